//! Storage infrastructure.
//!
//! - `config`   – the TOML configuration file in the platform config directory.
//! - `kv_store` – [`KeyValueStore`](crate::application::KeyValueStore)
//!   implementations backing the chat history.

pub mod config;
pub mod kv_store;
