//! Domain layer: pure types with no I/O.
//!
//! # What belongs in the domain layer?
//!
//! - Session configuration and its validation rules
//! - Status notifications and the session state machine
//! - The tagged error type shared by every layer above
//! - Socket URL resolution and camera device cycling
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, socket, or camera handle types
//! - File I/O or environment variable reading

pub mod config;
pub mod devices;
pub mod endpoint;
pub mod error;
pub mod state;
pub mod status;
