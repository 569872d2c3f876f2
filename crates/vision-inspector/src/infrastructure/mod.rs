//! Infrastructure layer for the inspector.
//!
//! Contains the adapters behind the application ports: the tokio-tungstenite
//! detector socket, camera providers, and file-system storage.  The mock
//! adapters are compiled unconditionally so integration tests under `tests/`
//! can drive a session without a camera or network.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vision_core`, but MUST NOT be imported by the `application` layer.

pub mod camera;
pub mod mock_transport;
pub mod storage;
pub mod ws_transport;
