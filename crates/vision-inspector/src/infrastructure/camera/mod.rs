//! Camera providers.
//!
//! - [`SyntheticCameraProvider`] renders an animated test pattern, so the
//!   binary streams something on hosts without a capture device.
//! - [`mock::MockCameraProvider`] is a scriptable fake for tests.

pub mod mock;
pub mod synthetic;

pub use synthetic::SyntheticCameraProvider;
