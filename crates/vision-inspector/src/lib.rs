//! vision-inspector library crate.
//!
//! Turns a local camera into a live, remotely processed video feed: frames
//! are sampled on a fixed cadence, pushed to a detector over a WebSocket, and
//! whatever images the detector sends back are painted onto a render surface
//! the UI displays.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Camera ──frames──> [InspectorSession] ──data URLs──> detector (WebSocket)
//!                          │    ^
//!                 paints   v    └──────── data URLs ──────────┘
//!                   RenderSurface ──> UI (read-only SurfaceHandle)
//!
//! [vision-inspector]
//!   ├── application/      InspectorSession, ports, callbacks, chat history
//!   └── infrastructure/
//!         ├── ws_transport/   detector socket (tokio-tungstenite)
//!         ├── camera/         synthetic test-pattern camera + mock
//!         ├── mock_transport/ in-memory socket for tests
//!         └── storage/        TOML config file, key-value store
//! ```
//!
//! # Layer rules
//!
//! - `application` depends on `vision-core` and the port traits it defines.
//! - `infrastructure` implements those ports and may depend on everything.

/// Application layer: the capture/stream session and its ports.
pub mod application;

/// Infrastructure layer: socket transport, cameras, storage.
pub mod infrastructure;
