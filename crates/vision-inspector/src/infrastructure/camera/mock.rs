//! Mock camera provider for tests.
//!
//! [`MockCameraProvider`] answers `open` according to a
//! [`MockCameraBehavior`] and hands out streams that share one
//! [`CameraProbe`] with the test.  Through the probe a test can:
//!
//! - switch the reported dimensions on and off (`set_dimensions`),
//! - make grabs fail (`set_fail_grab`),
//! - observe how many frames were grabbed and whether tracks were stopped.
//!
//! ```ignore
//! let (provider, probe) = MockCameraProvider::new(MockCameraBehavior::succeed(64, 48));
//! let session = InspectorSession::new(config, callbacks, Arc::new(provider), transport)?;
//! session.start().await?;
//! session.stop();
//! assert!(probe.tracks_stopped());
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use vision_core::{CameraDevice, VideoConstraints};

use crate::application::ports::{CameraError, CameraProvider, CameraStream};

/// What `open` does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCameraBehavior {
    /// Opens a stream that reports `width × height` immediately.
    Succeed { width: u32, height: u32 },
    /// Opens a stream whose dimensions stay unknown until the probe sets them.
    NoFrameYet,
    DenyPermission,
    NoDevice,
    Fail(String),
}

impl MockCameraBehavior {
    pub fn succeed(width: u32, height: u32) -> Self {
        MockCameraBehavior::Succeed { width, height }
    }
}

/// Test-side view of the streams a [`MockCameraProvider`] opened.
#[derive(Debug, Default)]
pub struct CameraProbe {
    dimensions: Mutex<Option<(u32, u32)>>,
    fail_grab: AtomicBool,
    tracks_stopped: AtomicBool,
    frames_grabbed: AtomicUsize,
    opens: AtomicUsize,
    last_constraints: Mutex<Option<VideoConstraints>>,
}

impl CameraProbe {
    pub fn set_dimensions(&self, dimensions: Option<(u32, u32)>) {
        *self.dimensions.lock().unwrap_or_else(PoisonError::into_inner) = dimensions;
    }

    pub fn set_fail_grab(&self, fail: bool) {
        self.fail_grab.store(fail, Ordering::SeqCst);
    }

    pub fn tracks_stopped(&self) -> bool {
        self.tracks_stopped.load(Ordering::SeqCst)
    }

    pub fn frames_grabbed(&self) -> usize {
        self.frames_grabbed.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Constraints passed to the most recent `open`.
    pub fn last_constraints(&self) -> Option<VideoConstraints> {
        self.last_constraints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        *self.dimensions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct MockCameraProvider {
    behavior: MockCameraBehavior,
    probe: Arc<CameraProbe>,
    devices: Vec<CameraDevice>,
}

impl MockCameraProvider {
    /// Returns the provider and the probe its streams report to.
    pub fn new(behavior: MockCameraBehavior) -> (Self, Arc<CameraProbe>) {
        let probe = Arc::new(CameraProbe::default());
        let provider = Self {
            behavior,
            probe: Arc::clone(&probe),
            devices: vec![
                CameraDevice::new("mock-front", "Mock front camera"),
                CameraDevice::new("mock-rear", "Mock rear camera"),
            ],
        };
        (provider, probe)
    }
}

#[async_trait]
impl CameraProvider for MockCameraProvider {
    async fn open(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        *self
            .probe
            .last_constraints
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(constraints.clone());

        match &self.behavior {
            MockCameraBehavior::Succeed { width, height } => {
                self.probe.set_dimensions(Some((*width, *height)));
            }
            MockCameraBehavior::NoFrameYet => self.probe.set_dimensions(None),
            MockCameraBehavior::DenyPermission => {
                return Err(CameraError::PermissionDenied("NotAllowedError".to_string()))
            }
            MockCameraBehavior::NoDevice => return Err(CameraError::NotFound),
            MockCameraBehavior::Fail(reason) => return Err(CameraError::Device(reason.clone())),
        }
        self.probe.tracks_stopped.store(false, Ordering::SeqCst);
        Ok(Box::new(MockCameraStream {
            probe: Arc::clone(&self.probe),
        }))
    }

    async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
        Ok(self.devices.clone())
    }
}

struct MockCameraStream {
    probe: Arc<CameraProbe>,
}

impl CameraStream for MockCameraStream {
    fn dimensions(&self) -> Option<(u32, u32)> {
        if self.probe.tracks_stopped() {
            return None;
        }
        self.probe.dimensions()
    }

    fn grab_frame(&mut self) -> Result<RgbImage, CameraError> {
        if self.probe.fail_grab.load(Ordering::SeqCst) {
            return Err(CameraError::Device("grab failed".to_string()));
        }
        let (width, height) = self.dimensions().ok_or(CameraError::NoFrame)?;
        let n = self.probe.frames_grabbed.fetch_add(1, Ordering::SeqCst);
        let shade = (n % 256) as u8;
        Ok(RgbImage::from_pixel(width, height, Rgb([shade, 128, 255 - shade])))
    }

    fn stop_tracks(&mut self) {
        self.probe.tracks_stopped.store(true, Ordering::SeqCst);
    }
}
