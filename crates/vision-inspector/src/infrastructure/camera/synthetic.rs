//! Animated test-pattern camera.
//!
//! Each grab renders a diagonal gradient that scrolls one step per frame and
//! a moving white bar, which is enough for a detector to see motion between
//! frames.  The native resolution is the ideal resolution from the
//! constraints, or 640×480 when none is given.

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tracing::debug;

use vision_core::{CameraDevice, VideoConstraints};

use crate::application::ports::{CameraError, CameraProvider, CameraStream};

const FALLBACK_WIDTH: u32 = 640;
const FALLBACK_HEIGHT: u32 = 480;

/// Device id the synthetic provider reports.
pub const SYNTHETIC_DEVICE_ID: &str = "synthetic-0";

#[derive(Debug, Clone)]
pub struct SyntheticCameraProvider {
    devices: Vec<CameraDevice>,
}

impl SyntheticCameraProvider {
    pub fn new() -> Self {
        Self {
            devices: vec![CameraDevice::new(SYNTHETIC_DEVICE_ID, "Synthetic test pattern")],
        }
    }
}

impl Default for SyntheticCameraProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraProvider for SyntheticCameraProvider {
    async fn open(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        if let Some(id) = &constraints.device_id {
            if !self.devices.iter().any(|d| &d.device_id == id) {
                return Err(CameraError::NotFound);
            }
        }
        let width = constraints.ideal_width.unwrap_or(FALLBACK_WIDTH);
        let height = constraints.ideal_height.unwrap_or(FALLBACK_HEIGHT);
        debug!(width, height, "synthetic camera opened");
        Ok(Box::new(SyntheticStream {
            width,
            height,
            tick: 0,
            live: true,
        }))
    }

    async fn list_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
        Ok(self.devices.clone())
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    tick: u32,
    live: bool,
}

impl CameraStream for SyntheticStream {
    fn dimensions(&self) -> Option<(u32, u32)> {
        self.live.then_some((self.width, self.height))
    }

    fn grab_frame(&mut self) -> Result<RgbImage, CameraError> {
        if !self.live {
            return Err(CameraError::NoFrame);
        }
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);

        let bar_x = (tick.wrapping_mul(8)) % self.width;
        Ok(RgbImage::from_fn(self.width, self.height, |x, y| {
            if x.abs_diff(bar_x) < 4 {
                return Rgb([255, 255, 255]);
            }
            let r = (x.wrapping_add(tick) % 256) as u8;
            let g = (y.wrapping_add(tick) % 256) as u8;
            let b = ((x + y) / 4 % 256) as u8;
            Rgb([r, g, b])
        }))
    }

    fn stop_tracks(&mut self) {
        self.live = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_uses_ideal_resolution() {
        // Arrange
        let provider = SyntheticCameraProvider::new();
        let constraints = VideoConstraints {
            ideal_width: Some(320),
            ideal_height: Some(240),
            ..VideoConstraints::default()
        };

        // Act
        let mut stream = tokio_test::block_on(provider.open(&constraints)).unwrap();

        // Assert
        assert_eq!(stream.dimensions(), Some((320, 240)));
        assert_eq!(stream.grab_frame().unwrap().dimensions(), (320, 240));
    }

    #[test]
    fn test_frames_change_between_grabs() {
        let provider = SyntheticCameraProvider::new();
        let mut stream = tokio_test::block_on(provider.open(&VideoConstraints::default())).unwrap();

        let first = stream.grab_frame().unwrap();
        let second = stream.grab_frame().unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_unknown_device_is_not_found() {
        let provider = SyntheticCameraProvider::new();
        let constraints = VideoConstraints::default().with_device("usb-cam-9");

        let result = tokio_test::block_on(provider.open(&constraints));

        assert_eq!(result.err(), Some(CameraError::NotFound));
    }

    #[test]
    fn test_known_device_opens() {
        let provider = SyntheticCameraProvider::new();
        let constraints = VideoConstraints::default().with_device(SYNTHETIC_DEVICE_ID);

        assert!(tokio_test::block_on(provider.open(&constraints)).is_ok());
    }

    #[test]
    fn test_stopped_stream_has_no_frames() {
        let provider = SyntheticCameraProvider::new();
        let mut stream = tokio_test::block_on(provider.open(&VideoConstraints::default())).unwrap();

        stream.stop_tracks();

        assert_eq!(stream.dimensions(), None);
        assert_eq!(stream.grab_frame().err(), Some(CameraError::NoFrame));
    }

    #[test]
    fn test_list_devices_reports_synthetic_device() {
        let devices = tokio_test::block_on(SyntheticCameraProvider::new().list_devices()).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device_id, SYNTHETIC_DEVICE_ID);
    }
}
