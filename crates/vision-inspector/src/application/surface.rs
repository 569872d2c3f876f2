//! The render surface detector replies are painted onto.
//!
//! The session owns a [`RenderSurface`]; the UI only ever sees a
//! [`SurfaceHandle`], which can read pixels but not paint them.
//!
//! Every paint is tagged with the surface *generation* that was current when
//! the reply arrived.  `stop` and `destroy` bump the generation, so a decode
//! that finishes after the session stopped is discarded instead of painting
//! over the cleared surface.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::{Rgba, RgbaImage};
use tracing::debug;

use vision_core::frame::scale_to;
use vision_core::InspectorError;

/// Size of a surface before the camera reports its resolution.
pub const DEFAULT_SURFACE_WIDTH: u32 = 300;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 150;

#[derive(Debug)]
struct SurfaceState {
    pixels: RgbaImage,
    generation: u64,
    released: bool,
}

/// Shared, mutable render target.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl RenderSurface {
    /// Allocates a transparent `width × height` surface.
    ///
    /// # Errors
    ///
    /// Returns [`InspectorError::SurfaceUnavailable`] for a zero dimension or
    /// a size whose pixel buffer would not fit in memory.
    pub fn new(width: u32, height: u32) -> Result<Self, InspectorError> {
        let pixels = allocate(width, height)?;
        Ok(Self {
            state: Arc::new(Mutex::new(SurfaceState {
                pixels,
                generation: 0,
                released: false,
            })),
        })
    }

    /// Current paint generation.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Discards any in-flight paints.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
    }

    /// Resizes to match the camera.  Clears the surface when the size changes.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), InspectorError> {
        let mut state = self.lock();
        if state.released {
            return Err(InspectorError::SurfaceUnavailable(
                "render surface has been released".to_string(),
            ));
        }
        if state.pixels.dimensions() != (width, height) {
            state.pixels = allocate(width, height)?;
            debug!(width, height, "render surface resized");
        }
        Ok(())
    }

    /// Paints `image` stretched to the surface size.
    ///
    /// Returns `false` without painting when `generation` is stale or the
    /// surface was released.
    pub fn paint(&self, generation: u64, image: &RgbaImage) -> bool {
        let (width, height) = {
            let state = self.lock();
            if state.released || state.generation != generation {
                return false;
            }
            state.pixels.dimensions()
        };

        // Scale outside the lock; the UI may be reading a snapshot meanwhile.
        let scaled = scale_to(image, width, height);

        let mut state = self.lock();
        if state.released
            || state.generation != generation
            || state.pixels.dimensions() != (width, height)
        {
            return false;
        }
        state.pixels = scaled;
        true
    }

    /// Detaches the surface for good.  Further paints are ignored.
    pub fn release(&self) {
        let mut state = self.lock();
        state.released = true;
        state.generation = state.generation.wrapping_add(1);
    }

    /// Read-only view for the UI.
    pub fn handle(&self) -> SurfaceHandle {
        SurfaceHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only access to a [`RenderSurface`].
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    state: Arc<Mutex<SurfaceState>>,
}

impl SurfaceHandle {
    pub fn dimensions(&self) -> (u32, u32) {
        self.lock().pixels.dimensions()
    }

    /// Copy of the current pixels.
    pub fn snapshot(&self) -> RgbaImage {
        self.lock().pixels.clone()
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    /// Writes the current pixels as a PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.snapshot().save_with_format(path, image::ImageFormat::Png)
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn allocate(width: u32, height: u32) -> Result<RgbaImage, InspectorError> {
    if width == 0 || height == 0 {
        return Err(InspectorError::SurfaceUnavailable(format!(
            "cannot create a {width}x{height} render surface"
        )));
    }
    let bytes = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4));
    if bytes.is_none() {
        return Err(InspectorError::SurfaceUnavailable(format!(
            "render surface {width}x{height} is too large"
        )));
    }
    Ok(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_core::ErrorKind;

    fn solid(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_new_rejects_zero_dimension() {
        let err = RenderSurface::new(0, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SurfaceUnavailable);
    }

    #[test]
    fn test_paint_with_current_generation_scales_to_surface() {
        // Arrange
        let surface = RenderSurface::new(8, 6).unwrap();
        let gen = surface.generation();

        // Act
        let painted = surface.paint(gen, &solid(4, 3, 200));

        // Assert
        assert!(painted);
        let snap = surface.handle().snapshot();
        assert_eq!(snap.dimensions(), (8, 6));
        assert_eq!(snap.get_pixel(7, 5), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_paint_after_invalidate_is_discarded() {
        // Arrange
        let surface = RenderSurface::new(4, 4).unwrap();
        let gen = surface.generation();

        // Act
        surface.invalidate();
        let painted = surface.paint(gen, &solid(4, 4, 255));

        // Assert
        assert!(!painted);
        assert_eq!(surface.handle().snapshot().get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_release_blocks_paint_and_resize() {
        let surface = RenderSurface::new(4, 4).unwrap();
        surface.release();

        assert!(surface.handle().is_released());
        assert!(!surface.paint(surface.generation(), &solid(4, 4, 1)));
        assert!(surface.resize(8, 8).is_err());
    }

    #[test]
    fn test_resize_changes_dimensions() {
        let surface = RenderSurface::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT).unwrap();
        surface.resize(640, 480).unwrap();
        assert_eq!(surface.handle().dimensions(), (640, 480));
    }
}
