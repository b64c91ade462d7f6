use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rutt_core::frame::FrameBuffer;
use rutt_core::traits::FrameSource;

use crate::error::SourceError;

/// Source d'image statique. Retourne toujours la même frame.
///
/// # Example
/// ```no_run
/// use rutt_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::new(Path::new("test.png")).unwrap();
/// ```
pub struct ImageSource {
    frame: Arc<FrameBuffer>,
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// Returns an error if the image cannot be loaded or has no pixels.
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self::from_frame(load_image(path)?))
    }

    /// Wraps an already decoded frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }
}

impl FrameSource for ImageSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        Some(Arc::clone(&self.frame))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Décode une image (PNG, JPEG, BMP, GIF) en RGBA8.
///
/// # Errors
/// Returns an error if the file cannot be decoded or is empty.
///
/// # Example
/// ```no_run
/// use rutt_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("test.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = ::image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(SourceError::EmptyFrame { width, height })
            .with_context(|| format!("Image vide : {}", path.display()));
    }
    Ok(FrameBuffer::from_raw(width, height, rgba.into_raw())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_roundtrip_through_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        ::image::RgbaImage::from_pixel(3, 2, ::image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let mut src = ImageSource::new(&path).unwrap();
        assert_eq!(src.native_size(), (3, 2));
        assert!(!src.is_live());
        let frame = src.next_frame().unwrap();
        assert_eq!(frame.pixel(2, 1), (255, 0, 0, 255));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSource::new(&dir.path().join("nope.png")).is_err());
    }
}
