use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use rutt_core::color::Rgba;
use rutt_core::frame::FrameBuffer;
use rutt_core::settings::Sampling;

use crate::error::SourceError;

/// Couleurs de la source ramenées à la résolution de la grille.
///
/// Row-major, **ligne 0 en bas** (comme la grille du mesh) :
/// la ligne 0 échantillonne le bas de l'image source.
#[derive(Clone, Debug, Default)]
pub struct GridSample {
    pub colors: Vec<Rgba>,
    pub width: u32,
    pub height: u32,
}

impl GridSample {
    #[inline(always)]
    #[must_use]
    pub fn color(&self, x: u32, y: u32) -> Rgba {
        self.colors
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .unwrap_or(Rgba::BLACK)
    }
}

/// Rééchantillonneur réutilisable wrappant fast_image_resize.
///
/// Pré-alloue le resizer et les buffers intermédiaires pour zéro
/// allocation en régime permanent.
///
/// # Example
/// ```
/// use rutt_source::GridSampler;
/// use rutt_core::FrameBuffer;
/// let mut sampler = GridSampler::default();
/// let src = FrameBuffer::filled(100, 50, [255, 255, 255, 255]);
/// let grid = sampler.sample(&src, 8, 4).unwrap();
/// assert_eq!(grid.colors.len(), 32);
/// ```
pub struct GridSampler {
    inner: FirResizer,
    options: ResizeOptions,
    sampling: Sampling,
    /// Copie de la source (fast_image_resize exige `&mut`).
    src_buf: Vec<u8>,
    dst_buf: Vec<u8>,
    out: GridSample,
}

impl GridSampler {
    #[must_use]
    pub fn new(sampling: Sampling) -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(resize_alg(sampling)),
            sampling,
            src_buf: Vec::new(),
            dst_buf: Vec::new(),
            out: GridSample::default(),
        }
    }

    #[must_use]
    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    pub fn set_sampling(&mut self, sampling: Sampling) {
        if sampling != self.sampling {
            self.sampling = sampling;
            self.options = ResizeOptions::new().resize_alg(resize_alg(sampling));
        }
    }

    /// Rééchantillonne `src` en `width × height` cellules.
    ///
    /// # Errors
    /// Returns an error if the frame is empty or the resize fails.
    pub fn sample(&mut self, src: &FrameBuffer, width: u32, height: u32) -> Result<&GridSample> {
        if src.is_empty() {
            return Err(SourceError::EmptyFrame {
                width: src.width,
                height: src.height,
            }
            .into());
        }
        if width == 0 || height == 0 {
            return Err(SourceError::EmptyFrame { width, height }.into());
        }

        let needed = width as usize * height as usize * 4;
        self.dst_buf.resize(needed, 0);

        if src.width == width && src.height == height {
            self.dst_buf.copy_from_slice(&src.data[..needed]);
        } else {
            // Copie forcée par l'API fast_image_resize (source en &mut).
            self.src_buf.clear();
            self.src_buf
                .extend_from_slice(&src.data[..src.width as usize * src.height as usize * 4]);

            let src_image =
                Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                    .context("Dimensions source invalides")?;
            let mut dst_image =
                Image::from_slice_u8(width, height, &mut self.dst_buf, PixelType::U8x4)
                    .context("Dimensions grille invalides")?;
            self.inner
                .resize(&src_image, &mut dst_image, Some(&self.options))
                .context("Rééchantillonnage échoué")?;
        }

        let out = &mut self.out;
        out.width = width;
        out.height = height;
        out.colors.clear();
        out.colors.reserve(width as usize * height as usize);
        let stride = width as usize * 4;
        // Retournement vertical : la grille part du bas.
        for row in self.dst_buf.chunks_exact(stride).rev() {
            out.colors.extend(
                row.chunks_exact(4)
                    .map(|px| Rgba::from_rgba8(px[0], px[1], px[2], px[3])),
            );
        }
        Ok(&self.out)
    }
}

impl Default for GridSampler {
    fn default() -> Self {
        Self::new(Sampling::default())
    }
}

fn resize_alg(sampling: Sampling) -> ResizeAlg {
    match sampling {
        Sampling::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
        Sampling::Nearest => ResizeAlg::Nearest,
    }
}
