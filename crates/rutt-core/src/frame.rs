use crate::color::Rgba;
use crate::error::CoreError;

/// Coefficients de luma (Rec. 601). Doivent rester exacts pour la parité visuelle.
pub const LUMA_R: f32 = 0.299;
pub const LUMA_G: f32 = 0.587;
pub const LUMA_B: f32 = 0.114;

/// Luma Rec. 601 d'une couleur normalisée.
///
/// # Example
/// ```
/// use rutt_core::color::Rgba;
/// use rutt_core::frame::luma;
/// assert!((luma(Rgba::WHITE) - 1.0).abs() < 1e-6);
/// ```
#[inline(always)]
#[must_use]
pub fn luma(c: Rgba) -> f32 {
    LUMA_R * c.r + LUMA_G * c.g + LUMA_B * c.b
}

/// Buffer de pixels réutilisable.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel, ligne 0 en haut.
///
/// # Example
/// ```
/// use rutt_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer pré-alloué (noir transparent) aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wraps an existing RGBA8 buffer.
    ///
    /// # Errors
    /// Returns [`CoreError::BufferSize`] if `data.len() != width * height * 4`.
    ///
    /// # Example
    /// ```
    /// use rutt_core::frame::FrameBuffer;
    /// assert!(FrameBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
    /// assert!(FrameBuffer::from_raw(2, 2, vec![0; 15]).is_err());
    /// ```
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CoreError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Remplit tout le buffer avec une couleur RGBA8.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut fb = Self::new(width, height);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        fb
    }

    /// `true` si le buffer ne contient aucun pixel exploitable.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0
            || self.height == 0
            || self.data.len() < self.width as usize * self.height as usize * 4
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    ///
    /// # Example
    /// ```
    /// use rutt_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(10, 10);
    /// assert_eq!(fb.pixel(0, 0), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Pixel (x, y) en couleur normalisée.
    #[inline(always)]
    #[must_use]
    pub fn color(&self, x: u32, y: u32) -> Rgba {
        let (r, g, b, a) = self.pixel(x, y);
        Rgba::from_rgba8(r, g, b, a)
    }

    /// Écrit le pixel (x, y). Hors limites : no-op.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if let Some(px) = self.data.get_mut(idx..idx + 4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Luminance Rec. 601 normalisée [0.0, 1.0].
    ///
    /// # Example
    /// ```
    /// use rutt_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(1, 1, [255, 255, 255, 255]);
    /// assert!((fb.luminance(0, 0) - 1.0).abs() < 1e-6);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> f32 {
        luma(self.color(x, y))
    }
}
