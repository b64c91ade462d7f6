use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::settings::Settings;

/// Largeur de ligne minimale transmise au renderer.
pub const MIN_LINE_WIDTH: f32 = 0.001;

/// Uniformes de style émis avec chaque mesh.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct LineStyle {
    pub width: f32,
    pub taper: f32,
    pub glow: f32,
    pub noise: f32,
    pub bloom: f32,
    pub background: Rgba,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl LineStyle {
    /// Extrait le style courant ; la largeur n'est jamais sous [`MIN_LINE_WIDTH`].
    ///
    /// # Example
    /// ```
    /// use rutt_core::{LineStyle, Settings};
    /// let s = Settings { line_width: 0.0, ..Settings::default() };
    /// assert_eq!(LineStyle::from_settings(&s).width, 0.001);
    /// ```
    #[must_use]
    pub fn from_settings(s: &Settings) -> Self {
        let width = if s.line_width.is_finite() {
            s.line_width.max(MIN_LINE_WIDTH)
        } else {
            MIN_LINE_WIDTH
        };
        Self {
            width,
            taper: s.line_taper,
            glow: s.glow_intensity,
            noise: s.noise_amount,
            bloom: s.bloom,
            background: s.background_color,
        }
    }
}

/// Buffers de sortie d'un tick, consommés par le renderer externe.
///
/// `vertices` et `colors` sont row-major, ligne 0 en bas ;
/// `indices` est une liste de segments (paires).
///
/// # Example
/// ```
/// use rutt_core::MeshBuffers;
/// let m = MeshBuffers::new(4, 3);
/// assert_eq!(m.vertices.len(), 12);
/// assert_eq!(m.segment_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MeshBuffers {
    pub vertices: Vec<Vec3>,
    pub colors: Vec<Rgba>,
    pub indices: Vec<u32>,
    pub width: u32,
    pub height: u32,
    pub style: LineStyle,
}

impl MeshBuffers {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let n = width as usize * height as usize;
        Self {
            vertices: vec![Vec3::ZERO; n],
            colors: vec![Rgba::WHITE; n],
            indices: Vec::new(),
            width,
            height,
            style: LineStyle::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.indices.len() / 2
    }

    /// Index row-major de la cellule (x, y).
    #[inline(always)]
    #[must_use]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
