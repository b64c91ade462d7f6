use std::str::FromStr;
use std::sync::Arc;

use rayon::prelude::*;
use rutt_core::frame::FrameBuffer;
use rutt_core::traits::FrameSource;

use crate::error::SourceError;

/// Barres couleur SMPTE simplifiées, de gauche à droite.
const BARS: [[u8; 4]; 8] = [
    [255, 255, 255, 255],
    [255, 235, 4, 255],
    [0, 255, 255, 255],
    [0, 255, 0, 255],
    [255, 0, 255, 255],
    [255, 0, 0, 255],
    [0, 0, 255, 255],
    [0, 0, 0, 255],
];

/// Motifs de test intégrés.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Rampe de luminance gauche (noir) → droite (blanc).
    Gradient,
    /// Rampe de luminance haut (blanc) → bas (noir).
    VerticalGradient,
    /// Damier de `cells` cases par côté.
    Checker { cells: u32 },
    /// Huit barres verticales.
    Bars,
    /// Anneaux concentriques qui s'éloignent du centre.
    Rings,
    /// Bruit de Perlin défilant.
    #[cfg(feature = "procedural")]
    Noise { seed: u32 },
}

impl FromStr for Pattern {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gradient" | "hgradient" => Ok(Self::Gradient),
            "vgradient" => Ok(Self::VerticalGradient),
            "checker" => Ok(Self::Checker { cells: 8 }),
            "bars" => Ok(Self::Bars),
            "rings" => Ok(Self::Rings),
            #[cfg(feature = "procedural")]
            "noise" => Ok(Self::Noise { seed: 0 }),
            _ => Err(SourceError::UnknownPattern(s.to_string())),
        }
    }
}

impl Pattern {
    /// Couleur du pixel (x, y) au temps `t` (secondes).
    #[inline]
    #[cfg_attr(not(feature = "procedural"), allow(unused_variables))]
    fn shade(self, x: u32, y: u32, w: u32, h: u32, t: f64, noise: Option<&Perlin2>) -> [u8; 4] {
        let nx = f64::from(x) / f64::from(w.saturating_sub(1).max(1));
        let ny = f64::from(y) / f64::from(h.saturating_sub(1).max(1));
        let gray = |v: f64| {
            let l = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            [l, l, l, 255]
        };
        match self {
            Self::Gradient => gray(nx),
            Self::VerticalGradient => gray(1.0 - ny),
            Self::Checker { cells } => {
                let cells = cells.max(1);
                let cx = x * cells / w.max(1);
                let cy = y * cells / h.max(1);
                if (cx + cy) % 2 == 0 { [255, 255, 255, 255] } else { [0, 0, 0, 255] }
            }
            Self::Bars => BARS[((x * 8) / w.max(1)).min(7) as usize],
            Self::Rings => {
                let dx = nx - 0.5;
                let dy = ny - 0.5;
                let r = (dx * dx + dy * dy).sqrt();
                gray(0.5 + 0.5 * (r * 40.0 - t * 4.0).sin())
            }
            #[cfg(feature = "procedural")]
            Self::Noise { .. } => {
                let v = noise.map_or(0.0, |p| p.sample(nx * 6.0 + t * 0.5, ny * 6.0));
                gray(0.5 + 0.5 * v)
            }
        }
    }

    fn is_animated(self) -> bool {
        match self {
            Self::Rings => true,
            #[cfg(feature = "procedural")]
            Self::Noise { .. } => true,
            _ => false,
        }
    }
}

#[cfg(feature = "procedural")]
struct Perlin2(noise::Perlin);

#[cfg(feature = "procedural")]
impl Perlin2 {
    fn sample(&self, x: f64, y: f64) -> f64 {
        use noise::NoiseFn;
        self.0.get([x, y])
    }
}

#[cfg(not(feature = "procedural"))]
#[allow(dead_code)]
struct Perlin2;

/// Générateur de motifs de test, sans I/O.
///
/// Recycle un petit pool de frames : aucune allocation après le démarrage
/// tant que le consommateur relâche ses `Arc`.
///
/// # Example
/// ```
/// use rutt_source::{Pattern, PatternSource};
/// use rutt_core::traits::FrameSource;
/// let mut src = PatternSource::new(Pattern::Gradient, 16, 8);
/// let frame = src.next_frame().unwrap();
/// assert_eq!(frame.pixel(0, 0), (0, 0, 0, 255));
/// assert_eq!(frame.pixel(15, 0), (255, 255, 255, 255));
/// ```
pub struct PatternSource {
    pattern: Pattern,
    width: u32,
    height: u32,
    pool: Vec<Arc<FrameBuffer>>,
    frame_count: u64,
    noise: Option<Perlin2>,
}

impl PatternSource {
    #[must_use]
    pub fn new(pattern: Pattern, width: u32, height: u32) -> Self {
        let pool = (0..3).map(|_| Arc::new(FrameBuffer::new(width, height))).collect();
        #[cfg(feature = "procedural")]
        let noise = match pattern {
            Pattern::Noise { seed } => Some(Perlin2(noise::Perlin::new(seed))),
            _ => None,
        };
        #[cfg(not(feature = "procedural"))]
        let noise = None;
        Self {
            pattern,
            width,
            height,
            pool,
            frame_count: 0,
            noise,
        }
    }

    #[must_use]
    pub fn pattern(&self) -> Pattern {
        self.pattern
    }
}

impl FrameSource for PatternSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let free_idx = self
            .pool
            .iter()
            .position(|a| Arc::strong_count(a) == 1)
            .unwrap_or(0);
        let fb = Arc::get_mut(&mut self.pool[free_idx])?;

        let t = if self.pattern.is_animated() {
            self.frame_count as f64 / 60.0
        } else {
            0.0
        };
        let (w, h, pattern) = (self.width, self.height, self.pattern);
        let noise = self.noise.as_ref();
        let stride = w as usize * 4;

        fb.data
            .par_chunks_exact_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..w {
                    let idx = x as usize * 4;
                    row[idx..idx + 4].copy_from_slice(&pattern.shade(x, y as u32, w, h, t, noise));
                }
            });

        self.frame_count += 1;
        Some(Arc::clone(&self.pool[free_idx]))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_live(&self) -> bool {
        true
    }
}
