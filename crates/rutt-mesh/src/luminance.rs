use rayon::prelude::*;
use rutt_core::frame::luma;
use rutt_core::settings::Settings;
use rutt_source::GridSample;

/// Paramètres du conditionnement de signal, figés pour un tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalParams {
    pub brightness: f32,
    pub contrast: f32,
    pub threshold: f32,
    pub gamma: f32,
    pub edge_detect: bool,
    pub posterize: u32,
    pub invert: bool,
    /// 1 = champ figé, 0 = instantané.
    pub smoothing: f32,
    pub persistence: f32,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl SignalParams {
    #[must_use]
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            brightness: s.brightness,
            contrast: s.contrast,
            threshold: s.threshold,
            gamma: s.gamma,
            edge_detect: s.edge_detect,
            posterize: s.posterize,
            invert: s.invert_displacement,
            smoothing: unit_or(s.displacement_smoothing, 0.0),
            persistence: unit_or(s.persistence, 0.0),
        }
    }
}

#[inline(always)]
fn unit_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { fallback }
}

/// Luminance conditionnée : luminosité/contraste, gamma, seuil,
/// postérisation, clamp puis inversion.
///
/// # Example
/// ```
/// use rutt_mesh::luminance::{condition, SignalParams};
/// let p = SignalParams { invert: true, ..SignalParams::default() };
/// assert!((condition(0.3, &p) - 0.7).abs() < 1e-6);
/// ```
#[inline(always)]
#[must_use]
pub fn condition(lum: f32, p: &SignalParams) -> f32 {
    let mut lum = (lum + p.brightness) * p.contrast;
    lum = lum.clamp(0.0, 1.0).powf(p.gamma);
    if lum <= p.threshold {
        lum = 0.0;
    }
    if p.posterize > 1 {
        let levels = p.posterize as f32;
        lum = (lum * levels).floor() / (levels - 1.0);
    }
    lum = lum.clamp(0.0, 1.0);
    if p.invert { 1.0 - lum } else { lum }
}

/// Magnitude de contour sur les 4 voisins ; un voisin hors grille vaut le centre.
#[inline(always)]
#[must_use]
pub fn edge_magnitude(field: &[f32], width: usize, height: usize, x: usize, y: usize) -> f32 {
    let i = y * width + x;
    let c = field[i];
    let left = if x > 0 { field[i - 1] } else { c };
    let right = if x + 1 < width { field[i + 1] } else { c };
    let down = if y > 0 { field[i - width] } else { c };
    let up = if y + 1 < height { field[i + width] } else { c };
    let sum = (c - left).abs() + (c - right).abs() + (c - up).abs() + (c - down).abs();
    (sum * 2.0).clamp(0.0, 1.0)
}

/// Champ de luminance par cellule, avec lissage temporel et persistance.
///
/// Trois buffers : `raw` (valeur conditionnée du tick), `smoothed`
/// (lerp exponentiel) et `field` (max décroissant, lu par la displacement).
///
/// # Example
/// ```
/// use rutt_mesh::luminance::{LuminanceProcessor, SignalParams};
/// use rutt_source::GridSample;
/// use rutt_core::Rgba;
///
/// let mut lp = LuminanceProcessor::new(2, 2);
/// let sample = GridSample { colors: vec![Rgba::WHITE; 4], width: 2, height: 2 };
/// let p = SignalParams { smoothing: 0.0, ..SignalParams::default() };
/// lp.process(&sample, &p);
/// assert!(lp.field().iter().all(|&v| (v - 1.0).abs() < 1e-6));
/// ```
#[derive(Clone, Debug, Default)]
pub struct LuminanceProcessor {
    width: u32,
    height: u32,
    luma: Vec<f32>,
    raw: Vec<f32>,
    smoothed: Vec<f32>,
    field: Vec<f32>,
}

impl LuminanceProcessor {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let mut lp = Self::default();
        lp.resize(width, height);
        lp
    }

    /// Réalloue tous les buffers (à zéro) si la taille change.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == self.width && height == self.height && !self.field.is_empty() {
            return false;
        }
        let n = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.luma = vec![0.0; n];
        self.raw = vec![0.0; n];
        self.smoothed = vec![0.0; n];
        self.field = vec![0.0; n];
        true
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn raw(&self) -> &[f32] {
        &self.raw
    }

    #[must_use]
    pub fn smoothed(&self) -> &[f32] {
        &self.smoothed
    }

    /// Champ final consommé par la displacement.
    #[must_use]
    pub fn field(&self) -> &[f32] {
        &self.field
    }

    /// Traite un échantillon de grille.
    ///
    /// Un échantillon vide ou de taille différente est ignoré : le champ
    /// précédent reste en place.
    pub fn process(&mut self, sample: &GridSample, params: &SignalParams) {
        let (w, h) = (self.width as usize, self.height as usize);
        if w == 0 || h == 0 || sample.width != self.width || sample.height != self.height {
            log::debug!(
                "Échantillon {}×{} ignoré (grille {}×{})",
                sample.width,
                sample.height,
                self.width,
                self.height
            );
            return;
        }
        if sample.colors.len() != w * h {
            return;
        }

        self.luma
            .par_iter_mut()
            .zip(sample.colors.par_iter())
            .for_each(|(l, &c)| *l = luma(c));

        let luma_field = &self.luma;
        self.raw
            .par_chunks_exact_mut(w)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    let lum = if params.edge_detect {
                        edge_magnitude(luma_field, w, h, x, y)
                    } else {
                        luma_field[y * w + x]
                    };
                    *out = condition(lum, params);
                }
            });

        let t = 1.0 - params.smoothing;
        let persistence = params.persistence;
        self.smoothed
            .par_iter_mut()
            .zip(self.field.par_iter_mut())
            .zip(self.raw.par_iter())
            .for_each(|((s, f), &lum)| {
                // NaN issu de paramètres dégénérés : on garde la dernière valeur.
                if !lum.is_finite() {
                    return;
                }
                *s = *s * (1.0 - t) + lum * t;
                *f = if persistence > 0.0 { s.max(*f * persistence) } else { *s };
            });
    }
}
