use std::str::FromStr;

use glam::Vec3;
use rutt_core::color::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::FxError;

const PURPLE: Rgba = Rgba::rgb(0.5, 0.0, 0.5);
const ORANGE: Rgba = Rgba::rgb(1.0, 0.5, 0.0);

/// Mode de coloration par profondeur.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum DepthMode {
    /// Lecture d'un [`Gradient`].
    #[default]
    Gradient,
    /// Interpolation proche → lointain.
    TwoColor,
    /// Teinte cyclique.
    Rainbow,
    /// Rampe noir → bleu → violet → rouge → orange → jaune.
    Thermal,
    /// Cinq bandes discrètes.
    Bands,
}

/// Dégradé à clés, interpolation linéaire entre clés voisines.
///
/// # Example
/// ```
/// use rutt_fx::depth::Gradient;
/// use rutt_core::Rgba;
/// let g = Gradient::new(vec![(0.0, Rgba::BLACK), (1.0, Rgba::WHITE)]);
/// assert!((g.evaluate(0.25).r - 0.25).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Gradient {
    keys: Vec<(f32, Rgba)>,
}

impl Default for Gradient {
    fn default() -> Self {
        Self::new(vec![
            (0.0, Rgba::BLUE),
            (0.25, Rgba::CYAN),
            (0.5, Rgba::GREEN),
            (0.75, Rgba::YELLOW),
            (1.0, Rgba::RED),
        ])
    }
}

impl Gradient {
    /// Les clés sont triées par position ; un dégradé vide rend du blanc.
    #[must_use]
    pub fn new(mut keys: Vec<(f32, Rgba)>) -> Self {
        keys.retain(|(t, _)| t.is_finite());
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    #[must_use]
    pub fn evaluate(&self, t: f32) -> Rgba {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return Rgba::WHITE;
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        for pair in self.keys.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let span = t1 - t0;
                let k = if span > 0.0 { (t - t0) / span } else { 1.0 };
                return Rgba::lerp(c0, c1, k);
            }
        }
        last.1
    }
}

/// Palettes prêtes à l'emploi.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthPreset {
    Thermal,
    Rainbow,
    Ocean,
    Fire,
    Matrix,
}

impl FromStr for DepthPreset {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "thermal" => Ok(Self::Thermal),
            "rainbow" => Ok(Self::Rainbow),
            "ocean" => Ok(Self::Ocean),
            "fire" => Ok(Self::Fire),
            "matrix" => Ok(Self::Matrix),
            _ => Err(FxError::UnknownPreset(s.to_string())),
        }
    }
}

/// Réglages du colorieur.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DepthParams {
    pub mode: DepthMode,
    pub gradient: Gradient,
    pub near_color: Rgba,
    pub far_color: Rgba,
    /// Nombre de tours de teinte [0.5, 5].
    pub rainbow_cycles: f32,
    pub rainbow_saturation: f32,
    pub rainbow_value: f32,
    pub animate_rainbow: bool,
    /// Tours par seconde.
    pub rainbow_speed: f32,
    /// Plage suivie par passe plutôt que fixe.
    pub auto_range: bool,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Default for DepthParams {
    fn default() -> Self {
        Self {
            mode: DepthMode::Gradient,
            gradient: Gradient::default(),
            near_color: Rgba::CYAN,
            far_color: Rgba::MAGENTA,
            rainbow_cycles: 1.0,
            rainbow_saturation: 1.0,
            rainbow_value: 1.0,
            animate_rainbow: false,
            rainbow_speed: 0.5,
            auto_range: true,
            min_depth: -2.0,
            max_depth: 2.0,
        }
    }
}

/// Colore chaque vertex selon son Z.
///
/// # Example
/// ```
/// use rutt_fx::depth::{DepthColorizer, DepthMode, DepthParams};
/// use rutt_core::Rgba;
/// use glam::Vec3;
///
/// let mut d = DepthColorizer::new(DepthParams { mode: DepthMode::Bands, ..Default::default() });
/// let verts = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)];
/// let mut colors = [Rgba::WHITE; 2];
/// d.apply(&verts, &mut colors, 1.0);
/// assert_eq!(colors[0], Rgba::BLUE);
/// assert_eq!(colors[1], Rgba::RED);
/// ```
#[derive(Clone, Debug)]
pub struct DepthColorizer {
    pub params: DepthParams,
    tracked_min: f32,
    tracked_max: f32,
    rainbow_offset: f32,
}

impl Default for DepthColorizer {
    fn default() -> Self {
        Self::new(DepthParams::default())
    }
}

impl DepthColorizer {
    #[must_use]
    pub fn new(params: DepthParams) -> Self {
        Self {
            params,
            tracked_min: f32::MAX,
            tracked_max: f32::MIN,
            rainbow_offset: 0.0,
        }
    }

    /// Anime le décalage arc-en-ciel.
    pub fn update(&mut self, dt: f32) {
        if self.params.animate_rainbow {
            self.rainbow_offset += self.params.rainbow_speed * dt;
            if self.rainbow_offset > 1.0 {
                self.rainbow_offset -= 1.0;
            }
        }
    }

    /// Oublie la plage suivie.
    pub fn reset_range(&mut self) {
        self.tracked_min = f32::MAX;
        self.tracked_max = f32::MIN;
    }

    /// Plage suivie `(min, max)`, `None` avant la première mesure.
    #[must_use]
    pub fn tracked_range(&self) -> Option<(f32, f32)> {
        (self.tracked_min <= self.tracked_max).then_some((self.tracked_min, self.tracked_max))
    }

    pub fn apply_preset(&mut self, preset: DepthPreset) {
        let p = &mut self.params;
        match preset {
            DepthPreset::Thermal => p.mode = DepthMode::Thermal,
            DepthPreset::Rainbow => {
                p.mode = DepthMode::Rainbow;
                p.rainbow_cycles = 1.0;
            }
            DepthPreset::Ocean => {
                p.mode = DepthMode::TwoColor;
                p.near_color = Rgba::rgb(0.0, 0.2, 0.4);
                p.far_color = Rgba::rgb(0.0, 0.8, 1.0);
            }
            DepthPreset::Fire => {
                p.mode = DepthMode::TwoColor;
                p.near_color = Rgba::rgb(0.3, 0.0, 0.0);
                p.far_color = Rgba::YELLOW;
            }
            DepthPreset::Matrix => {
                p.mode = DepthMode::TwoColor;
                p.near_color = Rgba::rgb(0.0, 0.2, 0.0);
                p.far_color = Rgba::rgb(0.0, 1.0, 0.2);
            }
        }
    }

    /// Couleur pour une profondeur. En plage automatique, étend la plage suivie.
    pub fn color_for_depth(&mut self, depth: f32) -> Rgba {
        let p = &self.params;
        let (min, mut max) = if p.auto_range {
            if depth.is_finite() {
                self.tracked_min = self.tracked_min.min(depth);
                self.tracked_max = self.tracked_max.max(depth);
            }
            (self.tracked_min, self.tracked_max)
        } else {
            (p.min_depth, p.max_depth)
        };
        if approximately(min, max) {
            max = min + 0.001;
        }
        let t = inverse_lerp(min, max, depth);

        match p.mode {
            DepthMode::Gradient => p.gradient.evaluate(t),
            DepthMode::TwoColor => Rgba::lerp(p.near_color, p.far_color, t),
            DepthMode::Rainbow => {
                let hue = (t * p.rainbow_cycles + self.rainbow_offset) % 1.0;
                Rgba::from_hsv(hue, p.rainbow_saturation, p.rainbow_value)
            }
            DepthMode::Thermal => thermal(t),
            DepthMode::Bands => band(t),
        }
    }

    /// Deux passes : mesure de la plage (si automatique) puis coloration.
    ///
    /// La profondeur vaut `z * displacement_scale`. L'alpha existant est
    /// conservé : les lignes entrelacées restent invisibles.
    pub fn apply(&mut self, vertices: &[Vec3], colors: &mut [Rgba], displacement_scale: f32) {
        if vertices.len() != colors.len() {
            log::debug!(
                "DepthColorizer : {} vertices pour {} couleurs, passe ignorée",
                vertices.len(),
                colors.len()
            );
            return;
        }
        if self.params.auto_range {
            self.reset_range();
            for v in vertices {
                let depth = v.z * displacement_scale;
                if depth.is_finite() {
                    self.tracked_min = self.tracked_min.min(depth);
                    self.tracked_max = self.tracked_max.max(depth);
                }
            }
        }
        for (v, c) in vertices.iter().zip(colors.iter_mut()) {
            let mut next = self.color_for_depth(v.z * displacement_scale);
            next.a = c.a;
            *c = next;
        }
    }
}

/// Égalité relative à 1e-6 près.
#[inline(always)]
fn approximately(a: f32, b: f32) -> bool {
    (b - a).abs() < (1e-6 * a.abs().max(b.abs())).max(f32::MIN_POSITIVE * 8.0)
}

/// Position de `v` dans [a, b], clampée dans [0, 1].
#[inline(always)]
fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    let t = (v - a) / (b - a);
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

fn thermal(t: f32) -> Rgba {
    if t < 0.2 {
        Rgba::lerp(Rgba::BLACK, Rgba::BLUE, t / 0.2)
    } else if t < 0.4 {
        Rgba::lerp(Rgba::BLUE, PURPLE, (t - 0.2) / 0.2)
    } else if t < 0.6 {
        Rgba::lerp(PURPLE, Rgba::RED, (t - 0.4) / 0.2)
    } else if t < 0.8 {
        Rgba::lerp(Rgba::RED, ORANGE, (t - 0.6) / 0.2)
    } else {
        Rgba::lerp(ORANGE, Rgba::YELLOW, (t - 0.8) / 0.2)
    }
}

fn band(t: f32) -> Rgba {
    match (t * 5.0).floor() as i32 {
        i32::MIN..=0 => Rgba::BLUE,
        1 => Rgba::CYAN,
        2 => Rgba::GREEN,
        3 => Rgba::YELLOW,
        _ => Rgba::RED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn default_gradient_keys() {
        let g = Gradient::default();
        assert_eq!(g.evaluate(-1.0), Rgba::BLUE);
        assert_eq!(g.evaluate(0.5), Rgba::GREEN);
        assert_eq!(g.evaluate(2.0), Rgba::RED);
        let mid = g.evaluate(0.125);
        assert!(close(mid, Rgba::rgb(0.0, 0.5, 1.0)));
    }

    #[test]
    fn fixed_range_two_color() {
        let mut d = DepthColorizer::new(DepthParams {
            mode: DepthMode::TwoColor,
            auto_range: false,
            ..DepthParams::default()
        });
        assert_eq!(d.color_for_depth(-2.0), Rgba::CYAN);
        assert_eq!(d.color_for_depth(2.0), Rgba::MAGENTA);
        assert_eq!(d.color_for_depth(9.0), Rgba::MAGENTA);
        assert!(close(d.color_for_depth(0.0), Rgba::rgb(0.5, 0.5, 1.0)));
        assert!(d.tracked_range().is_none());
    }

    #[test]
    fn auto_range_spans_the_pass() {
        let mut d = DepthColorizer::new(DepthParams {
            mode: DepthMode::TwoColor,
            ..DepthParams::default()
        });
        let verts = [Vec3::new(0.0, 0.0, 0.5), Vec3::new(0.0, 0.0, 1.5), Vec3::new(0.0, 0.0, 1.0)];
        let mut colors = [Rgba::WHITE; 3];
        d.apply(&verts, &mut colors, 2.0);
        assert_eq!(d.tracked_range(), Some((1.0, 3.0)));
        assert_eq!(colors[0], Rgba::CYAN);
        assert_eq!(colors[1], Rgba::MAGENTA);
    }

    #[test]
    fn flat_field_does_not_divide_by_zero() {
        let mut d = DepthColorizer::default();
        let verts = [Vec3::new(0.0, 0.0, 0.7); 4];
        let mut colors = [Rgba::WHITE; 4];
        d.apply(&verts, &mut colors, 1.0);
        assert!(colors.iter().all(|c| c.is_finite()));
        assert!(colors.iter().all(|c| *c == Rgba::BLUE));
    }

    #[test]
    fn transparent_cells_stay_transparent() {
        let mut d = DepthColorizer::default();
        let verts = [Vec3::ZERO, Vec3::Z];
        let mut colors = [Rgba::CLEAR, Rgba::WHITE];
        d.apply(&verts, &mut colors, 1.0);
        assert_eq!(colors[0].a, 0.0);
        assert_eq!(colors[1].a, 1.0);
    }

    #[test]
    fn thermal_ramp_endpoints() {
        assert!(close(thermal(0.0), Rgba::BLACK));
        assert!(close(thermal(0.2), Rgba::BLUE));
        assert!(close(thermal(0.4), PURPLE));
        assert!(close(thermal(0.6), Rgba::RED));
        assert!(close(thermal(0.8), ORANGE));
        assert!(close(thermal(1.0), Rgba::YELLOW));
    }

    #[test]
    fn bands_are_discrete() {
        assert_eq!(band(0.1), Rgba::BLUE);
        assert_eq!(band(0.3), Rgba::CYAN);
        assert_eq!(band(0.5), Rgba::GREEN);
        assert_eq!(band(0.7), Rgba::YELLOW);
        assert_eq!(band(0.9), Rgba::RED);
        assert_eq!(band(1.0), Rgba::RED);
    }

    #[test]
    fn rainbow_animation_wraps() {
        let mut d = DepthColorizer::new(DepthParams {
            mode: DepthMode::Rainbow,
            animate_rainbow: true,
            rainbow_speed: 0.5,
            auto_range: false,
            ..DepthParams::default()
        });
        d.update(1.5);
        d.update(0.5);
        // 1.0 n'est pas > 1 : pas encore replié.
        assert!((d.rainbow_offset - 1.0).abs() < 1e-6);
        d.update(0.2);
        assert!((d.rainbow_offset - 0.1).abs() < 1e-5);
        let c = d.color_for_depth(-2.0);
        assert!(close(c, Rgba::from_hsv(0.1, 1.0, 1.0)));
    }

    #[test]
    fn presets() {
        let mut d = DepthColorizer::default();
        d.apply_preset("fire".parse().unwrap());
        assert_eq!(d.params.mode, DepthMode::TwoColor);
        assert_eq!(d.params.far_color, Rgba::YELLOW);
        d.apply_preset(DepthPreset::Thermal);
        assert_eq!(d.params.mode, DepthMode::Thermal);
        assert!("lava".parse::<DepthPreset>().is_err());
    }
}
