use fastrand::Rng;
use rutt_core::Settings;
use rutt_core::color::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;
use crate::morph::smoothstep;

/// Thème de couleurs appliqué aux [`Settings`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Palette {
    pub name: String,
    pub primary: Rgba,
    pub secondary: Rgba,
    pub background: Rgba,
    pub glow_intensity: f32,
}

impl Palette {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        primary: Rgba,
        secondary: Rgba,
        background: Rgba,
        glow_intensity: f32,
    ) -> Self {
        Self {
            name: name.into(),
            primary,
            secondary,
            background,
            glow_intensity,
        }
    }

    /// Couleurs actuellement publiées, sous forme de palette.
    #[must_use]
    pub fn from_settings(s: &Settings) -> Self {
        Self::new(
            "Current",
            s.primary_color,
            s.secondary_color,
            s.background_color,
            s.glow_intensity,
        )
    }

    pub fn write_to(&self, s: &mut Settings) {
        s.primary_color = self.primary;
        s.secondary_color = self.secondary;
        s.background_color = self.background;
        s.glow_intensity = self.glow_intensity;
    }

    fn lerp_into(from: &Self, to: &Self, t: f32, s: &mut Settings) {
        s.primary_color = Rgba::lerp(from.primary, to.primary, t);
        s.secondary_color = Rgba::lerp(from.secondary, to.secondary, t);
        s.background_color = Rgba::lerp(from.background, to.background, t);
        s.glow_intensity = from.glow_intensity + (to.glow_intensity - from.glow_intensity) * t;
    }
}

/// Les quinze thèmes intégrés.
#[must_use]
pub fn default_palettes() -> Vec<Palette> {
    let rgb = Rgba::rgb;
    vec![
        Palette::new("CRT Green", rgb(0.2, 1.0, 0.3), rgb(0.0, 0.5, 0.1), Rgba::BLACK, 0.6),
        Palette::new("Vaporwave", rgb(1.0, 0.4, 0.8), rgb(0.4, 0.8, 1.0), rgb(0.1, 0.0, 0.2), 0.8),
        Palette::new("Cyberpunk", rgb(1.0, 0.9, 0.0), rgb(1.0, 0.0, 0.5), rgb(0.05, 0.0, 0.1), 1.0),
        Palette::new("Synthwave", rgb(1.0, 0.3, 0.1), rgb(0.8, 0.0, 0.6), rgb(0.1, 0.0, 0.15), 0.9),
        Palette::new("Ice Blue", rgb(0.5, 0.9, 1.0), rgb(0.2, 0.4, 0.8), rgb(0.0, 0.02, 0.05), 0.7),
        Palette::new("Fire", rgb(1.0, 0.6, 0.0), rgb(1.0, 0.1, 0.0), Rgba::BLACK, 1.2),
        Palette::new("Matrix", rgb(0.0, 1.0, 0.2), rgb(0.0, 0.3, 0.0), Rgba::BLACK, 0.5),
        Palette::new("Monochrome", Rgba::WHITE, Rgba::GRAY, Rgba::BLACK, 0.3),
        Palette::new("Neon Pink", rgb(1.0, 0.0, 0.6), rgb(0.6, 0.0, 1.0), rgb(0.05, 0.0, 0.05), 1.0),
        Palette::new("Retro Amber", rgb(1.0, 0.7, 0.0), rgb(0.6, 0.3, 0.0), Rgba::BLACK, 0.5),
        Palette::new("Ocean", rgb(0.0, 0.8, 0.9), rgb(0.0, 0.3, 0.6), rgb(0.0, 0.05, 0.1), 0.6),
        Palette::new("Toxic", rgb(0.5, 1.0, 0.0), rgb(0.0, 0.6, 0.0), Rgba::BLACK, 0.8),
        Palette::new("Plasma", rgb(0.8, 0.2, 1.0), rgb(0.2, 0.8, 1.0), rgb(0.05, 0.0, 0.1), 1.0),
        Palette::new("Sunset", rgb(1.0, 0.5, 0.2), rgb(1.0, 0.2, 0.4), rgb(0.1, 0.02, 0.05), 0.7),
        Palette::new("Arctic", rgb(0.9, 0.95, 1.0), rgb(0.4, 0.6, 0.9), rgb(0.02, 0.03, 0.05), 0.4),
    ]
}

/// Sélection de palette et transitions temporisées.
///
/// La durée des transitions vient de `Settings::palette_transition`,
/// le défilement automatique de `palette_auto` / `palette_interval`.
///
/// # Example
/// ```
/// use rutt_control::palette::PaletteCycler;
/// use rutt_core::Settings;
///
/// let mut s = Settings { palette_transition: 0.0, ..Settings::default() };
/// let mut palettes = PaletteCycler::default();
/// palettes.apply_name("Fire", &mut s).unwrap();
/// assert_eq!(palettes.current_name(), Some("Fire"));
/// assert_eq!(s.glow_intensity, 1.2);
/// ```
#[derive(Clone, Debug)]
pub struct PaletteCycler {
    palettes: Vec<Palette>,
    current: usize,
    from: Palette,
    to: Palette,
    duration: f32,
    elapsed: f32,
    transitioning: bool,
    auto_timer: f32,
}

impl Default for PaletteCycler {
    fn default() -> Self {
        Self::new(default_palettes())
    }
}

impl PaletteCycler {
    #[must_use]
    pub fn new(palettes: Vec<Palette>) -> Self {
        let idle = Palette::from_settings(&Settings::default());
        Self {
            palettes,
            current: 0,
            from: idle.clone(),
            to: idle,
            duration: 0.0,
            elapsed: 0.0,
            transitioning: false,
            auto_timer: 0.0,
        }
    }

    #[must_use]
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.palettes.get(self.current).map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Applique la palette `index`, en transition si
    /// `palette_transition > 0`. Retourne `false` si l'index est invalide.
    pub fn apply_index(&mut self, index: usize, s: &mut Settings) -> bool {
        let Some(palette) = self.palettes.get(index) else {
            log::warn!("Palette {index} invalide ({} disponibles)", self.palettes.len());
            return false;
        };
        self.current = index;
        let duration = s.palette_transition;
        if duration.is_finite() && duration > 0.0 {
            self.from = Palette::from_settings(s);
            self.to = palette.clone();
            self.duration = duration;
            self.elapsed = 0.0;
            self.transitioning = true;
        } else {
            palette.write_to(s);
            self.transitioning = false;
        }
        log::info!("Palette : {}", palette.name);
        true
    }

    /// Par nom, insensible à la casse.
    ///
    /// # Errors
    /// Returns [`ControlError::PaletteNotFound`] if no palette has this name.
    pub fn apply_name(&mut self, name: &str, s: &mut Settings) -> Result<(), ControlError> {
        let index = self
            .palettes
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ControlError::PaletteNotFound(name.to_string()))?;
        self.apply_index(index, s);
        Ok(())
    }

    /// Palette suivante, en boucle.
    pub fn next(&mut self, s: &mut Settings) -> bool {
        match self.palettes.len() {
            0 => false,
            n => self.apply_index((self.current + 1) % n, s),
        }
    }

    /// Palette précédente, en boucle.
    pub fn previous(&mut self, s: &mut Settings) -> bool {
        match self.palettes.len() {
            0 => false,
            n => self.apply_index((self.current + n - 1) % n, s),
        }
    }

    pub fn random(&mut self, s: &mut Settings, rng: &mut Rng) -> bool {
        if self.palettes.is_empty() {
            return false;
        }
        let index = rng.usize(..self.palettes.len());
        self.apply_index(index, s)
    }

    /// Avance le défilement automatique et la transition en cours.
    pub fn update(&mut self, dt: f32, s: &mut Settings) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if s.palette_auto {
            self.auto_timer += dt;
            if self.auto_timer >= s.palette_interval {
                self.auto_timer = 0.0;
                self.next(s);
            }
        } else {
            self.auto_timer = 0.0;
        }

        if self.transitioning {
            self.elapsed += dt;
            let t = smoothstep(self.elapsed / self.duration);
            Palette::lerp_into(&self.from, &self.to, t, s);
            if t >= 1.0 {
                self.transitioning = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant() -> Settings {
        Settings {
            palette_transition: 0.0,
            ..Settings::default()
        }
    }

    #[test]
    fn next_and_previous_wrap() {
        let mut s = instant();
        let mut p = PaletteCycler::default();
        assert_eq!(p.len(), 15);
        assert!(p.previous(&mut s));
        assert_eq!(p.current_name(), Some("Arctic"));
        assert!(p.next(&mut s));
        assert_eq!(p.current_index(), 0);
        assert_eq!(s.primary_color, Rgba::rgb(0.2, 1.0, 0.3));
        assert_eq!(s.background_color, Rgba::BLACK);
    }

    #[test]
    fn transition_midpoint() {
        let mut s = Settings {
            primary_color: Rgba::BLACK,
            secondary_color: Rgba::BLACK,
            glow_intensity: 0.0,
            palette_transition: 2.0,
            ..Settings::default()
        };
        let mut p = PaletteCycler::default();
        p.apply_name("monochrome", &mut s).unwrap();
        assert!(p.is_transitioning());
        assert_eq!(s.primary_color, Rgba::BLACK);

        p.update(1.0, &mut s);
        assert!((s.primary_color.r - 0.5).abs() < 1e-6);
        assert!((s.secondary_color.g - 0.25).abs() < 1e-6);
        assert!((s.glow_intensity - 0.15).abs() < 1e-6);

        p.update(1.0, &mut s);
        assert!(!p.is_transitioning());
        assert_eq!(s.primary_color, Rgba::WHITE);
        assert_eq!(s.glow_intensity, 0.3);
    }

    #[test]
    fn auto_advances_after_interval() {
        let mut s = Settings {
            palette_auto: true,
            palette_interval: 5.0,
            ..instant()
        };
        let mut p = PaletteCycler::default();
        p.update(4.9, &mut s);
        assert_eq!(p.current_index(), 0);
        p.update(0.2, &mut s);
        assert_eq!(p.current_index(), 1);
        assert_eq!(s.primary_color, Rgba::rgb(1.0, 0.4, 0.8));
        p.update(4.0, &mut s);
        assert_eq!(p.current_index(), 1);
    }

    #[test]
    fn unknown_name_and_random() {
        let mut s = instant();
        let mut p = PaletteCycler::default();
        assert_eq!(
            p.apply_name("Beige", &mut s),
            Err(ControlError::PaletteNotFound("Beige".into()))
        );
        assert!(!p.apply_index(99, &mut s));
        let mut rng = Rng::with_seed(4);
        assert!(p.random(&mut s, &mut rng));
        assert!(p.current_index() < 15);
        assert!(!PaletteCycler::new(Vec::new()).next(&mut s));
    }
}
