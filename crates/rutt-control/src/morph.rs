use rutt_core::color::Rgba;
use rutt_core::{Preset, Settings};

/// Durée de morph par défaut, en secondes.
pub const DEFAULT_MORPH_DURATION: f32 = 2.0;

/// Courbe ease-in-out `t² (3 − 2t)`, `t` clampé à [0, 1].
///
/// # Example
/// ```
/// use rutt_control::morph::smoothstep;
/// assert_eq!(smoothstep(0.5), 0.5);
/// assert_eq!(smoothstep(2.0), 1.0);
/// ```
#[inline]
#[must_use]
pub fn smoothstep(t: f32) -> f32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    t * t * (3.0 - 2.0 * t)
}

#[inline(always)]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline(always)]
fn step<T: Copy>(a: T, b: T, t: f32) -> T {
    if t >= 0.5 { b } else { a }
}

/// Interpole `from` → `to` dans `out`.
///
/// Flottants et couleurs : lerp linéaire. Booléens et entiers
/// (postérisation, pas de scanline, résolution) basculent à `t ≥ 0.5`.
pub fn lerp_settings(from: &Settings, to: &Settings, t: f32, out: &mut Settings) {
    let t = t.clamp(0.0, 1.0);
    macro_rules! lerp_fields {
        ($($f:ident),* $(,)?) => { $( out.$f = lerp(from.$f, to.$f, t); )* };
    }
    macro_rules! step_fields {
        ($($f:ident),* $(,)?) => { $( out.$f = step(from.$f, to.$f, t); )* };
    }

    lerp_fields!(
        brightness,
        contrast,
        threshold,
        gamma,
        displacement_strength,
        displacement_smoothing,
        displacement_offset,
        z_modulation,
        z_mod_frequency,
        horizontal_position,
        vertical_position,
        horizontal_scale,
        vertical_scale,
        mesh_scale,
        rotation_x,
        rotation_y,
        rotation_z,
        keystone_h,
        keystone_v,
        barrel_distortion,
        horizontal_wave,
        vertical_wave,
        wave_frequency,
        wave_speed,
        line_width,
        line_taper,
        glow_intensity,
        color_blend,
        noise_amount,
        persistence,
        scanline_flicker,
        bloom,
        randomizer_speed,
        randomizer_intensity,
        palette_interval,
        palette_transition,
    );
    step_fields!(
        horizontal_resolution,
        vertical_resolution,
        edge_detect,
        posterize,
        invert_displacement,
        scan_line_skip,
        show_horizontal_lines,
        show_vertical_lines,
        interlace,
        use_source_color,
        randomizer_enabled,
        randomizer_snap_to_beats,
        palette_auto,
    );
    out.primary_color = Rgba::lerp(from.primary_color, to.primary_color, t);
    out.secondary_color = Rgba::lerp(from.secondary_color, to.secondary_color, t);
    out.background_color = Rgba::lerp(from.background_color, to.background_color, t);
}

/// Transition temporisée entre deux états de paramètres.
///
/// # Example
/// ```
/// use rutt_control::morph::PresetMorph;
/// use rutt_core::{Preset, Settings};
///
/// let mut live = Settings::default();
/// let target = Preset::new("dense", Settings { contrast: 3.0, ..Settings::default() });
/// let mut morph = PresetMorph::default();
/// morph.start(&live, &target, 1.0);
/// morph.update(0.5, &mut live);
/// assert!((live.contrast - 2.0).abs() < 1e-5);
/// morph.update(0.5, &mut live);
/// assert!(!morph.is_active());
/// assert_eq!(live.contrast, 3.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PresetMorph {
    from: Settings,
    to: Settings,
    duration: f32,
    elapsed: f32,
    active: bool,
}

impl PresetMorph {
    /// Démarre depuis l'état courant vers `target`.
    /// La résolution courante est conservée, comme pour un apply direct.
    pub fn start(&mut self, current: &Settings, target: &Preset, duration: f32) {
        let mut to = current.clone();
        target.apply_to(&mut to);
        self.start_between(current.clone(), to, duration);
    }

    /// Démarre entre deux états arbitraires.
    pub fn start_between(&mut self, from: Settings, to: Settings, duration: f32) {
        self.from = from;
        self.to = to;
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.elapsed = 0.0;
        self.active = true;
        log::info!("Morph démarré ({:.2}s)", self.duration);
    }

    /// Avance de `dt` et écrit l'état interpolé dans `out`.
    ///
    /// Retourne la progression, ou `None` sans morph en cours.
    /// Une durée nulle applique la cible immédiatement.
    pub fn update(&mut self, dt: f32, out: &mut Settings) -> Option<f32> {
        if !self.active {
            return None;
        }
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        let progress = self.progress();
        if progress >= 1.0 {
            *out = self.to.clone();
            self.active = false;
            log::debug!("Morph terminé");
            return Some(1.0);
        }
        lerp_settings(&self.from, &self.to, smoothstep(progress), out);
        Some(progress)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Progression linéaire dans [0, 1].
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn target(&self) -> &Settings {
        &self.to
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }
}
