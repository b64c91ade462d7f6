use fastrand::Rng;
use noise::{NoiseFn, Perlin};
use rutt_core::{ParamKey, Settings};
use serde::{Deserialize, Serialize};

/// Cibles de la dérive : activation, intensité propre et plage visée.
///
/// L'intensité effective d'une cible est `amount × randomizer_intensity`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriftTargets {
    pub displacement: bool,
    pub displacement_amount: f32,
    pub displacement_range: (f32, f32),

    pub wave: bool,
    pub wave_amount: f32,
    pub wave_range: (f32, f32),

    pub rotation: bool,
    pub rotation_amount: f32,
    /// Écart maximal en degrés autour de la rotation de base.
    pub rotation_range: f32,

    pub hue: bool,
    pub hue_amount: f32,
    pub hue_speed: f32,

    pub line_width: bool,
    pub line_width_amount: f32,
    pub line_width_range: (f32, f32),

    pub glow: bool,
    pub glow_amount: f32,
    pub glow_range: (f32, f32),

    /// Keystone H/V.
    pub distortion: bool,
    pub distortion_amount: f32,

    pub scale: bool,
    pub scale_amount: f32,
    pub scale_range: (f32, f32),

    /// Vitesses propres par axe ; sinon toutes à `speed_variation`.
    pub varied_speeds: bool,
    pub speed_variation: f32,
}

impl Default for DriftTargets {
    fn default() -> Self {
        Self {
            displacement: true,
            displacement_amount: 0.5,
            displacement_range: (0.5, 3.0),
            wave: true,
            wave_amount: 0.3,
            wave_range: (0.0, 1.0),
            rotation: true,
            rotation_amount: 0.3,
            rotation_range: 30.0,
            hue: true,
            hue_amount: 0.2,
            hue_speed: 0.05,
            line_width: false,
            line_width_amount: 0.3,
            line_width_range: (0.002, 0.02),
            glow: true,
            glow_amount: 0.4,
            glow_range: (0.1, 1.5),
            distortion: false,
            distortion_amount: 0.2,
            scale: false,
            scale_amount: 0.2,
            scale_range: (0.8, 1.2),
            varied_speeds: true,
            speed_variation: 1.5,
        }
    }
}

// Un décalage de bruit par canal.
const DISPLACEMENT: usize = 0;
const WAVE_H: usize = 1;
const WAVE_V: usize = 2;
const WAVE_FREQ: usize = 3;
const ROT_X: usize = 4;
const ROT_Y: usize = 5;
const ROT_Z: usize = 6;
const HUE: usize = 7;
const WIDTH: usize = 8;
const GLOW: usize = 9;
const KEYSTONE_H: usize = 10;
const KEYSTONE_V: usize = 11;
const SCALE: usize = 12;
const CHANNELS: usize = 13;

/// Plage de fréquence d'onde visée par la dérive.
const WAVE_FREQ_RANGE: (f32, f32) = (1.0, 5.0);
/// Amplitude maximale de la dérive du keystone.
const KEYSTONE_SPAN: f32 = 0.3;

#[inline(always)]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Dérive lente des paramètres autour d'une base capturée, pilotée par
/// du bruit de Perlin.
///
/// Activée par `Settings::randomizer_enabled`. Avec
/// `randomizer_snap_to_beats`, le bruit n'avance qu'à chaque
/// [`Randomizer::on_beat`] : les valeurs sautent au rythme de la musique.
///
/// # Example
/// ```
/// use rutt_control::randomizer::Randomizer;
/// use rutt_core::Settings;
///
/// let mut s = Settings { randomizer_enabled: true, ..Settings::default() };
/// let mut drift = Randomizer::new(7);
/// for _ in 0..100 {
///     drift.update(0.1, &mut s);
/// }
/// assert!(drift.restore(&mut s));
/// assert_eq!(s.displacement_strength, Settings::default().displacement_strength);
/// ```
#[derive(Clone)]
pub struct Randomizer {
    pub targets: DriftTargets,
    perlin: Perlin,
    rng: Rng,
    offsets: [f32; CHANNELS],
    base: Option<Settings>,
    base_hue: f32,
    clock: f32,
    sample_time: f32,
    was_enabled: bool,
}

impl std::fmt::Debug for Randomizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Randomizer")
            .field("targets", &self.targets)
            .field("clock", &self.clock)
            .field("captured", &self.base.is_some())
            .finish_non_exhaustive()
    }
}

impl Randomizer {
    /// `seed` fixe le bruit et les décalages initiaux.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut drift = Self {
            targets: DriftTargets::default(),
            perlin: Perlin::new(seed as u32),
            rng: Rng::with_seed(seed),
            offsets: [0.0; CHANNELS],
            base: None,
            base_hue: 0.0,
            clock: 0.0,
            sample_time: 0.0,
            was_enabled: false,
        };
        drift.shuffle();
        drift
    }

    /// Nouveaux décalages de bruit : même base, autre trajectoire.
    pub fn shuffle(&mut self) {
        for offset in &mut self.offsets {
            *offset = self.rng.f32() * 1000.0;
        }
        log::debug!("Dérive : nouveaux décalages de bruit");
    }

    /// Mémorise `s` comme centre de la dérive.
    pub fn capture_base(&mut self, s: &Settings) {
        self.base_hue = s.primary_color.hue();
        self.base = Some(s.clone());
    }

    /// La base sera recapturée à la prochaine mise à jour active.
    pub fn recapture_base(&mut self) {
        self.base = None;
    }

    #[must_use]
    pub fn base(&self) -> Option<&Settings> {
        self.base.as_ref()
    }

    /// Rétablit les valeurs de base de tous les paramètres dérivés.
    /// Retourne `false` si aucune base n'a été capturée.
    pub fn restore(&self, s: &mut Settings) -> bool {
        let Some(base) = self.base.as_ref() else {
            return false;
        };
        s.displacement_strength = base.displacement_strength;
        s.horizontal_wave = base.horizontal_wave;
        s.vertical_wave = base.vertical_wave;
        s.wave_frequency = base.wave_frequency;
        s.rotation_x = base.rotation_x;
        s.rotation_y = base.rotation_y;
        s.rotation_z = base.rotation_z;
        s.primary_color = base.primary_color;
        s.secondary_color = base.secondary_color;
        s.line_width = base.line_width;
        s.glow_intensity = base.glow_intensity;
        s.keystone_h = base.keystone_h;
        s.keystone_v = base.keystone_v;
        s.mesh_scale = base.mesh_scale;
        true
    }

    /// Fait avancer la dérive jusqu'à l'instant courant (mode beat).
    pub fn on_beat(&mut self) {
        self.sample_time = self.clock;
    }

    /// Bruit de Perlin 1D ramené dans [0, 1].
    fn noise01(&self, x: f32) -> f32 {
        let n = self.perlin.get([f64::from(x), 0.5]) as f32;
        (n * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Bruit centré dans [-1, 1].
    fn noise11(&self, x: f32) -> f32 {
        self.noise01(x) * 2.0 - 1.0
    }

    /// Avance de `dt` et écrit les valeurs dérivées dans `s`.
    ///
    /// La base est capturée à l'activation. Inactif, `s` n'est pas touché.
    pub fn update(&mut self, dt: f32, s: &mut Settings) {
        if !s.randomizer_enabled {
            self.was_enabled = false;
            return;
        }
        if !self.was_enabled || self.base.is_none() {
            self.capture_base(s);
            self.was_enabled = true;
        }
        if dt.is_finite() && dt > 0.0 {
            self.clock += dt * s.randomizer_speed;
        }
        if !s.randomizer_snap_to_beats {
            self.sample_time = self.clock;
        }
        let Some(base) = self.base.as_ref() else {
            return;
        };

        let t = self.sample_time;
        let k = s.randomizer_intensity;
        let g = &self.targets;
        let speed = |own: f32| if g.varied_speeds { own } else { g.speed_variation };
        let at = |channel: usize, rate: f32| t * rate + self.offsets[channel];

        if g.displacement {
            let (lo, hi) = g.displacement_range;
            let target = lerp(lo, hi, self.noise01(at(DISPLACEMENT, speed(1.0))));
            let v = lerp(base.displacement_strength, target, g.displacement_amount * k);
            ParamKey::DisplacementStrength.set(s, v);
        }
        if g.wave {
            let (lo, hi) = g.wave_range;
            let amount = g.wave_amount * k;
            let h = lerp(lo, hi, self.noise01(at(WAVE_H, speed(0.8))));
            let v = lerp(lo, hi, self.noise01(at(WAVE_V, speed(1.2))));
            ParamKey::HorizontalWave.set(s, lerp(base.horizontal_wave, h, amount));
            ParamKey::VerticalWave.set(s, lerp(base.vertical_wave, v, amount));
            let (flo, fhi) = WAVE_FREQ_RANGE;
            let freq = lerp(flo, fhi, self.noise01(at(WAVE_FREQ, 0.5)));
            ParamKey::WaveFrequency.set(s, lerp(base.wave_frequency, freq, amount));
        }
        if g.rotation {
            let span = g.rotation_range * g.rotation_amount * k;
            let x = self.noise11(at(ROT_X, speed(0.7)));
            let y = self.noise11(at(ROT_Y, speed(1.0)));
            let z = self.noise11(at(ROT_Z, speed(1.3)));
            ParamKey::RotationX.set(s, base.rotation_x + x * span);
            ParamKey::RotationY.set(s, base.rotation_y + y * span);
            ParamKey::RotationZ.set(s, base.rotation_z + z * span);
        }
        if g.hue {
            let n = self.noise01(t * g.hue_speed + self.offsets[HUE]);
            let hue = (self.base_hue + n * g.hue_amount * k).rem_euclid(1.0);
            s.primary_color = s.primary_color.with_hue(hue);
            // Secondaire complémentaire.
            s.secondary_color = s.secondary_color.with_hue((hue + 0.5).rem_euclid(1.0));
        }
        if g.line_width {
            let (lo, hi) = g.line_width_range;
            let target = lerp(lo, hi, self.noise01(at(WIDTH, 0.6)));
            let v = lerp(base.line_width, target, g.line_width_amount * k);
            ParamKey::LineWidth.set(s, v);
        }
        if g.glow {
            let (lo, hi) = g.glow_range;
            let target = lerp(lo, hi, self.noise01(at(GLOW, 1.5)));
            ParamKey::GlowIntensity.set(s, lerp(base.glow_intensity, target, g.glow_amount * k));
        }
        if g.distortion {
            let span = KEYSTONE_SPAN * g.distortion_amount * k;
            let h = self.noise11(at(KEYSTONE_H, 0.4));
            let v = self.noise11(at(KEYSTONE_V, 0.4));
            ParamKey::KeystoneH.set(s, base.keystone_h + h * span);
            ParamKey::KeystoneV.set(s, base.keystone_v + v * span);
        }
        if g.scale {
            let (lo, hi) = g.scale_range;
            let target = lerp(lo, hi, self.noise01(at(SCALE, 0.3)));
            ParamKey::MeshScale.set(s, lerp(base.mesh_scale, target, g.scale_amount * k));
        }
    }
}
