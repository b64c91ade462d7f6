use std::f32::consts::TAU;
use std::str::FromStr;

use noise::{NoiseFn, Perlin};
use rutt_core::{ParamKey, Settings};
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Forme d'onde d'un LFO, sortie dans [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Square,
    Sawtooth,
    /// Bruit de Perlin 1D.
    Random,
}

impl Waveform {
    /// Valeur à la phase `phase` (en cycles).
    ///
    /// # Example
    /// ```
    /// use rutt_control::animator::Waveform;
    /// let perlin = noise::Perlin::new(0);
    /// assert!((Waveform::Sine.sample(0.25, &perlin) - 1.0).abs() < 1e-6);
    /// assert_eq!(Waveform::Sawtooth.sample(0.75, &perlin), 0.5);
    /// ```
    #[must_use]
    pub fn sample(self, phase: f32, perlin: &Perlin) -> f32 {
        match self {
            Self::Sine => (phase * TAU).sin(),
            Self::Triangle => {
                let ping = 1.0 - ((phase * 2.0).rem_euclid(2.0) - 1.0).abs();
                ping * 2.0 - 1.0
            }
            Self::Square => {
                if (phase * TAU).sin() > 0.0 { 1.0 } else { -1.0 }
            }
            Self::Sawtooth => phase.rem_euclid(1.0) * 2.0 - 1.0,
            Self::Random => (perlin.get([f64::from(phase), 0.5]) as f32).clamp(-1.0, 1.0),
        }
    }
}

impl FromStr for Waveform {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" | "sin" => Ok(Self::Sine),
            "triangle" | "tri" => Ok(Self::Triangle),
            "square" => Ok(Self::Square),
            "sawtooth" | "saw" => Ok(Self::Sawtooth),
            "random" | "noise" => Ok(Self::Random),
            _ => Err(ControlError::UnknownWaveform(s.to_string())),
        }
    }
}

/// Oscillateur basse fréquence.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Lfo {
    pub enabled: bool,
    /// Cycles par seconde.
    pub speed: f32,
    pub amplitude: f32,
    pub offset: f32,
    pub waveform: Waveform,
}

impl Default for Lfo {
    fn default() -> Self {
        Self {
            enabled: false,
            speed: 1.0,
            amplitude: 1.0,
            offset: 0.0,
            waveform: Waveform::Sine,
        }
    }
}

impl Lfo {
    /// LFO actif.
    #[must_use]
    pub fn new(waveform: Waveform, speed: f32, amplitude: f32) -> Self {
        Self {
            enabled: true,
            speed,
            amplitude,
            offset: 0.0,
            waveform,
        }
    }

    /// `wave(time · speed) · amplitude + offset`, 0 si désactivé.
    #[must_use]
    pub fn evaluate(&self, time: f32, perlin: &Perlin) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        self.waveform.sample(time * self.speed, perlin) * self.amplitude + self.offset
    }
}

/// Bornes appliquées à `base + lfo` avant l'écriture.
fn lfo_bounds(key: ParamKey) -> (f32, f32) {
    match key {
        ParamKey::Brightness
        | ParamKey::DisplacementOffset
        | ParamKey::KeystoneH
        | ParamKey::KeystoneV => (-1.0, 1.0),
        ParamKey::Contrast => (0.1, 3.0),
        ParamKey::DisplacementStrength
        | ParamKey::HorizontalWave
        | ParamKey::VerticalWave
        | ParamKey::GlowIntensity => (0.0, f32::INFINITY),
        ParamKey::HorizontalScale | ParamKey::VerticalScale | ParamKey::MeshScale => {
            (0.1, f32::INFINITY)
        }
        ParamKey::BarrelDistortion => (-0.5, 0.5),
        ParamKey::LineWidth => (0.001, 0.05),
        _ => (f32::NEG_INFINITY, f32::INFINITY),
    }
}

/// Animations prêtes à l'emploi, toutes désactivées par défaut.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuickAnimations {
    pub auto_rotate: bool,
    pub rotate_speed: f32,
    /// Amplitude en degrés autour de la rotation Y de base.
    pub rotate_amount: f32,

    pub hue_cycle: bool,
    pub hue_speed: f32,

    pub wave_animate: bool,
    pub wave_speed: f32,
    pub wave_amount: f32,

    pub z_pulse: bool,
    pub z_pulse_speed: f32,
    pub z_pulse_amount: f32,

    pub breathe: bool,
    pub breathe_speed: f32,
    pub breathe_amount: f32,

    pub distort: bool,
    pub distort_speed: f32,
    pub distort_amount: f32,
}

impl Default for QuickAnimations {
    fn default() -> Self {
        Self {
            auto_rotate: false,
            rotate_speed: 0.5,
            rotate_amount: 30.0,
            hue_cycle: false,
            hue_speed: 0.3,
            wave_animate: false,
            wave_speed: 0.5,
            wave_amount: 0.5,
            z_pulse: false,
            z_pulse_speed: 0.5,
            z_pulse_amount: 0.3,
            breathe: false,
            breathe_speed: 0.3,
            breathe_amount: 0.2,
            distort: false,
            distort_speed: 0.4,
            distort_amount: 0.3,
        }
    }
}

impl QuickAnimations {
    fn apply(&self, time: f32, base: &Settings, base_hues: (f32, f32), s: &mut Settings) {
        let osc = |speed: f32| (time * speed * TAU).sin();

        if self.auto_rotate {
            s.rotation_y = base.rotation_y + osc(self.rotate_speed) * self.rotate_amount;
        }
        if self.hue_cycle {
            let shift = (time * self.hue_speed).rem_euclid(1.0);
            s.primary_color = s.primary_color.with_hue((base_hues.0 + shift).rem_euclid(1.0));
            s.secondary_color = s
                .secondary_color
                .with_hue((base_hues.1 + shift).rem_euclid(1.0));
        }
        if self.wave_animate {
            let w = osc(self.wave_speed) * self.wave_amount;
            s.horizontal_wave = (base.horizontal_wave + w).max(0.0);
            s.vertical_wave = (base.vertical_wave + w * 0.7).max(0.0);
        }
        if self.z_pulse {
            let p = osc(self.z_pulse_speed) * self.z_pulse_amount;
            s.displacement_strength = (base.displacement_strength + p).max(0.0);
            s.displacement_offset = base.displacement_offset + p * 0.5;
        }
        if self.breathe {
            let b = osc(self.breathe_speed) * self.breathe_amount;
            s.mesh_scale = (base.mesh_scale + b).max(0.1);
        }
        if self.distort {
            let t = time * self.distort_speed * TAU;
            let amount = self.distort_amount;
            s.keystone_h = (base.keystone_h + t.sin() * amount).clamp(-1.0, 1.0);
            s.keystone_v = (base.keystone_v + (t * 1.3).sin() * amount).clamp(-1.0, 1.0);
            s.barrel_distortion =
                (base.barrel_distortion + (t * 0.7).sin() * amount * 0.5).clamp(-0.5, 0.5);
        }
    }
}

/// Modulation temporelle des paramètres autour de valeurs de base capturées.
///
/// Les animations rapides passent d'abord, puis les LFO liés dans
/// l'ordre de liaison.
///
/// # Example
/// ```
/// use rutt_control::animator::{Animator, Lfo, Waveform};
/// use rutt_core::{ParamKey, Settings};
///
/// let mut s = Settings::default();
/// let mut anim = Animator::new(1);
/// anim.bind(ParamKey::RotationZ, Lfo::new(Waveform::Sine, 1.0, 45.0));
/// anim.update(0.25, &mut s);
/// assert!((s.rotation_z - 45.0).abs() < 1e-3);
/// ```
#[derive(Clone)]
pub struct Animator {
    pub quick: QuickAnimations,
    lfos: Vec<(ParamKey, Lfo)>,
    base: Option<Settings>,
    base_hues: (f32, f32),
    time: f32,
    perlin: Perlin,
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("quick", &self.quick)
            .field("lfos", &self.lfos)
            .field("time", &self.time)
            .field("captured", &self.base.is_some())
            .finish_non_exhaustive()
    }
}

impl Animator {
    /// `seed` fixe le bruit de la forme d'onde `Random`.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            quick: QuickAnimations::default(),
            lfos: Vec::new(),
            base: None,
            base_hues: (0.0, 0.0),
            time: 0.0,
            perlin: Perlin::new(seed),
        }
    }

    /// Lie (ou remplace) le LFO d'un paramètre.
    pub fn bind(&mut self, key: ParamKey, lfo: Lfo) {
        match self.lfos.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = lfo,
            None => self.lfos.push((key, lfo)),
        }
    }

    /// Retire le LFO ; la valeur de base est rétablie à la prochaine capture.
    pub fn unbind(&mut self, key: ParamKey) -> Option<Lfo> {
        let pos = self.lfos.iter().position(|(k, _)| *k == key)?;
        Some(self.lfos.remove(pos).1)
    }

    #[must_use]
    pub fn lfo(&self, key: ParamKey) -> Option<&Lfo> {
        self.lfos.iter().find(|(k, _)| *k == key).map(|(_, l)| l)
    }

    pub fn lfo_mut(&mut self, key: ParamKey) -> Option<&mut Lfo> {
        self.lfos.iter_mut().find(|(k, _)| *k == key).map(|(_, l)| l)
    }

    /// Mémorise `s` comme centre des modulations.
    pub fn capture_base(&mut self, s: &Settings) {
        self.base_hues = (s.primary_color.hue(), s.secondary_color.hue());
        self.base = Some(s.clone());
    }

    #[must_use]
    pub fn base(&self) -> Option<&Settings> {
        self.base.as_ref()
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Remet le temps à zéro et recapture la base.
    pub fn reset(&mut self, s: &Settings) {
        self.time = 0.0;
        self.capture_base(s);
    }

    /// Avance de `dt` et écrit les valeurs modulées.
    /// La base est capturée au premier appel si besoin.
    pub fn update(&mut self, dt: f32, s: &mut Settings) {
        if self.base.is_none() {
            self.capture_base(s);
        }
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }
        let Some(base) = self.base.as_ref() else {
            return;
        };
        let time = self.time;

        self.quick.apply(time, base, self.base_hues, s);

        for (key, lfo) in &self.lfos {
            if !lfo.enabled {
                continue;
            }
            let v = lfo.evaluate(time, &self.perlin);
            match key {
                ParamKey::PrimaryHue => key.set(s, (self.base_hues.0 + v).rem_euclid(1.0)),
                ParamKey::SecondaryHue => key.set(s, (self.base_hues.1 + v).rem_euclid(1.0)),
                _ => {
                    let (lo, hi) = lfo_bounds(*key);
                    key.set(s, (key.get(base) + v).clamp(lo, hi));
                }
            }
        }
    }
}
