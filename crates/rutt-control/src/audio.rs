use std::str::FromStr;

use rutt_core::Settings;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Bande de fréquence utilisable comme source de modulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioBand {
    /// 20 à 250 Hz.
    #[default]
    Bass,
    /// 250 à 500 Hz.
    LowMid,
    /// 500 à 2000 Hz.
    Mid,
    /// 2 à 4 kHz.
    HighMid,
    /// 4 à 20 kHz.
    Treble,
    /// Volume RMS.
    Overall,
}

impl AudioBand {
    /// Plage en Hz, `None` pour [`AudioBand::Overall`].
    #[must_use]
    pub fn frequency_range(self) -> Option<(f32, f32)> {
        match self {
            Self::Bass => Some((20.0, 250.0)),
            Self::LowMid => Some((250.0, 500.0)),
            Self::Mid => Some((500.0, 2000.0)),
            Self::HighMid => Some((2000.0, 4000.0)),
            Self::Treble => Some((4000.0, 20000.0)),
            Self::Overall => None,
        }
    }
}

impl FromStr for AudioBand {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "bass" => Ok(Self::Bass),
            "low_mid" | "lowmid" => Ok(Self::LowMid),
            "mid" => Ok(Self::Mid),
            "high_mid" | "highmid" => Ok(Self::HighMid),
            "treble" => Ok(Self::Treble),
            "overall" | "rms" => Ok(Self::Overall),
            _ => Err(ControlError::UnknownBand(s.to_string())),
        }
    }
}

/// Niveaux par bande fournis par un analyseur externe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AudioLevels {
    pub bass: f32,
    pub low_mid: f32,
    pub mid: f32,
    pub high_mid: f32,
    pub treble: f32,
    pub overall: f32,
}

impl AudioLevels {
    #[must_use]
    pub fn band(&self, band: AudioBand) -> f32 {
        match band {
            AudioBand::Bass => self.bass,
            AudioBand::LowMid => self.low_mid,
            AudioBand::Mid => self.mid,
            AudioBand::HighMid => self.high_mid,
            AudioBand::Treble => self.treble,
            AudioBand::Overall => self.overall,
        }
    }

    /// Moyennes de bandes d'un spectre de magnitudes couvrant `[0, sample_rate / 2]`.
    ///
    /// Chaque moyenne est multipliée par 10 ; `rms` devient `overall`.
    ///
    /// # Example
    /// ```
    /// use rutt_control::audio::AudioLevels;
    /// let spectrum = vec![0.01; 1024];
    /// let levels = AudioLevels::from_spectrum(&spectrum, 48_000.0, 0.2);
    /// assert!((levels.bass - 0.1).abs() < 1e-5);
    /// assert_eq!(levels.overall, 0.2);
    /// ```
    #[must_use]
    pub fn from_spectrum(spectrum: &[f32], sample_rate: f32, rms: f32) -> Self {
        let avg = |band: AudioBand| -> f32 {
            let Some((lo, hi)) = band.frequency_range() else {
                return 0.0;
            };
            if spectrum.is_empty() || sample_rate <= 0.0 {
                return 0.0;
            }
            let per_bin = sample_rate / 2.0 / spectrum.len() as f32;
            let last = spectrum.len() - 1;
            let min_bin = ((lo / per_bin).floor() as usize).min(last);
            let max_bin = ((hi / per_bin).floor() as usize).min(last);
            if min_bin > max_bin {
                return 0.0;
            }
            let bins = &spectrum[min_bin..=max_bin];
            bins.iter().sum::<f32>() / bins.len() as f32 * 10.0
        };
        Self {
            bass: avg(AudioBand::Bass),
            low_mid: avg(AudioBand::LowMid),
            mid: avg(AudioBand::Mid),
            high_mid: avg(AudioBand::HighMid),
            treble: avg(AudioBand::Treble),
            overall: rms,
        }
    }

    fn map(self, f: impl Fn(f32, AudioBand) -> f32) -> Self {
        Self {
            bass: f(self.bass, AudioBand::Bass),
            low_mid: f(self.low_mid, AudioBand::LowMid),
            mid: f(self.mid, AudioBand::Mid),
            high_mid: f(self.high_mid, AudioBand::HighMid),
            treble: f(self.treble, AudioBand::Treble),
            overall: f(self.overall, AudioBand::Overall),
        }
    }

    #[must_use]
    pub fn scaled(self, gain: f32) -> Self {
        self.map(|v, _| v * gain)
    }

    /// `lerp(self, prev, smoothing)` par bande : 0 suit l'entrée, 1 fige.
    #[must_use]
    pub fn smoothed(self, prev: &Self, smoothing: f32) -> Self {
        let s = smoothing.clamp(0.0, 1.0);
        self.map(|v, band| v + (prev.band(band) - v) * s)
    }
}

/// Taille de l'historique de basses (~1 s à 60 fps).
pub const BEAT_HISTORY: usize = 43;
/// Niveau de basse minimal pour un beat.
pub const BEAT_MIN_LEVEL: f32 = 0.1;
/// Décroissance du pulse par seconde.
const PULSE_DECAY: f32 = 5.0;

/// Détection de beat sur énergie de basse.
///
/// Beat quand `bass > moyenne · threshold` et `bass > 0.1`, hors cooldown.
///
/// # Example
/// ```
/// use rutt_control::audio::BeatDetector;
/// let mut det = BeatDetector::default();
/// for _ in 0..43 { det.process(0.05, 1.0 / 60.0); }
/// assert!(det.process(1.0, 1.0 / 60.0));
/// assert!(det.pulse() > 0.9);
/// ```
#[derive(Clone, Debug)]
pub struct BeatDetector {
    pub threshold: f32,
    /// Secondes minimales entre deux beats.
    pub cooldown: f32,
    history: [f32; BEAT_HISTORY],
    index: usize,
    since_beat: f32,
    pulse: f32,
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new(1.5, 0.15)
    }
}

impl BeatDetector {
    #[must_use]
    pub fn new(threshold: f32, cooldown: f32) -> Self {
        Self {
            threshold,
            cooldown,
            history: [0.0; BEAT_HISTORY],
            index: 0,
            since_beat: f32::INFINITY,
            pulse: 0.0,
        }
    }

    /// Ajoute un niveau de basse, retourne `true` sur un beat.
    /// Le pulse passe à 1 sur un beat puis décroît linéairement.
    pub fn process(&mut self, bass: f32, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let bass = if bass.is_finite() { bass } else { 0.0 };
        self.since_beat += dt;

        self.history[self.index] = bass;
        self.index = (self.index + 1) % BEAT_HISTORY;
        let avg = self.history.iter().sum::<f32>() / BEAT_HISTORY as f32;

        let beat = self.since_beat > self.cooldown
            && bass > avg * self.threshold
            && bass > BEAT_MIN_LEVEL;
        if beat {
            self.since_beat = 0.0;
            self.pulse = 1.0;
        }
        self.pulse = (self.pulse - dt * PULSE_DECAY).max(0.0);
        beat
    }

    /// Enveloppe de beat dans [0, 1].
    #[must_use]
    pub fn pulse(&self) -> f32 {
        self.pulse
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.threshold, self.cooldown);
    }
}

/// Route une bande vers un paramètre avec un gain.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct BandRoute {
    pub enabled: bool,
    pub band: AudioBand,
    pub amount: f32,
}

impl BandRoute {
    const fn off(band: AudioBand, amount: f32) -> Self {
        Self {
            enabled: false,
            band,
            amount,
        }
    }

    fn value(&self, levels: &AudioLevels) -> Option<f32> {
        self.enabled.then(|| levels.band(self.band) * self.amount)
    }
}

/// Réglages de la modulation audio.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioModulation {
    pub enabled: bool,
    pub gain: f32,
    /// Lissage des bandes, 0 = aucun.
    pub smoothing: f32,
    pub displacement: BandRoute,
    pub wave: BandRoute,
    pub hue: BandRoute,
    pub scale: BandRoute,
    /// Amplitude en degrés.
    pub rotation: BandRoute,
    pub glow: BandRoute,
    pub flash_on_beat: bool,
    pub pulse_on_beat: bool,
    pub beat_intensity: f32,
}

impl Default for AudioModulation {
    fn default() -> Self {
        Self {
            enabled: true,
            gain: 1.0,
            smoothing: 0.8,
            displacement: BandRoute::off(AudioBand::Bass, 1.0),
            wave: BandRoute::off(AudioBand::Mid, 0.5),
            hue: BandRoute::off(AudioBand::Treble, 0.3),
            scale: BandRoute::off(AudioBand::Overall, 0.2),
            rotation: BandRoute::off(AudioBand::LowMid, 10.0),
            glow: BandRoute::off(AudioBand::HighMid, 1.0),
            flash_on_beat: false,
            pulse_on_beat: false,
            beat_intensity: 0.5,
        }
    }
}

/// Interrupteur de la modulation audio, adressable par MIDI/OSC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioToggle {
    Enable,
    Displacement,
    Wave,
    Hue,
    Scale,
    Rotation,
    Glow,
    BeatFlash,
    BeatPulse,
}

impl AudioToggle {
    pub const ALL: [Self; 9] = [
        Self::Enable,
        Self::Displacement,
        Self::Wave,
        Self::Hue,
        Self::Scale,
        Self::Rotation,
        Self::Glow,
        Self::BeatFlash,
        Self::BeatPulse,
    ];

    /// Nom d'action (`audio_displacement`, `beat_flash`, …).
    #[must_use]
    pub fn action(self) -> &'static str {
        match self {
            Self::Enable => "audio_enable",
            Self::Displacement => "audio_displacement",
            Self::Wave => "audio_wave",
            Self::Hue => "audio_hue",
            Self::Scale => "audio_scale",
            Self::Rotation => "audio_rotation",
            Self::Glow => "audio_glow",
            Self::BeatFlash => "beat_flash",
            Self::BeatPulse => "beat_pulse",
        }
    }

    #[must_use]
    pub fn from_action(action: &str) -> Option<Self> {
        let wanted = action.to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.action() == wanted)
    }

    fn flag(self, m: &mut AudioModulation) -> &mut bool {
        match self {
            Self::Enable => &mut m.enabled,
            Self::Displacement => &mut m.displacement.enabled,
            Self::Wave => &mut m.wave.enabled,
            Self::Hue => &mut m.hue.enabled,
            Self::Scale => &mut m.scale.enabled,
            Self::Rotation => &mut m.rotation.enabled,
            Self::Glow => &mut m.glow.enabled,
            Self::BeatFlash => &mut m.flash_on_beat,
            Self::BeatPulse => &mut m.pulse_on_beat,
        }
    }

    pub fn set(self, m: &mut AudioModulation, on: bool) {
        *self.flag(m) = on;
    }

    /// Inverse l'interrupteur, retourne le nouvel état.
    pub fn toggle(self, m: &mut AudioModulation) -> bool {
        let flag = self.flag(m);
        *flag = !*flag;
        *flag
    }

    #[must_use]
    pub fn is_on(self, m: &AudioModulation) -> bool {
        match self {
            Self::Enable => m.enabled,
            Self::Displacement => m.displacement.enabled,
            Self::Wave => m.wave.enabled,
            Self::Hue => m.hue.enabled,
            Self::Scale => m.scale.enabled,
            Self::Rotation => m.rotation.enabled,
            Self::Glow => m.glow.enabled,
            Self::BeatFlash => m.flash_on_beat,
            Self::BeatPulse => m.pulse_on_beat,
        }
    }
}

/// Valeurs de base autour desquelles l'audio module.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ModBase {
    displacement: f32,
    wave_h: f32,
    wave_v: f32,
    hue: f32,
    scale: f32,
    rotation_y: f32,
    glow: f32,
}

impl ModBase {
    fn capture(s: &Settings) -> Self {
        Self {
            displacement: s.displacement_strength,
            wave_h: s.horizontal_wave,
            wave_v: s.vertical_wave,
            hue: s.primary_color.hue(),
            scale: s.mesh_scale,
            rotation_y: s.rotation_y,
            glow: s.glow_intensity,
        }
    }
}

/// Lissage, détection de beat et écriture des paramètres modulés.
///
/// # Example
/// ```
/// use rutt_control::audio::{AudioLevels, AudioModulator};
/// use rutt_core::Settings;
///
/// let mut s = Settings::default();
/// let mut m = AudioModulator::default();
/// m.params.displacement.enabled = true;
/// m.params.smoothing = 0.0;
/// m.process(&AudioLevels { bass: 0.5, ..AudioLevels::default() }, 1.0 / 60.0, &mut s);
/// assert!((s.displacement_strength - 1.5).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, Default)]
pub struct AudioModulator {
    pub params: AudioModulation,
    pub detector: BeatDetector,
    levels: AudioLevels,
    base: Option<ModBase>,
}

impl AudioModulator {
    #[must_use]
    pub fn new(params: AudioModulation) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Niveaux après gain et lissage.
    #[must_use]
    pub fn levels(&self) -> &AudioLevels {
        &self.levels
    }

    #[must_use]
    pub fn beat_pulse(&self) -> f32 {
        self.detector.pulse()
    }

    /// Les bases seront recapturées au prochain [`AudioModulator::process`].
    pub fn recapture_base(&mut self) {
        self.base = None;
    }

    /// Traite un bloc d'analyse et module `s`. Retourne `true` sur un beat.
    pub fn process(&mut self, raw: &AudioLevels, dt: f32, s: &mut Settings) -> bool {
        if !self.params.enabled {
            return false;
        }
        let base = *self.base.get_or_insert_with(|| ModBase::capture(s));

        self.levels = raw
            .scaled(self.params.gain)
            .smoothed(&self.levels, self.params.smoothing);
        let beat = self.detector.process(self.levels.bass, dt);
        if beat {
            log::debug!("Beat (basse {:.3})", self.levels.bass);
        }

        let p = &self.params;
        let l = &self.levels;
        if let Some(m) = p.displacement.value(l) {
            s.displacement_strength = base.displacement + m;
        }
        if let Some(m) = p.wave.value(l) {
            s.horizontal_wave = (base.wave_h + m).max(0.0);
            s.vertical_wave = (base.wave_v + m * 0.7).max(0.0);
        }
        if let Some(m) = p.hue.value(l) {
            s.primary_color = s.primary_color.with_hue((base.hue + m).rem_euclid(1.0));
        }
        if let Some(m) = p.scale.value(l) {
            s.mesh_scale = (base.scale + m).max(0.1);
        }
        if let Some(m) = p.rotation.value(l) {
            s.rotation_y = base.rotation_y + m;
        }
        if let Some(m) = p.glow.value(l) {
            s.glow_intensity = (base.glow + m).max(0.0);
        }

        let pulse = self.detector.pulse();
        if pulse > 0.0 {
            if p.flash_on_beat {
                s.brightness += (p.beat_intensity - s.brightness) * pulse;
            }
            if p.pulse_on_beat {
                let target = base.scale + p.beat_intensity * 0.3;
                s.mesh_scale += (target - s.mesh_scale) * pulse;
            }
        }
        beat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn spectrum_bands_pick_their_bins() {
        // 1024 bins sur 24 kHz : 23.4 Hz par bin.
        let mut spectrum = vec![0.0; 1024];
        for v in &mut spectrum[..=10] {
            *v = 0.1;
        }
        let l = AudioLevels::from_spectrum(&spectrum, 48_000.0, 0.0);
        assert!((l.bass - 1.0).abs() < 1e-5);
        assert_eq!(l.treble, 0.0);
        assert_eq!(AudioLevels::from_spectrum(&[], 48_000.0, 0.3).bass, 0.0);
    }

    #[test]
    fn smoothing_holds_previous() {
        let prev = AudioLevels {
            bass: 1.0,
            ..AudioLevels::default()
        };
        let now = AudioLevels::default();
        assert_eq!(now.smoothed(&prev, 1.0).bass, 1.0);
        assert_eq!(now.smoothed(&prev, 0.0).bass, 0.0);
        assert!((now.smoothed(&prev, 0.8).bass - 0.8).abs() < 1e-6);
    }

    #[test]
    fn beat_needs_min_level_and_cooldown() {
        let mut det = BeatDetector::default();
        // Silence : jamais de beat, même au-dessus de la moyenne.
        assert!(!det.process(0.05, DT));
        for _ in 0..50 {
            det.process(0.05, DT);
        }
        assert!(det.process(0.8, DT));
        // Cooldown de 0.15 s.
        assert!(!det.process(2.0, DT));
        for _ in 0..9 {
            det.process(0.0, DT);
        }
        assert!(det.process(3.0, DT));
    }

    #[test]
    fn pulse_decays_to_zero() {
        let mut det = BeatDetector::default();
        assert!(det.process(1.0, 0.0));
        assert_eq!(det.pulse(), 1.0);
        det.process(0.0, 0.1);
        assert!((det.pulse() - 0.5).abs() < 1e-6);
        det.process(0.0, 0.2);
        assert_eq!(det.pulse(), 0.0);
    }

    #[test]
    fn routes_modulate_from_base() {
        let mut s = Settings {
            horizontal_wave: 0.2,
            ..Settings::default()
        };
        let mut m = AudioModulator::default();
        m.params.smoothing = 0.0;
        m.params.wave.enabled = true;
        m.params.rotation.enabled = true;
        m.params.scale.enabled = true;
        m.params.scale.amount = -10.0;
        let levels = AudioLevels {
            mid: 0.4,
            low_mid: 0.5,
            overall: 1.0,
            ..AudioLevels::default()
        };
        for _ in 0..3 {
            m.process(&levels, DT, &mut s);
        }
        assert!((s.horizontal_wave - 0.4).abs() < 1e-6);
        assert!((s.vertical_wave - 0.14).abs() < 1e-6);
        assert!((s.rotation_y - 5.0).abs() < 1e-5);
        assert_eq!(s.mesh_scale, 0.1);
    }

    #[test]
    fn disabled_leaves_settings() {
        let mut s = Settings::default();
        let mut m = AudioModulator::default();
        m.params.displacement.enabled = true;
        AudioToggle::Enable.set(&mut m.params, false);
        let levels = AudioLevels {
            bass: 1.0,
            ..AudioLevels::default()
        };
        assert!(!m.process(&levels, DT, &mut s));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn flash_on_beat_pulls_brightness() {
        let mut s = Settings::default();
        let mut m = AudioModulator::default();
        m.params.smoothing = 0.0;
        m.params.flash_on_beat = true;
        m.params.beat_intensity = 0.8;
        let beat = m.process(
            &AudioLevels {
                bass: 1.0,
                ..AudioLevels::default()
            },
            0.0,
            &mut s,
        );
        assert!(beat);
        assert!((s.brightness - 0.8).abs() < 1e-6);
    }

    #[test]
    fn toggles_by_action_name() {
        let mut p = AudioModulation::default();
        let t = AudioToggle::from_action("audio_hue").unwrap();
        assert!(t.toggle(&mut p));
        assert!(p.hue.enabled);
        assert!(t.is_on(&p));
        assert_eq!(AudioToggle::from_action("Beat_Flash"), Some(AudioToggle::BeatFlash));
        assert_eq!(AudioToggle::from_action("audio_reverb"), None);
        assert_eq!("low-mid".parse::<AudioBand>(), Ok(AudioBand::LowMid));
    }
}
