use std::fmt;
use std::str::FromStr;

use rutt_core::{ParamKey, Settings};
use serde::{Deserialize, Serialize};

use crate::audio::{AudioModulation, AudioToggle};
use crate::error::ControlError;

/// Contrôleur MIDI continu → paramètre.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct CcMapping {
    pub cc: u8,
    pub param: ParamKey,
    pub min: f32,
    pub max: f32,
    #[serde(default)]
    pub inverted: bool,
}

impl CcMapping {
    #[must_use]
    pub fn new(cc: u8, param: ParamKey, min: f32, max: f32) -> Self {
        Self {
            cc,
            param,
            min,
            max,
            inverted: false,
        }
    }

    /// Valeur normalisée [0, 1] → `[min, max]`.
    #[must_use]
    pub fn scale(&self, normalized: f32) -> f32 {
        let v = normalized.clamp(0.0, 1.0);
        let v = if self.inverted { 1.0 - v } else { v };
        self.min + (self.max - self.min) * v
    }
}

/// Action déclenchée par une note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum NoteAction {
    /// Inverse un paramètre booléen.
    Toggle(ParamKey),
    /// Inverse un interrupteur de modulation audio.
    Audio(AudioToggle),
}

impl NoteAction {
    /// Applique l'action. Retourne l'état après bascule.
    pub fn apply(self, settings: &mut Settings, audio: &mut AudioModulation) -> bool {
        match self {
            Self::Toggle(key) => {
                key.toggle(settings);
                key.get(settings) > 0.5
            }
            Self::Audio(t) => t.toggle(audio),
        }
    }
}

impl FromStr for NoteAction {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(t) = AudioToggle::from_action(s) {
            return Ok(Self::Audio(t));
        }
        match ParamKey::from_name(s) {
            Ok(key) if key.is_toggle() => Ok(Self::Toggle(key)),
            _ => Err(ControlError::UnknownAction(s.to_string())),
        }
    }
}

impl TryFrom<String> for NoteAction {
    type Error = ControlError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NoteAction> for String {
    fn from(a: NoteAction) -> Self {
        a.to_string()
    }
}

impl fmt::Display for NoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toggle(key) => f.write_str(key.name()),
            Self::Audio(t) => f.write_str(t.action()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoteMapping {
    pub note: u8,
    pub action: NoteAction,
}

/// Tables CC et notes, avec mode apprentissage.
///
/// # Example
/// ```
/// use rutt_control::mapping::MidiMapper;
/// use rutt_core::{ParamKey, Settings};
///
/// let mut midi = MidiMapper::default();
/// let mut s = Settings::default();
/// assert_eq!(midi.process_cc(6, 1.0, &mut s), Some(ParamKey::RotationY));
/// assert_eq!(s.rotation_y, 180.0);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MidiMapper {
    pub cc: Vec<CcMapping>,
    pub notes: Vec<NoteMapping>,
    #[serde(skip)]
    learn: Option<String>,
}

impl Default for MidiMapper {
    fn default() -> Self {
        use ParamKey as K;
        let cc = vec![
            CcMapping::new(1, K::DisplacementStrength, 0.0, 5.0),
            CcMapping::new(2, K::Brightness, -1.0, 1.0),
            CcMapping::new(3, K::Contrast, 0.1, 3.0),
            CcMapping::new(4, K::HorizontalWave, 0.0, 2.0),
            CcMapping::new(5, K::VerticalWave, 0.0, 2.0),
            CcMapping::new(6, K::RotationY, -180.0, 180.0),
            CcMapping::new(7, K::MeshScale, 0.1, 3.0),
            CcMapping::new(8, K::GlowIntensity, 0.0, 2.0),
            CcMapping::new(9, K::LineWidth, 0.001, 0.05),
            CcMapping::new(10, K::ColorBlend, 0.0, 1.0),
            CcMapping::new(11, K::NoiseAmount, 0.0, 1.0),
            CcMapping::new(12, K::KeystoneH, -1.0, 1.0),
        ];
        let notes = [
            (36, NoteAction::Toggle(K::InvertDisplacement)),
            (37, NoteAction::Toggle(K::UseSourceColor)),
            (38, NoteAction::Toggle(K::ShowHorizontalLines)),
            (39, NoteAction::Toggle(K::ShowVerticalLines)),
            (40, NoteAction::Toggle(K::Interlace)),
            (41, NoteAction::Audio(AudioToggle::Displacement)),
            (42, NoteAction::Audio(AudioToggle::Wave)),
            (43, NoteAction::Audio(AudioToggle::Hue)),
        ]
        .into_iter()
        .map(|(note, action)| NoteMapping { note, action })
        .collect();
        Self {
            cc,
            notes,
            learn: None,
        }
    }
}

impl MidiMapper {
    /// Tables vides.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            cc: Vec::new(),
            notes: Vec::new(),
            learn: None,
        }
    }

    /// Le prochain CC (ou note) reçu sera assigné à `target`,
    /// nom de paramètre ou d'action.
    pub fn start_learn(&mut self, target: &str) {
        log::info!("MIDI learn : bougez un contrôle pour « {target} »");
        self.learn = Some(target.to_string());
    }

    pub fn cancel_learn(&mut self) {
        self.learn = None;
    }

    #[must_use]
    pub fn learn_target(&self) -> Option<&str> {
        self.learn.as_deref()
    }

    /// Applique un CC. Retourne le paramètre écrit.
    ///
    /// En apprentissage, le CC est assigné à la cible et rien n'est écrit.
    pub fn process_cc(&mut self, cc: u8, normalized: f32, s: &mut Settings) -> Option<ParamKey> {
        if let Some(target) = self.learn.take() {
            self.learn_cc(cc, &target);
            return None;
        }
        let mapping = self.cc.iter().find(|m| m.cc == cc)?;
        mapping.param.set(s, mapping.scale(normalized));
        Some(mapping.param)
    }

    fn learn_cc(&mut self, cc: u8, target: &str) {
        let Ok(param) = ParamKey::from_name(target) else {
            log::warn!("MIDI learn : paramètre inconnu « {target} »");
            return;
        };
        match self.cc.iter_mut().find(|m| m.param == param) {
            Some(m) => m.cc = cc,
            None => {
                let (min, max) = param.range();
                self.cc.push(CcMapping::new(cc, param, min, max));
            }
        }
        log::info!("MIDI learn : CC{cc} → {param}");
    }

    /// Résout une note. Les note-off sont ignorés hors apprentissage.
    pub fn process_note(&mut self, note: u8, on: bool) -> Option<NoteAction> {
        if on && let Some(target) = self.learn.take() {
            match target.parse::<NoteAction>() {
                Ok(action) => {
                    match self.notes.iter_mut().find(|m| m.action == action) {
                        Some(m) => m.note = note,
                        None => self.notes.push(NoteMapping { note, action }),
                    }
                    log::info!("MIDI learn : note {note} → {action}");
                }
                Err(e) => log::warn!("MIDI learn : {e}"),
            }
            return None;
        }
        if !on {
            return None;
        }
        self.notes.iter().find(|m| m.note == note).map(|m| m.action)
    }

    pub fn clear_cc(&mut self, cc: u8) {
        self.cc.retain(|m| m.cc != cc);
    }

    pub fn clear_note(&mut self, note: u8) {
        self.notes.retain(|m| m.note != note);
    }
}

/// Argument OSC décodé par le transport.
#[derive(Clone, Debug, PartialEq)]
pub enum OscArg {
    Float(f32),
    Int(i32),
    Bool(bool),
    Str(String),
}

impl OscArg {
    fn value(&self) -> Option<(f32, bool)> {
        match self {
            Self::Float(v) => Some((*v, *v > 0.5)),
            Self::Int(v) => Some((*v as f32, *v as f32 > 0.5)),
            Self::Bool(b) => Some((if *b { 1.0 } else { 0.0 }, *b)),
            Self::Str(_) => None,
        }
    }
}

/// Cible écrite par un message OSC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OscTarget {
    Param(ParamKey),
    Audio(AudioToggle),
    AudioGain,
}

const OSC_AUDIO_PREFIX: &str = "/rutt/audio/";

/// Applique `/rutt/<param> <valeur>` ou `/rutt/audio/<switch> <valeur>`.
///
/// Seul le premier argument compte. Un booléen ou une valeur `> 0.5`
/// active les interrupteurs.
///
/// # Example
/// ```
/// use rutt_control::audio::AudioModulation;
/// use rutt_control::mapping::{dispatch_osc, OscArg, OscTarget};
/// use rutt_core::{ParamKey, Settings};
///
/// let mut s = Settings::default();
/// let mut audio = AudioModulation::default();
/// let hit = dispatch_osc("/rutt/displacement", &[OscArg::Float(1.5)], &mut s, &mut audio);
/// assert_eq!(hit, Some(OscTarget::Param(ParamKey::DisplacementStrength)));
/// assert_eq!(s.displacement_strength, 1.5);
/// ```
pub fn dispatch_osc(
    address: &str,
    args: &[OscArg],
    s: &mut Settings,
    audio: &mut AudioModulation,
) -> Option<OscTarget> {
    let (value, on) = args.first()?.value()?;
    let lower = address.to_ascii_lowercase();

    if let Some(rest) = lower.strip_prefix(OSC_AUDIO_PREFIX) {
        if rest == "gain" {
            if value.is_finite() {
                audio.gain = value.max(0.0);
            }
            return Some(OscTarget::AudioGain);
        }
        let toggle = AudioToggle::from_action(rest)
            .or_else(|| AudioToggle::from_action(&format!("audio_{rest}")))?;
        toggle.set(audio, on);
        return Some(OscTarget::Audio(toggle));
    }

    match ParamKey::from_osc_address(&lower) {
        Ok(key) => {
            let v = if key.is_toggle() { if on { 1.0 } else { 0.0 } } else { value };
            key.set(s, v);
            Some(OscTarget::Param(key))
        }
        Err(e) => {
            log::debug!("OSC ignoré : {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cc_lerps_and_inverts() {
        let mut midi = MidiMapper::default();
        let mut s = Settings::default();
        assert_eq!(midi.process_cc(1, 0.5, &mut s), Some(ParamKey::DisplacementStrength));
        assert!((s.displacement_strength - 2.5).abs() < 1e-6);

        midi.cc[1].inverted = true;
        midi.process_cc(2, 0.0, &mut s);
        assert_eq!(s.brightness, 1.0);
        assert_eq!(midi.process_cc(99, 0.5, &mut s), None);
    }

    #[test]
    fn default_notes_toggle() {
        let mut midi = MidiMapper::default();
        let mut s = Settings::default();
        let mut audio = AudioModulation::default();

        let action = midi.process_note(36, true).unwrap();
        assert!(action.apply(&mut s, &mut audio));
        assert!(s.invert_displacement);

        let action = midi.process_note(42, true).unwrap();
        assert!(action.apply(&mut s, &mut audio));
        assert!(audio.wave.enabled);

        assert_eq!(midi.process_note(36, false), None);
        assert_eq!(midi.process_note(60, true), None);
    }

    #[test]
    fn learn_reassigns_existing_mapping() {
        let mut midi = MidiMapper::default();
        let mut s = Settings::default();
        midi.start_learn("contrast");
        assert_eq!(midi.process_cc(20, 0.7, &mut s), None);
        assert_eq!(s.contrast, 1.0);
        assert!(midi.learn_target().is_none());
        assert_eq!(midi.process_cc(20, 1.0, &mut s), Some(ParamKey::Contrast));
        assert_eq!(s.contrast, 3.0);
        assert_eq!(midi.process_cc(3, 1.0, &mut s), None);
    }

    #[test]
    fn learn_adds_mapping_with_param_range() {
        let mut midi = MidiMapper::empty();
        let mut s = Settings::default();
        midi.start_learn("wave_speed");
        midi.process_cc(70, 0.0, &mut s);
        assert_eq!(midi.cc, vec![CcMapping::new(70, ParamKey::WaveSpeed, 0.0, 5.0)]);

        midi.start_learn("edge_detect");
        assert_eq!(midi.process_note(50, true), None);
        assert_eq!(
            midi.process_note(50, true),
            Some(NoteAction::Toggle(ParamKey::EdgeDetect))
        );
    }

    #[test]
    fn note_action_parsing() {
        assert_eq!(
            "beat_pulse".parse::<NoteAction>(),
            Ok(NoteAction::Audio(AudioToggle::BeatPulse))
        );
        assert_eq!(
            "hlines".parse::<NoteAction>(),
            Ok(NoteAction::Toggle(ParamKey::ShowHorizontalLines))
        );
        assert!("contrast".parse::<NoteAction>().is_err());
        assert_eq!(NoteAction::Toggle(ParamKey::Interlace).to_string(), "interlace");
    }

    #[test]
    fn mapper_json_roundtrip() {
        let midi = MidiMapper::default();
        let json = serde_json::to_string(&midi).unwrap();
        assert!(json.contains("\"audio_wave\""));
        let back: MidiMapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back, midi);
    }

    #[test]
    fn osc_toggles_and_audio() {
        let mut s = Settings::default();
        let mut audio = AudioModulation::default();

        dispatch_osc("/rutt/vlines", &[OscArg::Bool(true)], &mut s, &mut audio);
        assert!(s.show_vertical_lines);
        dispatch_osc("/rutt/interlace", &[OscArg::Float(0.7)], &mut s, &mut audio);
        assert!(s.interlace);

        assert_eq!(
            dispatch_osc("/rutt/audio/hue", &[OscArg::Int(1)], &mut s, &mut audio),
            Some(OscTarget::Audio(AudioToggle::Hue))
        );
        assert!(audio.hue.enabled);
        dispatch_osc("/rutt/audio/enable", &[OscArg::Bool(false)], &mut s, &mut audio);
        assert!(!audio.enabled);
        dispatch_osc("/rutt/audio/gain", &[OscArg::Float(3.0)], &mut s, &mut audio);
        assert_eq!(audio.gain, 3.0);
    }

    #[test]
    fn osc_rejects_unknown_and_strings() {
        let mut s = Settings::default();
        let mut audio = AudioModulation::default();
        assert_eq!(
            dispatch_osc("/rutt/warp", &[OscArg::Float(1.0)], &mut s, &mut audio),
            None
        );
        assert_eq!(
            dispatch_osc("/rutt/gamma", &[OscArg::Str("2".into())], &mut s, &mut audio),
            None
        );
        assert_eq!(dispatch_osc("/rutt/gamma", &[], &mut s, &mut audio), None);
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn osc_hue_sets_color() {
        let mut s = Settings::default();
        let mut audio = AudioModulation::default();
        dispatch_osc("/rutt/primaryhue", &[OscArg::Float(0.0)], &mut s, &mut audio);
        assert!(s.primary_color.r > 0.99);
        assert!(s.primary_color.g < 0.01);
    }
}
