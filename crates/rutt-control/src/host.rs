use std::path::Path;

use anyhow::Result;
use fastrand::Rng;
use rutt_core::{ParamKey, Settings, SettingsHandle};
use rutt_mesh::Engine;

use crate::animator::Animator;
use crate::audio::{AudioLevels, AudioModulator};
use crate::bus::{ControlBus, ControlTargets};
use crate::library::PresetLibrary;
use crate::mapping::{MidiMapper, NoteAction, OscArg, OscTarget, dispatch_osc};
use crate::morph::{DEFAULT_MORPH_DURATION, PresetMorph};
use crate::palette::PaletteCycler;
use crate::randomizer::Randomizer;

/// Regroupe les collaborateurs qui écrivent dans les [`Settings`].
///
/// Un seul thread (celui du tick) possède l'hôte ; les autres threads
/// passent par [`ControlHost::bus`].
pub struct ControlHost {
    pub settings: SettingsHandle,
    pub bus: ControlBus,
    pub library: PresetLibrary,
    pub morph: PresetMorph,
    pub palette: PaletteCycler,
    pub animator: Animator,
    pub randomizer: Randomizer,
    pub audio: AudioModulator,
    pub midi: MidiMapper,
    pub morph_duration: f32,
    rng: Rng,
}

impl ControlHost {
    /// # Errors
    /// Returns an error if the preset directory cannot be opened.
    pub fn new(settings: SettingsHandle, preset_dir: &Path, seed: u64) -> Result<Self> {
        Ok(Self {
            settings,
            bus: ControlBus::default(),
            library: PresetLibrary::open(preset_dir)?,
            morph: PresetMorph::default(),
            palette: PaletteCycler::default(),
            animator: Animator::new(seed as u32),
            randomizer: Randomizer::new(seed),
            audio: AudioModulator::default(),
            midi: MidiMapper::default(),
            morph_duration: DEFAULT_MORPH_DURATION,
            rng: Rng::with_seed(seed),
        })
    }

    /// Passe de contrôle d'un tick, avant [`Engine::tick`] :
    /// bus, morph, palettes, animateur, dérive puis audio.
    /// Retourne `true` sur un beat.
    pub fn tick(&mut self, dt: f32, engine: &mut Engine, levels: Option<&AudioLevels>) -> bool {
        self.bus.dispatch(&mut ControlTargets {
            settings: &self.settings,
            engine: &mut *engine,
            library: &mut self.library,
            morph: &mut self.morph,
            palette: &mut self.palette,
            randomizer: &mut self.randomizer,
            rng: &mut self.rng,
            morph_duration: self.morph_duration,
        });

        let mut s = Settings::clone(&self.settings.snapshot());
        let before = s.clone();
        if self.morph.update(dt, &mut s) == Some(1.0) {
            // Fin de morph : le nouvel état sert de base aux modulations.
            self.animator.capture_base(&s);
            self.randomizer.recapture_base();
            self.audio.recapture_base();
        }
        self.palette.update(dt, &mut s);
        self.animator.update(dt, &mut s);
        self.randomizer.update(dt, &mut s);
        let beat = levels.is_some_and(|l| self.audio.process(l, dt, &mut s));
        if beat {
            engine.on_beat();
            // Pris en compte par la dérive au tick suivant.
            self.randomizer.on_beat();
        }
        if s != before {
            self.settings.store(s);
        }
        beat
    }

    pub fn handle_cc(&mut self, cc: u8, normalized: f32) -> Option<ParamKey> {
        let mut s = Settings::clone(&self.settings.snapshot());
        let hit = self.midi.process_cc(cc, normalized, &mut s);
        if hit.is_some() {
            self.settings.store(s);
        }
        hit
    }

    pub fn handle_note(&mut self, note: u8, on: bool) -> Option<NoteAction> {
        let action = self.midi.process_note(note, on)?;
        let mut s = Settings::clone(&self.settings.snapshot());
        action.apply(&mut s, &mut self.audio.params);
        self.settings.store(s);
        Some(action)
    }

    pub fn handle_osc(&mut self, address: &str, args: &[OscArg]) -> Option<OscTarget> {
        let mut s = Settings::clone(&self.settings.snapshot());
        let hit = dispatch_osc(address, args, &mut s, &mut self.audio.params);
        if matches!(hit, Some(OscTarget::Param(_))) {
            self.settings.store(s);
        }
        hit
    }

    /// Recapture les bases de l'animateur, de la dérive et de l'audio
    /// sur l'état publié.
    pub fn recapture_bases(&mut self) {
        let s = self.settings.snapshot();
        self.animator.capture_base(&s);
        self.randomizer.capture_base(&s);
        self.audio.recapture_base();
    }

    /// Sauvegarde l'état publié sous `name`.
    ///
    /// # Errors
    /// Returns an error if the preset file cannot be written.
    pub fn save_preset(&mut self, name: &str) -> Result<()> {
        let s = self.settings.snapshot();
        self.library.save_current(&s, name).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animator::{Lfo, Waveform};
    use crate::bus::ControlEvent;
    use rutt_core::FrameBuffer;
    use rutt_core::settings::MeshConfig;

    fn host(dir: &Path) -> ControlHost {
        ControlHost::new(SettingsHandle::default(), dir, 9).unwrap()
    }

    #[test]
    fn bus_then_morph_reach_engine_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path());
        let mut engine = Engine::new(MeshConfig::default());
        host.morph_duration = 0.5;
        host.bus.post(ControlEvent::MorphToPreset {
            name: "Minimal White".into(),
            duration: None,
        });
        host.tick(0.25, &mut engine, None);
        let mid = host.settings.snapshot().contrast;
        assert!(mid > 1.0 && mid < 2.0, "{mid}");
        host.tick(0.25, &mut engine, None);
        assert_eq!(host.settings.snapshot().contrast, 2.0);
        assert!(!host.morph.is_active());

        let s = host.settings.snapshot();
        let frame = FrameBuffer::filled(32, 16, [128, 128, 128, 255]);
        engine.on_frame(&frame, &s);
        assert_eq!(engine.mesh().style.width, 0.005);
    }

    #[test]
    fn animator_runs_each_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path());
        let mut engine = Engine::new(MeshConfig::default());
        host.animator
            .bind(ParamKey::RotationX, Lfo::new(Waveform::Sine, 1.0, 90.0));
        host.tick(0.25, &mut engine, None);
        assert!((host.settings.snapshot().rotation_x - 90.0).abs() < 1e-2);
    }

    #[test]
    fn audio_beat_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path());
        let mut engine = Engine::new(MeshConfig::default());
        host.audio.params.smoothing = 0.0;
        let quiet = AudioLevels::default();
        let loud = AudioLevels {
            bass: 2.0,
            ..AudioLevels::default()
        };
        assert!(!host.tick(0.016, &mut engine, Some(&quiet)));
        assert!(host.tick(0.016, &mut engine, Some(&loud)));
    }

    #[test]
    fn randomizer_snaps_on_audio_beats() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path());
        let mut engine = Engine::new(MeshConfig::default());
        host.audio.params.smoothing = 0.0;
        host.settings.update(|s| {
            s.randomizer_enabled = true;
            s.randomizer_snap_to_beats = true;
            s.randomizer_speed = 1.0;
            s.randomizer_intensity = 1.0;
        });
        let quiet = AudioLevels::default();
        let loud = AudioLevels {
            bass: 2.0,
            ..AudioLevels::default()
        };
        host.tick(0.5, &mut engine, Some(&quiet));
        let held = host.settings.snapshot().rotation_z;
        host.tick(0.5, &mut engine, Some(&quiet));
        assert_eq!(host.settings.snapshot().rotation_z, held);
        assert!(host.tick(0.5, &mut engine, Some(&loud)));
        host.tick(0.5, &mut engine, Some(&quiet));
        assert_ne!(host.settings.snapshot().rotation_z, held);
    }

    #[test]
    fn palette_auto_runs_in_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path());
        let mut engine = Engine::new(MeshConfig::default());
        host.settings.update(|s| {
            s.palette_auto = true;
            s.palette_interval = 5.0;
            s.palette_transition = 0.0;
        });
        host.tick(5.0, &mut engine, None);
        assert_eq!(host.palette.current_name(), Some("Vaporwave"));
        assert_eq!(host.settings.snapshot().glow_intensity, 0.8);
    }

    #[test]
    fn midi_and_osc_publish() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host(dir.path());
        assert_eq!(host.handle_cc(3, 1.0), Some(ParamKey::Contrast));
        assert_eq!(host.settings.snapshot().contrast, 3.0);

        host.handle_note(39, true);
        assert!(host.settings.snapshot().show_vertical_lines);
        host.handle_note(43, true);
        assert!(host.audio.params.hue.enabled);

        host.handle_osc("/rutt/gamma", &[OscArg::Float(0.5)]);
        assert_eq!(host.settings.snapshot().gamma, 0.5);

        host.save_preset("From Host").unwrap();
        assert_eq!(
            host.library.get("From Host").map(|p| p.settings.gamma),
            Some(0.5)
        );
    }
}
