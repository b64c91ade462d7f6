use fastrand::Rng;
use rutt_core::{ParamKey, Preset, Settings, SettingsHandle};
use rutt_mesh::Engine;

use crate::error::ControlError;
use crate::library::PresetLibrary;
use crate::morph::PresetMorph;
use crate::palette::PaletteCycler;
use crate::randomizer::Randomizer;

/// Capacité par défaut du bus.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Déplacement dans une liste (presets, palettes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresetStep {
    Next,
    Previous,
    Random,
}

/// Événement inter-composants, appliqué au bord de tick.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlEvent {
    SetParam { key: ParamKey, value: f32 },
    ToggleParam(ParamKey),
    Beat,
    TriggerGlitch { duration: f32 },
    ApplyPreset(String),
    /// `duration = None` : durée de morph de l'hôte.
    MorphToPreset { name: String, duration: Option<f32> },
    StepPreset { step: PresetStep, morph: bool },
    SavePreset(String),
    ResetDepthRange,
    ApplyPalette(String),
    StepPalette(PresetStep),
    /// Coupe la dérive et rétablit ses valeurs de base.
    RestoreDrift,
    ShuffleDrift,
}

/// Ce que le bus peut modifier pendant un drain.
pub struct ControlTargets<'a> {
    pub settings: &'a SettingsHandle,
    pub engine: &'a mut Engine,
    pub library: &'a mut PresetLibrary,
    pub morph: &'a mut PresetMorph,
    pub palette: &'a mut PaletteCycler,
    pub randomizer: &'a mut Randomizer,
    pub rng: &'a mut Rng,
    pub morph_duration: f32,
}

/// File d'événements multi-producteurs, vidée par l'hôte.
///
/// # Example
/// ```
/// use rutt_control::bus::{ControlBus, ControlEvent};
/// use rutt_core::ParamKey;
///
/// let bus = ControlBus::default();
/// let tx = bus.sender();
/// tx.send(ControlEvent::SetParam { key: ParamKey::Gamma, value: 2.0 }).unwrap();
/// assert_eq!(bus.drain().len(), 1);
/// ```
#[derive(Clone)]
pub struct ControlBus {
    tx: flume::Sender<ControlEvent>,
    rx: flume::Receiver<ControlEvent>,
}

impl Default for ControlBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl ControlBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Émetteur clonable pour les threads OSC/MIDI/audio.
    #[must_use]
    pub fn sender(&self) -> flume::Sender<ControlEvent> {
        self.tx.clone()
    }

    /// Envoi non bloquant ; `false` si le bus est plein.
    pub fn post(&self, event: ControlEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Bus de contrôle : événement perdu ({e})");
                false
            }
        }
    }

    /// Retire tous les événements en attente, dans l'ordre d'arrivée.
    #[must_use]
    pub fn drain(&self) -> Vec<ControlEvent> {
        self.rx.try_iter().collect()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Vide le bus et applique chaque événement dans l'ordre.
    ///
    /// Les paramètres sont modifiés sur une copie publiée une seule fois
    /// en fin de drain. Retourne le nombre d'événements traités.
    pub fn dispatch(&self, targets: &mut ControlTargets<'_>) -> usize {
        let events = self.drain();
        if events.is_empty() {
            return 0;
        }
        let mut settings = Settings::clone(&targets.settings.snapshot());
        let before = settings.clone();

        for event in &events {
            if let Err(e) = apply(event, &mut settings, targets) {
                log::warn!("{e}");
            }
        }

        if settings != before {
            targets.settings.store(settings);
        }
        events.len()
    }
}

fn apply(
    event: &ControlEvent,
    s: &mut Settings,
    t: &mut ControlTargets<'_>,
) -> Result<(), ControlError> {
    match event {
        ControlEvent::SetParam { key, value } => key.set(s, *value),
        ControlEvent::ToggleParam(key) => key.toggle(s),
        ControlEvent::Beat => {
            t.engine.on_beat();
            t.randomizer.on_beat();
        }
        ControlEvent::TriggerGlitch { duration } => {
            if !t.engine.trigger_glitch(*duration) {
                log::debug!("Glitch demandé sans overlay installé");
            }
        }
        ControlEvent::ApplyPreset(name) => {
            let preset = t
                .library
                .select(name)
                .cloned()
                .ok_or_else(|| ControlError::PresetNotFound(name.clone()))?;
            load(&preset, false, None, s, t);
        }
        ControlEvent::MorphToPreset { name, duration } => {
            let preset = t
                .library
                .select(name)
                .cloned()
                .ok_or_else(|| ControlError::PresetNotFound(name.clone()))?;
            load(&preset, true, *duration, s, t);
        }
        ControlEvent::StepPreset { step, morph } => {
            let picked = match step {
                PresetStep::Next => t.library.next(),
                PresetStep::Previous => t.library.previous(),
                PresetStep::Random => t.library.random(t.rng),
            };
            let Some(preset) = picked.cloned() else {
                return Err(ControlError::PresetNotFound(format!("{step:?}")));
            };
            load(&preset, *morph, None, s, t);
        }
        ControlEvent::SavePreset(name) => {
            if let Err(e) = t.library.save_current(s, name) {
                log::warn!("Sauvegarde du preset « {name} » impossible : {e:#}");
            }
        }
        ControlEvent::ResetDepthRange => t.engine.reset_depth_range(),
        ControlEvent::ApplyPalette(name) => t.palette.apply_name(name, s)?,
        ControlEvent::StepPalette(step) => {
            let moved = match step {
                PresetStep::Next => t.palette.next(s),
                PresetStep::Previous => t.palette.previous(s),
                PresetStep::Random => t.palette.random(s, t.rng),
            };
            if !moved {
                return Err(ControlError::PaletteNotFound(format!("{step:?}")));
            }
        }
        ControlEvent::RestoreDrift => {
            s.randomizer_enabled = false;
            t.randomizer.restore(s);
        }
        ControlEvent::ShuffleDrift => t.randomizer.shuffle(),
    }
    Ok(())
}

fn load(
    preset: &Preset,
    morph: bool,
    duration: Option<f32>,
    s: &mut Settings,
    t: &mut ControlTargets<'_>,
) {
    if morph {
        t.morph
            .start(s, preset, duration.unwrap_or(t.morph_duration));
    } else {
        t.morph.cancel();
        preset.apply_to(s);
    }
    log::info!("Preset chargé : {}", preset.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rutt_core::settings::MeshConfig;
    use rutt_fx::{EffectChain, Glitch, GlitchParams};

    struct Host {
        settings: SettingsHandle,
        engine: Engine,
        library: PresetLibrary,
        morph: PresetMorph,
        palette: PaletteCycler,
        randomizer: Randomizer,
        rng: Rng,
        _dir: tempfile::TempDir,
    }

    impl Host {
        fn new() -> Self {
            let _ = env_logger::builder().is_test(true).try_init();
            let dir = tempfile::tempdir().unwrap();
            let library = PresetLibrary::open(dir.path()).unwrap();
            let mut chain = EffectChain::new();
            chain.insert(Glitch::new(GlitchParams::default()));
            Self {
                settings: SettingsHandle::default(),
                engine: Engine::new(MeshConfig::default()).with_chain(chain),
                library,
                morph: PresetMorph::default(),
                palette: PaletteCycler::default(),
                randomizer: Randomizer::new(1),
                rng: Rng::with_seed(1),
                _dir: dir,
            }
        }

        fn dispatch(&mut self, bus: &ControlBus) -> usize {
            bus.dispatch(&mut ControlTargets {
                settings: &self.settings,
                engine: &mut self.engine,
                library: &mut self.library,
                morph: &mut self.morph,
                palette: &mut self.palette,
                randomizer: &mut self.randomizer,
                rng: &mut self.rng,
                morph_duration: 2.0,
            })
        }
    }

    #[test]
    fn events_apply_in_order() {
        let mut host = Host::new();
        let bus = ControlBus::default();
        bus.post(ControlEvent::SetParam {
            key: ParamKey::Gamma,
            value: 2.0,
        });
        bus.post(ControlEvent::SetParam {
            key: ParamKey::Gamma,
            value: 2.5,
        });
        bus.post(ControlEvent::ToggleParam(ParamKey::Interlace));
        assert_eq!(host.dispatch(&bus), 3);
        let s = host.settings.snapshot();
        assert_eq!(s.gamma, 2.5);
        assert!(s.interlace);
        assert_eq!(host.dispatch(&bus), 0);
    }

    #[test]
    fn apply_preset_keeps_resolution() {
        let mut host = Host::new();
        host.settings.update(|s| s.horizontal_resolution = 32);
        let bus = ControlBus::default();
        bus.post(ControlEvent::ApplyPreset("Neon Pink".into()));
        host.dispatch(&bus);
        let s = host.settings.snapshot();
        assert_eq!(s.contrast, 1.5);
        assert_eq!(s.horizontal_resolution, 32);
        assert_eq!(host.library.current_index(), Some(1));
    }

    #[test]
    fn morph_event_starts_morph() {
        let mut host = Host::new();
        let bus = ControlBus::default();
        bus.post(ControlEvent::MorphToPreset {
            name: "Psychedelic".into(),
            duration: Some(1.0),
        });
        host.dispatch(&bus);
        assert!(host.morph.is_active());
        assert_eq!(host.morph.target().displacement_strength, 3.0);
        // Rien n'est publié tant que le morph n'avance pas.
        assert_eq!(host.settings.snapshot().displacement_strength, 1.0);

        let mut s = Settings::clone(&host.settings.snapshot());
        host.morph.update(1.0, &mut s);
        assert_eq!(s.displacement_strength, 3.0);
    }

    #[test]
    fn step_and_unknown_presets() {
        let mut host = Host::new();
        let bus = ControlBus::default();
        bus.post(ControlEvent::ApplyPreset("Nope".into()));
        bus.post(ControlEvent::StepPreset {
            step: PresetStep::Previous,
            morph: false,
        });
        assert_eq!(host.dispatch(&bus), 2);
        assert_eq!(host.library.current_index(), Some(4));
        assert_eq!(host.settings.snapshot().noise_amount, 0.05);
    }

    #[test]
    fn glitch_and_beat_reach_engine() {
        let mut host = Host::new();
        let bus = ControlBus::default();
        bus.post(ControlEvent::TriggerGlitch { duration: 0.5 });
        bus.post(ControlEvent::Beat);
        bus.post(ControlEvent::ResetDepthRange);
        host.dispatch(&bus);
        assert!(host.engine.chain().glitch().is_some_and(Glitch::is_glitching));
    }

    #[test]
    fn save_preset_captures_current() {
        let mut host = Host::new();
        let bus = ControlBus::default();
        bus.post(ControlEvent::SetParam {
            key: ParamKey::Bloom,
            value: 0.7,
        });
        bus.post(ControlEvent::SavePreset("Live".into()));
        host.dispatch(&bus);
        assert_eq!(host.library.get("Live").map(|p| p.settings.bloom), Some(0.7));
    }

    #[test]
    fn palette_events_write_colors() {
        let mut host = Host::new();
        host.settings.update(|s| s.palette_transition = 0.0);
        let bus = ControlBus::default();
        bus.post(ControlEvent::ApplyPalette("Fire".into()));
        bus.post(ControlEvent::StepPalette(PresetStep::Next));
        bus.post(ControlEvent::ApplyPalette("Beige".into()));
        assert_eq!(host.dispatch(&bus), 3);
        assert_eq!(host.palette.current_name(), Some("Matrix"));
        let s = host.settings.snapshot();
        assert_eq!(s.glow_intensity, 0.5);
        assert_eq!(s.primary_color, rutt_core::color::Rgba::rgb(0.0, 1.0, 0.2));
    }

    #[test]
    fn restore_drift_stops_randomizer() {
        let mut host = Host::new();
        host.settings.update(|s| s.randomizer_enabled = true);
        let mut s = Settings::clone(&host.settings.snapshot());
        for _ in 0..20 {
            host.randomizer.update(0.5, &mut s);
        }
        host.settings.store(s);
        let bus = ControlBus::default();
        bus.post(ControlEvent::RestoreDrift);
        host.dispatch(&bus);
        let s = host.settings.snapshot();
        assert!(!s.randomizer_enabled);
        assert_eq!(s.rotation_x, 0.0);
        assert_eq!(s.displacement_strength, 1.0);
    }

    #[test]
    fn full_bus_drops_events() {
        let bus = ControlBus::new(1);
        assert!(bus.post(ControlEvent::Beat));
        assert!(!bus.post(ControlEvent::Beat));
        assert_eq!(bus.pending(), 1);
        assert_eq!(bus.drain(), vec![ControlEvent::Beat]);
        assert!(bus.post(ControlEvent::ResetDepthRange));
    }
}
