//! External collaborators for ruttetra.
//!
//! Everything here writes into the shared [`rutt_core::Settings`]:
//! preset library and morphs, colour palettes, LFO animator, noise drift,
//! audio modulation with beat detection, MIDI/OSC mapping, the control bus
//! and settings hot-reload.

pub mod animator;
pub mod audio;
pub mod bus;
pub mod error;
pub mod host;
pub mod hotreload;
pub mod library;
pub mod mapping;
pub mod morph;
pub mod palette;
pub mod randomizer;

pub use animator::{Animator, Lfo, QuickAnimations, Waveform};
pub use audio::{AudioBand, AudioLevels, AudioModulation, AudioModulator, AudioToggle, BeatDetector};
pub use bus::{ControlBus, ControlEvent, ControlTargets, PresetStep};
pub use error::ControlError;
pub use host::ControlHost;
pub use hotreload::spawn_settings_watcher;
pub use library::PresetLibrary;
pub use mapping::{CcMapping, MidiMapper, NoteAction, NoteMapping, OscArg, OscTarget, dispatch_osc};
pub use morph::PresetMorph;
pub use palette::{Palette, PaletteCycler};
pub use randomizer::{DriftTargets, Randomizer};
