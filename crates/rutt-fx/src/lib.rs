//! Mesh overlays for ruttetra: glitch corruption, mirror/kaleidoscope
//! remapping and depth coloring, run in a fixed order by [`EffectChain`].

pub mod chain;
pub mod depth;
pub mod error;
pub mod glitch;
pub mod mirror;

pub use chain::{EffectChain, EffectContext, Overlay, OverlayKind};
pub use depth::{DepthColorizer, DepthMode, DepthPreset};
pub use error::FxError;
pub use glitch::{Glitch, GlitchParams};
pub use mirror::{Mirror, MirrorMode, MirrorParams};
