//! Settings, types, and shared structures for ruttetra.
//!
//! This crate contains all shared types, traits, and configuration logic
//! used across the ruttetra workspace.

pub mod color;
pub mod error;
pub mod frame;
pub mod mesh;
pub mod params;
pub mod preset;
pub mod settings;
pub mod traits;

pub use color::Rgba;
pub use error::CoreError;
pub use frame::FrameBuffer;
pub use mesh::{LineStyle, MeshBuffers};
pub use params::ParamKey;
pub use preset::Preset;
pub use settings::{Settings, SettingsHandle};

/// Re-exports pour accès par chemin sémantique.
pub mod math {
    pub use glam::{EulerRot, Quat, Vec2, Vec3};
}
