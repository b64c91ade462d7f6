//! Rutt/Etra mesh pipeline: per-cell luminance, grid topology,
//! displacement and the `Engine` that runs them once per tick.

pub mod displacement;
pub mod engine;
pub mod luminance;
pub mod publish;
pub mod topology;

pub use displacement::{Displacer, FrameParams};
pub use engine::{Engine, SignalStatus};
pub use luminance::{LuminanceProcessor, SignalParams};
pub use publish::{MeshPublisher, MeshReader, mesh_channel};
pub use topology::{MeshTopology, TopologyKey};
