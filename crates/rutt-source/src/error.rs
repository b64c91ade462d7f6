use thiserror::Error;

/// Errors originating from frame sources and the grid sampler.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Frame with no usable pixel.
    #[error("Frame vide : {width}×{height}")]
    EmptyFrame {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// Pattern name that matches no built-in generator.
    #[error("Motif inconnu : {0}. Supportés : gradient, vgradient, checker, bars, rings, noise")]
    UnknownPattern(String),
}
