use thiserror::Error;

/// Errors originating from the overlay chain.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FxError {
    /// Depth color preset that does not exist.
    #[error("Preset de couleur inconnu : {0}. Supportés : thermal, rainbow, ocean, fire, matrix")]
    UnknownPreset(String),

    /// Mirror mode name that does not exist.
    #[error("Mode miroir inconnu : {0}")]
    UnknownMirrorMode(String),
}
