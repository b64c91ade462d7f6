use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Pixel buffer length does not match the declared dimensions.
    #[error("Taille de buffer incohérente : attendu {expected} octets, reçu {actual}")]
    BufferSize {
        /// Expected byte count (width × height × 4).
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// Parameter name or OSC address that maps to no settings field.
    #[error("Paramètre inconnu : {name}")]
    UnknownParam {
        /// The unresolved name.
        name: String,
    },
}
