use thiserror::Error;

/// Erreurs des collaborateurs externes (presets, mappings, audio).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ControlError {
    /// Aucun preset de ce nom dans la bibliothèque.
    #[error("Preset introuvable : {0}")]
    PresetNotFound(String),

    /// Aucune palette de ce nom.
    #[error("Palette introuvable : {0}")]
    PaletteNotFound(String),

    /// Action de note MIDI sans correspondance.
    #[error("Action inconnue : {0}")]
    UnknownAction(String),

    /// Nom de bande audio invalide.
    #[error("Bande audio inconnue : {0}")]
    UnknownBand(String),

    /// Forme d'onde LFO invalide.
    #[error("Forme d'onde inconnue : {0}")]
    UnknownWaveform(String),
}
