//! Frame sources for ruttetra (image, test patterns, queue-fed live input)
//! and the sampler that brings any frame down to grid resolution.

pub mod error;
pub mod image;
pub mod live;
pub mod pattern;
pub mod sampler;

pub use error::SourceError;
pub use image::ImageSource;
pub use live::{ChannelSource, FrameFeeder};
pub use pattern::{Pattern, PatternSource};
pub use sampler::{GridSample, GridSampler};

use rutt_core::traits::FrameSource;

/// Fabrique une source à partir d'une description textuelle.
///
/// `pattern:<nom>` crée un motif de test aux dimensions données,
/// tout autre texte est traité comme un chemin d'image.
///
/// # Errors
/// Retourne une erreur si le motif est inconnu ou si l'image ne charge pas.
///
/// # Example
/// ```
/// use rutt_source::open_source;
/// let src = open_source("pattern:checker", 64, 48).unwrap();
/// assert_eq!(src.native_size(), (64, 48));
/// assert!(open_source("pattern:warp", 64, 48).is_err());
/// ```
pub fn open_source(descriptor: &str, width: u32, height: u32) -> anyhow::Result<Box<dyn FrameSource>> {
    if let Some(name) = descriptor.strip_prefix("pattern:") {
        let pattern: Pattern = name.parse()?;
        log::info!("Source procédurale : {name} {width}×{height}");
        return Ok(Box::new(PatternSource::new(pattern, width, height)));
    }
    let source = ImageSource::new(std::path::Path::new(descriptor))?;
    log::info!("Source image : {descriptor}");
    Ok(Box::new(source))
}
