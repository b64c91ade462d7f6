use std::sync::Arc;

use crate::frame::FrameBuffer;
use crate::mesh::MeshBuffers;

/// Fournit des frames couleur au moteur.
///
/// Implémenté par : `ImageSource`, `PatternSource`, `ChannelSource`.
///
/// # Example
/// ```
/// use rutt_core::traits::FrameSource;
/// use rutt_core::frame::FrameBuffer;
/// use std::sync::Arc;
///
/// struct DummySource;
/// impl FrameSource for DummySource {
///     fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn is_live(&self) -> bool { false }
/// }
/// ```
pub trait FrameSource: Send + 'static {
    /// Retourne la frame courante.
    ///
    /// Ne bloque JAMAIS. `None` signifie « pas de signal » : le moteur
    /// conserve alors le dernier mesh.
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>>;

    /// Dimensions natives de la source (avant rééchantillonnage).
    fn native_size(&self) -> (u32, u32);

    /// Indique si la source est infinie (caméra, procédural) ou finie (fichier).
    fn is_live(&self) -> bool;
}

/// Reçoit les buffers finis à chaque tick (renderer externe).
///
/// Toute closure `FnMut(&MeshBuffers)` fait l'affaire.
///
/// # Example
/// ```
/// use rutt_core::traits::MeshSink;
/// use rutt_core::MeshBuffers;
///
/// let mut count = 0;
/// let mut sink = |_: &MeshBuffers| count += 1;
/// sink.on_mesh_updated(&MeshBuffers::new(2, 2));
/// assert_eq!(count, 1);
/// ```
pub trait MeshSink: Send {
    /// Appelé une fois par tick réussi, après la chaîne d'effets.
    fn on_mesh_updated(&mut self, mesh: &MeshBuffers);
}

impl<F> MeshSink for F
where
    F: FnMut(&MeshBuffers) + Send,
{
    fn on_mesh_updated(&mut self, mesh: &MeshBuffers) {
        self(mesh);
    }
}
