use rutt_core::mesh::MeshBuffers;
use rutt_core::traits::MeshSink;
use triple_buffer::TripleBuffer;

/// Côté écrivain : installé comme sink du moteur.
pub struct MeshPublisher {
    input: triple_buffer::Input<MeshBuffers>,
}

/// Côté lecteur (thread de rendu) : voit toujours un mesh complet.
pub struct MeshReader {
    output: triple_buffer::Output<MeshBuffers>,
}

/// Crée la paire publisher/lecteur.
///
/// # Example
/// ```
/// use rutt_core::traits::MeshSink;
/// use rutt_core::MeshBuffers;
/// use rutt_mesh::publish::mesh_channel;
///
/// let (mut publisher, mut reader) = mesh_channel();
/// publisher.on_mesh_updated(&MeshBuffers::new(3, 2));
/// assert!(reader.updated());
/// assert_eq!(reader.read().vertex_count(), 6);
/// ```
#[must_use]
pub fn mesh_channel() -> (MeshPublisher, MeshReader) {
    let (input, output) = TripleBuffer::new(&MeshBuffers::default()).split();
    (MeshPublisher { input }, MeshReader { output })
}

impl MeshSink for MeshPublisher {
    fn on_mesh_updated(&mut self, mesh: &MeshBuffers) {
        self.input.write(mesh.clone());
    }
}

impl MeshReader {
    /// Un mesh plus récent attend d'être lu.
    #[must_use]
    pub fn updated(&self) -> bool {
        self.output.updated()
    }

    /// Dernier mesh publié.
    pub fn read(&mut self) -> &MeshBuffers {
        self.output.read()
    }
}
