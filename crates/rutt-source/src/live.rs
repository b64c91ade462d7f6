use std::sync::Arc;

use flume::{Receiver, Sender, TryRecvError, TrySendError};
use rutt_core::frame::FrameBuffer;
use rutt_core::traits::FrameSource;

/// Côté producteur (thread caméra, décodeur vidéo, VFX).
///
/// Ne bloque jamais : si la file est pleine, la frame est abandonnée.
#[derive(Clone)]
pub struct FrameFeeder {
    tx: Sender<Arc<FrameBuffer>>,
}

impl FrameFeeder {
    /// Pousse une frame. Retourne `false` si elle a été abandonnée
    /// (file pleine ou consommateur disparu).
    pub fn push(&self, frame: Arc<FrameBuffer>) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::debug!("File de frames pleine, frame abandonnée");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Source alimentée par une file : consommée aux frontières de tick.
///
/// `next_frame` vide la file et garde la plus récente. Sans nouvelle
/// frame, la dernière connue est rejouée ; une fois tous les producteurs
/// partis, la source retourne `None` (pas de signal).
///
/// # Example
/// ```
/// use rutt_source::live::channel;
/// use rutt_core::{FrameBuffer, traits::FrameSource};
/// use std::sync::Arc;
///
/// let (feeder, mut source) = channel(2);
/// assert!(source.next_frame().is_none());
/// feeder.push(Arc::new(FrameBuffer::new(4, 4)));
/// assert_eq!(source.next_frame().unwrap().width, 4);
/// ```
pub struct ChannelSource {
    rx: Receiver<Arc<FrameBuffer>>,
    last: Option<Arc<FrameBuffer>>,
    connected: bool,
}

/// Crée une paire producteur/source bornée à `capacity` frames.
#[must_use]
pub fn channel(capacity: usize) -> (FrameFeeder, ChannelSource) {
    let (tx, rx) = flume::bounded(capacity.max(1));
    (
        FrameFeeder { tx },
        ChannelSource {
            rx,
            last: None,
            connected: true,
        },
    )
}

impl ChannelSource {
    /// `false` dès que tous les [`FrameFeeder`] ont été relâchés.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl FrameSource for ChannelSource {
    fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => self.last = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        log::warn!("Source live déconnectée");
                        self.connected = false;
                    }
                    return None;
                }
            }
        }
        self.last.clone()
    }

    fn native_size(&self) -> (u32, u32) {
        self.last.as_ref().map_or((0, 0), |f| (f.width, f.height))
    }

    fn is_live(&self) -> bool {
        true
    }
}
