//! Hand-off point for sound requests arriving from other threads.
//!
//! Network callbacks never touch engine state. They push into the inbox
//! through an [`InboxSender`]; the tick driver drains it synchronously.

use glam::Vec3;
use soundscape_core::SoundKey;
use std::sync::mpsc::{self, Receiver, Sender};

/// Sound the server asked this client to play.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributedSound {
    /// Sound identifier.
    pub key: SoundKey,
    /// World position.
    pub position: Vec3,
    /// Volume.
    pub volume: f32,
    /// Pitch.
    pub pitch: f32,
}

/// Cloneable, thread-safe producer side of the inbox.
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: Sender<DistributedSound>,
}

impl InboxSender {
    /// Queue a sound. Returns false once the engine is gone.
    pub fn send(&self, sound: DistributedSound) -> bool {
        self.tx.send(sound).is_ok()
    }
}

/// Consumer side, owned by the engine.
#[derive(Debug)]
pub struct SoundInbox {
    tx: Sender<DistributedSound>,
    rx: Receiver<DistributedSound>,
}

impl SoundInbox {
    /// New empty inbox.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Producer handle.
    pub fn sender(&self) -> InboxSender {
        InboxSender {
            tx: self.tx.clone(),
        }
    }

    /// Take everything queued so far without blocking.
    pub fn drain(&self) -> Vec<DistributedSound> {
        self.rx.try_iter().collect()
    }
}

impl Default for SoundInbox {
    fn default() -> Self {
        Self::new()
    }
}
