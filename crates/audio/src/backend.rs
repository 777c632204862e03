//! Contracts for the external collaborators the engine drives.
//!
//! The engine never mixes audio, renders particles or talks to the network
//! itself. It hands finished decisions to these traits once per tick.

use crate::{FootprintEvent, SoundInstance};
use glam::IVec3;
use soundscape_core::SoundKey;
use thiserror::Error;
use tracing::debug;

/// Handle returned by a playback backend for a sound it accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundHandle(pub u64);

/// Failure reported by a playback backend.
///
/// These are caught at the engine's call boundary and logged; they never
/// abort a tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// The backend refused the sound (unknown asset, no free channel, ...).
    #[error("backend rejected sound {0}")]
    Rejected(SoundKey),
    /// The backend itself failed.
    #[error("playback backend failure: {0}")]
    Backend(String),
}

/// Sound engine the scheduler drives.
pub trait PlaybackBackend {
    /// Start playing `sound`. `Ok(None)` means the sound was accepted but not
    /// tracked (nothing to stop or poll later).
    fn play(&mut self, sound: &SoundInstance) -> Result<Option<SoundHandle>, PlaybackError>;

    /// Stop a sound previously started by [`PlaybackBackend::play`].
    fn stop(&mut self, handle: SoundHandle) -> Result<(), PlaybackError>;

    /// Whether the sound behind `handle` is still audible.
    fn is_playing(&self, handle: SoundHandle) -> bool;

    /// Adjust the volume of a playing sound.
    fn set_volume(&mut self, _handle: SoundHandle, _volume: f32) -> Result<(), PlaybackError> {
        Ok(())
    }

    /// Stop every sound the backend knows about.
    fn stop_all(&mut self) {}
}

/// Read-only world lookups used by the ambient probe.
pub trait WorldQuery {
    /// True when `pos` is an air block with no sky access and low block light.
    fn is_air_and_dark(&self, pos: IVec3) -> bool;
}

/// Fire-and-forget replication of played sounds to the server.
pub trait Transport {
    /// Send one sound.
    fn send(&mut self, sound: &SoundInstance);
}

/// Fire-and-forget particle output for footprints.
pub trait ParticleSink {
    /// Spawn one footprint decal.
    fn emit_footprint(&mut self, footprint: &FootprintEvent);
}

/// Backend stub used when no audio device is available.
///
/// Accepts every sound without tracking it.
#[derive(Debug, Default)]
pub struct NullBackend;

impl PlaybackBackend for NullBackend {
    fn play(&mut self, sound: &SoundInstance) -> Result<Option<SoundHandle>, PlaybackError> {
        debug!("Audio backend: stub accepted {}", sound.key);
        Ok(None)
    }

    fn stop(&mut self, _handle: SoundHandle) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn is_playing(&self, _handle: SoundHandle) -> bool {
        false
    }
}

/// World stub that never reports a dark air block.
#[derive(Debug, Default)]
pub struct NoWorld;

impl WorldQuery for NoWorld {
    fn is_air_and_dark(&self, _pos: IVec3) -> bool {
        false
    }
}

/// Transport stub for single-player sessions.
#[derive(Debug, Default)]
pub struct NoTransport;

impl Transport for NoTransport {
    fn send(&mut self, _sound: &SoundInstance) {}
}

/// Particle stub for headless sessions.
#[derive(Debug, Default)]
pub struct NoParticles;

impl ParticleSink for NoParticles {
    fn emit_footprint(&mut self, _footprint: &FootprintEvent) {}
}
