//! Recording stand-ins for the engine's external collaborators.

use glam::IVec3;
use soundscape_audio::{
    FootprintEvent, ParticleSink, PlaybackBackend, PlaybackError, SoundHandle, SoundInstance,
    Transport, WorldQuery,
};
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Playback backend that records every call.
///
/// One-shot sounds play for `duration` ticks of [`RecordingBackend::advance`]
/// (forever when unset); looping sounds play until stopped or finished.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_handle: u64,
    duration: Option<u64>,
    failing: bool,
    active: HashMap<SoundHandle, Option<u64>>,
    handles: Vec<SoundHandle>,
    /// Every sound accepted, in order.
    pub played: Vec<SoundInstance>,
    /// Every handle stopped, in order.
    pub stopped: Vec<SoundHandle>,
    /// Every volume update.
    pub volumes: Vec<(SoundHandle, f32)>,
    /// Number of `stop_all` calls.
    pub stop_all_calls: usize,
}

impl RecordingBackend {
    /// Backend whose one-shots never finish on their own.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose one-shots finish after `ticks` advances.
    pub fn with_duration(ticks: u64) -> Self {
        Self {
            duration: Some(ticks),
            ..Self::default()
        }
    }

    /// Make every subsequent `play` fail (or succeed again).
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Age every one-shot by one tick, finishing expired ones.
    pub fn advance(&mut self) {
        self.active.retain(|_, remaining| match remaining {
            Some(0) | Some(1) => false,
            Some(ticks) => {
                *ticks -= 1;
                true
            }
            None => true,
        });
    }

    /// Finish a sound as if it ran out.
    pub fn finish(&mut self, handle: SoundHandle) {
        self.active.remove(&handle);
    }

    /// Handle of the most recent accepted sound with identifier `key`.
    pub fn handle_for(&self, key: &str) -> Option<SoundHandle> {
        self.played
            .iter()
            .zip(&self.handles)
            .rev()
            .find(|(sound, _)| sound.key.to_string() == key)
            .map(|(_, handle)| *handle)
    }

    /// Identifiers of every accepted sound, in order.
    pub fn played_keys(&self) -> Vec<String> {
        self.played.iter().map(|sound| sound.key.to_string()).collect()
    }

    /// Remove and return the sounds accepted so far.
    pub fn take_played(&mut self) -> Vec<SoundInstance> {
        self.handles.clear();
        std::mem::take(&mut self.played)
    }

    /// Number of sounds still playing.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl PlaybackBackend for RecordingBackend {
    fn play(&mut self, sound: &SoundInstance) -> Result<Option<SoundHandle>, PlaybackError> {
        if self.failing {
            return Err(PlaybackError::Backend("scripted failure".into()));
        }
        self.next_handle += 1;
        let handle = SoundHandle(self.next_handle);
        let remaining = if sound.looping { None } else { self.duration };
        self.active.insert(handle, remaining);
        self.played.push(sound.clone());
        self.handles.push(handle);
        debug!("RecordingBackend played {} as {:?}", sound, handle);
        Ok(Some(handle))
    }

    fn stop(&mut self, handle: SoundHandle) -> Result<(), PlaybackError> {
        self.active.remove(&handle);
        self.stopped.push(handle);
        Ok(())
    }

    fn is_playing(&self, handle: SoundHandle) -> bool {
        self.active.contains_key(&handle)
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), PlaybackError> {
        self.volumes.push((handle, volume));
        Ok(())
    }

    fn stop_all(&mut self) {
        self.active.clear();
        self.stop_all_calls += 1;
    }
}

/// World with scripted dark air blocks.
#[derive(Debug, Default)]
pub struct ScriptedWorld {
    all_dark: bool,
    dark: HashSet<IVec3>,
    queries: Cell<u32>,
}

impl ScriptedWorld {
    /// World where every block qualifies.
    pub fn all_dark() -> Self {
        Self {
            all_dark: true,
            ..Self::default()
        }
    }

    /// World where no block qualifies.
    pub fn lit() -> Self {
        Self::default()
    }

    /// Mark `pos` as dark air.
    pub fn add_dark(&mut self, pos: IVec3) {
        self.dark.insert(pos);
    }

    /// Switch the all-dark flag.
    pub fn set_all_dark(&mut self, all_dark: bool) {
        self.all_dark = all_dark;
    }

    /// Number of queries answered.
    pub fn queries(&self) -> u32 {
        self.queries.get()
    }
}

impl WorldQuery for ScriptedWorld {
    fn is_air_and_dark(&self, pos: IVec3) -> bool {
        self.queries.set(self.queries.get() + 1);
        self.all_dark || self.dark.contains(&pos)
    }
}

/// Transport that keeps every sent sound.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Sent sounds, in order.
    pub sent: Vec<SoundInstance>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, sound: &SoundInstance) {
        self.sent.push(sound.clone());
    }
}

/// Particle sink that keeps every footprint.
#[derive(Debug, Default)]
pub struct RecordingParticles {
    /// Emitted footprints, in order.
    pub footprints: Vec<FootprintEvent>,
}

impl ParticleSink for RecordingParticles {
    fn emit_footprint(&mut self, footprint: &FootprintEvent) {
        self.footprints.push(*footprint);
    }
}
