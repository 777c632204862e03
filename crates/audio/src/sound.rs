//! Sound instances, effects and their playback state.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use soundscape_core::SoundKey;
use std::fmt;

/// Opaque reference to a world subject (player or other entity).
///
/// Emitters and footstep sounds hold this id instead of the subject itself,
/// so nothing in the engine keeps a subject alive.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SubjectId(pub u64);

/// Mixer category a sound is played under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SoundCategory {
    /// Environmental ambience (emitters, cave probe).
    Ambient,
    /// Block interactions (drips, steps on blocks).
    Block,
    /// Player-originated sounds (footsteps, swings).
    #[default]
    Player,
    /// Weather (thunder, rain).
    Weather,
    /// Anything else.
    Neutral,
}

/// Lifecycle of a single sound instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SoundState {
    /// Created but not handed to playback.
    #[default]
    None,
    /// Waiting in the pending queue.
    Delayed,
    /// Accepted by the playback backend.
    Playing,
    /// Finished or stopped.
    Done,
    /// Dropped without playing (e.g. became stale in the pending queue).
    Error,
}

impl SoundState {
    /// Upper-case label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            SoundState::None => "NONE",
            SoundState::Delayed => "DELAYED",
            SoundState::Playing => "PLAYING",
            SoundState::Done => "DONE",
            SoundState::Error => "ERROR",
        }
    }
}

/// A concrete request to play one sound at one place.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundInstance {
    /// Sound identifier.
    pub key: SoundKey,
    /// World position of the sound.
    pub position: Vec3,
    /// Subject the sound follows, if any.
    pub subject: Option<SubjectId>,
    /// Volume (0.0 to 1.0 for most sounds; thunder may exceed 1.0).
    pub volume: f32,
    /// Pitch multiplier.
    pub pitch: f32,
    /// Mixer category.
    pub category: SoundCategory,
    /// Whether the sound should be replicated to the server when played.
    pub routed: bool,
    /// Whether the backend should loop the sound until stopped.
    pub looping: bool,
    /// Current lifecycle state.
    pub state: SoundState,
}

impl SoundInstance {
    /// Create a one-shot sound at `position` with unit volume and pitch.
    pub fn new(key: SoundKey, position: Vec3) -> Self {
        Self {
            key,
            position,
            subject: None,
            volume: 1.0,
            pitch: 1.0,
            category: SoundCategory::default(),
            routed: false,
            looping: false,
            state: SoundState::None,
        }
    }

    /// Set the volume.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.max(0.0);
        self
    }

    /// Set the pitch.
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Set the mixer category.
    pub fn with_category(mut self, category: SoundCategory) -> Self {
        self.category = category;
        self
    }

    /// Attach the sound to a subject.
    pub fn attached_to(mut self, subject: SubjectId) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Mark the sound for server replication.
    pub fn routed(mut self) -> Self {
        self.routed = true;
        self
    }

    /// Mark the sound as looping.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }
}

impl fmt::Display for SoundInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @({:.1}, {:.1}, {:.1}) v={:.2} p={:.2} [{}]",
            self.key,
            self.position.x,
            self.position.y,
            self.position.z,
            self.volume,
            self.pitch,
            self.state.label()
        )
    }
}

/// Reusable sound definition from which instances are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEffect {
    /// Sound identifier.
    pub key: SoundKey,
    /// Base volume.
    pub volume: f32,
    /// Base pitch.
    pub pitch: f32,
    /// Mixer category.
    pub category: SoundCategory,
    /// Whether instances are replicated to the server.
    pub routed: bool,
}

impl SoundEffect {
    /// Effect with unit volume/pitch in the given category.
    pub fn new(key: SoundKey, category: SoundCategory) -> Self {
        Self {
            key,
            volume: 1.0,
            pitch: 1.0,
            category,
            routed: false,
        }
    }

    /// Instance centred in the block at `pos`.
    pub fn create_sound_at(&self, pos: IVec3) -> SoundInstance {
        self.instance(block_center(pos))
    }

    /// Instance following `subject` at its current `position`.
    pub fn create_sound_near(&self, subject: SubjectId, position: Vec3) -> SoundInstance {
        self.instance(position).attached_to(subject)
    }

    fn instance(&self, position: Vec3) -> SoundInstance {
        SoundInstance {
            routed: self.routed,
            ..SoundInstance::new(self.key.clone(), position)
                .with_volume(self.volume)
                .with_pitch(self.pitch)
                .with_category(self.category)
        }
    }
}

/// Centre of the block containing `pos`.
pub fn block_center(pos: IVec3) -> Vec3 {
    pos.as_vec3() + Vec3::splat(0.5)
}
