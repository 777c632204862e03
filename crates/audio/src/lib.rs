#![warn(missing_docs)]
//! Acoustic scheduling engine for soundscape.
//!
//! Resolves symbolic acoustic expressions into playable units, schedules
//! delayed sounds, throttles retriggers, and keeps continuous ambient
//! emitters in step with the desired ambient set. Mixing, attenuation and
//! asset loading belong to the host's sound engine, driven through
//! [`PlaybackBackend`].
//!
//! # Architecture
//!
//! - [`SoundEngine`] - Per-session context and tick driver
//! - [`AcousticRegistry`] / [`PrimitiveMap`] - Expression compilation and caching
//! - [`PendingSoundQueue`] - Sounds waiting for their fire tick
//! - [`CullTable`] / [`SoundTables`] - Retrigger suppression, block list, substitutions
//! - [`EmitterPool`] - Reconciled ambient loops with fade out
//! - [`AmbientProbe`] - Randomized dark-spot ambience
//!
//! # Example
//!
//! ```ignore
//! let mut engine = SoundEngine::new(SoundOptions::default(), seed, Collaborators::headless());
//! engine.on_connect(catalogue);
//! loop {
//!     engine.tick();
//! }
//! ```

mod acoustic;
mod ambient;
mod backend;
mod cull;
mod drip;
mod emitter;
mod engine;
mod footprint;
mod footsteps;
mod inbox;
mod pending;
mod primitive_map;
mod replacement;
mod settings;
mod sound;
mod thread_guard;
mod world_cache;

pub use acoustic::{
    AcousticBehavior, AcousticRegistry, AcousticSound, AcousticUnit, Compilation, CompiledAcoustic,
    SoundPlayer, StepEvent, MESSY_GROUND, NOT_EMITTER,
};
pub use ambient::{AmbientProbe, ProbeOutcome, MAX_PROBE_RADIUS};
pub use backend::{
    NoParticles, NoTransport, NoWorld, NullBackend, ParticleSink, PlaybackBackend, PlaybackError,
    SoundHandle, Transport, WorldQuery,
};
pub use cull::CullTable;
pub use drip::{drip_impact, DripImpact, Fluid, ImpactSurface, STEAM_HISS, WATER_DRIP, WATER_DROPS};
pub use emitter::{
    desired_from_weights, EmitterPool, EmitterRecord, FadeState, Fingerprint, SpotSoundTable,
    DEFAULT_SPOT_CHANCE, FADE_STEP,
};
pub use engine::{
    Collaborators, Interception, Listener, SoundEngine, TickReport, LATE_THRESHOLD_TICKS,
    THUNDER_REMAP_VOLUME, VANILLA_THUNDER,
};
pub use footprint::{FootSide, FootprintEvent, FootprintQueue};
pub use footsteps::Association;
pub use inbox::{DistributedSound, InboxSender, SoundInbox};
pub use pending::{DelayWindow, DrainReport, PendingSoundEntry, PendingSoundQueue};
pub use primitive_map::{AcousticError, PrimitiveMap};
pub use replacement::{default_substitutions, ReplacementTable, SoundTables, BOW_LOOSE};
pub use settings::{ConfigError, PrimitiveTable, ProbeOptions, SoundOptions};
pub use sound::{block_center, SoundCategory, SoundEffect, SoundInstance, SoundState, SubjectId};
pub use thread_guard::ThreadGuard;
pub use world_cache::{ChunkCache, ChunkCoord, ChunkSource, ChunkView, CHUNK_WIDTH};
