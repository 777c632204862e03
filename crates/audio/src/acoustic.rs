//! Acoustic units and the registry that compiles symbolic expressions.
//!
//! An acoustic expression is a comma-separated list of unit names, e.g.
//! `"stone_step,gravel_crunch"`. Compiling resolves every fragment against the
//! registry. Unknown fragments are skipped with a warning; compilation itself
//! never fails.

use crate::{DelayWindow, SubjectId};
use glam::Vec3;
use soundscape_core::SoundKey;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::warn;

/// Reserved literal: the block never makes a step sound.
pub const NOT_EMITTER: &str = "NOT_EMITTER";
/// Reserved literal: the block uses the "messy ground" overlay.
pub const MESSY_GROUND: &str = "MESSY_GROUND";

/// Movement event that triggers acoustic playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepEvent {
    /// Regular walking step.
    Walk,
    /// Slow idle shuffle.
    Wander,
    /// Sprinting step.
    Run,
    /// Stroke while swimming.
    Swim,
    /// Leaving the ground.
    Jump,
    /// Hitting the ground.
    Land,
}

/// The sound an acoustic unit plays.
#[derive(Debug, Clone, PartialEq)]
pub struct AcousticSound {
    /// Sound identifier handed to playback.
    pub sound: SoundKey,
    /// Volume.
    pub volume: f32,
    /// Pitch.
    pub pitch: f32,
    /// Optional randomized delay before the sound plays.
    pub delay: DelayWindow,
}

impl AcousticSound {
    /// Immediate sound with unit volume and pitch.
    pub fn new(sound: SoundKey) -> Self {
        Self {
            sound,
            volume: 1.0,
            pitch: 1.0,
            delay: DelayWindow::NONE,
        }
    }

    /// Set volume.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Set pitch.
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Set the delay window.
    pub fn with_delay(mut self, delay: DelayWindow) -> Self {
        self.delay = delay;
        self
    }
}

/// Behaviour attached to a unit. Dispatch happens in [`AcousticUnit::play`].
#[derive(Debug, Clone, PartialEq)]
pub enum AcousticBehavior {
    /// Plays on every event.
    Simple(AcousticSound),
    /// Plays on walking/running steps.
    Footstep(AcousticSound),
    /// Plays on swim strokes.
    Swim(AcousticSound),
    /// Plays when jumping.
    Jump(AcousticSound),
    /// Plays when landing.
    Splash(AcousticSound),
    /// Reserved marker unit; never plays.
    Sentinel,
}

/// Smallest playable behaviour, referenced by name.
#[derive(Debug, Clone, PartialEq)]
pub struct AcousticUnit {
    name: String,
    behavior: AcousticBehavior,
}

/// Receiver for the sounds an acoustic unit decides to play.
pub trait SoundPlayer {
    /// Play (or schedule, if `sound.delay` is set) one acoustic sound.
    fn play_acoustic_sound(&mut self, subject: SubjectId, position: Vec3, sound: &AcousticSound);
}

impl AcousticUnit {
    /// Create a unit.
    pub fn new(name: impl Into<String>, behavior: AcousticBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
        }
    }

    fn sentinel(name: &str) -> Self {
        Self::new(name, AcousticBehavior::Sentinel)
    }

    /// Unit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit behaviour.
    pub fn behavior(&self) -> &AcousticBehavior {
        &self.behavior
    }

    /// Sound for `event`, if this unit responds to it.
    pub fn sound_for(&self, event: StepEvent) -> Option<&AcousticSound> {
        use AcousticBehavior::*;
        match (&self.behavior, event) {
            (Simple(sound), _) => Some(sound),
            (Footstep(sound), StepEvent::Walk | StepEvent::Wander | StepEvent::Run) => Some(sound),
            (Swim(sound), StepEvent::Swim) => Some(sound),
            (Jump(sound), StepEvent::Jump) => Some(sound),
            (Splash(sound), StepEvent::Land) => Some(sound),
            _ => None,
        }
    }

    /// Play this unit for `event`.
    pub fn play(
        &self,
        player: &mut dyn SoundPlayer,
        subject: SubjectId,
        position: Vec3,
        event: StepEvent,
    ) {
        if let Some(sound) = self.sound_for(event) {
            player.play_acoustic_sound(subject, position, sound);
        }
    }
}

/// Ordered, possibly empty sequence of resolved units.
///
/// Cloning is cheap (shared slice). Sentinel and empty results are process
/// wide singletons, so [`CompiledAcoustic::ptr_eq`] holds across calls.
#[derive(Debug, Clone)]
pub struct CompiledAcoustic(Arc<[Arc<AcousticUnit>]>);

static EMPTY: OnceLock<CompiledAcoustic> = OnceLock::new();
static NOT_EMITTER_UNITS: OnceLock<CompiledAcoustic> = OnceLock::new();
static MESSY_GROUND_UNITS: OnceLock<CompiledAcoustic> = OnceLock::new();

impl CompiledAcoustic {
    /// Shared empty sequence.
    pub fn empty() -> Self {
        EMPTY.get_or_init(|| Self(Arc::from(Vec::new()))).clone()
    }

    /// Shared `NOT_EMITTER` sequence.
    pub fn not_emitter() -> Self {
        NOT_EMITTER_UNITS
            .get_or_init(|| Self::from_units(vec![Arc::new(AcousticUnit::sentinel(NOT_EMITTER))]))
            .clone()
    }

    /// Shared `MESSY_GROUND` sequence.
    pub fn messy_ground() -> Self {
        MESSY_GROUND_UNITS
            .get_or_init(|| Self::from_units(vec![Arc::new(AcousticUnit::sentinel(MESSY_GROUND))]))
            .clone()
    }

    fn from_units(units: Vec<Arc<AcousticUnit>>) -> Self {
        Self(Arc::from(units))
    }

    /// Resolved units in expression order.
    pub fn units(&self) -> &[Arc<AcousticUnit>] {
        &self.0
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing resolved.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identity comparison (same shared sequence).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// True for the `NOT_EMITTER` singleton.
    pub fn is_not_emitter(&self) -> bool {
        self.ptr_eq(&Self::not_emitter())
    }

    /// True for the `MESSY_GROUND` singleton.
    pub fn is_messy_ground(&self) -> bool {
        self.ptr_eq(&Self::messy_ground())
    }

    /// Comma-joined unit names, as used in debug logging.
    pub fn describe(&self) -> String {
        self.0
            .iter()
            .map(|unit| unit.name())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Play every unit in order.
    pub fn play(
        &self,
        player: &mut dyn SoundPlayer,
        subject: SubjectId,
        position: Vec3,
        event: StepEvent,
    ) {
        for unit in self.0.iter() {
            unit.play(player, subject, position, event);
        }
    }
}

/// Result of compiling one expression.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Compiled sequence.
    pub acoustic: CompiledAcoustic,
    /// Fragments that did not resolve.
    pub unresolved: Vec<String>,
}

/// Name → unit map.
#[derive(Debug, Default)]
pub struct AcousticRegistry {
    units: HashMap<String, Arc<AcousticUnit>>,
    generation: u64,
}

impl AcousticRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit. A unit with the same name is replaced.
    pub fn register(&mut self, unit: AcousticUnit) {
        self.units.insert(unit.name.clone(), Arc::new(unit));
        self.generation += 1;
    }

    /// Look up a unit by name.
    pub fn get(&self, name: &str) -> Option<&Arc<AcousticUnit>> {
        self.units.get(name)
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Drop every unit.
    pub fn clear(&mut self) {
        self.units.clear();
        self.generation += 1;
    }

    /// Bumped on every change; compiled results from an older generation
    /// may be stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Compile an expression, logging one warning per unresolved fragment.
    pub fn compile(&self, expression: &str) -> CompiledAcoustic {
        let compilation = self.compile_with_report(expression);
        for fragment in &compilation.unresolved {
            warn!("Acoustic '{}' not found!", fragment);
        }
        compilation.acoustic
    }

    /// Compile an expression and report unresolved fragments instead of logging.
    pub fn compile_with_report(&self, expression: &str) -> Compilation {
        match expression {
            NOT_EMITTER => {
                return Compilation {
                    acoustic: CompiledAcoustic::not_emitter(),
                    unresolved: Vec::new(),
                }
            }
            MESSY_GROUND => {
                return Compilation {
                    acoustic: CompiledAcoustic::messy_ground(),
                    unresolved: Vec::new(),
                }
            }
            _ => {}
        }

        let mut units = Vec::new();
        let mut unresolved = Vec::new();
        for fragment in expression.split(',').filter(|fragment| !fragment.is_empty()) {
            match self.units.get(fragment) {
                Some(unit) => units.push(Arc::clone(unit)),
                None => unresolved.push(fragment.to_string()),
            }
        }

        let acoustic = if units.is_empty() {
            CompiledAcoustic::empty()
        } else {
            CompiledAcoustic::from_units(units)
        };
        Compilation {
            acoustic,
            unresolved,
        }
    }
}
