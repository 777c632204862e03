//! Per-sound retrigger suppression.

use soundscape_core::{SimTick, SoundKey};
use std::collections::HashMap;

/// Rate limiter keyed by sound identifier.
///
/// The cooldown window is anchored to the last trigger that was allowed
/// through; suppressed attempts do not extend it.
#[derive(Debug, Default)]
pub struct CullTable {
    cooldown: u64,
    last_trigger: HashMap<SoundKey, SimTick>,
}

impl CullTable {
    /// Table with a cooldown in ticks. Zero disables culling.
    pub fn new(cooldown: u64) -> Self {
        Self {
            cooldown,
            last_trigger: HashMap::new(),
        }
    }

    /// Configured cooldown.
    pub fn cooldown(&self) -> u64 {
        self.cooldown
    }

    /// Change the cooldown. Existing anchors are kept.
    pub fn set_cooldown(&mut self, cooldown: u64) {
        self.cooldown = cooldown;
    }

    /// Whether a trigger of `key` at `now` should be suppressed.
    pub fn should_suppress(&mut self, key: &SoundKey, now: SimTick) -> bool {
        if self.cooldown == 0 {
            return false;
        }

        match self.last_trigger.get_mut(key) {
            None => {
                self.last_trigger.insert(key.clone(), now);
                false
            }
            Some(last) if now.since(*last) < self.cooldown => true,
            Some(last) => {
                *last = now;
                false
            }
        }
    }

    /// Tick of the last allowed trigger of `key`.
    pub fn last_trigger(&self, key: &SoundKey) -> Option<SimTick> {
        self.last_trigger.get(key).copied()
    }

    /// Forget every anchor.
    pub fn clear(&mut self) {
        self.last_trigger.clear();
    }

    /// Number of tracked identifiers.
    pub fn len(&self) -> usize {
        self.last_trigger.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.last_trigger.is_empty()
    }
}
