//! Randomized search for dark open-air spots that trigger a one-shot ambience.

use crate::{block_center, ProbeOptions, SoundCategory, SoundInstance, WorldQuery};
use glam::IVec3;
use soundscape_core::RandomSource;
use tracing::debug;

/// Largest sampling radius honoured; larger configured values are clamped.
pub const MAX_PROBE_RADIUS: i32 = 256;

/// Result of one probe step.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Countdown still running; nothing sampled.
    Waiting,
    /// A location qualified; play this sound.
    Triggered(SoundInstance),
    /// A sample was taken and rejected.
    Missed,
}

/// Countdown-driven ambient sampler.
///
/// While the countdown is above one it only ticks down. At one, a single
/// random offset around the listener is tested per tick. A hit schedules the
/// next cycle far out; misses retry on the following tick until
/// `max_fast_retries` consecutive misses, after which the countdown backs off
/// by `retry_backoff_ticks`.
#[derive(Debug, Clone)]
pub struct AmbientProbe {
    options: ProbeOptions,
    countdown: u64,
    misses: u32,
}

impl AmbientProbe {
    /// New probe with a random initial countdown.
    pub fn new(options: ProbeOptions, rng: &mut RandomSource) -> Self {
        let countdown = rng
            .range_inclusive(options.cycle_min_ticks, options.cycle_max_ticks)
            .max(1);
        Self {
            options,
            countdown,
            misses: 0,
        }
    }

    /// Current countdown.
    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    /// Force the countdown (e.g. to probe on the next tick).
    pub fn set_countdown(&mut self, countdown: u64) {
        self.countdown = countdown.max(1);
    }

    /// Consecutive missed samples.
    pub fn misses(&self) -> u32 {
        self.misses
    }

    /// Replace tuning; the running countdown is kept.
    pub fn set_options(&mut self, options: ProbeOptions) {
        self.options = options;
    }

    /// Advance one tick.
    pub fn step(
        &mut self,
        listener: IVec3,
        world: &dyn WorldQuery,
        rng: &mut RandomSource,
    ) -> ProbeOutcome {
        if self.countdown > 1 {
            self.countdown -= 1;
            return ProbeOutcome::Waiting;
        }

        if let Some(pos) = self.sample(listener, rng) {
            if world.is_air_and_dark(pos) {
                let sound = SoundInstance::new(self.options.sound.clone(), block_center(pos))
                    .with_category(SoundCategory::Ambient)
                    .with_volume(self.options.volume)
                    .with_pitch(0.8 + rng.next_float() * 0.2);
                self.countdown = rng
                    .range_inclusive(self.options.cycle_min_ticks, self.options.cycle_max_ticks)
                    .max(1);
                self.misses = 0;
                debug!("Next ambient event: {} ticks", self.countdown);
                return ProbeOutcome::Triggered(sound);
            }
        }

        self.misses += 1;
        if self.misses > self.options.max_fast_retries {
            self.misses = 0;
            self.countdown = self.options.retry_backoff_ticks.max(1);
        } else {
            self.countdown = 1;
        }
        ProbeOutcome::Missed
    }

    fn sample(&self, listener: IVec3, rng: &mut RandomSource) -> Option<IVec3> {
        let radius = self.options.radius.min(MAX_PROBE_RADIUS);
        let delta = IVec3::new(rng.offset(radius), rng.offset(radius), rng.offset(radius));
        let distance: i64 = delta.to_array().iter().map(|&c| i64::from(c) * i64::from(c)).sum();
        (distance > i64::from(self.options.min_distance_sq)
            && distance <= i64::from(self.options.max_distance_sq))
        .then_some(listener + delta)
    }
}
