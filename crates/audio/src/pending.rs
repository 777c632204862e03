//! Sounds scheduled to fire on a future tick.

use crate::{SoundInstance, SoundState};
use soundscape_core::{RandomSource, SimTick};
use std::fmt;
use tracing::debug;

/// Randomized delay, in ticks, applied before a sound plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DelayWindow {
    /// Smallest delay.
    pub min: u64,
    /// Largest delay; also the lateness a scheduled sound tolerates.
    pub max: u64,
}

impl DelayWindow {
    /// No delay: play immediately.
    pub const NONE: Self = Self { min: 0, max: 0 };

    /// Window `[min, max]`.
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Whether sounds using this window go through the pending queue.
    /// Both bounds must be positive; `[0, n]` plays immediately.
    pub fn is_scheduled(&self) -> bool {
        self.min > 0 && self.max > 0
    }

    /// Draw a delay: uniform in `[min, max]`, or exactly `min` when
    /// `min >= max`.
    pub fn sample(&self, rng: &mut RandomSource) -> u64 {
        rng.range_inclusive(self.min, self.max)
    }
}

/// One scheduled sound.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSoundEntry {
    /// Sound to play.
    pub sound: SoundInstance,
    /// Absolute tick at which the sound becomes due.
    pub fire_at: SimTick,
    /// Maximum ticks past `fire_at` the sound may still play.
    pub late_threshold: u64,
}

impl PendingSoundEntry {
    /// Whether the entry is due at `now`.
    pub fn is_due(&self, now: SimTick) -> bool {
        self.fire_at <= now
    }

    /// Ticks elapsed past `fire_at` (zero before it).
    pub fn lateness(&self, now: SimTick) -> u64 {
        now.since(self.fire_at)
    }

    /// Whether the entry would be dropped if drained at `now`.
    pub fn is_stale(&self, now: SimTick) -> bool {
        self.is_due(now) && self.lateness(now) > self.late_threshold
    }
}

impl fmt::Display for PendingSoundEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fire_at={}", self.sound, self.fire_at)
    }
}

/// Result of one drain pass.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Due sounds to hand to playback, in scheduling order.
    pub ready: Vec<SoundInstance>,
    /// Sounds dropped for lateness, marked [`SoundState::Error`].
    pub stale: Vec<SoundInstance>,
}

impl DrainReport {
    /// True when nothing was removed from the queue.
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty() && self.stale.is_empty()
    }
}

/// Queue of sounds waiting for their fire tick.
#[derive(Debug, Default)]
pub struct PendingSoundQueue {
    entries: Vec<PendingSoundEntry>,
}

impl PendingSoundQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `sound` with a random delay drawn from `window`.
    ///
    /// The late threshold is the window's maximum delay.
    pub fn schedule(
        &mut self,
        sound: SoundInstance,
        window: DelayWindow,
        now: SimTick,
        rng: &mut RandomSource,
    ) -> SimTick {
        let delay = window.sample(rng);
        self.schedule_after(sound, delay, window.max, now)
    }

    /// Schedule `sound` exactly `delay` ticks from `now`.
    pub fn schedule_after(
        &mut self,
        mut sound: SoundInstance,
        delay: u64,
        late_threshold: u64,
        now: SimTick,
    ) -> SimTick {
        let fire_at = now.advance(delay);
        sound.state = SoundState::Delayed;
        debug!("Scheduled {} for tick {}", sound.key, fire_at);
        self.entries.push(PendingSoundEntry {
            sound,
            fire_at,
            late_threshold,
        });
        fire_at
    }

    /// Remove every entry due at `now`.
    ///
    /// Due entries whose lateness exceeds their threshold are returned as
    /// stale instead of ready. Entries not yet due stay queued.
    pub fn drain(&mut self, now: SimTick) -> DrainReport {
        let mut report = DrainReport::default();
        if !self.entries.iter().any(|entry| entry.is_due(now)) {
            return report;
        }

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.is_due(now));
        self.entries = waiting;

        for entry in due {
            let lateness = entry.lateness(now);
            let mut sound = entry.sound;
            if lateness > entry.late_threshold {
                debug!(
                    "Dropping stale sound {} ({} ticks late, threshold {})",
                    sound.key, lateness, entry.late_threshold
                );
                sound.state = SoundState::Error;
                report.stale.push(sound);
            } else {
                report.ready.push(sound);
            }
        }
        report
    }

    /// Queued entries.
    pub fn entries(&self) -> &[PendingSoundEntry] {
        &self.entries
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use soundscape_core::SoundKey;

    fn sound(name: &str) -> SoundInstance {
        SoundInstance::new(SoundKey::parse(name).unwrap(), Vec3::ZERO)
    }

    #[test]
    fn schedule_marks_delayed_and_stays_in_window() {
        let mut rng = RandomSource::seeded(3);
        let mut queue = PendingSoundQueue::new();
        let now = SimTick(1000);
        for _ in 0..200 {
            let fire_at = queue.schedule(sound("step"), DelayWindow::new(100, 200), now, &mut rng);
            assert!(fire_at >= SimTick(1100) && fire_at <= SimTick(1200));
        }
        assert!(queue
            .entries()
            .iter()
            .all(|e| e.sound.state == SoundState::Delayed && e.late_threshold == 200));
    }

    #[test]
    fn degenerate_window_is_exact() {
        let mut rng = RandomSource::seeded(3);
        let mut queue = PendingSoundQueue::new();
        let fire_at = queue.schedule(sound("step"), DelayWindow::new(150, 150), SimTick(7), &mut rng);
        assert_eq!(fire_at, SimTick(157));
        let fire_at = queue.schedule(sound("step"), DelayWindow::new(30, 10), SimTick(7), &mut rng);
        assert_eq!(fire_at, SimTick(37));
    }

    #[test]
    fn lateness_threshold_is_inclusive() {
        let mut queue = PendingSoundQueue::new();
        queue.schedule_after(sound("late"), 0, 10, SimTick(50));
        let report = queue.drain(SimTick(61));
        assert!(report.ready.is_empty());
        assert_eq!(report.stale.len(), 1);
        assert_eq!(report.stale[0].state, SoundState::Error);
        assert!(queue.is_empty());

        queue.schedule_after(sound("on_time"), 0, 10, SimTick(50));
        let report = queue.drain(SimTick(60));
        assert_eq!(report.ready.len(), 1);
        assert!(report.stale.is_empty());
    }

    #[test]
    fn entries_not_due_remain() {
        let mut queue = PendingSoundQueue::new();
        queue.schedule_after(sound("soon"), 5, 10, SimTick(0));
        queue.schedule_after(sound("later"), 50, 10, SimTick(0));
        let report = queue.drain(SimTick(5));
        assert_eq!(report.ready.len(), 1);
        assert_eq!(report.ready[0].key.path(), "soon");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.entries()[0].sound.key.path(), "later");
    }

    #[test]
    fn drain_is_idempotent_at_same_tick() {
        let mut queue = PendingSoundQueue::new();
        queue.schedule_after(sound("a"), 2, 10, SimTick(0));
        queue.schedule_after(sound("b"), 9, 10, SimTick(0));
        let first = queue.drain(SimTick(3));
        assert_eq!(first.ready.len(), 1);
        let second = queue.drain(SimTick(3));
        assert!(second.is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn draining_empty_queue_is_noop() {
        let mut queue = PendingSoundQueue::new();
        assert!(queue.drain(SimTick(100)).is_empty());
    }

    #[test]
    fn window_scheduling_flag() {
        assert!(!DelayWindow::NONE.is_scheduled());
        assert!(!DelayWindow::new(0, 4).is_scheduled());
        assert!(!DelayWindow::new(3, 0).is_scheduled());
        assert!(DelayWindow::new(1, 4).is_scheduled());
    }
}
