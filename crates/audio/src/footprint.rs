//! Footprint decals produced by footstep playback.

use crate::ParticleSink;
use glam::Vec3;

/// Which foot left the print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FootSide {
    /// Left foot.
    Left,
    /// Right foot.
    Right,
}

/// One footprint to hand to the particle sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintEvent {
    /// Where the print lands.
    pub location: Vec3,
    /// Yaw in degrees.
    pub rotation: f32,
    /// Decal scale.
    pub scale: f32,
    /// Foot.
    pub side: FootSide,
}

/// Footprints collected during a tick.
///
/// Flushed once per tick and cleared unconditionally; nothing survives to
/// the next tick.
#[derive(Debug, Default)]
pub struct FootprintQueue {
    events: Vec<FootprintEvent>,
}

impl FootprintQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a print.
    pub fn push(&mut self, event: FootprintEvent) {
        self.events.push(event);
    }

    /// Send queued prints to `sink` when `enabled`, then clear. Returns the
    /// number emitted.
    pub fn flush(&mut self, sink: &mut dyn ParticleSink, enabled: bool) -> usize {
        let emitted = if enabled {
            for event in &self.events {
                sink.emit_footprint(event);
            }
            self.events.len()
        } else {
            0
        };
        self.events.clear();
        emitted
    }

    /// Number of queued prints.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop queued prints without emitting.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sink(Vec<FootprintEvent>);

    impl ParticleSink for Sink {
        fn emit_footprint(&mut self, footprint: &FootprintEvent) {
            self.0.push(*footprint);
        }
    }

    fn print(side: FootSide) -> FootprintEvent {
        FootprintEvent {
            location: Vec3::new(1.0, 64.0, 1.0),
            rotation: 90.0,
            scale: 1.0,
            side,
        }
    }

    #[test]
    fn flush_emits_and_clears() {
        let mut queue = FootprintQueue::new();
        let mut sink = Sink::default();
        queue.push(print(FootSide::Left));
        queue.push(print(FootSide::Right));
        assert_eq!(queue.flush(&mut sink, true), 2);
        assert!(queue.is_empty());
        assert_eq!(sink.0[1].side, FootSide::Right);
    }

    #[test]
    fn disabled_flush_still_clears() {
        let mut queue = FootprintQueue::new();
        let mut sink = Sink::default();
        queue.push(print(FootSide::Left));
        assert_eq!(queue.flush(&mut sink, false), 0);
        assert!(queue.is_empty());
        assert!(sink.0.is_empty());
    }
}
