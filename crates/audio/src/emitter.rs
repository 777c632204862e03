//! Continuous ambient emitters and per-tick reconciliation.
//!
//! The host computes the set of ambient sounds that *should* be audible each
//! tick and hands it to [`EmitterPool::reconcile`]. Emitters already playing
//! keep their playback and only change volume; missing ones fade out; new ones
//! are created.

use crate::{PlaybackBackend, SoundCategory, SoundEffect, SoundHandle, SoundInstance, SubjectId};
use glam::Vec3;
use soundscape_core::{RandomSource, SoundKey};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Fade level lost per update while fading.
pub const FADE_STEP: f32 = 0.05;

/// Identity of an ambient sound definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub SoundKey);

impl Fingerprint {
    /// Sound behind this fingerprint.
    pub fn key(&self) -> &SoundKey {
        &self.0
    }
}

impl From<SoundKey> for Fingerprint {
    fn from(key: SoundKey) -> Self {
        Self(key)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Emitter lifecycle. `Active → Fading → Done`, with `unfade` returning a
/// fading emitter to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeState {
    /// Playing at its throttled volume.
    Active,
    /// Decaying towards silence.
    Fading,
    /// Finished; removed on the next reconciliation.
    Done,
}

impl FadeState {
    fn label(self) -> &'static str {
        match self {
            FadeState::Active => "ACTIVE",
            FadeState::Fading => "FADING",
            FadeState::Done => "DONE",
        }
    }
}

/// One continuous ambient sound tracked across ticks.
#[derive(Debug, Clone)]
pub struct EmitterRecord {
    fingerprint: Fingerprint,
    subject: SubjectId,
    throttle: f32,
    state: FadeState,
    fade_level: f32,
    started: bool,
    handle: Option<SoundHandle>,
}

impl EmitterRecord {
    /// New active emitter; playback starts on the next update.
    pub fn new(fingerprint: Fingerprint, subject: SubjectId, throttle: f32) -> Self {
        Self {
            fingerprint,
            subject,
            throttle: throttle.clamp(0.0, 1.0),
            state: FadeState::Active,
            fade_level: 1.0,
            started: false,
            handle: None,
        }
    }

    /// Fingerprint.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Subject the emitter follows.
    pub fn subject(&self) -> SubjectId {
        self.subject
    }

    /// Volume throttle in `[0, 1]`.
    pub fn throttle(&self) -> f32 {
        self.throttle
    }

    /// Fade state.
    pub fn state(&self) -> FadeState {
        self.state
    }

    /// Backend handle, once playback started. `None` for untracked playback.
    pub fn handle(&self) -> Option<SoundHandle> {
        self.handle
    }

    /// Whether the backend accepted the sound.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the emitter is fading.
    pub fn is_fading(&self) -> bool {
        self.state == FadeState::Fading
    }

    /// Set the volume throttle (clamped to `[0, 1]`).
    pub fn set_volume_throttle(&mut self, throttle: f32) {
        self.throttle = throttle.clamp(0.0, 1.0);
    }

    /// Begin fading out.
    pub fn fade(&mut self) {
        if self.state == FadeState::Active {
            self.state = FadeState::Fading;
        }
    }

    /// Cancel a fade in progress.
    pub fn unfade(&mut self) {
        if self.state == FadeState::Fading {
            self.state = FadeState::Active;
            self.fade_level = 1.0;
        }
    }

    /// Whether playback has finished, marking the record `Done` if so.
    ///
    /// Untracked playback (accepted without a handle) counts as playing until
    /// its fade runs out. A fading emitter that never started counts as
    /// finished.
    pub fn is_done_playing(&mut self, backend: &dyn PlaybackBackend) -> bool {
        let finished = match (self.state, self.handle) {
            (FadeState::Done, _) => true,
            (_, Some(handle)) => !backend.is_playing(handle),
            (FadeState::Fading, None) => !self.started,
            (FadeState::Active, None) => false,
        };
        if finished {
            self.state = FadeState::Done;
        }
        finished
    }

    /// Advance playback: start if needed, push the current volume, step the
    /// fade. A start that failed is retried on the next update.
    pub fn update(&mut self, backend: &mut dyn PlaybackBackend, listener: Vec3, volume_scale: f32) {
        match self.state {
            FadeState::Done => return,
            FadeState::Active => {
                if !self.started {
                    self.start(backend, listener, volume_scale);
                    return;
                }
            }
            FadeState::Fading => {
                self.fade_level = (self.fade_level - FADE_STEP).max(0.0);
                if self.fade_level <= 0.0 {
                    self.stop(backend);
                    return;
                }
            }
        }

        if let Some(handle) = self.handle {
            if let Err(err) = backend.set_volume(handle, self.volume(volume_scale)) {
                warn!("Unable to update emitter {}: {}", self.fingerprint, err);
            }
        }
    }

    /// Stop playback immediately and mark the record `Done`.
    pub fn stop(&mut self, backend: &mut dyn PlaybackBackend) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = backend.stop(handle) {
                warn!("Unable to stop emitter {}: {}", self.fingerprint, err);
            }
        }
        self.state = FadeState::Done;
    }

    fn volume(&self, volume_scale: f32) -> f32 {
        self.throttle * self.fade_level * volume_scale
    }

    fn start(&mut self, backend: &mut dyn PlaybackBackend, listener: Vec3, volume_scale: f32) {
        let sound = SoundInstance::new(self.fingerprint.key().clone(), listener)
            .attached_to(self.subject)
            .with_category(SoundCategory::Ambient)
            .with_volume(self.volume(volume_scale))
            .looping();
        match backend.play(&sound) {
            Ok(handle) => {
                self.started = true;
                self.handle = handle;
            }
            Err(err) => warn!("Unable to start emitter {}: {}", self.fingerprint, err),
        }
    }
}

impl fmt::Display for EmitterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] throttle={:.2} fade={:.2}",
            self.fingerprint,
            self.state.label(),
            self.throttle,
            self.fade_level
        )
    }
}

/// Emitters keyed by fingerprint.
#[derive(Debug, Default)]
pub struct EmitterPool {
    emitters: HashMap<Fingerprint, EmitterRecord>,
}

impl EmitterPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the pool against the desired fingerprint → volume set.
    ///
    /// Finished emitters are removed; desired ones keep playing with the new
    /// throttle (and stop fading); undesired ones fade; the rest of `desired`
    /// becomes new emitters owned by `subject`.
    pub fn reconcile(
        &mut self,
        mut desired: HashMap<Fingerprint, f32>,
        subject: SubjectId,
        backend: &dyn PlaybackBackend,
    ) {
        self.emitters.retain(|fingerprint, emitter| {
            if emitter.is_done_playing(backend) {
                return false;
            }
            if let Some(volume) = desired.remove(fingerprint) {
                emitter.set_volume_throttle(volume);
                if emitter.is_fading() {
                    emitter.unfade();
                }
            } else if !emitter.is_fading() {
                emitter.fade();
            }
            true
        });

        for (fingerprint, volume) in desired {
            debug!("Creating emitter {} at {:.2}", fingerprint, volume);
            self.emitters
                .insert(fingerprint.clone(), EmitterRecord::new(fingerprint, subject, volume));
        }
    }

    /// Advance every emitter once.
    pub fn update_all(&mut self, backend: &mut dyn PlaybackBackend, listener: Vec3, volume_scale: f32) {
        for emitter in self.emitters.values_mut() {
            emitter.update(backend, listener, volume_scale);
        }
    }

    /// Stop every emitter and empty the pool.
    pub fn stop_all(&mut self, backend: &mut dyn PlaybackBackend) {
        for emitter in self.emitters.values_mut() {
            emitter.stop(backend);
        }
        self.emitters.clear();
    }

    /// Emitter for `fingerprint`.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&EmitterRecord> {
        self.emitters.get(fingerprint)
    }

    /// Every emitter, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &EmitterRecord> {
        self.emitters.values()
    }

    /// Number of emitters.
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    /// True when the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }
}

/// Desired ambient set from an area survey: each sound's accumulated weight
/// over the surveyed `area` scales its volume into `[0.3, 1.0]`.
pub fn desired_from_weights(
    weights: &HashMap<Fingerprint, u32>,
    area: u32,
) -> HashMap<Fingerprint, f32> {
    if area == 0 {
        return HashMap::new();
    }
    weights
        .iter()
        .map(|(fingerprint, weight)| {
            let share = (*weight as f32 / area as f32).min(1.0);
            (fingerprint.clone(), 0.3 + 0.7 * share)
        })
        .collect()
}

/// Default one-in-N odds of a spot sound per survey.
pub const DEFAULT_SPOT_CHANCE: u32 = 1200;

/// Weighted one-shot sounds an area plays near the listener now and then.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotSoundTable {
    chance: u32,
    entries: Vec<(SoundEffect, u32)>,
    total_weight: u32,
}

impl Default for SpotSoundTable {
    fn default() -> Self {
        Self::new(DEFAULT_SPOT_CHANCE)
    }
}

impl SpotSoundTable {
    /// Empty table playing with one-in-`chance` odds. A chance of 0 or 1
    /// plays on every survey.
    pub fn new(chance: u32) -> Self {
        Self {
            chance,
            entries: Vec::new(),
            total_weight: 0,
        }
    }

    /// Add `effect` with relative `weight`. Zero weights are ignored.
    pub fn with_sound(mut self, effect: SoundEffect, weight: u32) -> Self {
        if weight > 0 {
            self.total_weight = self.total_weight.saturating_add(weight);
            self.entries.push((effect, weight));
        }
        self
    }

    /// One-in-N odds.
    pub fn chance(&self) -> u32 {
        self.chance
    }

    /// True when there is nothing to pick.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Roll the odds and, on success, pick a sound by weight.
    pub fn pick(&self, rng: &mut RandomSource) -> Option<&SoundEffect> {
        if self.entries.is_empty() || rng.next_int(self.chance) != 0 {
            return None;
        }
        let mut roll = rng.next_int(self.total_weight);
        for (effect, weight) in &self.entries {
            if roll < *weight {
                return Some(effect);
            }
            roll -= weight;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaybackError;
    use std::collections::HashSet;

    #[derive(Default)]
    struct Backend {
        next: u64,
        playing: HashSet<SoundHandle>,
        volumes: HashMap<SoundHandle, f32>,
    }

    impl Backend {
        fn finish(&mut self, handle: SoundHandle) {
            self.playing.remove(&handle);
        }
    }

    impl PlaybackBackend for Backend {
        fn play(&mut self, _sound: &SoundInstance) -> Result<Option<SoundHandle>, PlaybackError> {
            self.next += 1;
            let handle = SoundHandle(self.next);
            self.playing.insert(handle);
            Ok(Some(handle))
        }

        fn stop(&mut self, handle: SoundHandle) -> Result<(), PlaybackError> {
            self.playing.remove(&handle);
            Ok(())
        }

        fn is_playing(&self, handle: SoundHandle) -> bool {
            self.playing.contains(&handle)
        }

        fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), PlaybackError> {
            self.volumes.insert(handle, volume);
            Ok(())
        }
    }

    fn fp(name: &str) -> Fingerprint {
        Fingerprint(SoundKey::parse(name).unwrap())
    }

    fn desired(entries: &[(&str, f32)]) -> HashMap<Fingerprint, f32> {
        entries.iter().map(|(n, v)| (fp(n), *v)).collect()
    }

    const PLAYER: SubjectId = SubjectId(1);

    #[test]
    fn reconcile_updates_fades_and_creates() {
        let mut backend = Backend::default();
        let mut pool = EmitterPool::new();
        pool.reconcile(desired(&[("a", 0.5), ("b", 0.3)]), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        let a_handle = pool.get(&fp("a")).unwrap().handle().unwrap();

        pool.reconcile(desired(&[("a", 0.8), ("c", 0.2)]), PLAYER, &backend);
        let a = pool.get(&fp("a")).unwrap();
        assert_eq!(a.throttle(), 0.8);
        assert_eq!(a.state(), FadeState::Active);
        assert_eq!(a.handle(), Some(a_handle));
        assert_eq!(pool.get(&fp("b")).unwrap().state(), FadeState::Fading);
        let c = pool.get(&fp("c")).unwrap();
        assert_eq!(c.state(), FadeState::Active);
        assert_eq!(c.throttle(), 0.2);

        let b_handle = pool.get(&fp("b")).unwrap().handle().unwrap();
        backend.finish(b_handle);
        pool.reconcile(HashMap::new(), PLAYER, &backend);
        assert!(pool.get(&fp("b")).is_none());
        assert_eq!(pool.get(&fp("a")).unwrap().state(), FadeState::Fading);
    }

    #[test]
    fn reappearing_sound_unfades_without_restart() {
        let mut backend = Backend::default();
        let mut pool = EmitterPool::new();
        pool.reconcile(desired(&[("rain", 1.0)]), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        let handle = pool.get(&fp("rain")).unwrap().handle();

        pool.reconcile(HashMap::new(), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        assert!(pool.get(&fp("rain")).unwrap().is_fading());

        pool.reconcile(desired(&[("rain", 0.4)]), PLAYER, &backend);
        let rain = pool.get(&fp("rain")).unwrap();
        assert_eq!(rain.state(), FadeState::Active);
        assert_eq!(rain.handle(), handle);
        assert_eq!(backend.next, 1);
    }

    #[test]
    fn finished_active_emitter_is_recreated() {
        let mut backend = Backend::default();
        let mut pool = EmitterPool::new();
        pool.reconcile(desired(&[("wind", 0.6)]), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        let old = pool.get(&fp("wind")).unwrap().handle().unwrap();
        backend.finish(old);

        pool.reconcile(desired(&[("wind", 0.6)]), PLAYER, &backend);
        let wind = pool.get(&fp("wind")).unwrap();
        assert_eq!(wind.state(), FadeState::Active);
        assert!(wind.handle().is_none());
    }

    #[test]
    fn fading_emitter_eventually_stops() {
        let mut backend = Backend::default();
        let mut pool = EmitterPool::new();
        pool.reconcile(desired(&[("wind", 1.0)]), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        pool.reconcile(HashMap::new(), PLAYER, &backend);

        for _ in 0..25 {
            pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        }
        assert!(backend.playing.is_empty());
        pool.reconcile(HashMap::new(), PLAYER, &backend);
        assert!(pool.is_empty());
    }

    #[test]
    fn stop_all_halts_playback() {
        let mut backend = Backend::default();
        let mut pool = EmitterPool::new();
        pool.reconcile(desired(&[("a", 1.0), ("b", 1.0)]), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        assert_eq!(backend.playing.len(), 2);
        pool.stop_all(&mut backend);
        assert!(pool.is_empty());
        assert!(backend.playing.is_empty());
    }

    #[test]
    fn throttle_scales_pushed_volume() {
        let mut backend = Backend::default();
        let mut pool = EmitterPool::new();
        pool.reconcile(desired(&[("a", 0.5)]), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 0.5);
        pool.update_all(&mut backend, Vec3::ZERO, 0.5);
        let handle = pool.get(&fp("a")).unwrap().handle().unwrap();
        assert!((backend.volumes[&handle] - 0.25).abs() < 1e-6);
    }

    #[derive(Default)]
    struct Untracked {
        plays: u32,
        failures_left: u32,
    }

    impl PlaybackBackend for Untracked {
        fn play(&mut self, sound: &SoundInstance) -> Result<Option<SoundHandle>, PlaybackError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(PlaybackError::Rejected(sound.key.clone()));
            }
            self.plays += 1;
            Ok(None)
        }

        fn stop(&mut self, _handle: SoundHandle) -> Result<(), PlaybackError> {
            Ok(())
        }

        fn is_playing(&self, _handle: SoundHandle) -> bool {
            false
        }
    }

    #[test]
    fn untracked_emitter_starts_once_and_fades_out() {
        let mut backend = Untracked::default();
        let mut pool = EmitterPool::new();
        pool.reconcile(desired(&[("wind", 0.5)]), PLAYER, &backend);
        for _ in 0..20 {
            pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        }
        assert_eq!(backend.plays, 1);

        pool.reconcile(desired(&[("wind", 0.7)]), PLAYER, &backend);
        let wind = pool.get(&fp("wind")).unwrap();
        assert!(wind.is_started());
        assert_eq!(wind.state(), FadeState::Active);

        pool.reconcile(HashMap::new(), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        pool.reconcile(HashMap::new(), PLAYER, &backend);
        assert_eq!(pool.get(&fp("wind")).unwrap().state(), FadeState::Fading);

        for _ in 0..25 {
            pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        }
        pool.reconcile(HashMap::new(), PLAYER, &backend);
        assert!(pool.is_empty());
        assert_eq!(backend.plays, 1);
    }

    #[test]
    fn failed_start_is_retried() {
        let mut backend = Untracked {
            plays: 0,
            failures_left: 2,
        };
        let mut pool = EmitterPool::new();
        pool.reconcile(desired(&[("rain", 1.0)]), PLAYER, &backend);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        assert!(!pool.get(&fp("rain")).unwrap().is_started());
        for _ in 0..5 {
            pool.update_all(&mut backend, Vec3::ZERO, 1.0);
        }
        assert!(pool.get(&fp("rain")).unwrap().is_started());
        assert_eq!(backend.plays, 1);
    }

    #[test]
    fn spot_table_respects_weights_and_odds() {
        let effect = |name: &str| SoundEffect::new(SoundKey::parse(name).unwrap(), SoundCategory::Ambient);
        let table = SpotSoundTable::new(1)
            .with_sound(effect("dsurround:crickets"), 3)
            .with_sound(effect("dsurround:owl"), 1)
            .with_sound(effect("dsurround:never"), 0);
        let mut rng = RandomSource::seeded(9);
        let mut crickets = 0;
        for _ in 0..400 {
            let picked = table.pick(&mut rng).expect("chance 1 always plays");
            assert_ne!(picked.key.path(), "never");
            if picked.key.path() == "crickets" {
                crickets += 1;
            }
        }
        assert!((220..=380).contains(&crickets));

        let rare = SpotSoundTable::new(1_000_000).with_sound(effect("dsurround:owl"), 1);
        let hits = (0..100).filter(|_| rare.pick(&mut rng).is_some()).count();
        assert!(hits <= 1);
        assert!(SpotSoundTable::default().pick(&mut rng).is_none());
    }

    #[test]
    fn weights_scale_between_floor_and_one() {
        let weights: HashMap<_, _> = [(fp("forest"), 50), (fp("river"), 100)].into_iter().collect();
        let set = desired_from_weights(&weights, 100);
        assert!((set[&fp("forest")] - 0.65).abs() < 1e-6);
        assert!((set[&fp("river")] - 1.0).abs() < 1e-6);
        assert!(desired_from_weights(&weights, 0).is_empty());
    }
}
