//! Per-session scheduler context and tick driver.
//!
//! One [`SoundEngine`] exists per connection. The host constructs it, passes
//! it wherever sounds are requested and calls [`SoundEngine::tick`] once per
//! game tick from the owning thread.

use crate::{
    drip_impact, AcousticRegistry, AcousticSound, AmbientProbe, Association, CompiledAcoustic,
    CullTable, DelayWindow, EmitterPool, Fingerprint, Fluid, FootprintQueue, ImpactSurface,
    InboxSender, NoParticles, NoTransport, NoWorld, NullBackend, ParticleSink,
    PendingSoundQueue, PlaybackBackend, PrimitiveMap, ProbeOutcome, SoundCategory, SoundEffect,
    SoundHandle, SoundInbox, SoundInstance, SoundOptions, SoundPlayer, SoundState, SoundTables,
    SpotSoundTable, StepEvent, SubjectId, ThreadGuard, Transport, WorldQuery,
};
use glam::{IVec3, Vec3};
use soundscape_core::{RandomSource, SimTick, SoundKey};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Late threshold for sounds scheduled through [`SoundEngine::play_sound_at`].
pub const LATE_THRESHOLD_TICKS: u64 = 10;
/// Vanilla thunder identifier.
pub const VANILLA_THUNDER: &str = "minecraft:entity.lightning.thunder";
/// Vanilla thunder louder than this is remapped.
pub const THUNDER_REMAP_VOLUME: f32 = 16.0;

/// External collaborators driven by the engine.
#[derive(Debug, Default)]
pub struct Collaborators<B, W, T, P> {
    /// Audio playback.
    pub playback: B,
    /// World lookups for the ambient probe.
    pub world: W,
    /// Server replication.
    pub transport: T,
    /// Footprint particles.
    pub particles: P,
}

impl Collaborators<NullBackend, NoWorld, NoTransport, NoParticles> {
    /// Stubs for every collaborator.
    pub fn headless() -> Self {
        Self::default()
    }
}

/// Subject whose ears the engine models.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Listener {
    /// Listening subject; owns emitters and acoustic sounds.
    pub subject: SubjectId,
    /// Ear position.
    pub position: Vec3,
}

/// Verdict for a sound requested by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Interception {
    /// Play unchanged.
    Pass,
    /// Drop the sound.
    Block,
    /// Play this sound instead.
    Replace(SoundInstance),
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick that was processed.
    pub tick: SimTick,
    /// Server-distributed sounds accepted from the inbox.
    pub distributed: usize,
    /// Pending sounds handed to playback.
    pub played: usize,
    /// Pending sounds dropped for lateness.
    pub stale: usize,
    /// Sounds sent to the transport.
    pub sent: usize,
    /// Whether the ambient probe fired.
    pub probe_triggered: bool,
    /// Footprints emitted.
    pub footprints: usize,
}

/// The acoustic scheduling engine.
pub struct SoundEngine<B, W, T, P> {
    options: SoundOptions,
    rng: RandomSource,
    tick: SimTick,
    listener: Listener,
    io: Collaborators<B, W, T, P>,
    acoustics: AcousticRegistry,
    primitives: PrimitiveMap,
    catalogue: HashSet<SoundKey>,
    tables: SoundTables,
    cull: CullTable,
    pending: PendingSoundQueue,
    emitters: EmitterPool,
    probe: AmbientProbe,
    footprints: FootprintQueue,
    outgoing: Vec<SoundInstance>,
    playing: HashMap<SoundHandle, SoundKey>,
    inbox: SoundInbox,
    guard: ThreadGuard,
}

impl<B, W, T, P> SoundEngine<B, W, T, P>
where
    B: PlaybackBackend,
    W: WorldQuery,
    T: Transport,
    P: ParticleSink,
{
    /// New engine for one session. `seed` drives every random decision.
    pub fn new(options: SoundOptions, seed: u64, io: Collaborators<B, W, T, P>) -> Self {
        let mut rng = RandomSource::seeded(seed);
        let probe = AmbientProbe::new(options.probe.clone(), &mut rng);
        let cull = CullTable::new(options.cull_threshold_ticks);
        Self {
            options,
            rng,
            tick: SimTick::ZERO,
            listener: Listener::default(),
            io,
            acoustics: AcousticRegistry::new(),
            primitives: PrimitiveMap::new(),
            catalogue: HashSet::new(),
            tables: SoundTables::default(),
            cull,
            pending: PendingSoundQueue::new(),
            emitters: EmitterPool::new(),
            probe,
            footprints: FootprintQueue::new(),
            outgoing: Vec::new(),
            playing: HashMap::new(),
            inbox: SoundInbox::new(),
            guard: ThreadGuard::new("SoundEngine"),
        }
    }

    /// Run one tick: inbox, pending drain, outgoing batch, ambient probe,
    /// emitter update, footprint flush.
    pub fn tick(&mut self) -> TickReport {
        self.guard.check("tick");
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        for request in self.inbox.drain() {
            if !self.options.is_distributable(&request.key) {
                debug!("Ignoring distributed sound {}", request.key);
                continue;
            }
            let sound = SoundInstance::new(request.key, request.position)
                .with_volume(request.volume)
                .with_pitch(request.pitch)
                .with_category(SoundCategory::Neutral);
            self.play_sound(sound);
            report.distributed += 1;
        }

        let drained = self.pending.drain(self.tick);
        report.stale = drained.stale.len();
        for sound in drained.ready {
            self.play_sound(sound);
            report.played += 1;
        }

        for sound in self.outgoing.drain(..) {
            self.io.transport.send(&sound);
            report.sent += 1;
        }

        let listener_block = self.listener.position.floor().as_ivec3();
        if let ProbeOutcome::Triggered(sound) =
            self.probe.step(listener_block, &self.io.world, &mut self.rng)
        {
            debug!("Ambient probe triggered {}", sound);
            self.play_sound(sound);
            report.probe_triggered = true;
        }

        let ambient_scale = self.options.effective_ambient_volume();
        self.emitters
            .update_all(&mut self.io.playback, self.listener.position, ambient_scale);

        report.footprints = self
            .footprints
            .flush(&mut self.io.particles, self.options.enable_footprints);

        let playback = &self.io.playback;
        self.playing.retain(|handle, _| playback.is_playing(*handle));

        self.tick = self.tick.advance(1);
        report
    }

    /// Hand `sound` to playback with the category volume applied.
    ///
    /// Routed sounds join the outgoing batch when routing is enabled.
    /// Playback errors are logged and yield `None`.
    pub fn play_sound(&mut self, mut sound: SoundInstance) -> Option<SoundHandle> {
        if sound.routed && self.options.route_to_server {
            self.outgoing.push(sound.clone());
        }

        let scale = match sound.category {
            SoundCategory::Ambient => self.options.effective_ambient_volume(),
            _ => self.options.effective_sfx_volume(),
        };
        sound.volume *= scale;
        if sound.volume <= 0.0 {
            debug!("Skipping silent sound {}", sound.key);
            return None;
        }

        sound.state = SoundState::Playing;
        match self.io.playback.play(&sound) {
            Ok(handle) => {
                if let Some(handle) = handle {
                    self.playing.insert(handle, sound.key.clone());
                }
                handle
            }
            Err(err) => {
                warn!("Unable to play sound {}: {}", sound.key, err);
                None
            }
        }
    }

    /// Play a host-requested sound after interception.
    pub fn submit(&mut self, sound: SoundInstance) -> Option<SoundHandle> {
        match self.intercept(&sound) {
            Interception::Pass => self.play_sound(sound),
            Interception::Block => None,
            Interception::Replace(replacement) => self.play_sound(replacement),
        }
    }

    /// Decide what happens to a sound the host is about to play.
    ///
    /// Blocked sounds are dropped, culled sounds are rate limited, loud
    /// vanilla thunder is remapped, then the replacement table applies.
    pub fn intercept(&mut self, sound: &SoundInstance) -> Interception {
        let key = &sound.key;
        if self.tables.is_blocked(key) {
            return Interception::Block;
        }

        if self.tables.is_culled(key) && self.cull.should_suppress(key, self.tick) {
            debug!("Culled {}", key);
            return Interception::Block;
        }

        if key.to_string() == VANILLA_THUNDER {
            let thunder = &self.options.thunder_sound;
            if !self.tables.is_blocked(thunder) {
                if sound.volume > THUNDER_REMAP_VOLUME {
                    let position = sound.position.floor().as_ivec3();
                    let effect = SoundEffect::new(thunder.clone(), SoundCategory::Weather);
                    let mut remapped = effect.create_sound_at(position);
                    remapped.volume = self.options.thunder_volume;
                    return Interception::Replace(remapped);
                }
                return Interception::Pass;
            }
        }

        match self.tables.replacements.resolve(key) {
            Some(substitute) => Interception::Replace(SoundInstance {
                key: substitute.clone(),
                ..sound.clone()
            }),
            None => Interception::Pass,
        }
    }

    /// Play `effect` centred on block `pos`, after `delay` ticks if non-zero.
    ///
    /// Delayed sounds tolerate [`LATE_THRESHOLD_TICKS`] of lateness and
    /// return no handle.
    pub fn play_sound_at(&mut self, pos: IVec3, effect: &SoundEffect, delay: u64) -> Option<SoundHandle> {
        let sound = effect.create_sound_at(pos);
        if delay == 0 {
            return self.play_sound(sound);
        }
        self.pending
            .schedule_after(sound, delay, LATE_THRESHOLD_TICKS, self.tick);
        None
    }

    /// Play `effect` following the listener.
    pub fn play_sound_at_player(&mut self, effect: &SoundEffect) -> Option<SoundHandle> {
        let sound = effect.create_sound_near(self.listener.subject, self.listener.position);
        self.play_sound(sound)
    }

    /// Schedule `sound` with a random delay from `window`.
    pub fn schedule(&mut self, sound: SoundInstance, window: DelayWindow) -> SimTick {
        self.pending.schedule(sound, window, self.tick, &mut self.rng)
    }

    /// Reconcile ambient emitters against the desired fingerprint → volume
    /// set.
    pub fn queue_ambient_sounds(&mut self, desired: HashMap<Fingerprint, f32>) {
        self.emitters
            .reconcile(desired, self.listener.subject, &self.io.playback);
    }

    /// Roll `spots` and play the picked sound at the listener as ambience.
    pub fn play_spot_sound(&mut self, spots: &SpotSoundTable) -> Option<SoundHandle> {
        let mut effect = spots.pick(&mut self.rng)?.clone();
        effect.category = SoundCategory::Ambient;
        self.play_sound_at_player(&effect)
    }

    /// Play a resolved step and queue its footprint.
    pub fn play_association(&mut self, association: Association) {
        let Association {
            subject,
            position,
            event,
            acoustics,
            step_sound,
            liquid,
            footprint,
        } = association;

        match acoustics {
            Some(acoustics) => {
                debug!("Playing acoustic {} for event {:?}", acoustics.describe(), event);
                acoustics.play(self, subject, position, event);
            }
            None if !liquid => {
                if let Some(step) = step_sound {
                    self.play_acoustic_sound(subject, position, &step);
                }
            }
            None => {}
        }

        if let Some(print) = footprint {
            self.footprints.push(print);
        }
    }

    /// Play `acoustics` for `event` at `position`.
    pub fn play_acoustic(
        &mut self,
        acoustics: &CompiledAcoustic,
        subject: SubjectId,
        position: Vec3,
        event: StepEvent,
    ) {
        acoustics.play(self, subject, position, event);
    }

    /// Acoustics for a primitive, preferring its substrate variant.
    pub fn acoustics_for(&mut self, primitive: &str, substrate: Option<&str>) -> Option<CompiledAcoustic> {
        if let Some(substrate) = substrate {
            if let Some(hit) = self.primitives.get_substrate(primitive, substrate) {
                return Some(hit);
            }
        }
        self.primitives.get(primitive, &self.catalogue)
    }

    /// Compile an acoustic expression through the primitive cache.
    pub fn resolve_acoustics(&mut self, expression: &str) -> CompiledAcoustic {
        self.primitives.resolve(&self.acoustics, expression)
    }

    /// Load a primitive mapping table. Returns the number of entries
    /// registered.
    pub fn setup_primitives<'a>(&mut self, table: impl IntoIterator<Item = (&'a String, &'a String)>) -> usize {
        let registered = self.primitives.setup(&self.acoustics, table);
        info!("Registered {} primitive mappings", registered);
        registered
    }

    /// Schedule the impact sound of a drip falling from `start` onto `hit`.
    ///
    /// Returns false when the drip makes no sound.
    pub fn play_drip_impact(
        &mut self,
        fluid: Fluid,
        start: IVec3,
        hit: IVec3,
        surface: ImpactSurface,
    ) -> bool {
        let Some(impact) = drip_impact(fluid, start, hit, surface) else {
            return false;
        };
        let effect = SoundEffect::new(impact.sound, SoundCategory::Block);
        self.play_sound_at(impact.position, &effect, impact.delay);
        true
    }

    /// Start a session: clear sounds and rebuild the block, cull and
    /// replacement tables from the host's sound `catalogue`.
    pub fn on_connect(&mut self, catalogue: impl IntoIterator<Item = SoundKey>) {
        self.clear_sounds();
        self.catalogue = catalogue.into_iter().collect();
        self.rebuild_tables();
        info!(
            "Sound session connected: {} sounds, {} blocked, {} culled, {} replacements",
            self.catalogue.len(),
            self.tables.blocked.len(),
            self.tables.culled.len(),
            self.tables.replacements.len()
        );
    }

    /// End the session.
    pub fn on_disconnect(&mut self) {
        self.clear_sounds();
        info!("Sound session disconnected");
    }

    /// The listener (re)joined a world.
    pub fn on_world_join(&mut self) {
        self.clear_sounds();
    }

    /// Host registries reloaded.
    pub fn on_registry_reload(&mut self) {
        self.clear_sounds();
        self.rebuild_tables();
    }

    /// Stop every emitter and playing sound, and drop pending sounds, unsent
    /// routed sounds and queued footprints.
    pub fn clear_sounds(&mut self) {
        self.emitters.stop_all(&mut self.io.playback);
        self.pending.clear();
        self.io.playback.stop_all();
        self.playing.clear();
        self.outgoing.clear();
        self.footprints.clear();
    }

    fn rebuild_tables(&mut self) {
        self.tables = SoundTables::build(self.catalogue.iter(), &self.options);
        self.cull = CullTable::new(self.options.cull_threshold_ticks);
    }

    /// Replace the options and rebuild the session tables.
    pub fn set_options(&mut self, options: SoundOptions) {
        self.probe.set_options(options.probe.clone());
        self.options = options;
        self.rebuild_tables();
    }

    /// Move the listener.
    pub fn set_listener(&mut self, subject: SubjectId, position: Vec3) {
        self.listener = Listener { subject, position };
    }

    /// Stop a sound started through this engine.
    pub fn stop_sound(&mut self, handle: SoundHandle) {
        if let Some(key) = self.playing.remove(&handle) {
            if let Err(err) = self.io.playback.stop(handle) {
                warn!("Unable to stop sound {}: {}", key, err);
            }
        }
    }

    /// Whether a sound started through this engine is still playing.
    pub fn is_sound_playing(&self, handle: SoundHandle) -> bool {
        self.playing.contains_key(&handle) && self.io.playback.is_playing(handle)
    }

    /// Debug overlay lines: probe countdown, emitters, pending sounds.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = vec![format!("Ambiance Timer: {}", self.probe.countdown())];

        let mut emitters: Vec<_> = self
            .emitters
            .iter()
            .map(|emitter| format!("EMITTER: {emitter}"))
            .collect();
        emitters.sort();
        lines.extend(emitters);

        for entry in self.pending.entries() {
            let label = if entry.is_due(self.tick) {
                "PENDING"
            } else {
                "DELAYED"
            };
            lines.push(format!("{label}: {entry}"));
        }
        lines
    }

    /// Producer handle for server-distributed sounds.
    pub fn inbox_sender(&self) -> InboxSender {
        self.inbox.sender()
    }

    /// Current tick.
    pub fn current_tick(&self) -> SimTick {
        self.tick
    }

    /// Current options.
    pub fn options(&self) -> &SoundOptions {
        &self.options
    }

    /// Current listener.
    pub fn listener(&self) -> Listener {
        self.listener
    }

    /// Acoustic unit registry.
    pub fn acoustics(&self) -> &AcousticRegistry {
        &self.acoustics
    }

    /// Mutable acoustic unit registry.
    pub fn acoustics_mut(&mut self) -> &mut AcousticRegistry {
        &mut self.acoustics
    }

    /// Sounds known to the host this session.
    pub fn catalogue(&self) -> &HashSet<SoundKey> {
        &self.catalogue
    }

    /// Session tables.
    pub fn tables(&self) -> &SoundTables {
        &self.tables
    }

    /// Pending queue.
    pub fn pending(&self) -> &PendingSoundQueue {
        &self.pending
    }

    /// Emitter pool.
    pub fn emitters(&self) -> &EmitterPool {
        &self.emitters
    }

    /// Ambient probe.
    pub fn probe(&self) -> &AmbientProbe {
        &self.probe
    }

    /// Mutable ambient probe.
    pub fn probe_mut(&mut self) -> &mut AmbientProbe {
        &mut self.probe
    }

    /// Footprints queued for the next flush.
    pub fn footprints(&self) -> &FootprintQueue {
        &self.footprints
    }

    /// Sounds waiting to be sent to the server.
    pub fn outgoing(&self) -> &[SoundInstance] {
        &self.outgoing
    }

    /// Collaborators.
    pub fn collaborators(&self) -> &Collaborators<B, W, T, P> {
        &self.io
    }

    /// Mutable collaborators.
    pub fn collaborators_mut(&mut self) -> &mut Collaborators<B, W, T, P> {
        &mut self.io
    }
}

impl<B, W, T, P> SoundPlayer for SoundEngine<B, W, T, P>
where
    B: PlaybackBackend,
    W: WorldQuery,
    T: Transport,
    P: ParticleSink,
{
    fn play_acoustic_sound(&mut self, subject: SubjectId, position: Vec3, sound: &AcousticSound) {
        let instance = SoundInstance::new(sound.sound.clone(), position)
            .attached_to(subject)
            .with_volume(sound.volume)
            .with_pitch(sound.pitch)
            .with_category(SoundCategory::Player);
        if sound.delay.is_scheduled() {
            self.schedule(instance, sound.delay);
        } else {
            self.play_sound(instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SoundKey {
        SoundKey::parse(s).unwrap()
    }

    fn engine() -> SoundEngine<NullBackend, NoWorld, NoTransport, NoParticles> {
        let mut engine = SoundEngine::new(SoundOptions::default(), 7, Collaborators::headless());
        engine.on_connect([
            key("entity.arrow.shoot"),
            key("entity.lightning.thunder"),
            key("dsurround:bow.loose"),
            key("dsurround:thunder"),
        ]);
        engine
    }

    #[test]
    fn ticks_advance() {
        let mut engine = engine();
        assert_eq!(engine.tick().tick, SimTick(0));
        assert_eq!(engine.tick().tick, SimTick(1));
        assert_eq!(engine.current_tick(), SimTick(2));
    }

    #[test]
    fn shoot_sounds_are_replaced() {
        let mut engine = engine();
        let sound = SoundInstance::new(key("entity.arrow.shoot"), Vec3::ZERO);
        match engine.intercept(&sound) {
            Interception::Replace(replaced) => assert_eq!(replaced.key, key("dsurround:bow.loose")),
            other => panic!("expected replacement, got {other:?}"),
        }
    }

    #[test]
    fn loud_thunder_is_remapped() {
        let mut engine = engine();
        let loud = SoundInstance::new(key("entity.lightning.thunder"), Vec3::new(3.2, 70.0, -4.5))
            .with_volume(10000.0);
        match engine.intercept(&loud) {
            Interception::Replace(thunder) => {
                assert_eq!(thunder.key, key("dsurround:thunder"));
                assert_eq!(thunder.volume, 10000.0);
                assert_eq!(thunder.category, SoundCategory::Weather);
                assert_eq!(thunder.position, Vec3::new(3.5, 70.5, -4.5));
            }
            other => panic!("expected remap, got {other:?}"),
        }

        let quiet = SoundInstance::new(key("entity.lightning.thunder"), Vec3::ZERO).with_volume(2.0);
        assert_eq!(engine.intercept(&quiet), Interception::Pass);
    }

    #[test]
    fn delayed_play_goes_through_pending_queue() {
        let mut engine = engine();
        let effect = SoundEffect::new(key("dsurround:waterdrops"), SoundCategory::Block);
        assert!(engine.play_sound_at(IVec3::new(1, 2, 3), &effect, 5).is_none());
        assert_eq!(engine.pending().len(), 1);
        assert_eq!(engine.pending().entries()[0].late_threshold, LATE_THRESHOLD_TICKS);
        for _ in 0..6 {
            engine.tick();
        }
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn diagnostics_start_with_timer() {
        let mut engine = engine();
        engine.probe_mut().set_countdown(42);
        let effect = SoundEffect::new(key("dsurround:waterdrops"), SoundCategory::Block);
        engine.play_sound_at(IVec3::ZERO, &effect, 3);
        let lines = engine.diagnostics();
        assert_eq!(lines[0], "Ambiance Timer: 42");
        assert!(lines[1].starts_with("DELAYED: dsurround:waterdrops"));
    }
}
