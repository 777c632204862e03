//! soundscape - headless driver for the acoustic scheduling engine
//!
//! Loads sound options, acoustic units and primitive mappings, then walks a
//! listener through a scripted cave for a fixed number of ticks.

mod config;
mod demo;

use anyhow::{Context, Result};
use clap::Parser;
use config::{
    AcousticsConfig, DEFAULT_ACOUSTICS_PATH, DEFAULT_OPTIONS_PATH, DEFAULT_PRIMITIVES_PATH,
};
use glam::Vec3;
use soundscape_audio::{
    ChunkCache, Collaborators, DistributedSound, PrimitiveTable, SoundEngine, SoundOptions,
};
use soundscape_core::SoundKey;
use soundscape_testkit::{
    JsonlSink, PlaybackEvent, RecordingBackend, RecordingParticles, RecordingTransport,
    SessionSummary, SummarySink,
};
use std::path::PathBuf;
use tracing::{info, warn};

const STEP_PRIMITIVE: &str = "minecraft:block.stone.step";
const STEP_SUBSTRATE: &str = "cave";

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the soundscape acoustic engine", long_about = None)]
struct Args {
    /// Sound options (TOML)
    #[arg(long, default_value = DEFAULT_OPTIONS_PATH)]
    options: PathBuf,

    /// Acoustic unit definitions (TOML)
    #[arg(long, default_value = DEFAULT_ACOUSTICS_PATH)]
    acoustics: PathBuf,

    /// Primitive mapping table (TOML)
    #[arg(long, default_value = DEFAULT_PRIMITIVES_PATH)]
    primitives: PathBuf,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1200)]
    ticks: u64,

    /// Session seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Write every played sound as newline-delimited JSON
    #[arg(long)]
    event_log: Option<PathBuf>,

    /// Write run totals as JSON
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Print diagnostics every N ticks (0 disables)
    #[arg(long, default_value_t = 0)]
    diagnostics_every: u64,
}

fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Starting soundscape v{} (seed {seed})", env!("CARGO_PKG_VERSION"));

    let options = SoundOptions::load_from_path(&args.options);
    let acoustics = AcousticsConfig::load_from_path(&args.acoustics);
    let primitives = PrimitiveTable::load_from_path(&args.primitives);

    let io = Collaborators {
        playback: RecordingBackend::with_duration(40),
        world: ChunkCache::new(
            demo::CaveSource {
                floor: 12,
                ceiling: 30,
            },
            64,
        ),
        transport: RecordingTransport::default(),
        particles: RecordingParticles::default(),
    };
    let mut engine = SoundEngine::new(options, seed, io);
    let units = acoustics.register_all(engine.acoustics_mut());
    info!("Registered {units} acoustic units");
    engine.setup_primitives(primitives.iter());
    engine.on_connect(demo::catalogue());

    // Stand-in for a network callback delivering a server-distributed sound.
    let sender = engine.inbox_sender();
    let crafting = SoundKey::parse("dsurround:crafting").context("invalid built-in sound key")?;
    std::thread::spawn(move || {
        sender.send(DistributedSound {
            key: crafting,
            position: Vec3::new(2.5, 20.0, 0.5),
            volume: 1.0,
            pitch: 1.0,
        })
    })
    .join()
    .map_err(|_| anyhow::anyhow!("network thread panicked"))?;

    let mut sink = args
        .event_log
        .as_ref()
        .map(JsonlSink::create)
        .transpose()
        .context("failed to create event log")?;
    let mut summary = SessionSummary::default();
    let spots = demo::cave_spots();

    for tick in 0..args.ticks {
        engine.set_listener(demo::PLAYER, demo::listener_at(tick));
        engine.play_spot_sound(&spots);

        if tick % 8 == 0 {
            let acoustics = engine.acoustics_for(STEP_PRIMITIVE, Some(STEP_SUBSTRATE));
            if acoustics.is_none() {
                warn!("No acoustics for {STEP_PRIMITIVE}");
            }
            if let Some(step) = demo::step_at(tick, acoustics) {
                engine.play_association(step);
            }
        }
        if tick % 100 == 0 {
            engine.queue_ambient_sounds(demo::ambient_survey(tick));
        }
        if tick % 60 == 30 {
            let (fluid, start, hit, surface) = demo::drip_at(tick);
            engine.play_drip_impact(fluid, start, hit, surface);
        }
        if tick % 400 == 200 {
            if let Some(thunder) = demo::thunder_at(tick) {
                engine.submit(thunder);
            }
        }

        let report = engine.tick();
        summary.record(&report);

        let playback = &mut engine.collaborators_mut().playback;
        playback.advance();
        let played = playback.take_played();
        if let Some(sink) = sink.as_mut() {
            for sound in &played {
                sink.write(&PlaybackEvent::from_sound(report.tick, "play", sound))?;
            }
        }

        if args.diagnostics_every > 0 && tick % args.diagnostics_every == 0 {
            println!("-- tick {} --", report.tick);
            for line in engine.diagnostics() {
                println!("{line}");
            }
        }
    }

    let footprints = engine.collaborators().particles.footprints.len();
    engine.on_disconnect();

    if let Some(path) = &args.summary {
        SummarySink::create(path)
            .and_then(|mut sink| sink.write(&summary))
            .with_context(|| format!("failed to write summary {}", path.display()))?;
    }

    println!(
        "ticks={} played={} stale={} sent={} probe_triggers={} footprints={}",
        summary.ticks,
        summary.played,
        summary.stale,
        summary.sent,
        summary.probe_triggers,
        footprints
    );
    Ok(())
}
