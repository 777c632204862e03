//! Sound engine options and volume controls.

use serde::{Deserialize, Serialize};
use soundscape_core::SoundKey;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors from strict option loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("failed to read sound options: {0}")]
    Io(#[from] std::io::Error),
    /// The TOML was malformed.
    #[error("failed to parse sound options: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tuning for the randomized ambient probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeOptions {
    /// Sound played at a qualifying location.
    pub sound: SoundKey,
    /// Half-width of the sampled cube around the listener.
    pub radius: i32,
    /// Squared distances at or below this are rejected.
    pub min_distance_sq: i32,
    /// Squared distances above this are rejected.
    pub max_distance_sq: i32,
    /// Shortest countdown after a successful probe.
    pub cycle_min_ticks: u64,
    /// Longest countdown after a successful probe.
    pub cycle_max_ticks: u64,
    /// Consecutive failed samples retried on the next tick.
    pub max_fast_retries: u32,
    /// Countdown applied once fast retries are exhausted.
    pub retry_backoff_ticks: u64,
    /// Volume of the probe sound.
    pub volume: f32,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            sound: SoundKey::parse("minecraft:ambient.cave").expect("built-in sound key is valid"),
            radius: 15,
            min_distance_sq: 4,
            max_distance_sq: 255,
            cycle_min_ticks: 6000,
            cycle_max_ticks: 17999,
            max_fast_retries: 20,
            retry_backoff_ticks: 100,
            volume: 0.9,
        }
    }
}

/// Engine options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundOptions {
    /// Master volume (0.0 to 1.0)
    pub master: f32,
    /// Sound effects volume (0.0 to 1.0)
    pub sfx: f32,
    /// Ambient sounds volume (0.0 to 1.0)
    pub ambient: f32,
    /// Whether audio is muted
    pub muted: bool,
    /// Cull cooldown in ticks; 0 disables culling.
    pub cull_threshold_ticks: u64,
    /// Sounds subject to culling.
    pub culled_sounds: Vec<String>,
    /// Sounds that never play.
    pub blocked_sounds: Vec<String>,
    /// Whether footprints are handed to the particle sink.
    pub enable_footprints: bool,
    /// Whether routed sounds are replicated to the server.
    pub route_to_server: bool,
    /// Sound vanilla thunder is remapped to.
    pub thunder_sound: SoundKey,
    /// Volume of remapped thunder.
    pub thunder_volume: f32,
    /// Sounds the server may ask this client to play.
    pub distributed_sounds: Vec<String>,
    /// Ambient probe tuning.
    pub probe: ProbeOptions,
}

impl Default for SoundOptions {
    fn default() -> Self {
        Self {
            master: 1.0,
            sfx: 1.0,
            ambient: 0.7,
            muted: false,
            cull_threshold_ticks: 20,
            culled_sounds: Vec::new(),
            blocked_sounds: Vec::new(),
            enable_footprints: true,
            route_to_server: false,
            thunder_sound: SoundKey::parse("dsurround:thunder").expect("built-in sound key is valid"),
            thunder_volume: 10000.0,
            distributed_sounds: vec!["dsurround:crafting".to_string()],
            probe: ProbeOptions::default(),
        }
    }
}

impl SoundOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from TOML.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load options from `path`, returning errors to the caller.
    pub fn load_strict(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load options from `path`, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match Self::load_strict(path) {
            Ok(options) => options,
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!("Sound options not found at {}. Using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                warn!("{err} ({}). Using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Get the effective SFX volume (master * sfx).
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master * self.sfx
        }
    }

    /// Get the effective ambient volume (master * ambient).
    pub fn effective_ambient_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master * self.ambient
        }
    }

    /// Toggle mute state.
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Set master volume (clamped to 0.0-1.0).
    pub fn set_master(&mut self, volume: f32) {
        self.master = volume.clamp(0.0, 1.0);
    }

    /// Set SFX volume (clamped to 0.0-1.0).
    pub fn set_sfx(&mut self, volume: f32) {
        self.sfx = volume.clamp(0.0, 1.0);
    }

    /// Set ambient volume (clamped to 0.0-1.0).
    pub fn set_ambient(&mut self, volume: f32) {
        self.ambient = volume.clamp(0.0, 1.0);
    }

    /// Whether the server may ask for `key` to be played.
    pub fn is_distributable(&self, key: &SoundKey) -> bool {
        self.distributed_sounds
            .iter()
            .any(|entry| SoundKey::parse(entry).is_ok_and(|allowed| &allowed == key))
    }
}

/// Primitive name → acoustic expression pairs, loaded from a TOML table.
///
/// Keys usually contain `:` and `.`, so they are quoted in the file:
/// `"minecraft:block.stone.step" = "stone,gravel"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimitiveTable {
    /// Mapping entries.
    pub entries: BTreeMap<String, String>,
}

impl PrimitiveTable {
    /// Parse a table from TOML.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load a table from `path`, returning errors to the caller.
    pub fn load_strict(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load a table from `path`, falling back to an empty table on errors.
    pub fn load_from_path(path: &Path) -> Self {
        Self::load_strict(path).unwrap_or_else(|err| {
            warn!("{err} ({}). No primitive mappings loaded", path.display());
            Self::default()
        })
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
