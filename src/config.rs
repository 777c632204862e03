use serde::{Deserialize, Serialize};
use soundscape_audio::{
    AcousticBehavior, AcousticRegistry, AcousticSound, AcousticUnit, DelayWindow,
};
use soundscape_core::{SoundKey, SoundKeyError};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_OPTIONS_PATH: &str = "config/soundscape.toml";
pub const DEFAULT_PRIMITIVES_PATH: &str = "config/primitives.toml";
pub const DEFAULT_ACOUSTICS_PATH: &str = "config/acoustics.toml";

/// Which step events a unit answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcousticKind {
    Simple,
    Footstep,
    Swim,
    Jump,
    Splash,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcousticDefinition {
    pub name: String,
    pub kind: AcousticKind,
    pub sound: String,
    #[serde(default = "unit_scale")]
    pub volume: f32,
    #[serde(default = "unit_scale")]
    pub pitch: f32,
    #[serde(default)]
    pub delay_min: u64,
    #[serde(default)]
    pub delay_max: u64,
}

fn unit_scale() -> f32 {
    1.0
}

impl AcousticDefinition {
    pub fn to_unit(&self) -> Result<AcousticUnit, SoundKeyError> {
        let sound = AcousticSound::new(SoundKey::parse(&self.sound)?)
            .with_volume(self.volume)
            .with_pitch(self.pitch)
            .with_delay(DelayWindow::new(self.delay_min, self.delay_max));
        let behavior = match self.kind {
            AcousticKind::Simple => AcousticBehavior::Simple(sound),
            AcousticKind::Footstep => AcousticBehavior::Footstep(sound),
            AcousticKind::Swim => AcousticBehavior::Swim(sound),
            AcousticKind::Jump => AcousticBehavior::Jump(sound),
            AcousticKind::Splash => AcousticBehavior::Splash(sound),
        };
        Ok(AcousticUnit::new(self.name.clone(), behavior))
    }
}

/// Acoustic unit definitions (`[[unit]]` tables).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AcousticsConfig {
    #[serde(rename = "unit")]
    pub units: Vec<AcousticDefinition>,
}

impl AcousticsConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AcousticsConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    AcousticsConfig::default()
                }
            },
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    warn!(
                        "Acoustics config not found at {}. Using defaults",
                        path.display()
                    );
                } else {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                AcousticsConfig::default()
            }
        }
    }

    /// Register every valid unit, skipping (and logging) bad sound keys.
    pub fn register_all(&self, registry: &mut AcousticRegistry) -> usize {
        let mut registered = 0;
        for definition in &self.units {
            match definition.to_unit() {
                Ok(unit) => {
                    registry.register(unit);
                    registered += 1;
                }
                Err(err) => warn!("Skipping acoustic '{}': {err}", definition.name),
            }
        }
        registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundscape_audio::StepEvent;

    #[test]
    fn units_parse_with_defaults() {
        let cfg: AcousticsConfig = toml::from_str(
            r#"
            [[unit]]
            name = "stone"
            kind = "footstep"
            sound = "minecraft:block.stone.step"

            [[unit]]
            name = "drip"
            kind = "simple"
            sound = "dsurround:waterdrip"
            volume = 0.4
            delay_min = 2
            delay_max = 6
            "#,
        )
        .expect("valid acoustics");
        assert_eq!(cfg.units.len(), 2);
        assert_eq!(cfg.units[0].volume, 1.0);

        let drip = cfg.units[1].to_unit().expect("valid key");
        let sound = drip.sound_for(StepEvent::Land).expect("simple answers every event");
        assert_eq!(sound.delay, DelayWindow::new(2, 6));
    }

    #[test]
    fn bad_keys_are_skipped() {
        let cfg: AcousticsConfig = toml::from_str(
            r#"
            [[unit]]
            name = "broken"
            kind = "jump"
            sound = "Not A Key"

            [[unit]]
            name = "splash"
            kind = "splash"
            sound = "minecraft:entity.generic.splash"
            "#,
        )
        .expect("valid toml");
        let mut registry = AcousticRegistry::new();
        assert_eq!(cfg.register_all(&mut registry), 1);
        assert!(registry.get("splash").is_some());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AcousticsConfig::load_from_path(Path::new("/nonexistent/acoustics.toml"));
        assert!(cfg.units.is_empty());
    }
}
