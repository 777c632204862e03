//! Per-session block list, cull list and sound substitutions.

use crate::SoundOptions;
use soundscape_core::SoundKey;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Replacement used for both vanilla "shoot" sounds.
pub const BOW_LOOSE: &str = "dsurround:bow.loose";

/// Hard-coded substitutions applied every session.
pub fn default_substitutions() -> Vec<(SoundKey, SoundKey)> {
    let parse = |s: &str| SoundKey::parse(s).expect("built-in sound keys are valid");
    vec![
        (parse("minecraft:entity.arrow.shoot"), parse(BOW_LOOSE)),
        (parse("minecraft:entity.skeleton.shoot"), parse(BOW_LOOSE)),
    ]
}

/// Maps sound identifiers to substitute identifiers.
#[derive(Debug, Default, Clone)]
pub struct ReplacementTable {
    map: HashMap<SoundKey, SoundKey>,
}

impl ReplacementTable {
    /// Build from `substitutions`, skipping any whose target is blocked.
    pub fn build(
        blocked: &HashSet<SoundKey>,
        substitutions: impl IntoIterator<Item = (SoundKey, SoundKey)>,
    ) -> Self {
        let mut map = HashMap::new();
        for (from, to) in substitutions {
            if blocked.contains(&to) {
                debug!("Skipping replacement {} -> {}: target is blocked", from, to);
                continue;
            }
            map.insert(from, to);
        }
        Self { map }
    }

    /// Substitute for `key`, if any.
    pub fn resolve(&self, key: &SoundKey) -> Option<&SoundKey> {
        self.map.get(key)
    }

    /// Number of substitutions.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when there are no substitutions.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Lookup tables rebuilt whenever a session connects or registries reload.
#[derive(Debug, Default, Clone)]
pub struct SoundTables {
    /// Sounds that never play.
    pub blocked: HashSet<SoundKey>,
    /// Sounds subject to the cull table.
    pub culled: HashSet<SoundKey>,
    /// Substitutions.
    pub replacements: ReplacementTable,
}

impl SoundTables {
    /// Build tables for the sounds the host knows about (`catalogue`).
    ///
    /// A sound both blocked and culled is treated as blocked.
    pub fn build<'a>(catalogue: impl IntoIterator<Item = &'a SoundKey>, options: &SoundOptions) -> Self {
        let configured_blocked = parse_list("blocked", &options.blocked_sounds);
        let configured_culled = parse_list("culled", &options.culled_sounds);

        let mut blocked = HashSet::new();
        let mut culled = HashSet::new();
        for key in catalogue {
            if configured_blocked.contains(key) {
                blocked.insert(key.clone());
            } else if configured_culled.contains(key) {
                culled.insert(key.clone());
            }
        }

        let replacements = ReplacementTable::build(&blocked, default_substitutions());
        Self {
            blocked,
            culled,
            replacements,
        }
    }

    /// Whether `key` is blocked.
    pub fn is_blocked(&self, key: &SoundKey) -> bool {
        self.blocked.contains(key)
    }

    /// Whether `key` goes through the cull table.
    pub fn is_culled(&self, key: &SoundKey) -> bool {
        self.culled.contains(key)
    }
}

fn parse_list(label: &str, raw: &[String]) -> HashSet<SoundKey> {
    raw.iter()
        .filter_map(|entry| match SoundKey::parse(entry) {
            Ok(key) => Some(key),
            Err(err) => {
                warn!("Ignoring {} sound entry '{}': {}", label, entry, err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SoundKey {
        SoundKey::parse(s).unwrap()
    }

    #[test]
    fn shoot_sounds_map_to_bow_loose() {
        let table = ReplacementTable::build(&HashSet::new(), default_substitutions());
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(&key("entity.arrow.shoot")), Some(&key(BOW_LOOSE)));
        assert_eq!(table.resolve(&key("entity.skeleton.shoot")), Some(&key(BOW_LOOSE)));
        assert_eq!(table.resolve(&key("entity.arrow.hit")), None);
    }

    #[test]
    fn blocked_target_skips_substitution() {
        let blocked: HashSet<_> = [key(BOW_LOOSE)].into_iter().collect();
        let table = ReplacementTable::build(&blocked, default_substitutions());
        assert!(table.is_empty());
    }

    #[test]
    fn tables_only_cover_catalogue_sounds() {
        let options = SoundOptions {
            blocked_sounds: vec!["entity.bat.loop".into(), "not a key!".into()],
            culled_sounds: vec!["block.water.ambient".into(), "entity.bat.loop".into()],
            ..SoundOptions::default()
        };
        let catalogue = [key("entity.bat.loop"), key("block.water.ambient"), key(BOW_LOOSE)];
        let tables = SoundTables::build(catalogue.iter(), &options);

        assert!(tables.is_blocked(&key("entity.bat.loop")));
        assert!(!tables.is_culled(&key("entity.bat.loop")));
        assert!(tables.is_culled(&key("block.water.ambient")));
        assert_eq!(tables.replacements.len(), 2);
    }

    #[test]
    fn blocking_bow_loose_drops_replacements() {
        let options = SoundOptions {
            blocked_sounds: vec![BOW_LOOSE.into()],
            ..SoundOptions::default()
        };
        let catalogue = [key(BOW_LOOSE)];
        let tables = SoundTables::build(catalogue.iter(), &options);
        assert!(tables.replacements.is_empty());
    }
}
