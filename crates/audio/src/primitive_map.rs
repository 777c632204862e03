//! Primitive name → compiled acoustic cache.

use crate::{AcousticBehavior, AcousticRegistry, AcousticSound, AcousticUnit, CompiledAcoustic};
use soundscape_core::SoundKey;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::info;

/// Errors from registering a primitive mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcousticError {
    /// The primitive name was empty.
    #[error("primitive key is empty")]
    EmptyKey,
    /// The acoustic expression was empty.
    #[error("acoustic expression for '{0}' is empty")]
    EmptyExpression(String),
}

/// Cache of compiled acoustics keyed by raw primitive string.
///
/// Substrate variants are stored under `primitive@substrate`. Raw
/// expressions compiled through [`PrimitiveMap::resolve`] live in a separate
/// cache that is dropped whenever the registry changes.
#[derive(Debug, Default)]
pub struct PrimitiveMap {
    map: HashMap<String, CompiledAcoustic>,
    expressions: HashMap<String, CompiledAcoustic>,
    expressions_generation: u64,
}

impl PrimitiveMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `expression` and store it under `key`, replacing any
    /// previous mapping.
    pub fn register(
        &mut self,
        registry: &AcousticRegistry,
        key: &str,
        expression: &str,
    ) -> Result<(), AcousticError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AcousticError::EmptyKey);
        }
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(AcousticError::EmptyExpression(key.to_string()));
        }
        self.map
            .insert(key.to_string(), registry.compile(expression));
        Ok(())
    }

    /// Register every pair of `table`. Failing pairs are logged and skipped.
    /// Returns the number registered.
    pub fn setup<'a>(
        &mut self,
        registry: &AcousticRegistry,
        table: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> usize {
        let mut registered = 0;
        for (key, expression) in table {
            match self.register(registry, key, expression) {
                Ok(()) => registered += 1,
                Err(err) => info!("Error making registration {}: {}", key, err),
            }
        }
        registered
    }

    /// Acoustics for `primitive`.
    ///
    /// On a miss, a primitive naming a sound in `catalogue` is turned into a
    /// single simple unit playing that sound, and cached.
    pub fn get(&mut self, primitive: &str, catalogue: &HashSet<SoundKey>) -> Option<CompiledAcoustic> {
        if let Some(hit) = self.map.get(primitive) {
            return Some(hit.clone());
        }
        let key = SoundKey::parse(primitive).ok()?;
        if !catalogue.contains(&key) {
            return None;
        }
        let mut registry = AcousticRegistry::new();
        registry.register(AcousticUnit::new(
            primitive,
            AcousticBehavior::Simple(AcousticSound::new(key)),
        ));
        let compiled = registry.compile(primitive);
        self.map.insert(primitive.to_string(), compiled.clone());
        Some(compiled)
    }

    /// Acoustics registered for `primitive` on `substrate`. Never synthesized.
    pub fn get_substrate(&self, primitive: &str, substrate: &str) -> Option<CompiledAcoustic> {
        self.map.get(&format!("{primitive}@{substrate}")).cloned()
    }

    /// Compile `expression`, caching by the raw string until the registry
    /// changes.
    pub fn resolve(&mut self, registry: &AcousticRegistry, expression: &str) -> CompiledAcoustic {
        if registry.generation() != self.expressions_generation {
            self.expressions.clear();
            self.expressions_generation = registry.generation();
        }
        self.expressions
            .entry(expression.to_string())
            .or_insert_with(|| registry.compile(expression))
            .clone()
    }

    /// Number of primitive mappings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no primitive is mapped.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every mapping and cached expression.
    pub fn clear(&mut self) {
        self.map.clear();
        self.expressions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AcousticRegistry {
        let mut registry = AcousticRegistry::new();
        for name in ["stone", "gravel", "wood"] {
            registry.register(AcousticUnit::new(
                name,
                AcousticBehavior::Footstep(AcousticSound::new(
                    SoundKey::parse(&format!("dsurround:step.{name}")).unwrap(),
                )),
            ));
        }
        registry
    }

    #[test]
    fn setup_skips_bad_pairs() {
        let registry = registry();
        let mut map = PrimitiveMap::new();
        let table: Vec<(String, String)> = vec![
            ("block.stone.step".into(), "stone".into()),
            ("".into(), "stone".into()),
            ("block.gravel.step".into(), "  ".into()),
            ("block.wood.step@carpet".into(), "wood,gravel".into()),
        ];
        let registered = map.setup(&registry, table.iter().map(|(k, v)| (k, v)));
        assert_eq!(registered, 2);
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get_substrate("block.wood.step", "carpet")
                .map(|acoustic| acoustic.describe()),
            Some("wood,gravel".to_string())
        );
    }

    #[test]
    fn register_rejects_empty_input() {
        let registry = registry();
        let mut map = PrimitiveMap::new();
        assert_eq!(map.register(&registry, " ", "stone"), Err(AcousticError::EmptyKey));
        assert_eq!(
            map.register(&registry, "k", ""),
            Err(AcousticError::EmptyExpression("k".into()))
        );
    }

    #[test]
    fn get_synthesizes_known_sounds_once() {
        let mut map = PrimitiveMap::new();
        let catalogue: HashSet<_> = [SoundKey::parse("block.sand.step").unwrap()]
            .into_iter()
            .collect();

        let first = map.get("block.sand.step", &catalogue).expect("known sound");
        assert_eq!(first.len(), 1);
        let second = map.get("block.sand.step", &catalogue).expect("cached");
        assert!(first.ptr_eq(&second));

        assert!(map.get("block.unknown.step", &catalogue).is_none());
        assert!(map.get("Not A Key", &catalogue).is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn resolve_caches_by_raw_string() {
        let registry = registry();
        let mut map = PrimitiveMap::new();
        let a = map.resolve(&registry, "stone,missing");
        let b = map.resolve(&registry, "stone,missing");
        assert!(a.ptr_eq(&b));
        assert_eq!(a.describe(), "stone");
    }

    #[test]
    fn resolved_expressions_follow_registry_changes() {
        let mut registry = AcousticRegistry::new();
        let mut map = PrimitiveMap::new();
        assert!(map.resolve(&registry, "stone").is_empty());

        registry.register(AcousticUnit::new(
            "stone",
            AcousticBehavior::Footstep(AcousticSound::new(
                SoundKey::parse("dsurround:step.stone").unwrap(),
            )),
        ));
        assert_eq!(map.resolve(&registry, "stone").describe(), "stone");

        registry.clear();
        assert!(map.resolve(&registry, "stone").is_empty());
    }

    #[test]
    fn resolved_expressions_are_not_primitive_mappings() {
        let registry = registry();
        let mut map = PrimitiveMap::new();
        map.resolve(&registry, "stone");
        assert!(map.is_empty());
        assert!(map.get("stone", &HashSet::new()).is_none());
    }

    #[test]
    fn substrate_lookup_never_synthesizes() {
        let map = PrimitiveMap::new();
        assert!(map.get_substrate("block.stone.step", "snow").is_none());
    }
}
