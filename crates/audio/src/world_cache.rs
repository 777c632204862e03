//! LRU cache in front of the host's chunk data.
//!
//! Entries are tagged with the world generation they were loaded under.
//! Bumping the generation (world change, dimension change, reconnect) makes
//! every cached chunk stale; stale entries are reloaded on next access.

use crate::WorldQuery;
use glam::IVec3;
use lru::LruCache;
use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Width of a chunk column in blocks.
pub const CHUNK_WIDTH: i32 = 16;

/// Column coordinate of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Chunk X.
    pub x: i32,
    /// Chunk Z.
    pub z: i32,
}

impl ChunkCoord {
    /// Create a coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing block `pos`.
    pub fn containing(pos: IVec3) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_WIDTH),
            z: pos.z.div_euclid(CHUNK_WIDTH),
        }
    }
}

/// Read access to one loaded chunk.
pub trait ChunkView {
    /// Whether block `pos` (world coordinates) is open air below the
    /// ambience light threshold.
    fn is_air_and_dark(&self, pos: IVec3) -> bool;
}

/// Host-side chunk loader.
pub trait ChunkSource {
    /// Chunk representation.
    type Chunk: ChunkView;

    /// Load a chunk, or `None` if it is not available.
    fn load(&self, coord: ChunkCoord) -> Option<Arc<Self::Chunk>>;
}

struct Cached<C> {
    generation: u64,
    chunk: Option<Arc<C>>,
}

/// Generation-tagged LRU over a [`ChunkSource`].
pub struct ChunkCache<S: ChunkSource> {
    source: S,
    entries: RefCell<LruCache<ChunkCoord, Cached<S::Chunk>>>,
    generation: u64,
    loads: Cell<u64>,
}

impl<S: ChunkSource> ChunkCache<S> {
    /// Cache holding at most `capacity` chunks.
    pub fn new(source: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            entries: RefCell::new(LruCache::new(capacity)),
            generation: 0,
            loads: Cell::new(0),
        }
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switch to `generation`. A different value invalidates every entry.
    pub fn set_generation(&mut self, generation: u64) {
        if generation != self.generation {
            debug!(
                "Chunk cache generation {} -> {}",
                self.generation, generation
            );
            self.generation = generation;
        }
    }

    /// Bump the generation by one.
    pub fn invalidate(&mut self) {
        self.set_generation(self.generation.wrapping_add(1));
    }

    /// Chunk at `coord`, loading it on a miss or stale entry.
    pub fn chunk(&self, coord: ChunkCoord) -> Option<Arc<S::Chunk>> {
        let mut entries = self.entries.borrow_mut();
        if let Some(cached) = entries.get(&coord) {
            if cached.generation == self.generation {
                return cached.chunk.clone();
            }
        }
        self.loads.set(self.loads.get() + 1);
        let chunk = self.source.load(coord);
        entries.put(
            coord,
            Cached {
                generation: self.generation,
                chunk: chunk.clone(),
            },
        );
        chunk
    }

    /// Number of calls that reached the source.
    pub fn loads(&self) -> u64 {
        self.loads.get()
    }

    /// Number of cached entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable source. Callers changing world contents should also bump the
    /// generation.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: ChunkSource> WorldQuery for ChunkCache<S> {
    fn is_air_and_dark(&self, pos: IVec3) -> bool {
        self.chunk(ChunkCoord::containing(pos))
            .is_some_and(|chunk| chunk.is_air_and_dark(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Column {
        dark_below: i32,
    }

    impl ChunkView for Column {
        fn is_air_and_dark(&self, pos: IVec3) -> bool {
            pos.y < self.dark_below
        }
    }

    struct Source {
        dark_below: i32,
        missing: Option<ChunkCoord>,
    }

    impl ChunkSource for Source {
        type Chunk = Column;

        fn load(&self, coord: ChunkCoord) -> Option<Arc<Column>> {
            (Some(coord) != self.missing).then(|| {
                Arc::new(Column {
                    dark_below: self.dark_below,
                })
            })
        }
    }

    fn cache(capacity: usize) -> ChunkCache<Source> {
        ChunkCache::new(
            Source {
                dark_below: 40,
                missing: None,
            },
            capacity,
        )
    }

    #[test]
    fn coordinates_floor_negative_blocks() {
        assert_eq!(ChunkCoord::containing(IVec3::new(-1, 0, 15)), ChunkCoord::new(-1, 0));
        assert_eq!(ChunkCoord::containing(IVec3::new(16, 0, -17)), ChunkCoord::new(1, -2));
    }

    #[test]
    fn repeated_queries_hit_the_cache() {
        let cache = cache(4);
        assert!(cache.is_air_and_dark(IVec3::new(1, 10, 1)));
        assert!(!cache.is_air_and_dark(IVec3::new(2, 50, 2)));
        assert_eq!(cache.loads(), 1);
    }

    #[test]
    fn generation_change_forces_reload() {
        let mut cache = cache(4);
        cache.is_air_and_dark(IVec3::new(1, 10, 1));
        cache.source_mut().dark_below = 5;
        assert!(cache.is_air_and_dark(IVec3::new(1, 10, 1)));

        cache.invalidate();
        assert!(!cache.is_air_and_dark(IVec3::new(1, 10, 1)));
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let cache = cache(2);
        cache.chunk(ChunkCoord::new(0, 0));
        cache.chunk(ChunkCoord::new(1, 0));
        cache.chunk(ChunkCoord::new(2, 0));
        assert_eq!(cache.len(), 2);
        cache.chunk(ChunkCoord::new(0, 0));
        assert_eq!(cache.loads(), 4);
    }

    #[test]
    fn missing_chunks_are_not_dark() {
        let mut cache = cache(2);
        cache.source_mut().missing = Some(ChunkCoord::new(0, 0));
        assert!(!cache.is_air_and_dark(IVec3::new(3, 1, 3)));
    }
}
