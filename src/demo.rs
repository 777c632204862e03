//! Scripted cave walk used by the headless driver.

use glam::{IVec3, Vec3};
use soundscape_audio::{
    desired_from_weights, Association, ChunkCoord, ChunkSource, ChunkView, CompiledAcoustic,
    Fingerprint, Fluid, FootSide, FootprintEvent, ImpactSurface, SoundCategory, SoundEffect,
    SoundInstance, SpotSoundTable, StepEvent, SubjectId,
};
use soundscape_core::SoundKey;
use std::collections::HashMap;
use std::sync::Arc;

pub const PLAYER: SubjectId = SubjectId(1);

/// Blocks between `floor` and `ceiling` are open, unlit cave air.
pub struct CaveColumn {
    floor: i32,
    ceiling: i32,
}

impl ChunkView for CaveColumn {
    fn is_air_and_dark(&self, pos: IVec3) -> bool {
        (self.floor..self.ceiling).contains(&pos.y)
    }
}

/// Every chunk is the same cave; the ceiling varies with the chunk so the
/// cache has something to hold.
pub struct CaveSource {
    pub floor: i32,
    pub ceiling: i32,
}

impl ChunkSource for CaveSource {
    type Chunk = CaveColumn;

    fn load(&self, coord: ChunkCoord) -> Option<Arc<CaveColumn>> {
        let wobble = (coord.x + coord.z).rem_euclid(3);
        Some(Arc::new(CaveColumn {
            floor: self.floor,
            ceiling: self.ceiling - wobble,
        }))
    }
}

/// Catalogue of sounds the demo host "knows".
pub fn catalogue() -> Vec<SoundKey> {
    [
        "minecraft:ambient.cave",
        "minecraft:block.stone.step",
        "minecraft:block.gravel.step",
        "minecraft:entity.arrow.shoot",
        "minecraft:entity.bat.loop",
        "minecraft:entity.lightning.thunder",
        "dsurround:bow.loose",
        "dsurround:thunder",
        "dsurround:crafting",
        "dsurround:waterdrops",
        "dsurround:waterdrip",
        "dsurround:steamhiss",
        "dsurround:wind",
        "dsurround:cave.drone",
    ]
    .into_iter()
    .filter_map(|name| SoundKey::parse(name).ok())
    .collect()
}

/// Listener position at `tick`: a slow walk along +X at cave height.
pub fn listener_at(tick: u64) -> Vec3 {
    Vec3::new(0.5 + tick as f32 * 0.2, 20.0, 0.5)
}

/// Step taken on `tick`, if any (one every eight ticks, alternating feet).
pub fn step_at(tick: u64, acoustics: Option<CompiledAcoustic>) -> Option<Association> {
    if tick % 8 != 0 {
        return None;
    }
    let position = listener_at(tick);
    let side = if (tick / 8) % 2 == 0 {
        FootSide::Left
    } else {
        FootSide::Right
    };
    let print = FootprintEvent {
        location: position,
        rotation: 90.0,
        scale: 1.0,
        side,
    };
    let association = match acoustics {
        Some(acoustics) => Association::new(PLAYER, position, StepEvent::Walk, acoustics),
        None => Association::unassociated(PLAYER, position, StepEvent::Walk, None),
    };
    Some(association.with_footprint(print))
}

/// Ambient survey for `tick`: wind dominates early, the cave drone later.
pub fn ambient_survey(tick: u64) -> HashMap<Fingerprint, f32> {
    let mut weights = HashMap::new();
    let drone_share = ((tick / 100) % 5) as u32 * 20;
    let shares = [
        ("dsurround:wind", 100 - drone_share),
        ("dsurround:cave.drone", drone_share),
    ];
    for (name, weight) in shares {
        if weight == 0 {
            continue;
        }
        if let Ok(key) = SoundKey::parse(name) {
            weights.insert(Fingerprint(key), weight);
        }
    }
    desired_from_weights(&weights, 100)
}

/// Occasional one-shots heard deeper in the cave.
pub fn cave_spots() -> SpotSoundTable {
    [("dsurround:waterdrops", 3), ("minecraft:entity.bat.loop", 1)]
        .into_iter()
        .filter_map(|(name, weight)| Some((SoundKey::parse(name).ok()?, weight)))
        .fold(SpotSoundTable::new(240), |table, (key, weight)| {
            table.with_sound(SoundEffect::new(key, SoundCategory::Ambient), weight)
        })
}

/// Drip falling from the cave ceiling ahead of the listener.
pub fn drip_at(tick: u64) -> (Fluid, IVec3, IVec3, ImpactSurface) {
    let x = listener_at(tick).x as i32 + 4;
    let (fluid, surface) = if (tick / 60) % 4 == 3 {
        (Fluid::Lava, ImpactSurface::Water)
    } else {
        (Fluid::Water, ImpactSurface::Solid)
    };
    (fluid, IVec3::new(x, 28, 2), IVec3::new(x, 17, 2), surface)
}

/// Vanilla thunder as the host would request it.
pub fn thunder_at(tick: u64) -> Option<SoundInstance> {
    let key = SoundKey::parse("minecraft:entity.lightning.thunder").ok()?;
    let position = listener_at(tick) + Vec3::new(0.0, 60.0, 0.0);
    Some(SoundInstance::new(key, position).with_volume(10000.0))
}
