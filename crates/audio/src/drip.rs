//! Sounds for fluid drips landing below their source.

use glam::IVec3;
use soundscape_core::SoundKey;

/// Drop landing on something solid, or lava on lava.
pub const WATER_DROPS: &str = "dsurround:waterdrops";
/// Water meeting lava.
pub const STEAM_HISS: &str = "dsurround:steamhiss";
/// Water landing in water.
pub const WATER_DRIP: &str = "dsurround:waterdrip";

/// Fluid the drip is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fluid {
    /// Water drip.
    Water,
    /// Lava drip.
    Lava,
}

/// Material of the block the drip hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpactSurface {
    /// Any solid block.
    Solid,
    /// Water.
    Water,
    /// Lava.
    Lava,
    /// Anything else that stops a drip (leaves, plants).
    Other,
}

/// Sound a drip makes and when.
#[derive(Debug, Clone, PartialEq)]
pub struct DripImpact {
    /// Sound to play.
    pub sound: SoundKey,
    /// Block the sound plays at (directly above the hit block).
    pub position: IVec3,
    /// Ticks until the drip lands.
    pub delay: u64,
}

/// Impact for a drip starting at `start` and hitting the block at `hit`.
///
/// Returns `None` when the hit is below the world floor or not below the
/// start.
pub fn drip_impact(fluid: Fluid, start: IVec3, hit: IVec3, surface: ImpactSurface) -> Option<DripImpact> {
    if hit.y < 1 || hit.y >= start.y {
        return None;
    }

    let name = match (surface, fluid) {
        (ImpactSurface::Solid, _) => WATER_DROPS,
        (ImpactSurface::Water, Fluid::Lava) | (ImpactSurface::Lava, Fluid::Water) => STEAM_HISS,
        (_, Fluid::Water) => WATER_DRIP,
        (_, Fluid::Lava) => WATER_DROPS,
    };
    let sound = SoundKey::parse(name).ok()?;
    let fall = (start.y - hit.y) as u64;
    Some(DripImpact {
        sound,
        position: hit + IVec3::Y,
        delay: 40 + fall * 2,
    })
}
