//! Spawn policy and identity defaults

use rand::Rng;

use crate::ws::protocol::Vec3;

/// Spawns land in [-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT] on x and z
pub const ARENA_HALF_EXTENT: f64 = 50.0;

/// Fresh spawn point on the arena floor (y = 0)
pub fn random_spawn<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3 {
        x: rng.gen_range(-ARENA_HALF_EXTENT..=ARENA_HALF_EXTENT),
        y: 0.0,
        z: rng.gen_range(-ARENA_HALF_EXTENT..=ARENA_HALF_EXTENT),
    }
}

/// Random CSS colour with a fixed saturation and lightness
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    let hue: u32 = rng.gen_range(0..360);
    format!("hsl({},80%,60%)", hue)
}
