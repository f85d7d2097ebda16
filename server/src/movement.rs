//! Movement integration
//!
//! Move commands only store a direction; positions change once per tick.

use crate::physics::Vector2;
use crate::world::World;

/// Converts a raw commanded vector into the stored direction: the unit vector
/// along `(dx, dy)`, or zero when the vector has no length.
pub fn direction_from_input(dx: f64, dy: f64) -> Vector2 {
    Vector2::new(dx, dy).normalize()
}

/// Advances every player by `direction * speed` and clamps each axis into the world bounds.
pub fn integrate(world: &mut World) {
    let (width, height) = (world.width(), world.height());

    for player in world.players.values_mut() {
        let step = player.direction.scale(player.speed);
        player.position = player.position.add(&step).clamp_to_bounds(width, height);
    }
}
