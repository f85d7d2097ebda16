//! Food consumption and replenishment

use crate::world::World;

/// Outcome of one food pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoodReport {
    pub consumed: usize,
    pub spawned: usize,
}

/// Awards each food item to the first player (ascending id) whose center is
/// strictly closer than that player's radius, then refills the population to target.
///
/// An item overlapping several players is awarded once: it is removed as soon
/// as it matches and never tested against the remaining players.
pub fn resolve_food(world: &mut World) -> FoodReport {
    let order = world.player_ids_sorted();
    let World { players, food, .. } = world;

    let before = food.len();
    food.retain(|item| {
        for id in &order {
            let Some(player) = players.get_mut(id) else {
                continue;
            };
            if player.position.distance(&item.position) < player.radius() {
                player.grow(item.value);
                return false;
            }
        }
        true
    });
    let consumed = before - food.len();

    let spawned = world.replenish_food();
    FoodReport { consumed, spawned }
}
