//! Player-vs-player absorption
//!
//! Each unordered pair of players is evaluated at most once per pass, in
//! ascending id order. When two players overlap, the one with the strictly
//! larger radius absorbs the other; equal radii resolve in favor of the
//! greater id. Within a pass:
//!
//! - an absorbed player takes no part in any later pair,
//! - a player that has already absorbed someone cannot be absorbed itself;
//!   such a pair is left for the next tick.
//!
//! Together these guarantee that each loser's score is transferred exactly once
//! to a surviving player, so the total score of the world is conserved.
//! Removals are applied after the pairwise pass completes.

use crate::physics::circles_overlap;
use crate::world::{Player, PlayerId, World};
use log::debug;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Absorption {
    pub winner: PlayerId,
    pub loser: PlayerId,
    /// Score moved from loser to winner
    pub mass: f64,
}

/// Returns `(winner, loser)` for two overlapping players.
pub fn pick_winner(a: &Player, b: &Player) -> (PlayerId, PlayerId) {
    let by_radius = a
        .radius()
        .partial_cmp(&b.radius())
        .unwrap_or(Ordering::Equal);

    match by_radius.then(a.id.cmp(&b.id)) {
        Ordering::Less => (b.id, a.id),
        _ => (a.id, b.id),
    }
}

pub fn resolve_collisions(world: &mut World) -> Vec<Absorption> {
    let ids = world.player_ids_sorted();
    let mut absorbed: HashSet<PlayerId> = HashSet::new();
    let mut winners: HashSet<PlayerId> = HashSet::new();
    let mut absorptions = Vec::new();

    for (i, &first) in ids.iter().enumerate() {
        for &second in &ids[i + 1..] {
            if absorbed.contains(&first) {
                break;
            }
            if absorbed.contains(&second) {
                continue;
            }

            let (a, b) = match (world.players.get(&first), world.players.get(&second)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            if !circles_overlap(&a.position, a.radius(), &b.position, b.radius()) {
                continue;
            }

            let (winner, loser) = pick_winner(a, b);
            if winners.contains(&loser) {
                debug!(
                    "Deferring absorption of {} by {}: already absorbed this tick",
                    loser, winner
                );
                continue;
            }

            let mass = if loser == a.id { a.score() } else { b.score() };
            if let Some(player) = world.players.get_mut(&winner) {
                player.grow(mass);
            }
            absorbed.insert(loser);
            winners.insert(winner);
            absorptions.push(Absorption {
                winner,
                loser,
                mass,
            });
        }
    }

    for absorption in &absorptions {
        world.remove_player(absorption.loser);
        debug!(
            "Player {} absorbed player {} (+{:.1})",
            absorption.winner, absorption.loser, absorption.mass
        );
    }

    absorptions
}
