//! Scripted stand-in for a keyboard.

use delve_core::{Cell, Direction, Position, RandomSource, SeededRandom};
use delve_world::{query, World};

const TURN_CHANCE: f64 = 0.1;

/// Supplies at most one player intent per tick.
pub(crate) trait InputSource {
    fn next_intent(&mut self, world: &World) -> Option<Direction>;
}

/// Attacks adjacent monsters, heads for known down stairs and otherwise
/// wanders in straight runs.
#[derive(Debug)]
pub(crate) struct Autopilot {
    rng: SeededRandom,
    heading: Direction,
}

impl Autopilot {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: SeededRandom::new(seed),
            heading: Direction::North,
        }
    }

    fn wander(&mut self, passable: &[Direction]) -> Option<Direction> {
        if passable.contains(&self.heading) && self.rng.unit() >= TURN_CHANCE {
            return Some(self.heading);
        }
        let heading = *passable.get(self.rng.index(passable.len()))?;
        self.heading = heading;
        Some(heading)
    }
}

impl InputSource for Autopilot {
    fn next_intent(&mut self, world: &World) -> Option<Direction> {
        let player = query::player(world);
        let position = query::player_position(world)?;
        let level = query::active_level(world)?;

        if let Some(direction) = Direction::ALL.into_iter().find(|direction| {
            level
                .occupant(position.offset(direction.offset()))
                .is_some_and(|occupant| occupant != player)
        }) {
            return Some(direction);
        }

        let passable: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| {
                level
                    .grid()
                    .get(position.offset(direction.offset()))
                    .is_some_and(|cell| cell != Cell::Wall)
            })
            .collect();

        let stairs = level.down_stairs();
        if level.explored().contains(&stairs) {
            let closer = passable.iter().copied().find(|direction| {
                manhattan(position.offset(direction.offset()), stairs) < manhattan(position, stairs)
            });
            if closer.is_some() {
                return closer;
            }
        }

        self.wander(&passable)
    }
}

fn manhattan(from: Position, to: Position) -> u32 {
    from.x().abs_diff(to.x()) + from.y().abs_diff(to.y())
}
