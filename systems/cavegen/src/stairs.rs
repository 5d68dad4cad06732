//! Staircase carving and entry point selection.

use delve_core::{Cell, Depth, Grid, Position, RandomSource};

/// Immutable level layout produced by the generation pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSkeleton {
    /// Terrain with staircases carved in.
    pub grid: Grid,
    /// Position of the single down staircase.
    pub down_stairs: Position,
    /// Position of the up staircase; absent on the first depth.
    pub up_stairs: Option<Position>,
    /// Where an entity entering the level for the first time is placed.
    ///
    /// Equals `up_stairs` below the first depth.
    pub entry: Position,
}

/// Carves the staircases into distinct random floor cells and picks the entry point.
///
/// The down staircase is always placed. Below the first depth an up staircase
/// is placed as well and doubles as the entry point; on the first depth a
/// further floor cell is drawn as the plain spawn point. When no floor cell
/// is left the down staircase and the spawn point fall back to the grid
/// center, and the up staircase is carved into the interior cell nearest the
/// down staircase. The down staircase is never overwritten: on a grid with a
/// single interior cell both staircases share it and it stays `StairsDown`.
pub fn place_stairs_and_spawn(
    mut grid: Grid,
    depth: Depth,
    rng: &mut dyn RandomSource,
) -> LevelSkeleton {
    let center = grid.center();
    let mut floors = grid.positions_of(Cell::Floor);

    let down_stairs = take_random(&mut floors, rng).unwrap_or(center);
    grid.set(down_stairs, Cell::StairsDown);

    let (up_stairs, entry) = if depth > Depth::FIRST {
        let up = take_random(&mut floors, rng)
            .or_else(|| nearest_interior(&grid, down_stairs))
            .unwrap_or(down_stairs);
        if up != down_stairs {
            grid.set(up, Cell::StairsUp);
        }
        (Some(up), up)
    } else {
        (None, take_random(&mut floors, rng).unwrap_or(center))
    };

    LevelSkeleton {
        grid,
        down_stairs,
        up_stairs,
        entry,
    }
}

fn take_random(candidates: &mut Vec<Position>, rng: &mut dyn RandomSource) -> Option<Position> {
    if candidates.is_empty() {
        return None;
    }
    let index = rng.index(candidates.len());
    Some(candidates.swap_remove(index))
}

fn nearest_interior(grid: &Grid, anchor: Position) -> Option<Position> {
    grid.positions()
        .filter(|position| *position != anchor && !grid.is_border(*position))
        .min_by_key(|position| {
            position.x().abs_diff(anchor.x()) + position.y().abs_diff(anchor.y())
        })
}
