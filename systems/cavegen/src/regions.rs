//! Flood-fill connectivity analysis over the terrain grid.

use std::collections::VecDeque;

use delve_core::{Cell, Grid, Position};

/// Maximal 4-connected set of same-valued cells, in discovery order.
pub type Region = Vec<Position>;

/// Summary of a pruning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Number of floor regions found before pruning.
    pub regions: usize,
    /// Size of the region that was kept.
    pub kept: usize,
    /// Number of floor cells converted to wall.
    pub filled: usize,
}

/// Returns every maximal 4-connected component of `cell` in the grid.
///
/// Regions are reported in row-major order of their first cell. Each cell is
/// visited at most once.
#[must_use]
pub fn connected_regions(grid: &Grid, cell: Cell) -> Vec<Region> {
    let width = usize::try_from(grid.width()).unwrap_or(0);
    let mut visited = vec![false; grid.cells().len()];
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for start in grid.positions() {
        if grid.get(start) != Some(cell) {
            continue;
        }
        let Some(start_index) = index(width, start) else {
            continue;
        };
        if visited[start_index] {
            continue;
        }

        visited[start_index] = true;
        let mut region = vec![start];
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for neighbor in neighbors(current) {
                if grid.get(neighbor) != Some(cell) {
                    continue;
                }
                let Some(neighbor_index) = index(width, neighbor) else {
                    continue;
                };
                if visited[neighbor_index] {
                    continue;
                }
                visited[neighbor_index] = true;
                region.push(neighbor);
                queue.push_back(neighbor);
            }
        }

        regions.push(region);
    }

    regions
}

/// Converts every floor region except the largest into wall.
///
/// Ties keep the region discovered first. Afterwards at most one floor
/// region remains.
pub fn prune_to_largest(grid: &mut Grid) -> PruneReport {
    let regions = connected_regions(grid, Cell::Floor);
    let mut largest: Option<usize> = None;
    for (index, region) in regions.iter().enumerate() {
        let larger = largest.map_or(true, |best| region.len() > regions[best].len());
        if larger {
            largest = Some(index);
        }
    }

    let Some(keep) = largest else {
        return PruneReport::default();
    };

    let mut filled = 0;
    for (index, region) in regions.iter().enumerate() {
        if index == keep {
            continue;
        }
        for position in region {
            grid.set(*position, Cell::Wall);
        }
        filled += region.len();
    }

    PruneReport {
        regions: regions.len(),
        kept: regions[keep].len(),
        filled,
    }
}

fn neighbors(position: Position) -> [Position; 4] {
    let (x, y) = (position.x(), position.y());
    [
        Position::new(x, y - 1),
        Position::new(x + 1, y),
        Position::new(x, y + 1),
        Position::new(x - 1, y),
    ]
}

fn index(width: usize, position: Position) -> Option<usize> {
    let column = usize::try_from(position.x()).ok()?;
    let row = usize::try_from(position.y()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
