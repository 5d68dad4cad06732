#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic cave generation pipeline.
//!
//! A level skeleton is produced in three passes: [`GridGenerator`] turns
//! weighted noise into cave-like terrain through cellular-automaton
//! smoothing, [`prune_to_largest`] walls off every floor pocket except the
//! largest so the playable area is fully reachable, and
//! [`place_stairs_and_spawn`] carves the staircases and picks the entry
//! point. Every random draw goes through the injected [`RandomSource`].

use delve_core::{Cell, ConfigError, Depth, Grid, Position, RandomSource};
use tracing::debug;

mod regions;
mod stairs;

pub use regions::{connected_regions, prune_to_largest, PruneReport, Region};
pub use stairs::{place_stairs_and_spawn, LevelSkeleton};

/// A wall cell survives smoothing when at least this many neighbours are walls.
pub const WALL_SURVIVAL_THRESHOLD: u8 = 4;

/// A floor cell turns into wall when at least this many neighbours are walls.
pub const FLOOR_TO_WALL_THRESHOLD: u8 = 5;

/// Dimensions and noise parameters for a generated cave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Number of columns in the generated grid.
    pub width: u32,
    /// Number of rows in the generated grid.
    pub height: u32,
    /// Probability that an interior cell starts out as wall.
    pub fill_probability: f64,
    /// Number of smoothing passes applied to the noise.
    pub smoothing_iterations: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 80,
            fill_probability: 0.45,
            smoothing_iterations: 5,
        }
    }
}

impl GenerationConfig {
    /// Rejects fill probabilities outside `(0, 1)` and grids smaller than 3x3.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fill_probability > 0.0 && self.fill_probability < 1.0) {
            return Err(ConfigError::FillProbability(self.fill_probability));
        }
        if self.width < 3 || self.height < 3 {
            return Err(ConfigError::Dimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Produces candidate cave grids from weighted noise.
#[derive(Clone, Debug)]
pub struct GridGenerator {
    config: GenerationConfig,
}

impl GridGenerator {
    /// Creates a generator after validating the configuration.
    pub fn new(config: GenerationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration the generator was built with.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generates a smoothed grid whose border ring is entirely wall.
    ///
    /// The result is not yet guaranteed to be connected; run
    /// [`prune_to_largest`] afterwards.
    pub fn generate(&self, rng: &mut dyn RandomSource) -> Grid {
        let mut grid = Grid::filled(self.config.width, self.config.height, Cell::Wall);
        for position in grid.positions() {
            if grid.is_border(position) {
                continue;
            }
            let cell = if rng.unit() < self.config.fill_probability {
                Cell::Wall
            } else {
                Cell::Floor
            };
            grid.set(position, cell);
        }
        grid.enforce_border();

        for _ in 0..self.config.smoothing_iterations {
            grid = smooth(&grid);
        }
        grid
    }
}

/// Applies one cellular-automaton pass and re-enforces the border.
///
/// Every cell is evaluated against the previous generation. Neighbours
/// outside the grid do not count as walls.
#[must_use]
pub fn smooth(grid: &Grid) -> Grid {
    let mut next = grid.clone();
    for position in grid.positions() {
        let walls = wall_neighbors(grid, position);
        let cell = match grid.get(position) {
            Some(Cell::Wall) if walls >= WALL_SURVIVAL_THRESHOLD => Cell::Wall,
            Some(Cell::Floor) if walls >= FLOOR_TO_WALL_THRESHOLD => Cell::Wall,
            _ => Cell::Floor,
        };
        next.set(position, cell);
    }
    next.enforce_border();
    next
}

/// Counts wall cells among the eight Moore neighbours of `position`.
#[must_use]
pub fn wall_neighbors(grid: &Grid, position: Position) -> u8 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let neighbor = Position::new(position.x() + dx, position.y() + dy);
            if grid.get(neighbor) == Some(Cell::Wall) {
                count += 1;
            }
        }
    }
    count
}

/// Runs the full pipeline for one depth: generate, prune, place stairs.
pub fn build_level(
    generator: &GridGenerator,
    depth: Depth,
    rng: &mut dyn RandomSource,
) -> LevelSkeleton {
    let mut grid = generator.generate(rng);
    let report = prune_to_largest(&mut grid);
    debug!(
        depth = depth.get(),
        regions = report.regions,
        kept = report.kept,
        filled = report.filled,
        "pruned floor regions"
    );
    place_stairs_and_spawn(grid, depth, rng)
}
