#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Raycast field of view with wall occlusion.
//!
//! Rays are cast at a fixed angular step around the full circle and walked
//! outward one unit at a time for up to twice the radius, rounding to the
//! nearest cell. A ray stops at the first wall it lands on; the wall itself
//! is visible. This is an approximate method: a cell may be reached by more
//! than one ray, and visibility near tile corners is not perfectly
//! symmetric.

use delve_core::{ConfigError, Grid, Position, VisibilitySet};

/// Angular distance between consecutive rays.
pub const DEFAULT_ANGLE_STEP_DEGREES: u32 = 3;

/// Sight radius used when none is configured.
pub const DEFAULT_RADIUS: u32 = 8;

/// Configured visibility calculator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldOfView {
    radius: u32,
    angle_step_degrees: u32,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            angle_step_degrees: DEFAULT_ANGLE_STEP_DEGREES,
        }
    }
}

impl FieldOfView {
    /// Creates a calculator with the default angular step.
    pub fn new(radius: u32) -> Result<Self, ConfigError> {
        if radius == 0 {
            return Err(ConfigError::Radius);
        }
        Ok(Self {
            radius,
            angle_step_degrees: DEFAULT_ANGLE_STEP_DEGREES,
        })
    }

    /// Replaces the angular step between rays.
    pub fn with_angle_step(self, degrees: u32) -> Result<Self, ConfigError> {
        if degrees == 0 || degrees > 360 {
            return Err(ConfigError::AngleStep(degrees));
        }
        Ok(Self {
            angle_step_degrees: degrees,
            ..self
        })
    }

    /// Configured sight radius.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Configured angular step between rays.
    #[must_use]
    pub const fn angle_step_degrees(&self) -> u32 {
        self.angle_step_degrees
    }

    /// Number of steps each ray is walked before giving up.
    #[must_use]
    pub const fn ray_steps(&self) -> u32 {
        self.radius.saturating_mul(2)
    }

    /// Computes the set of cells visible from `origin`. Always contains `origin`.
    #[must_use]
    pub fn compute(&self, origin: Position, grid: &Grid) -> VisibilitySet {
        let mut visible = VisibilitySet::new();
        let _ = visible.insert(origin);

        let step = usize::try_from(self.angle_step_degrees).unwrap_or(360).max(1);
        for angle in (0..360u32).step_by(step) {
            let radians = f64::from(angle).to_radians();
            let (dy, dx) = radians.sin_cos();
            self.cast(origin, dx, dy, grid, &mut visible);
        }

        visible
    }

    fn cast(&self, origin: Position, dx: f64, dy: f64, grid: &Grid, visible: &mut VisibilitySet) {
        let mut x = f64::from(origin.x());
        let mut y = f64::from(origin.y());

        for _ in 0..self.ray_steps() {
            x += dx;
            y += dy;
            let cell = Position::new(nearest(x), nearest(y));

            let Some(terrain) = grid.get(cell) else {
                break;
            };
            let _ = visible.insert(cell);
            if terrain.blocks_sight() {
                break;
            }
        }
    }
}

/// Computes visibility with the default angular step.
///
/// A zero radius yields only the origin.
#[must_use]
pub fn compute_visible(origin: Position, radius: u32, grid: &Grid) -> VisibilitySet {
    let fov = FieldOfView {
        radius,
        angle_step_degrees: DEFAULT_ANGLE_STEP_DEGREES,
    };
    fov.compute(origin, grid)
}

fn nearest(value: f64) -> i32 {
    // Ties round to even.
    value.round_ties_even() as i32
}
