#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Delve simulation.
//!
//! This crate defines the vocabulary that connects the generation systems,
//! the authoritative world, the turn engine and any presentation adapter.
//! Adapters and systems submit [`Command`] values describing desired
//! mutations, the world executes those commands via its `apply` entry point,
//! and then broadcasts [`Event`] values that systems react to
//! deterministically. Presentation layers only ever read snapshots.

use std::{collections::HashSet, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod random;
#[cfg(feature = "testing")]
pub mod testing;

pub use random::{
    Clock, MonotonicClock, RandomSource, SeededRandom, RNG_STREAM_GENERATION, RNG_STREAM_TURNS,
};

/// Set of positions currently lit for the viewing entity.
pub type VisibilitySet = HashSet<Position>;

/// Terrain value stored at every grid position.
///
/// The discriminants are the interoperability encoding shared with existing
/// tooling and must not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Cell {
    /// Open ground that entities may stand on.
    Floor = 0,
    /// Solid rock that blocks movement and sight.
    Wall = 1,
    /// Staircase leading one level deeper.
    StairsDown = 2,
    /// Staircase leading one level shallower.
    StairsUp = 3,
}

impl Cell {
    /// Integer code used when exchanging grids with external tooling.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes an interoperability code, returning `None` for unknown values.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Floor),
            1 => Some(Self::Wall),
            2 => Some(Self::StairsDown),
            3 => Some(Self::StairsUp),
            _ => None,
        }
    }

    /// Reports whether the cell stops rays of sight.
    #[must_use]
    pub const fn blocks_sight(self) -> bool {
        matches!(self, Self::Wall)
    }

    /// Returns the staircase direction when the cell is a staircase.
    #[must_use]
    pub const fn stairs(self) -> Option<StairDirection> {
        match self {
            Self::StairsDown => Some(StairDirection::Down),
            Self::StairsUp => Some(StairDirection::Up),
            Self::Floor | Self::Wall => None,
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    x: i32,
    y: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the position.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the position.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the position displaced by the provided offset.
    #[must_use]
    pub const fn offset(self, offset: Offset) -> Self {
        Self {
            x: self.x.saturating_add(offset.dx()),
            y: self.y.saturating_add(offset.dy()),
        }
    }

    /// Computes the Chebyshev distance between two positions.
    #[must_use]
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Relative displacement applied to a position by a single step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    dx: i32,
    dy: i32,
}

impl Offset {
    /// Offset that leaves a position unchanged.
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    /// Creates a new offset, clamping each axis to a single cell.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self {
            dx: dx.signum(),
            dy: dy.signum(),
        }
    }

    /// Greedy one-cell offset moving `from` toward `to` on each axis independently.
    #[must_use]
    pub const fn toward(from: Position, to: Position) -> Self {
        Self::new(to.x - from.x, to.y - from.y)
    }

    /// Column displacement.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Row displacement.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }

    /// Reports whether the offset leaves a position unchanged.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Cardinal movement directions accepted from the input source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All cardinal directions in clockwise order starting at north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Single-cell offset travelled when stepping in this direction.
    #[must_use]
    pub const fn offset(self) -> Offset {
        match self {
            Self::North => Offset::new(0, -1),
            Self::East => Offset::new(1, 0),
            Self::South => Offset::new(0, 1),
            Self::West => Offset::new(-1, 0),
        }
    }
}

/// Vertical direction of travel through a staircase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StairDirection {
    /// Toward deeper levels.
    Down,
    /// Toward shallower levels.
    Up,
}

/// One persistent level of the dungeon, starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Depth(u32);

impl Depth {
    /// The level a session starts on.
    pub const FIRST: Self = Self(1);

    /// Creates a depth from its numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the depth.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Depth reached by travelling through a staircase, if one exists.
    ///
    /// Travelling up from the first level yields `None`.
    #[must_use]
    pub fn through(self, direction: StairDirection) -> Option<Self> {
        match direction {
            StairDirection::Down => self.0.checked_add(1).map(Self),
            StairDirection::Up => self.0.checked_sub(1).filter(|depth| *depth > 0).map(Self),
        }
    }
}

/// Unique identifier assigned to an entity for the life of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Display faction an entity belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The adventurer controlled through the input source.
    Player,
    /// Dungeon inhabitants.
    Monster,
}

/// Strategy that decides how an entity chooses its actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    /// Actions come from the external input source.
    PlayerControlled,
    /// Chase the player while standing in the player's view, otherwise wander.
    ChaseOrWander,
}

/// Combat statistics carried by every entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stats {
    /// Current hit points; the entity is dead at zero or below.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Defense threshold an attack total must meet or exceed to hit.
    pub armor_class: i32,
    /// Bonus added to attack rolls and damage.
    pub strength: i32,
}

impl Stats {
    /// Creates full-health statistics.
    #[must_use]
    pub const fn new(max_hp: i32, armor_class: i32, strength: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            armor_class,
            strength,
        }
    }

    /// Reports whether the hit points are above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// Mutable record shared by the player and every monster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier of the entity.
    pub id: EntityId,
    /// Grid position currently occupied.
    pub position: Position,
    /// Display name used in messages.
    pub name: String,
    /// Single-character display glyph.
    pub glyph: char,
    /// Display faction tag.
    pub faction: Faction,
    /// Strategy selecting the entity's actions.
    pub behavior: Behavior,
    /// Combat statistics.
    pub stats: Stats,
}

impl Entity {
    /// Reports whether the entity still has hit points left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.stats.is_alive()
    }

    /// Captures an immutable snapshot for presentation.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            position: self.position,
            glyph: self.glyph,
            faction: self.faction,
            hp: self.stats.hp,
            max_hp: self.stats.max_hp,
        }
    }
}

/// Immutable representation of a single entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Unique identifier of the entity.
    pub id: EntityId,
    /// Grid position currently occupied.
    pub position: Position,
    /// Display glyph.
    pub glyph: char,
    /// Display faction tag.
    pub faction: Faction,
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
}

/// Read-only snapshot describing all live entities on the active level.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view, preserving roster order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EntitySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}

/// Fixed-size rectangular terrain array addressed by `(column, row)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid with every cell set to `fill`.
    #[must_use]
    pub fn filled(width: u32, height: u32, fill: Cell) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![fill; capacity],
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// Cell stored at the position, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<Cell> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Overwrites the cell at the position. Positions outside the grid are ignored.
    pub fn set(&mut self, position: Position, cell: Cell) {
        if let Some(index) = self.index(position) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = cell;
            }
        }
    }

    /// Reports whether the position lies on the outermost ring.
    #[must_use]
    pub fn is_border(&self, position: Position) -> bool {
        self.contains(position)
            && (position.x() == 0
                || position.y() == 0
                || position.x() == self.last_column()
                || position.y() == self.last_row())
    }

    /// Sets every cell of the outermost ring to [`Cell::Wall`].
    pub fn enforce_border(&mut self) {
        let (last_column, last_row) = (self.last_column(), self.last_row());
        for x in 0..=last_column {
            self.set(Position::new(x, 0), Cell::Wall);
            self.set(Position::new(x, last_row), Cell::Wall);
        }
        for y in 0..=last_row {
            self.set(Position::new(0, y), Cell::Wall);
            self.set(Position::new(last_column, y), Cell::Wall);
        }
    }

    /// Iterator over every position in row-major scan order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    /// Positions holding the provided cell value, in row-major scan order.
    #[must_use]
    pub fn positions_of(&self, cell: Cell) -> Vec<Position> {
        self.positions()
            .filter(|position| self.get(*position) == Some(cell))
            .collect()
    }

    /// Number of cells holding the provided value.
    #[must_use]
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|value| **value == cell).count()
    }

    /// Geometric center of the grid.
    #[must_use]
    pub fn center(&self) -> Position {
        Position::new(
            i32::try_from(self.width / 2).unwrap_or(0),
            i32::try_from(self.height / 2).unwrap_or(0),
        )
    }

    /// Dense cell storage in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn last_column(&self) -> i32 {
        i32::try_from(self.width).unwrap_or(i32::MAX).saturating_sub(1)
    }

    fn last_row(&self) -> i32 {
        i32::try_from(self.height).unwrap_or(i32::MAX).saturating_sub(1)
    }

    fn index(&self, position: Position) -> Option<usize> {
        let column = u32::try_from(position.x()).ok()?;
        let row = u32::try_from(position.y()).ok()?;
        if column < self.width && row < self.height {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Outcome of running one step through the turn triage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Destination outside the grid, a wall, or the acting entity is gone.
    Blocked,
    /// The entity now stands on the destination.
    Moved,
    /// A distinct live entity occupies the destination.
    Collided(EntityId),
    /// The destination is a staircase; the entity did not move.
    UsedStairs(StairDirection),
}

/// Dice drawn for a single attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackRolls {
    /// Attack die, uniform in `1..=20`.
    pub attack: u32,
    /// Damage die, uniform in `1..=6`.
    pub damage: u32,
}

impl AttackRolls {
    /// Creates a pair of drawn dice.
    #[must_use]
    pub const fn new(attack: u32, damage: u32) -> Self {
        Self { attack, damage }
    }

    /// Resolves the attack against the defender, applying any damage.
    ///
    /// The attack hits when `attack + strength >= armor_class`; a hit deals
    /// `max(1, damage + strength)`. A miss never touches the defender.
    pub fn resolve(self, attacker: &Stats, defender: &mut Stats) -> AttackReport {
        let roll = i32::try_from(self.attack).unwrap_or(i32::MAX);
        let hit_total = roll.saturating_add(attacker.strength);
        let hit = hit_total >= defender.armor_class;
        let damage = if hit {
            let die = i32::try_from(self.damage).unwrap_or(i32::MAX);
            die.saturating_add(attacker.strength).max(1)
        } else {
            0
        };
        defender.hp = defender.hp.saturating_sub(damage);
        AttackReport {
            roll,
            hit_total,
            armor_class: defender.armor_class,
            hit,
            damage,
            remaining_hp: defender.hp,
            max_hp: defender.max_hp,
        }
    }
}

/// Result of resolving a single attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackReport {
    /// Natural attack roll.
    pub roll: i32,
    /// Roll plus the attacker's strength bonus.
    pub hit_total: i32,
    /// Defender armor class the total was compared against.
    pub armor_class: i32,
    /// Whether the attack connected.
    pub hit: bool,
    /// Hit points removed from the defender.
    pub damage: i32,
    /// Defender hit points after the attack.
    pub remaining_hp: i32,
    /// Defender maximum hit points.
    pub max_hp: i32,
}

/// Color attached to a log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl MessageColor {
    /// Neutral narration.
    pub const INFO: Self = Self::from_rgb(0xdc, 0xdc, 0xdc);
    /// Attacks that connect.
    pub const HIT: Self = Self::from_rgb(0xe0, 0x40, 0x40);
    /// Attacks that whiff.
    pub const MISS: Self = Self::from_rgb(0x90, 0x90, 0x90);
    /// Deaths.
    pub const DEATH: Self = Self::from_rgb(0xff, 0x20, 0x20);
    /// Level transitions.
    pub const TRAVEL: Self = Self::from_rgb(0x60, 0xa0, 0xff);

    /// Creates a new message color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Single line of the message log.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Human readable text.
    pub text: String,
    /// Presentation color.
    pub color: MessageColor,
}

/// Whether the session still accepts actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// The player is alive.
    Running,
    /// The player's hit points reached zero.
    Defeated,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests that an entity attempt a single step.
    StepEntity {
        /// Identifier of the entity attempting to move.
        entity: EntityId,
        /// Displacement of the attempted step.
        offset: Offset,
    },
    /// Applies an attack using dice already drawn by the caller.
    ResolveAttack {
        /// Entity delivering the attack.
        attacker: EntityId,
        /// Entity receiving the attack.
        defender: EntityId,
        /// Dice drawn for the attack.
        rolls: AttackRolls,
    },
    /// Moves the player through the staircase in the given direction.
    TakeStairs {
        /// Direction of travel.
        direction: StairDirection,
    },
    /// Removes dead non-player entities from the active roster.
    RemoveDead,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Reports the triage outcome of a step request.
    StepResolved {
        /// Entity that attempted the step.
        entity: EntityId,
        /// Position held before the attempt.
        from: Position,
        /// Outcome of the triage.
        outcome: MoveOutcome,
    },
    /// Reports a resolved attack.
    AttackResolved {
        /// Entity that delivered the attack.
        attacker: EntityId,
        /// Entity that received the attack.
        defender: EntityId,
        /// Details of the roll and damage.
        report: AttackReport,
    },
    /// Announces that an entity's hit points reached zero.
    EntityDied {
        /// Entity that died.
        entity: EntityId,
    },
    /// Announces that the player has died.
    PlayerDefeated,
    /// Confirms that dead entities were dropped from the roster.
    EntitiesRemoved {
        /// Entities removed, in roster order.
        entities: Vec<EntityId>,
    },
    /// Announces that a depth was generated for the first time.
    LevelGenerated {
        /// Depth that was generated.
        depth: Depth,
    },
    /// Announces that the player changed level.
    DepthChanged {
        /// Depth the player left.
        from: Depth,
        /// Depth the player arrived at.
        to: Depth,
        /// Position the player was placed at.
        arrival: Position,
    },
}

/// Configuration rejected at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The wall fill probability lies outside the open interval `(0, 1)`.
    #[error("fill probability {0} must lie strictly between 0 and 1")]
    FillProbability(f64),
    /// The grid is smaller than 3x3.
    #[error("grid dimensions {width}x{height} must both be at least 3")]
    Dimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The field-of-view radius is zero.
    #[error("field of view radius must be positive")]
    Radius,
    /// The ray angular step is zero or exceeds a full turn.
    #[error("ray angle step {0} must lie in 1..=360 degrees")]
    AngleStep(u32),
    /// The message log cannot hold any message.
    #[error("message log capacity must be positive")]
    MessageCapacity,
    /// The action cooldown is zero.
    #[error("move delay must be positive")]
    MoveDelay,
}

/// Default cooldown between accepted player actions.
pub const DEFAULT_PLAYER_MOVE_DELAY: Duration = Duration::from_millis(50);

/// Default cooldown between monster sweeps.
pub const DEFAULT_ENEMY_MOVE_DELAY: Duration = Duration::from_millis(250);
