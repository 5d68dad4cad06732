//! Lazily generated, never evicted collection of dungeon levels.

use std::collections::BTreeMap;

use delve_core::{
    Behavior, Cell, Depth, Entity, EntityId, Faction, Position, RandomSource, StairDirection,
    Stats,
};
use delve_system_cavegen::{build_level, GridGenerator};
use tracing::info;

use crate::{level::LevelState, RosterTuning};

const MONSTER_NAME: &str = "goblin";
const MONSTER_GLYPH: char = 'g';

/// Owns every level visited during a session, keyed by depth.
///
/// A depth is generated the first time it is requested and afterwards
/// returned unchanged, so revisiting a depth yields the same terrain,
/// staircases and exploration memory.
#[derive(Debug)]
pub struct DungeonLevelStore {
    generator: GridGenerator,
    roster: RosterTuning,
    rng: Box<dyn RandomSource>,
    levels: BTreeMap<Depth, LevelState>,
    next_entity: u32,
}

impl DungeonLevelStore {
    /// Creates an empty store drawing level randomness from `rng`.
    #[must_use]
    pub fn new(generator: GridGenerator, roster: RosterTuning, rng: Box<dyn RandomSource>) -> Self {
        Self {
            generator,
            roster,
            rng,
            levels: BTreeMap::new(),
            next_entity: 0,
        }
    }

    /// Hands out a fresh entity identifier.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        id
    }

    /// Reports whether `depth` has been generated already.
    #[must_use]
    pub fn contains(&self, depth: Depth) -> bool {
        self.levels.contains_key(&depth)
    }

    /// Retrieves a previously generated level.
    #[must_use]
    pub fn get(&self, depth: Depth) -> Option<&LevelState> {
        self.levels.get(&depth)
    }

    /// Retrieves a previously generated level for mutation.
    pub fn get_mut(&mut self, depth: Depth) -> Option<&mut LevelState> {
        self.levels.get_mut(&depth)
    }

    /// Depths generated so far, shallowest first.
    pub fn depths(&self) -> impl Iterator<Item = Depth> + '_ {
        self.levels.keys().copied()
    }

    /// Stores a prepared level, replacing any level previously held at its depth.
    pub fn insert(&mut self, level: LevelState) {
        let _ = self.levels.insert(level.depth(), level);
    }

    /// Returns the level at `depth`, generating and populating it on first access.
    pub fn get_or_create(&mut self, depth: Depth) -> &mut LevelState {
        let Self {
            generator,
            roster,
            rng,
            levels,
            next_entity,
        } = self;
        levels
            .entry(depth)
            .or_insert_with(|| generate_level(generator, roster, rng.as_mut(), next_entity, depth))
    }

    /// Moves `entity` from the level at `from` onto the level at `to`.
    ///
    /// The destination is generated if needed. The traveller is placed on the
    /// staircase matching the direction it arrived through. The departing level
    /// keeps its exploration memory. Returns the arrival position, or `None`
    /// when the source level or the entity does not exist.
    pub fn transition(
        &mut self,
        entity: EntityId,
        from: Depth,
        to: Depth,
        via: StairDirection,
    ) -> Option<Position> {
        let mut traveller = self.levels.get_mut(&from)?.take_entity(entity)?;
        let destination = self.get_or_create(to);
        let arrival = destination.arrival(via);
        traveller.position = arrival;
        destination.insert_entity(traveller);
        Some(arrival)
    }
}

/// Builds a roster member driven by the chase-or-wander behavior.
#[must_use]
pub fn monster(id: EntityId, position: Position, stats: Stats) -> Entity {
    Entity {
        id,
        position,
        name: MONSTER_NAME.to_owned(),
        glyph: MONSTER_GLYPH,
        faction: Faction::Monster,
        behavior: Behavior::ChaseOrWander,
        stats,
    }
}

fn generate_level(
    generator: &GridGenerator,
    roster: &RosterTuning,
    rng: &mut dyn RandomSource,
    next_entity: &mut u32,
    depth: Depth,
) -> LevelState {
    let skeleton = build_level(generator, depth, rng);

    let mut free: Vec<Position> = skeleton
        .grid
        .positions_of(Cell::Floor)
        .into_iter()
        .filter(|position| *position != skeleton.entry)
        .collect();

    let stats = Stats::new(
        roster.hit_points(depth),
        roster.armor_class,
        roster.strength(depth),
    );
    let mut entities = Vec::new();
    for _ in 0..roster.count(depth) {
        if free.is_empty() {
            break;
        }
        let index = rng.index(free.len());
        let position = free.swap_remove(index);
        let id = EntityId::new(*next_entity);
        *next_entity = next_entity.saturating_add(1);
        entities.push(monster(id, position, stats));
    }

    info!(
        depth = depth.get(),
        monsters = entities.len(),
        free_floor = free.len(),
        "generated level"
    );

    LevelState::new(depth, skeleton, entities)
}
