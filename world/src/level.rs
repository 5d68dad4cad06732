//! Persistent per-depth state: terrain, exploration memory and roster.

use std::collections::HashSet;

use delve_core::{
    Cell, Depth, Entity, EntityId, Faction, Grid, MoveOutcome, Position, StairDirection,
    VisibilitySet,
};
use delve_system_cavegen::LevelSkeleton;

/// Everything that persists about a single dungeon depth.
#[derive(Clone, Debug)]
pub struct LevelState {
    depth: Depth,
    grid: Grid,
    explored: HashSet<Position>,
    entities: Vec<Entity>,
    down_stairs: Position,
    up_stairs: Option<Position>,
    entry: Position,
}

impl LevelState {
    /// Wraps a generated layout together with its initial roster.
    #[must_use]
    pub fn new(depth: Depth, skeleton: LevelSkeleton, entities: Vec<Entity>) -> Self {
        Self {
            depth,
            grid: skeleton.grid,
            explored: HashSet::new(),
            entities,
            down_stairs: skeleton.down_stairs,
            up_stairs: skeleton.up_stairs,
            entry: skeleton.entry,
        }
    }

    /// Depth this level lives at.
    #[must_use]
    pub const fn depth(&self) -> Depth {
        self.depth
    }

    /// Terrain of the level. Never changes after generation.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Cells that were visible to the player at any point.
    #[must_use]
    pub const fn explored(&self) -> &HashSet<Position> {
        &self.explored
    }

    /// Location of the down staircase.
    #[must_use]
    pub const fn down_stairs(&self) -> Position {
        self.down_stairs
    }

    /// Location of the up staircase, absent on the first depth.
    #[must_use]
    pub const fn up_stairs(&self) -> Option<Position> {
        self.up_stairs
    }

    /// Spawn point used when entering the level for the first time.
    #[must_use]
    pub const fn entry(&self) -> Position {
        self.entry
    }

    /// Where an entity arriving through a staircase is placed.
    ///
    /// Descending lands on the up staircase; ascending lands on the down staircase.
    #[must_use]
    pub fn arrival(&self, via: StairDirection) -> Position {
        match via {
            StairDirection::Down => self.up_stairs.unwrap_or(self.entry),
            StairDirection::Up => self.down_stairs,
        }
    }

    /// Unions the provided cells into the explored memory.
    pub fn mark_explored(&mut self, visible: &VisibilitySet) {
        self.explored.extend(visible.iter().copied());
    }

    /// Entities on the level in roster order, including the dead awaiting removal.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Identifiers of living entities in roster order.
    #[must_use]
    pub fn live_ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|entity| entity.is_alive())
            .map(|entity| entity.id)
            .collect()
    }

    /// Looks up an entity on this level.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// Living entity standing on `position`, if any. Dead entities occupy nothing.
    #[must_use]
    pub fn occupant(&self, position: Position) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|entity| entity.is_alive() && entity.position == position)
            .map(|entity| entity.id)
    }

    /// Classifies an attempted move of `mover` onto `destination`.
    ///
    /// Checks run in a fixed order: grid bounds, walls, staircases, occupants.
    /// Unknown or dead movers and self-collisions are blocked.
    #[must_use]
    pub fn triage(&self, mover: EntityId, destination: Position) -> MoveOutcome {
        if !self.entity(mover).is_some_and(Entity::is_alive) {
            return MoveOutcome::Blocked;
        }
        let Some(cell) = self.grid.get(destination) else {
            return MoveOutcome::Blocked;
        };
        if cell == Cell::Wall {
            return MoveOutcome::Blocked;
        }
        if let Some(direction) = cell.stairs() {
            return MoveOutcome::UsedStairs(direction);
        }
        match self.occupant(destination) {
            Some(occupant) if occupant == mover => MoveOutcome::Blocked,
            Some(occupant) => MoveOutcome::Collided(occupant),
            None => MoveOutcome::Moved,
        }
    }

    /// Removes an entity from the roster and hands it over.
    pub fn take_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|entity| entity.id == id)?;
        Some(self.entities.remove(index))
    }

    /// Places an entity at the head of the roster.
    pub fn insert_entity(&mut self, entity: Entity) {
        self.entities.insert(0, entity);
    }

    /// Drops every dead non-player entity, returning their identifiers in roster order.
    pub fn remove_dead(&mut self) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.entities.retain(|entity| {
            let keep = entity.is_alive() || entity.faction == Faction::Player;
            if !keep {
                removed.push(entity.id);
            }
            keep
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::{Behavior, Stats};

    fn monster(id: u32, position: Position) -> Entity {
        Entity {
            id: EntityId::new(id),
            position,
            name: "goblin".to_owned(),
            glyph: 'g',
            faction: Faction::Monster,
            behavior: Behavior::ChaseOrWander,
            stats: Stats::new(5, 10, 0),
        }
    }

    fn level(entities: Vec<Entity>) -> LevelState {
        let mut grid = Grid::filled(8, 6, Cell::Floor);
        grid.enforce_border();
        grid.set(Position::new(3, 2), Cell::Wall);
        grid.set(Position::new(6, 4), Cell::StairsDown);
        grid.set(Position::new(1, 4), Cell::StairsUp);
        let skeleton = LevelSkeleton {
            grid,
            down_stairs: Position::new(6, 4),
            up_stairs: Some(Position::new(1, 4)),
            entry: Position::new(1, 4),
        };
        LevelState::new(Depth::new(2), skeleton, entities)
    }

    #[test]
    fn triage_follows_priority_order() {
        let walker = EntityId::new(1);
        let state = level(vec![
            monster(1, Position::new(2, 2)),
            monster(2, Position::new(2, 3)),
        ]);

        assert_eq!(state.triage(walker, Position::new(2, -1)), MoveOutcome::Blocked);
        assert_eq!(state.triage(walker, Position::new(2, 0)), MoveOutcome::Blocked);
        assert_eq!(state.triage(walker, Position::new(3, 2)), MoveOutcome::Blocked);
        assert_eq!(
            state.triage(walker, Position::new(6, 4)),
            MoveOutcome::UsedStairs(StairDirection::Down)
        );
        assert_eq!(
            state.triage(walker, Position::new(2, 3)),
            MoveOutcome::Collided(EntityId::new(2))
        );
        assert_eq!(state.triage(walker, Position::new(2, 2)), MoveOutcome::Blocked);
        assert_eq!(state.triage(walker, Position::new(2, 1)), MoveOutcome::Moved);
    }

    #[test]
    fn occupied_stairs_report_used_stairs() {
        let mut player = monster(1, Position::new(1, 4));
        player.faction = Faction::Player;
        player.behavior = Behavior::PlayerControlled;
        let state = level(vec![player, monster(2, Position::new(2, 4))]);

        assert_eq!(state.occupant(Position::new(1, 4)), Some(EntityId::new(1)));
        assert_eq!(
            state.triage(EntityId::new(2), Position::new(1, 4)),
            MoveOutcome::UsedStairs(StairDirection::Up)
        );
    }

    #[test]
    fn dead_entities_do_not_occupy_cells() {
        let mut corpse = monster(2, Position::new(2, 3));
        corpse.stats.hp = 0;
        let state = level(vec![monster(1, Position::new(2, 2)), corpse]);

        assert_eq!(state.occupant(Position::new(2, 3)), None);
        assert_eq!(
            state.triage(EntityId::new(1), Position::new(2, 3)),
            MoveOutcome::Moved
        );
        assert_eq!(
            state.triage(EntityId::new(2), Position::new(2, 4)),
            MoveOutcome::Blocked
        );
        assert_eq!(state.live_ids(), vec![EntityId::new(1)]);
    }

    #[test]
    fn remove_dead_spares_the_player() {
        let mut fallen_player = monster(0, Position::new(4, 1));
        fallen_player.faction = Faction::Player;
        fallen_player.stats.hp = 0;
        let mut corpse = monster(2, Position::new(2, 3));
        corpse.stats.hp = -2;
        let mut state = level(vec![fallen_player, monster(1, Position::new(2, 2)), corpse]);

        assert_eq!(state.remove_dead(), vec![EntityId::new(2)]);
        assert!(state.entity(EntityId::new(0)).is_some());
        assert!(state.remove_dead().is_empty());
    }

    #[test]
    fn arrival_depends_on_travel_direction() {
        let state = level(Vec::new());
        assert_eq!(state.arrival(StairDirection::Down), Position::new(1, 4));
        assert_eq!(state.arrival(StairDirection::Up), Position::new(6, 4));
    }

    #[test]
    fn explored_memory_only_grows() {
        let mut state = level(Vec::new());
        let first: VisibilitySet = [Position::new(1, 1), Position::new(2, 1)].into();
        let second: VisibilitySet = [Position::new(5, 3)].into();

        state.mark_explored(&first);
        state.mark_explored(&second);

        assert_eq!(state.explored().len(), 3);
        assert!(first.is_subset(state.explored()));
    }
}
