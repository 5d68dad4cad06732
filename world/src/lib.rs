#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative dungeon state for Delve.
//!
//! The world owns every generated level, the player's current depth and
//! visibility, and the message log. All mutation flows through [`apply`];
//! adapters and systems observe the world through [`query`].

mod level;
mod log;
mod store;

use delve_core::{
    AttackRolls, Behavior, Command, ConfigError, Depth, Entity, EntityId, Event, Faction,
    MessageColor, MoveOutcome, Offset, RandomSource, SessionStatus, StairDirection, Stats,
    VisibilitySet,
};
use delve_system_cavegen::{GenerationConfig, GridGenerator};
use delve_system_fov::{FieldOfView, DEFAULT_RADIUS};
use tracing::{debug, info};

pub use level::LevelState;
pub use log::MessageLog;
pub use store::{monster, DungeonLevelStore};

const PLAYER_NAME: &str = "Adventurer";
const PLAYER_GLYPH: char = '@';
const DEFAULT_MESSAGE_CAPACITY: usize = 8;

/// Monster roster scaling per depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RosterTuning {
    /// Monsters placed on a level before depth scaling.
    pub base_count: u32,
    /// Extra monsters per depth.
    pub per_depth: u32,
    /// Monster hit points before depth scaling.
    pub base_hp: i32,
    /// Monster strength before depth scaling.
    pub base_strength: i32,
    /// Monster armor class.
    pub armor_class: i32,
}

impl Default for RosterTuning {
    fn default() -> Self {
        Self {
            base_count: 3,
            per_depth: 2,
            base_hp: 5,
            base_strength: 0,
            armor_class: 10,
        }
    }
}

impl RosterTuning {
    /// Number of monsters a freshly generated level at `depth` receives.
    #[must_use]
    pub fn count(&self, depth: Depth) -> usize {
        let count = self
            .base_count
            .saturating_add(self.per_depth.saturating_mul(depth.get()));
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Maximum hit points of monsters at `depth`.
    #[must_use]
    pub fn hit_points(&self, depth: Depth) -> i32 {
        self.base_hp.saturating_add(depth_bonus(depth.get()))
    }

    /// Strength of monsters at `depth`; grows by one every third depth.
    #[must_use]
    pub fn strength(&self, depth: Depth) -> i32 {
        self.base_strength.saturating_add(depth_bonus(depth.get() / 3))
    }
}

fn depth_bonus(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Starting statistics of the player character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerTemplate {
    /// Maximum hit points.
    pub hp: i32,
    /// Armor class.
    pub armor_class: i32,
    /// Strength added to attack and damage rolls.
    pub strength: i32,
}

impl Default for PlayerTemplate {
    fn default() -> Self {
        Self {
            hp: 30,
            armor_class: 12,
            strength: 3,
        }
    }
}

/// Session-wide tuning for the dungeon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DungeonConfig {
    /// Cave generation parameters shared by every depth.
    pub generation: GenerationConfig,
    /// Player sight radius.
    pub fov_radius: u32,
    /// Number of messages retained by the log.
    pub message_capacity: usize,
    /// Monster scaling.
    pub roster: RosterTuning,
    /// Player starting statistics.
    pub player: PlayerTemplate,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            fov_radius: DEFAULT_RADIUS,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            roster: RosterTuning::default(),
            player: PlayerTemplate::default(),
        }
    }
}

/// Represents the authoritative dungeon session.
#[derive(Debug)]
pub struct World {
    config: DungeonConfig,
    generator: GridGenerator,
    fov: FieldOfView,
    store: DungeonLevelStore,
    depth: Depth,
    player: EntityId,
    visible: VisibilitySet,
    log: MessageLog,
    status: SessionStatus,
}

impl World {
    /// Validates the configuration, generates the first depth and places the player on it.
    pub fn new(config: DungeonConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        let mut world = Self::unpopulated(config, rng)?;
        world.enter_first_depth();
        Ok(world)
    }

    /// Builds a session whose first depth uses a prepared layout and monster roster.
    ///
    /// Deeper levels are still generated from `rng`.
    #[cfg(feature = "testing")]
    pub fn from_layout(
        config: DungeonConfig,
        skeleton: delve_system_cavegen::LevelSkeleton,
        monsters: &[(delve_core::Position, Stats)],
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        let mut world = Self::unpopulated(config, rng)?;
        let entities = monsters
            .iter()
            .map(|(position, stats)| monster(world.store.allocate_id(), *position, *stats))
            .collect();
        world
            .store
            .insert(LevelState::new(Depth::FIRST, skeleton, entities));
        world.enter_first_depth();
        Ok(world)
    }

    fn unpopulated(config: DungeonConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        let generator = GridGenerator::new(config.generation)?;
        let fov = FieldOfView::new(config.fov_radius)?;
        let log = MessageLog::new(config.message_capacity)?;
        let mut store = DungeonLevelStore::new(generator.clone(), config.roster, rng);
        let player = store.allocate_id();

        Ok(Self {
            config,
            generator,
            fov,
            store,
            depth: Depth::FIRST,
            player,
            visible: VisibilitySet::new(),
            log,
            status: SessionStatus::Running,
        })
    }

    /// Discards every level and starts a new descent with fresh randomness.
    pub fn restart(&mut self, rng: Box<dyn RandomSource>) {
        self.store = DungeonLevelStore::new(self.generator.clone(), self.config.roster, rng);
        self.player = self.store.allocate_id();
        self.depth = Depth::FIRST;
        self.status = SessionStatus::Running;
        self.log.clear();
        self.enter_first_depth();
    }

    fn enter_first_depth(&mut self) {
        let template = self.config.player;
        let level = self.store.get_or_create(Depth::FIRST);
        level.insert_entity(Entity {
            id: self.player,
            position: level.entry(),
            name: PLAYER_NAME.to_owned(),
            glyph: PLAYER_GLYPH,
            faction: Faction::Player,
            behavior: Behavior::PlayerControlled,
            stats: Stats::new(template.hp, template.armor_class, template.strength),
        });
        self.refresh_visibility();
        self.log.push(
            "You enter the caves. Find the stairs down.",
            MessageColor::INFO,
        );
        info!(player = self.player.get(), "session started");
    }

    fn active_level(&self) -> Option<&LevelState> {
        self.store.get(self.depth)
    }

    fn active_level_mut(&mut self) -> Option<&mut LevelState> {
        self.store.get_mut(self.depth)
    }

    fn refresh_visibility(&mut self) {
        let fov = self.fov;
        let player = self.player;
        let Some(level) = self.store.get_mut(self.depth) else {
            return;
        };
        let Some(origin) = level.entity(player).map(|entity| entity.position) else {
            return;
        };
        let visible = fov.compute(origin, level.grid());
        level.mark_explored(&visible);
        self.visible = visible;
    }

    fn step(&mut self, entity: EntityId, offset: Offset, out_events: &mut Vec<Event>) {
        let Some(level) = self.active_level_mut() else {
            return;
        };
        let Some(from) = level.entity(entity).map(|mover| mover.position) else {
            return;
        };
        let outcome = level.triage(entity, from.offset(offset));
        if outcome == MoveOutcome::Moved {
            if let Some(mover) = level.entity_mut(entity) {
                mover.position = from.offset(offset);
            }
            if entity == self.player {
                self.refresh_visibility();
            }
        }
        out_events.push(Event::StepResolved {
            entity,
            from,
            outcome,
        });
    }

    fn resolve_attack(
        &mut self,
        attacker: EntityId,
        defender: EntityId,
        rolls: AttackRolls,
        out_events: &mut Vec<Event>,
    ) {
        let Some(level) = self.store.get_mut(self.depth) else {
            return;
        };
        let Some((attacker_name, attacker_stats)) = level
            .entity(attacker)
            .filter(|entity| entity.is_alive())
            .map(|entity| (entity.name.clone(), entity.stats))
        else {
            return;
        };
        let Some(target) = level
            .entity_mut(defender)
            .filter(|entity| entity.is_alive())
        else {
            return;
        };

        let report = rolls.resolve(&attacker_stats, &mut target.stats);
        let defender_name = target.name.clone();
        let died = !target.is_alive();

        let text = if report.hit {
            format!(
                "{attacker_name} hits {defender_name} ({}{:+} = {} vs AC {}) for {} damage, {}/{} HP left.",
                report.roll,
                attacker_stats.strength,
                report.hit_total,
                report.armor_class,
                report.damage,
                report.remaining_hp,
                report.max_hp,
            )
        } else {
            format!(
                "{attacker_name} misses {defender_name} ({}{:+} = {} vs AC {}), {}/{} HP left.",
                report.roll,
                attacker_stats.strength,
                report.hit_total,
                report.armor_class,
                report.remaining_hp,
                report.max_hp,
            )
        };
        let color = if report.hit {
            MessageColor::HIT
        } else {
            MessageColor::MISS
        };
        self.log.push(text, color);
        out_events.push(Event::AttackResolved {
            attacker,
            defender,
            report,
        });

        if died {
            self.log
                .push(format!("{defender_name} dies."), MessageColor::DEATH);
            out_events.push(Event::EntityDied { entity: defender });
            if defender == self.player {
                self.status = SessionStatus::Defeated;
                self.log.push("You have been slain.", MessageColor::DEATH);
                out_events.push(Event::PlayerDefeated);
            }
        }
    }

    fn take_stairs(&mut self, direction: StairDirection, out_events: &mut Vec<Event>) {
        if self.status == SessionStatus::Defeated {
            return;
        }
        let from = self.depth;
        let Some(to) = from.through(direction) else {
            self.log
                .push("The way back up is sealed.", MessageColor::INFO);
            return;
        };

        let generated = !self.store.contains(to);
        let Some(arrival) = self.store.transition(self.player, from, to, direction) else {
            return;
        };
        if generated {
            out_events.push(Event::LevelGenerated { depth: to });
        }

        self.depth = to;
        self.refresh_visibility();
        let verb = match direction {
            StairDirection::Down => "descend",
            StairDirection::Up => "climb",
        };
        self.log.push(
            format!("You {verb} to depth {}.", to.get()),
            MessageColor::TRAVEL,
        );
        info!(from = from.get(), to = to.get(), generated, "depth changed");
        out_events.push(Event::DepthChanged { from, to, arrival });
    }

    fn remove_dead(&mut self, out_events: &mut Vec<Event>) {
        let Some(level) = self.active_level_mut() else {
            return;
        };
        let entities = level.remove_dead();
        if !entities.is_empty() {
            debug!(count = entities.len(), "removed dead entities");
            out_events.push(Event::EntitiesRemoved { entities });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StepEntity { entity, offset } => world.step(entity, offset, out_events),
        Command::ResolveAttack {
            attacker,
            defender,
            rolls,
        } => world.resolve_attack(attacker, defender, rolls, out_events),
        Command::TakeStairs { direction } => world.take_stairs(direction, out_events),
        Command::RemoveDead => world.remove_dead(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::HashSet;

    use super::{LevelState, MessageLog, World};
    use delve_core::{
        Depth, Entity, EntityId, EntityView, Grid, Position, SessionStatus, VisibilitySet,
    };

    /// Everything a presentation layer needs to draw the current state.
    #[derive(Clone, Debug)]
    pub struct Frame<'a> {
        /// Depth currently shown.
        pub depth: Depth,
        /// Terrain of the active level.
        pub grid: &'a Grid,
        /// Cells the player currently sees.
        pub visible: &'a VisibilitySet,
        /// Cells the player has ever seen on this level.
        pub explored: &'a HashSet<Position>,
        /// Living entities on the active level.
        pub entities: EntityView,
        /// Message log, oldest first.
        pub messages: &'a MessageLog,
        /// Whether the session is still running.
        pub status: SessionStatus,
    }

    /// Depth the player is currently on.
    #[must_use]
    pub fn depth(world: &World) -> Depth {
        world.depth
    }

    /// Identifier of the player entity.
    #[must_use]
    pub fn player(world: &World) -> EntityId {
        world.player
    }

    /// Current session status.
    #[must_use]
    pub fn status(world: &World) -> SessionStatus {
        world.status
    }

    /// Provides read-only access to the active level.
    #[must_use]
    pub fn active_level(world: &World) -> Option<&LevelState> {
        world.active_level()
    }

    /// Provides read-only access to any generated level.
    #[must_use]
    pub fn level(world: &World, depth: Depth) -> Option<&LevelState> {
        world.store.get(depth)
    }

    /// Terrain of the active level.
    #[must_use]
    pub fn grid(world: &World) -> Option<&Grid> {
        world.active_level().map(LevelState::grid)
    }

    /// Cells currently visible to the player.
    #[must_use]
    pub fn visible(world: &World) -> &VisibilitySet {
        &world.visible
    }

    /// Cells of the active level the player has ever seen.
    #[must_use]
    pub fn explored(world: &World) -> Option<&HashSet<Position>> {
        world.active_level().map(LevelState::explored)
    }

    /// Looks up an entity on the active level.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<&Entity> {
        world.active_level().and_then(|level| level.entity(id))
    }

    /// Position of the player on the active level.
    #[must_use]
    pub fn player_position(world: &World) -> Option<Position> {
        entity(world, world.player).map(|player| player.position)
    }

    /// Living entities of the active level in roster order.
    #[must_use]
    pub fn live_entities(world: &World) -> Vec<EntityId> {
        world
            .active_level()
            .map(LevelState::live_ids)
            .unwrap_or_default()
    }

    /// Captures a read-only view of the living entities on the active level.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        let snapshots = world
            .active_level()
            .map(|level| {
                level
                    .entities()
                    .filter(|entity| entity.is_alive())
                    .map(Entity::snapshot)
                    .collect()
            })
            .unwrap_or_default();
        EntityView::from_snapshots(snapshots)
    }

    /// Message log, oldest first.
    #[must_use]
    pub fn messages(world: &World) -> &MessageLog {
        &world.log
    }

    /// Bundles everything needed to render the active level.
    #[must_use]
    pub fn frame(world: &World) -> Option<Frame<'_>> {
        let level = world.active_level()?;
        Some(Frame {
            depth: world.depth,
            grid: level.grid(),
            visible: &world.visible,
            explored: level.explored(),
            entities: entity_view(world),
            messages: &world.log,
            status: world.status,
        })
    }
}
