#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cooldown-gated turn resolution for the player and the monster roster.
//!
//! The engine never mutates the world directly. Every action becomes a
//! [`Command`] applied through [`delve_world::apply`], and the engine reacts
//! to the resulting events: a collision turns into an attack with freshly
//! drawn dice, and a player stepping onto a staircase turns into a level
//! transition.

use std::time::Duration;

use delve_core::{
    AttackRolls, Behavior, Command, ConfigError, Direction, EntityId, Event, MoveOutcome, Offset,
    Position, RandomSource, SessionStatus, DEFAULT_ENEMY_MOVE_DELAY, DEFAULT_PLAYER_MOVE_DELAY,
};
use delve_world::{self as world, query, World};
use tracing::trace;

const ATTACK_DIE: (u32, u32) = (1, 20);
const DAMAGE_DIE: (u32, u32) = (1, 6);

/// Action cadence of the player and of the monster roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnConfig {
    /// Minimum time between two accepted player actions.
    pub player_move_delay: Duration,
    /// Time between two monster sweeps.
    pub enemy_move_delay: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            player_move_delay: DEFAULT_PLAYER_MOVE_DELAY,
            enemy_move_delay: DEFAULT_ENEMY_MOVE_DELAY,
        }
    }
}

impl TurnConfig {
    /// Rejects zero delays.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player_move_delay.is_zero() || self.enemy_move_delay.is_zero() {
            return Err(ConfigError::MoveDelay);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct Cooldown {
    delay: Duration,
    last: Option<Duration>,
}

impl Cooldown {
    const fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.last.map(|last| now.saturating_sub(last))
    }

    fn consume(&mut self, now: Duration) {
        self.last = Some(now);
    }
}

/// Resolves player intents and monster behavior against the active level.
#[derive(Debug)]
pub struct TurnEngine {
    rng: Box<dyn RandomSource>,
    player_gate: Cooldown,
    enemy_gate: Cooldown,
}

impl TurnEngine {
    /// Creates an engine drawing dice and wander choices from `rng`.
    pub fn new(config: TurnConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rng,
            player_gate: Cooldown::new(config.player_move_delay),
            enemy_gate: Cooldown::new(config.enemy_move_delay),
        })
    }

    /// Advances the session to `now`.
    ///
    /// The player's intent is honored when strictly more than the player delay
    /// has passed since the last accepted action; a blocked step does not
    /// count as an action. The monster roster acts once every enemy delay,
    /// measured from the first tick. Nothing happens once the player is
    /// defeated.
    pub fn tick(
        &mut self,
        world: &mut World,
        now: Duration,
        intent: Option<Direction>,
        out_events: &mut Vec<Event>,
    ) {
        if query::status(world) == SessionStatus::Defeated {
            return;
        }

        if let Some(direction) = intent {
            if self.player_ready(now) {
                self.player_turn(world, direction, now, out_events);
            }
        }

        if self.enemies_ready(now) {
            self.enemy_gate.consume(now);
            self.enemy_sweep(world, out_events);
        }
    }

    fn player_ready(&self, now: Duration) -> bool {
        self.player_gate
            .elapsed(now)
            .map_or(true, |elapsed| elapsed > self.player_gate.delay)
    }

    fn enemies_ready(&mut self, now: Duration) -> bool {
        match self.enemy_gate.elapsed(now) {
            Some(elapsed) => elapsed >= self.enemy_gate.delay,
            None => {
                self.enemy_gate.consume(now);
                false
            }
        }
    }

    fn player_turn(
        &mut self,
        world: &mut World,
        direction: Direction,
        now: Duration,
        out_events: &mut Vec<Event>,
    ) {
        let player = query::player(world);
        match step(world, player, direction.offset(), out_events) {
            MoveOutcome::Blocked => return,
            MoveOutcome::Moved => {}
            MoveOutcome::Collided(defender) => self.attack(world, player, defender, out_events),
            MoveOutcome::UsedStairs(direction) => {
                world::apply(world, Command::TakeStairs { direction }, out_events);
            }
        }
        self.player_gate.consume(now);
        world::apply(world, Command::RemoveDead, out_events);
    }

    fn enemy_sweep(&mut self, world: &mut World, out_events: &mut Vec<Event>) {
        let player = query::player(world);
        for id in query::live_entities(world) {
            if id == player {
                continue;
            }
            let Some(offset) = self.decide(world, id) else {
                continue;
            };
            match step(world, id, offset, out_events) {
                MoveOutcome::Collided(defender) => self.attack(world, id, defender, out_events),
                MoveOutcome::UsedStairs(_) => {
                    trace!(entity = id.get(), "monster ignores staircase");
                }
                MoveOutcome::Blocked | MoveOutcome::Moved => {}
            }
        }
        world::apply(world, Command::RemoveDead, out_events);
    }

    /// Picks the step a monster attempts this sweep, if any.
    fn decide(&mut self, world: &World, id: EntityId) -> Option<Offset> {
        let monster = query::entity(world, id).filter(|entity| entity.is_alive())?;
        match monster.behavior {
            Behavior::PlayerControlled => None,
            Behavior::ChaseOrWander => {
                let target = query::player_position(world);
                let offset = chase_or_wander(
                    monster.position,
                    target,
                    query::visible(world).contains(&monster.position),
                    self.rng.as_mut(),
                );
                trace!(
                    entity = id.get(),
                    dx = offset.dx(),
                    dy = offset.dy(),
                    "monster decided"
                );
                Some(offset).filter(|offset| !offset.is_zero())
            }
        }
    }

    fn attack(
        &mut self,
        world: &mut World,
        attacker: EntityId,
        defender: EntityId,
        out_events: &mut Vec<Event>,
    ) {
        let rolls = AttackRolls::new(
            self.rng.roll(ATTACK_DIE.0, ATTACK_DIE.1),
            self.rng.roll(DAMAGE_DIE.0, DAMAGE_DIE.1),
        );
        world::apply(
            world,
            Command::ResolveAttack {
                attacker,
                defender,
                rolls,
            },
            out_events,
        );
    }
}

/// Greedy chase toward `target` when seen, otherwise a uniform choice among
/// the four cardinal steps and staying put.
pub fn chase_or_wander(
    position: Position,
    target: Option<Position>,
    seen: bool,
    rng: &mut dyn RandomSource,
) -> Offset {
    match target {
        Some(target) if seen => Offset::toward(position, target),
        _ => Direction::ALL
            .get(rng.index(Direction::ALL.len() + 1))
            .map_or(Offset::ZERO, |direction| direction.offset()),
    }
}

fn step(
    world: &mut World,
    entity: EntityId,
    offset: Offset,
    out_events: &mut Vec<Event>,
) -> MoveOutcome {
    let mut events = Vec::new();
    world::apply(world, Command::StepEntity { entity, offset }, &mut events);
    let outcome = events
        .iter()
        .find_map(|event| match event {
            Event::StepResolved { outcome, .. } => Some(*outcome),
            _ => None,
        })
        .unwrap_or(MoveOutcome::Blocked);
    out_events.extend(events);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::testing::ScriptedRandom;

    #[test]
    fn zero_delays_are_rejected() {
        let config = TurnConfig {
            player_move_delay: Duration::ZERO,
            ..TurnConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MoveDelay));
        assert!(TurnEngine::new(config, Box::new(ScriptedRandom::new())).is_err());
        assert_eq!(TurnConfig::default().validate(), Ok(()));
    }

    #[test]
    fn seen_monsters_chase_on_both_axes() {
        let mut rng = ScriptedRandom::new().with_indices([0]);
        let offset = chase_or_wander(
            Position::new(5, 5),
            Some(Position::new(2, 9)),
            true,
            &mut rng,
        );
        assert_eq!(offset, Offset::new(-1, 1));
    }

    #[test]
    fn unseen_monsters_wander_or_stay() {
        let mut rng = ScriptedRandom::new().with_indices([1, 4]);
        let origin = Position::new(5, 5);
        let target = Some(Position::new(6, 5));

        assert_eq!(
            chase_or_wander(origin, target, false, &mut rng),
            Direction::East.offset()
        );
        assert_eq!(
            chase_or_wander(origin, target, false, &mut rng),
            Offset::ZERO
        );
    }

    #[test]
    fn player_cooldown_is_strict() {
        let mut engine = TurnEngine::new(TurnConfig::default(), Box::new(ScriptedRandom::new()))
            .expect("config");
        assert!(engine.player_ready(Duration::ZERO));
        engine.player_gate.consume(Duration::from_millis(100));
        assert!(!engine.player_ready(Duration::from_millis(150)));
        assert!(engine.player_ready(Duration::from_millis(151)));
    }

    #[test]
    fn enemy_gate_arms_on_first_tick() {
        let mut engine = TurnEngine::new(TurnConfig::default(), Box::new(ScriptedRandom::new()))
            .expect("config");
        assert!(!engine.enemies_ready(Duration::from_millis(10)));
        assert!(!engine.enemies_ready(Duration::from_millis(259)));
        assert!(engine.enemies_ready(Duration::from_millis(260)));
    }
}
