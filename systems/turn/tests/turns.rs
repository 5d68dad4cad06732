use std::time::Duration;

use delve_core::{
    testing::ScriptedRandom, AttackReport, Cell, Depth, Direction, EntityId, Event, Grid,
    MoveOutcome, Position, SeededRandom, SessionStatus, Stats,
};
use delve_system_cavegen::{GenerationConfig, LevelSkeleton};
use delve_system_turn::{TurnConfig, TurnEngine};
use delve_world::{query, DungeonConfig, World};

const ENTRY: Position = Position::new(1, 1);

fn room(stairs: Position) -> LevelSkeleton {
    let mut grid = Grid::filled(9, 5, Cell::Floor);
    grid.enforce_border();
    grid.set(stairs, Cell::StairsDown);
    LevelSkeleton {
        grid,
        down_stairs: stairs,
        up_stairs: None,
        entry: ENTRY,
    }
}

fn config() -> DungeonConfig {
    DungeonConfig {
        generation: GenerationConfig {
            width: 30,
            height: 20,
            ..GenerationConfig::default()
        },
        ..DungeonConfig::default()
    }
}

fn session(config: DungeonConfig, stairs: Position, monsters: &[(Position, Stats)]) -> World {
    World::from_layout(config, room(stairs), monsters, Box::new(SeededRandom::new(7)))
        .expect("valid config")
}

fn engine(rng: ScriptedRandom) -> TurnEngine {
    TurnEngine::new(TurnConfig::default(), Box::new(rng)).expect("valid config")
}

fn monsters(world: &World) -> Vec<EntityId> {
    let player = query::player(world);
    query::live_entities(world)
        .into_iter()
        .filter(|id| *id != player)
        .collect()
}

fn position(world: &World, id: EntityId) -> Option<Position> {
    query::entity(world, id).map(|entity| entity.position)
}

#[test]
fn bumping_a_monster_resolves_an_attack() {
    let mut world = session(
        config(),
        Position::new(7, 3),
        &[(Position::new(2, 1), Stats::new(10, 12, 0))],
    );
    let player = query::player(&world);
    let goblin = monsters(&world)[0];
    let mut engine = engine(ScriptedRandom::new().with_rolls([15, 4]));
    let mut events = Vec::new();

    engine.tick(&mut world, Duration::ZERO, Some(Direction::East), &mut events);

    assert_eq!(
        events,
        vec![
            Event::StepResolved {
                entity: player,
                from: ENTRY,
                outcome: MoveOutcome::Collided(goblin),
            },
            Event::AttackResolved {
                attacker: player,
                defender: goblin,
                report: AttackReport {
                    roll: 15,
                    hit_total: 18,
                    armor_class: 12,
                    hit: true,
                    damage: 7,
                    remaining_hp: 3,
                    max_hp: 10,
                },
            },
        ]
    );
    assert_eq!(position(&world, player), Some(ENTRY));
    assert_eq!(position(&world, goblin), Some(Position::new(2, 1)));
    let last = query::messages(&world).last().expect("attack message");
    assert!(last.text.contains("hits"), "{}", last.text);
}

#[test]
fn monsters_contesting_a_cell_fight_each_other() {
    let mut world = session(
        config(),
        Position::new(7, 3),
        &[
            (Position::new(5, 1), Stats::new(6, 10, 0)),
            (Position::new(5, 2), Stats::new(6, 10, 0)),
        ],
    );
    let roster = monsters(&world);
    let (first, second) = (roster[0], roster[1]);
    assert!(query::visible(&world).contains(&Position::new(5, 1)));
    assert!(query::visible(&world).contains(&Position::new(5, 2)));

    let mut engine = engine(ScriptedRandom::new());
    let mut events = Vec::new();
    engine.tick(&mut world, Duration::ZERO, None, &mut events);
    assert!(events.is_empty(), "monsters acted before their first delay");

    engine.tick(&mut world, Duration::from_millis(250), None, &mut events);

    assert_eq!(
        &events[..2],
        &[
            Event::StepResolved {
                entity: first,
                from: Position::new(5, 1),
                outcome: MoveOutcome::Moved,
            },
            Event::StepResolved {
                entity: second,
                from: Position::new(5, 2),
                outcome: MoveOutcome::Collided(first),
            },
        ]
    );
    assert!(events.iter().any(|event| matches!(
        event,
        Event::AttackResolved { attacker, defender, report }
            if *attacker == second && *defender == first && !report.hit
    )));
    assert_eq!(position(&world, first), Some(Position::new(4, 1)));
    assert_eq!(position(&world, second), Some(Position::new(5, 2)));
}

#[test]
fn blocked_steps_keep_position_and_cooldown() {
    let mut world = session(config(), Position::new(7, 3), &[]);
    let player = query::player(&world);
    let mut engine = engine(ScriptedRandom::new());
    let mut events = Vec::new();

    engine.tick(&mut world, Duration::ZERO, Some(Direction::North), &mut events);
    assert_eq!(
        events,
        vec![Event::StepResolved {
            entity: player,
            from: ENTRY,
            outcome: MoveOutcome::Blocked,
        }]
    );
    assert_eq!(position(&world, player), Some(ENTRY));

    engine.tick(
        &mut world,
        Duration::from_millis(1),
        Some(Direction::East),
        &mut events,
    );
    assert_eq!(position(&world, player), Some(Position::new(2, 1)));

    engine.tick(
        &mut world,
        Duration::from_millis(51),
        Some(Direction::East),
        &mut events,
    );
    assert_eq!(position(&world, player), Some(Position::new(2, 1)));

    engine.tick(
        &mut world,
        Duration::from_millis(52),
        Some(Direction::East),
        &mut events,
    );
    assert_eq!(position(&world, player), Some(Position::new(3, 1)));
}

#[test]
fn stepping_onto_stairs_descends() {
    let mut world = session(config(), Position::new(2, 1), &[]);
    let mut engine = engine(ScriptedRandom::new());
    let mut events = Vec::new();

    engine.tick(&mut world, Duration::ZERO, Some(Direction::East), &mut events);

    let level = query::active_level(&world).expect("second depth");
    let arrival = level.up_stairs().expect("up stairs below first depth");
    assert_eq!(query::depth(&world), Depth::new(2));
    assert_eq!(query::player_position(&world), Some(arrival));
    assert!(events.contains(&Event::LevelGenerated {
        depth: Depth::new(2)
    }));
    assert!(events.contains(&Event::DepthChanged {
        from: Depth::FIRST,
        to: Depth::new(2),
        arrival,
    }));
    assert!(query::visible(&world).contains(&arrival));
}

#[test]
fn defeated_player_accepts_no_actions() {
    let mut config = config();
    config.player.hp = 1;
    let mut world = session(
        config,
        Position::new(7, 3),
        &[(Position::new(2, 1), Stats::new(5, 10, 5))],
    );
    let player = query::player(&world);
    let mut engine = engine(ScriptedRandom::new().with_rolls([10, 1]));
    let mut events = Vec::new();

    engine.tick(&mut world, Duration::ZERO, None, &mut events);
    engine.tick(&mut world, Duration::from_millis(250), None, &mut events);

    assert_eq!(query::status(&world), SessionStatus::Defeated);
    assert!(events.contains(&Event::PlayerDefeated));
    assert!(query::entity(&world, player).is_some());

    events.clear();
    engine.tick(
        &mut world,
        Duration::from_secs(1),
        Some(Direction::South),
        &mut events,
    );
    assert!(events.is_empty());
    assert_eq!(position(&world, player), Some(ENTRY));
}

#[test]
fn killed_monsters_leave_the_roster() {
    let mut world = session(
        config(),
        Position::new(7, 3),
        &[(Position::new(2, 1), Stats::new(2, 10, 0))],
    );
    let goblin = monsters(&world)[0];
    let mut engine = engine(ScriptedRandom::new().with_rolls([12, 3]));
    let mut events = Vec::new();

    engine.tick(&mut world, Duration::ZERO, Some(Direction::East), &mut events);

    assert!(events.contains(&Event::EntityDied { entity: goblin }));
    assert!(events.contains(&Event::EntitiesRemoved {
        entities: vec![goblin]
    }));
    assert!(query::entity(&world, goblin).is_none());
    assert!(monsters(&world).is_empty());
}
