#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Delve session.
//!
//! The session is driven by a fixed-rate tick loop fed by an autopilot in
//! place of a keyboard. The fog-of-war view is printed as text.

mod autopilot;
mod clock;
mod frame;

use std::{
    io::{self, Write},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use delve_core::{Event, SeededRandom, SessionStatus, RNG_STREAM_GENERATION, RNG_STREAM_TURNS};
use delve_system_cavegen::GenerationConfig;
use delve_system_turn::{TurnConfig, TurnEngine};
use delve_world::{query, DungeonConfig, World};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{
    autopilot::{Autopilot, InputSource},
    clock::Pacing,
};

#[derive(Parser, Debug)]
#[command(name = "delve", about = "Headless fog-of-war cave crawl", long_about = None)]
struct Args {
    /// Session seed; generation and turn resolution draw from separate streams of it.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate before stopping.
    #[arg(long, default_value_t = 2_000)]
    ticks: u32,

    /// Length of one tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Level width in cells.
    #[arg(long, default_value_t = 100)]
    width: u32,

    /// Level height in cells.
    #[arg(long, default_value_t = 80)]
    height: u32,

    /// Probability that an interior cell starts as wall.
    #[arg(long, default_value_t = 0.45)]
    fill_probability: f64,

    /// Number of cellular-automaton smoothing passes.
    #[arg(long, default_value_t = 5)]
    smoothing_iterations: u32,

    /// Player sight radius.
    #[arg(long, default_value_t = 8)]
    fov_radius: u32,

    /// Number of log messages kept.
    #[arg(long, default_value_t = 8)]
    message_capacity: usize,

    /// Minimum milliseconds between player actions.
    #[arg(long, default_value_t = 50)]
    player_move_delay_ms: u64,

    /// Milliseconds between monster sweeps.
    #[arg(long, default_value_t = 250)]
    enemy_move_delay_ms: u64,

    /// Pace ticks against the wall clock instead of a simulated one.
    #[arg(long)]
    realtime: bool,

    /// Also print the view every N ticks.
    #[arg(long)]
    print_every: Option<u32>,
}

impl Args {
    fn dungeon_config(&self) -> DungeonConfig {
        DungeonConfig {
            generation: GenerationConfig {
                width: self.width,
                height: self.height,
                fill_probability: self.fill_probability,
                smoothing_iterations: self.smoothing_iterations,
            },
            fov_radius: self.fov_radius,
            message_capacity: self.message_capacity,
            ..DungeonConfig::default()
        }
    }

    fn turn_config(&self) -> TurnConfig {
        TurnConfig {
            player_move_delay: Duration::from_millis(self.player_move_delay_ms),
            enemy_move_delay: Duration::from_millis(self.enemy_move_delay_ms),
        }
    }
}

/// Entry point for the Delve command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;
    run(&args)
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")
}

fn run(args: &Args) -> Result<()> {
    let mut world = World::new(
        args.dungeon_config(),
        Box::new(SeededRandom::for_stream(args.seed, RNG_STREAM_GENERATION)),
    )
    .context("invalid dungeon configuration")?;
    let mut engine = TurnEngine::new(
        args.turn_config(),
        Box::new(SeededRandom::for_stream(args.seed, RNG_STREAM_TURNS)),
    )
    .context("invalid turn configuration")?;
    let mut input = Autopilot::new(args.seed);
    let mut pacing = Pacing::new(args.realtime, Duration::from_millis(args.tick_ms));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut events = Vec::new();
    let mut kills = 0u32;
    info!(seed = args.seed, ticks = args.ticks, "session started");

    for tick in 0..args.ticks {
        let intent = input.next_intent(&world);
        events.clear();
        engine.tick(&mut world, pacing.now(), intent, &mut events);

        for event in &events {
            match event {
                Event::EntityDied { entity } if *entity != query::player(&world) => {
                    kills = kills.saturating_add(1);
                }
                Event::DepthChanged { to, .. } => {
                    debug!(tick, depth = to.get(), "player changed depth");
                }
                _ => {}
            }
        }

        if args
            .print_every
            .is_some_and(|every| every > 0 && tick % every == 0)
        {
            print_view(&mut out, &world, kills)?;
        }

        if query::status(&world) == SessionStatus::Defeated {
            info!(tick, "player defeated");
            break;
        }
        pacing.wait();
    }

    print_view(&mut out, &world, kills)
}

fn print_view(out: &mut impl Write, world: &World, kills: u32) -> Result<()> {
    let view = query::frame(world).context("active level is missing")?;
    write!(out, "{}", frame::render(&view)).context("failed to write view")?;
    for message in view.messages.iter() {
        writeln!(out, "{}", message.text).context("failed to write message log")?;
    }
    writeln!(out, "{}", frame::summary(&view, kills)).context("failed to write summary")?;
    Ok(())
}
