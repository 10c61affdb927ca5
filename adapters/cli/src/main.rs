#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives Backtrack sessions.

mod replay_transfer;
mod script;

use anyhow::{bail, Context, Result};
use backtrack_core::{Command, Event, LevelIndex, SessionPhase, StepInput, TileKind};
use backtrack_system_analytics::AttemptAnalytics;
use backtrack_world::{query, World, DEFAULT_HISTORY_FRAMES};
use clap::{Args, Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    replay_transfer::ReplaySnapshot,
    script::{parse_script, ScriptAction},
};

/// Command-line interface for the Backtrack rewind platformer.
///
/// Scripts are whitespace-separated tokens: `.` idles, `L`/`R`/`J` hold
/// left/right/jump and combine freely (`RJ`), `!` rewinds, and any token
/// takes a `*N` repeat suffix, as in `R*40 RJ*3 ! R*60`.
#[derive(Parser)]
#[command(name = "backtrack", version)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run an input script against a level and narrate the outcome.
    Run(RunArgs),
    /// Encode a scripted run as a shareable replay string.
    Share(RunArgs),
    /// Decode a replay string, re-run its script, and verify the outcome.
    Verify(VerifyArgs),
    /// Hammer a session with seeded random input and check it stays sane.
    Fuzz(FuzzArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Level to load; out-of-range indices clamp to the last level.
    #[arg(long, default_value_t = 0)]
    level: u32,
    /// Input script to execute.
    #[arg(long, default_value = ".")]
    script: String,
}

#[derive(Args)]
struct VerifyArgs {
    /// Replay string produced by the `share` subcommand.
    replay: String,
}

#[derive(Args)]
struct FuzzArgs {
    /// Seed for the deterministic input stream.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Frames to simulate per session.
    #[arg(long, default_value_t = 2000)]
    steps: u32,
    /// Independent sessions to simulate.
    #[arg(long, default_value_t = 4)]
    sessions: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        CliCommand::Run(args) => run(&args),
        CliCommand::Share(args) => share(&args),
        CliCommand::Verify(args) => verify(&args),
        CliCommand::Fuzz(args) => fuzz(&args),
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let actions = parse_script(&args.script).context("could not parse the input script")?;
    let mut world = World::new();
    let mut analytics = AttemptAnalytics::new();
    load(&mut world, &mut analytics, args.level);

    println!("{}", query::welcome_banner(&world));
    let (columns, rows) = query::level_view(&world).dimensions();
    println!(
        "level {} of {} ({columns}x{rows} tiles)",
        query::level_index(&world).get(),
        query::level_count(&world),
    );
    print_board(&world);

    for line in drive(&mut world, &mut analytics, &actions) {
        println!("{line}");
    }

    print_board(&world);
    print_summary(&world, &analytics);
    Ok(())
}

fn share(args: &RunArgs) -> Result<()> {
    let actions = parse_script(&args.script).context("could not parse the input script")?;
    let (world, analytics) = replay_on_level(args.level, &actions);
    let report = analytics.report();
    let snapshot = ReplaySnapshot {
        level: query::level_index(&world).get(),
        script: args.script.clone(),
        frames: report.frames,
        won_at: report.won_at,
    };
    println!("{}", snapshot.encode());
    Ok(())
}

fn verify(args: &VerifyArgs) -> Result<()> {
    let snapshot =
        ReplaySnapshot::decode(&args.replay).context("could not decode the replay string")?;
    let actions = parse_script(&snapshot.script).context("replay script failed to parse")?;
    let (_, analytics) = replay_on_level(snapshot.level, &actions);
    let report = analytics.report();
    if report.frames != snapshot.frames || report.won_at != snapshot.won_at {
        bail!(
            "replay diverged: recorded {} frames (won {:?}), observed {} frames (won {:?})",
            snapshot.frames,
            snapshot.won_at,
            report.frames,
            report.won_at,
        );
    }
    match report.won_at {
        Some(frame) => println!("replay verified: {} frames, won on frame {frame}", report.frames),
        None => println!("replay verified: {} frames, no win", report.frames),
    }
    Ok(())
}

fn fuzz(args: &FuzzArgs) -> Result<()> {
    let mut wins = 0_u32;
    for session in 0..args.sessions {
        let mut rng = ChaCha8Rng::seed_from_u64(args.seed.wrapping_add(u64::from(session)));
        let mut world = World::new();
        let mut analytics = AttemptAnalytics::new();
        let level = rng.gen_range(0..query::level_count(&world) as u32);
        load(&mut world, &mut analytics, level);

        let mut events = Vec::new();
        for _ in 0..args.steps {
            let input = StepInput {
                left: rng.gen_bool(0.25),
                right: rng.gen_bool(0.55),
                jump: rng.gen_bool(0.2),
            };
            backtrack_world::apply(&mut world, Command::Step { input }, &mut events);
            analytics.handle(&events);
            events.clear();
            check_session_health(&world)?;

            if query::phase(&world) == SessionPhase::Won {
                wins += 1;
                backtrack_world::apply(&mut world, Command::Reset, &mut events);
                analytics.handle(&events);
                events.clear();
            }
        }
        println!(
            "session {session}: level {level}, {} attempts, {wins} wins so far",
            analytics.attempts(),
        );
    }
    println!(
        "fuzz complete: {} sessions x {} frames, {wins} wins, no invariant breaches",
        args.sessions, args.steps,
    );
    Ok(())
}

fn load(world: &mut World, analytics: &mut AttemptAnalytics, level: u32) {
    let mut events = Vec::new();
    backtrack_world::apply(
        world,
        Command::LoadLevel {
            index: LevelIndex::new(level),
        },
        &mut events,
    );
    analytics.handle(&events);
}

fn replay_on_level(level: u32, actions: &[ScriptAction]) -> (World, AttemptAnalytics) {
    let mut world = World::new();
    let mut analytics = AttemptAnalytics::new();
    load(&mut world, &mut analytics, level);
    let _ = drive(&mut world, &mut analytics, actions);
    (world, analytics)
}

/// Feeds actions through the session, returning digest lines for every
/// event worth narrating.
fn drive(
    world: &mut World,
    analytics: &mut AttemptAnalytics,
    actions: &[ScriptAction],
) -> Vec<String> {
    let mut digest = Vec::new();
    let mut batch = Vec::new();
    for action in actions {
        let command = match action {
            ScriptAction::Step(input) => Command::Step { input: *input },
            ScriptAction::Rewind => Command::Rewind,
        };
        backtrack_world::apply(world, command, &mut batch);
        analytics.handle(&batch);
        for event in batch.drain(..) {
            if let Some(line) = describe(&event) {
                digest.push(line);
            }
        }
    }
    digest
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::Stepped { .. } => None,
        Event::LevelLoaded {
            index,
            columns,
            rows,
        } => Some(format!(
            "loaded level {} ({columns}x{rows} tiles)",
            index.get()
        )),
        Event::Won { frame } => Some(format!("won on frame {frame}")),
        Event::RewindPerformed { ghost, replay_len } => Some(format!(
            "rewound: ghost {} replays {replay_len} frames",
            ghost.get()
        )),
        Event::GhostCountChanged { count } => Some(format!("ghosts now {count}")),
    }
}

fn print_board(world: &World) {
    let view = query::level_view(world);
    let tile = view.tile_length();
    let (columns, rows) = view.dimensions();
    let door_open = query::door_open(world);
    let player = query::player(world);
    let player_cell = cell_of(player.position.x(), player.position.y(), tile);
    let ghost_cells: Vec<(u32, u32)> = query::ghost_view(world)
        .iter()
        .map(|ghost| cell_of(ghost.position.x(), ghost.position.y(), tile))
        .collect();

    for row in 0..rows {
        let mut line = String::with_capacity(columns as usize);
        for column in 0..columns {
            let glyph = if (column, row) == player_cell {
                '@'
            } else if ghost_cells.contains(&(column, row)) {
                'g'
            } else {
                match view.kind_at(column, row) {
                    TileKind::Wall => '#',
                    TileKind::Empty => '.',
                    TileKind::Switch => 'S',
                    TileKind::Door => {
                        if door_open {
                            '/'
                        } else {
                            'D'
                        }
                    }
                    TileKind::Goal => 'G',
                }
            };
            line.push(glyph);
        }
        println!("{line}");
    }
}

fn print_summary(world: &World, analytics: &AttemptAnalytics) {
    let report = analytics.report();
    let player = query::player(world);
    match report.won_at {
        Some(frame) => println!("outcome: won on frame {frame}"),
        None => println!("outcome: still running after {} frames", report.frames),
    }
    println!(
        "rewinds {} | replayed frames {} | peak ghosts {} | door {}",
        report.rewinds,
        report.replay_frames,
        report.peak_ghosts,
        if query::door_open(world) { "open" } else { "closed" },
    );
    println!(
        "player at ({:.1}, {:.1}), history {} frames",
        player.position.x(),
        player.position.y(),
        query::history_len(world),
    );
}

fn check_session_health(world: &World) -> Result<()> {
    let player = query::player(world);
    let (x, y) = (player.position.x(), player.position.y());
    if !(x.is_finite() && y.is_finite()) {
        bail!("player position became non-finite: ({x}, {y})");
    }

    let view = query::level_view(world);
    let tile = view.tile_length();
    for probe_y in [y, y - 6.0, y - 20.0] {
        let (column, row) = cell_of(x, probe_y, tile);
        if view.kind_at(column, row) == TileKind::Wall {
            bail!("player centerline entered a wall at tile ({column}, {row})");
        }
    }
    // Lateral probes mirror the body's own collision checks at x +/- 6.
    // The spawn offset leaves the left probe up to four units inside a wall
    // adjoining the spawn column, so shallow overlap on that side is legal;
    // the right probe has no such allowance.
    for probe_y in [y - 6.0, y - 20.0] {
        let (column, row) = cell_of(x + 6.0, probe_y, tile);
        if view.kind_at(column, row) == TileKind::Wall {
            bail!("player right probe entered a wall at tile ({column}, {row})");
        }
        let left = x - 6.0;
        let (column, row) = cell_of(left, probe_y, tile);
        if view.kind_at(column, row) == TileKind::Wall && left.rem_euclid(tile) < tile - 4.0 {
            bail!("player left probe sank into a wall at tile ({column}, {row})");
        }
    }

    if query::history_len(world) > DEFAULT_HISTORY_FRAMES {
        bail!(
            "history grew past its horizon: {} frames",
            query::history_len(world)
        );
    }
    Ok(())
}

fn cell_of(x: f32, y: f32, tile: f32) -> (u32, u32) {
    let column = (x / tile).floor().max(0.0) as u32;
    let row = (y / tile).floor().max(0.0) as u32;
    (column, row)
}
