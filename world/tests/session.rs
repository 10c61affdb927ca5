//! End-to-end session scenarios driven purely through commands.

use backtrack_core::{
    Command, Event, LevelIndex, PlayerSnapshot, Position, SessionPhase, StepInput, TileKind,
};
use backtrack_world::{query, Level, LevelSet, SessionConfig, World};

const RIGHT: StepInput = StepInput {
    left: false,
    right: true,
    jump: false,
};

fn flat_gauntlet() -> World {
    let rows: &[&str] = &[
        "##########",
        "#P.....G.#",
        "##########",
    ];
    custom_world(rows)
}

fn switch_door_corridor() -> World {
    let rows: &[&str] = &[
        "##########",
        "#P..S.D.G#",
        "##########",
    ];
    custom_world(rows)
}

fn custom_world(rows: &[&str]) -> World {
    let level = Level::parse(rows, 24.0).expect("test grid parses");
    let levels = LevelSet::new(vec![level]).expect("catalog is non-empty");
    World::from_levels(levels, SessionConfig::default())
}

fn step(world: &mut World, input: StepInput) -> Vec<Event> {
    let mut events = Vec::new();
    backtrack_world::apply(world, Command::Step { input }, &mut events);
    events
}

fn rewind(world: &mut World) -> Vec<Event> {
    let mut events = Vec::new();
    backtrack_world::apply(world, Command::Rewind, &mut events);
    events
}

fn builtin_world(level: u32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    backtrack_world::apply(
        &mut world,
        Command::LoadLevel {
            index: LevelIndex::new(level),
        },
        &mut events,
    );
    world
}

fn cell_kind(world: &World, position: Position) -> TileKind {
    let view = query::level_view(world);
    let tile = view.tile_length();
    let column = (position.x() / tile).floor() as u32;
    let row = (position.y() / tile).floor() as u32;
    view.kind_at(column, row)
}

/// Steps with a fixed input until the predicate holds, up to `max` frames.
fn step_until(
    world: &mut World,
    input: StepInput,
    max: usize,
    done: impl Fn(&World) -> bool,
) -> bool {
    for _ in 0..max {
        let _ = step(world, input);
        if done(world) {
            return true;
        }
    }
    false
}

#[test]
fn idle_player_settles_onto_the_floor() {
    let mut world = flat_gauntlet();
    let settled = step_until(&mut world, StepInput::idle(), 30, |world| {
        query::player(world).on_ground
    });
    assert!(settled, "player lands within 30 idle frames");
    let player = query::player(&world);
    assert_eq!(player.position.y(), 47.0, "flush against the row-2 floor");
    assert_eq!(player.velocity.y(), 0.0);
}

#[test]
fn walking_right_reaches_the_goal_and_wins_exactly_once() {
    let mut world = flat_gauntlet();
    let mut wins = Vec::new();
    let mut won_batch = None;
    for _ in 0..400 {
        let events = step(&mut world, RIGHT);
        if events.iter().any(|event| matches!(event, Event::Won { .. })) {
            wins.push(query::frame(&world));
            won_batch = Some(events);
        }
    }

    assert_eq!(wins.len(), 1, "the win fires on exactly one step");
    assert_eq!(query::phase(&world), SessionPhase::Won);

    let batch = won_batch.expect("win batch captured");
    let frame = wins[0];
    assert_eq!(
        batch,
        vec![Event::Won { frame }, Event::Stepped { frame }],
        "the win precedes that step's completion notice"
    );
}

#[test]
fn won_sessions_ignore_steps_and_rewinds() {
    let mut world = flat_gauntlet();
    let won = step_until(&mut world, RIGHT, 400, |world| {
        query::phase(world) == SessionPhase::Won
    });
    assert!(won, "goal is reachable within 400 frames");

    let frame = query::frame(&world);
    let position = query::player(&world).position;
    assert!(step(&mut world, RIGHT).is_empty());
    assert!(rewind(&mut world).is_empty());
    assert_eq!(query::frame(&world), frame);
    assert_eq!(query::player(&world).position, position);
    assert!(query::ghost_view(&world).is_empty());
}

#[test]
fn walking_into_the_side_wall_pins_the_player_flush() {
    let mut world = flat_gauntlet();
    let settled = step_until(&mut world, StepInput::idle(), 30, |world| {
        query::player(world).on_ground
    });
    assert!(settled);

    let input = StepInput {
        left: true,
        right: false,
        jump: false,
    };
    let _ = step(&mut world, input);
    let player = query::player(&world);
    assert_eq!(
        player.position.x(),
        31.0,
        "left edge snaps flush to the boundary wall"
    );
    assert_eq!(player.velocity.x(), 0.0);

    for _ in 0..10 {
        let _ = step(&mut world, input);
    }
    assert_eq!(query::player(&world).position.x(), 31.0);
}

#[test]
fn ghost_replays_the_recorded_motion_forward() {
    let mut world = flat_gauntlet();
    for _ in 0..8 {
        let _ = step(&mut world, RIGHT);
    }
    for _ in 0..4 {
        let _ = step(&mut world, StepInput::idle());
    }

    let events = rewind(&mut world);
    assert_eq!(events.len(), 2);
    let player = query::player(&world);

    let ghosts = query::ghost_view(&world);
    let spawned = ghosts.iter().next().expect("rewind spawned a ghost");
    assert!(spawned.active);
    assert_eq!(spawned.replay_index, 0);
    assert_eq!(
        spawned.position, player.position,
        "ghost begins where the player was rolled back to"
    );

    // The recorded motion ran rightward first, so a forward replay must
    // drift right over its opening frames.
    let start_x = spawned.position.x();
    for _ in 0..3 {
        let _ = step(&mut world, StepInput::idle());
    }
    let ghosts = query::ghost_view(&world);
    let advanced = ghosts.iter().next().expect("ghost persists");
    assert!(
        advanced.position.x() > start_x,
        "replay opens with the earliest recorded movement"
    );
    assert_eq!(advanced.replay_index, 3);
}

#[test]
fn parked_ghost_rests_two_steps_behind_the_branch_point() {
    let mut world = flat_gauntlet();
    let mut track = Vec::new();
    for _ in 0..10 {
        let _ = step(&mut world, RIGHT);
        track.push(query::player(&world).position);
    }

    let branch_position = track[9];
    let _ = rewind(&mut world);

    let drained = step_until(&mut world, StepInput::idle(), 12, |world| {
        query::ghost_view(world)
            .iter()
            .next()
            .map_or(false, |ghost| !ghost.active)
    });
    assert!(drained, "nine replay frames drain within twelve idle steps");

    // The replay segment drops the newest trace entry and every entry is a
    // pre-move position, so the resting spot trails the branch by two
    // integration steps.
    let ghosts = query::ghost_view(&world);
    let ghost = ghosts.iter().next().expect("ghost persists");
    assert_eq!(ghost.position, track[7]);
    assert_ne!(ghost.position, branch_position);
}

#[test]
fn door_opens_on_the_switch_and_closes_one_step_after_leaving() {
    let mut world = switch_door_corridor();
    let on_switch = step_until(&mut world, RIGHT, 120, |world| {
        let player = query::player(world);
        world_is_on_switch(world, player.position.x())
    });
    assert!(on_switch, "player reaches the switch within 120 frames");

    let _ = step(&mut world, StepInput::idle());
    assert!(query::door_open(&world), "standing on the switch holds the door");

    let stepped_off = step_until(&mut world, RIGHT, 40, |world| {
        let player = query::player(world);
        !world_is_on_switch(world, player.position.x())
    });
    assert!(stepped_off);

    // The step after leaving sees the off-switch position and shuts it.
    let _ = step(&mut world, StepInput::idle());
    assert!(!query::door_open(&world));
}

fn world_is_on_switch(world: &World, x: f32) -> bool {
    let y = query::player(world).position.y();
    cell_kind(world, Position::new(x, y)) == TileKind::Switch
}

#[test]
fn parked_ghost_holds_the_switch_long_enough_to_win() {
    let mut world = switch_door_corridor();

    // Walk onto the switch and wait there so the tail of the recording
    // keeps the ghost parked on it after replay ends.
    let on_switch = step_until(&mut world, RIGHT, 120, |world| {
        let player = query::player(world);
        player.on_ground && world_is_on_switch(world, player.position.x())
    });
    assert!(on_switch);
    for _ in 0..20 {
        let _ = step(&mut world, StepInput::idle());
    }

    let events = rewind(&mut world);
    assert_eq!(events.len(), 2, "rewind spawns the helper ghost");

    let won = step_until(&mut world, RIGHT, 600, |world| {
        query::phase(world) == SessionPhase::Won
    });
    assert!(won, "the ghost-held door lets the player through");

    let ghosts = query::ghost_view(&world);
    let helper = ghosts.iter().next().expect("ghost survived the run");
    assert!(!helper.active, "the helper finished its replay");
    assert!(
        query::door_open(&world),
        "an inactive ghost parked on the switch still holds the door"
    );
}

/// Steering policy for the first built-in level, keyed off the player
/// snapshot alone: cross the basin, hop the low pillar, clear the shaft onto
/// the tall pillar, climb the ledge past the switch, ride the closed door
/// slab, drop the far shaft, then double back and jump up into the goal.
fn first_level_pilot(player: &PlayerSnapshot) -> StepInput {
    let x = player.position.x();
    let y = player.position.y();
    let grounded = player.on_ground;
    let (left, right, jump) = if x < 300.0 {
        (false, true, false)
    } else if x < 342.0 {
        if y > 160.0 {
            // Basin floor: launch onto the low pillar before overshooting
            // into the shaft beyond it.
            (false, true, grounded && x <= 310.0)
        } else {
            // Low pillar crest: carry the jump across the shaft.
            (false, true, x >= 338.0)
        }
    } else if x < 360.0 {
        (false, true, true)
    } else if x < 374.0 {
        (false, true, false)
    } else if x < 384.0 {
        // Tall pillar crest: hop up against the ledge slab.
        (false, true, grounded && y <= 100.0)
    } else if x < 480.0 {
        (false, true, false)
    } else if x < 504.0 {
        if y <= 75.0 {
            // Ledge end: bonk the ceiling and settle on the closed door.
            (false, true, grounded && x >= 488.0 && y > 60.0)
        } else if y > 180.0 && grounded {
            if x < 500.0 {
                (false, false, true)
            } else {
                (true, false, false)
            }
        } else {
            (false, false, false)
        }
    } else if x < 534.0 {
        if y <= 75.0 {
            (false, true, false)
        } else if y > 180.0 {
            (true, false, false)
        } else {
            (false, false, false)
        }
    } else if y > 180.0 {
        (true, false, false)
    } else {
        (false, false, false)
    };
    StepInput { left, right, jump }
}

#[test]
fn a_steered_run_clears_the_first_builtin_level() {
    let mut world = builtin_world(0);
    let mut wins = 0_usize;
    for _ in 0..1200 {
        let input = first_level_pilot(&query::player(&world));
        let events = step(&mut world, input);
        wins += events
            .iter()
            .filter(|event| matches!(event, Event::Won { .. }))
            .count();
        if query::phase(&world) == SessionPhase::Won {
            break;
        }
    }
    assert_eq!(wins, 1, "the opening level falls to the steered run");
    assert_eq!(query::phase(&world), SessionPhase::Won);

    let frame = query::frame(&world);
    let resting = query::player(&world);
    assert!(step(&mut world, StepInput::idle()).is_empty());
    assert_eq!(query::frame(&world), frame);
    assert_eq!(query::player(&world).position, resting.position);
}

#[test]
fn a_rewound_ghost_reopens_the_second_level_door_and_holds_it() {
    let mut world = builtin_world(1);

    // Run off the starting platform holding jump so the coyote launch arcs
    // the drop through the floating switch; the door tracks the overlap.
    let mut pressed = false;
    let mut exited = false;
    for _ in 0..400 {
        let player = query::player(&world);
        let input = StepInput {
            left: false,
            right: true,
            jump: !player.on_ground && player.position.x() >= 202.0,
        };
        let _ = step(&mut world, input);
        if query::door_open(&world) {
            pressed = true;
        } else if pressed {
            exited = true;
            break;
        }
    }
    assert!(exited, "the arc crosses the switch and drops out of it");

    // Branching right after the overlap leaves the tail of the recording
    // inside the switch cell, so that is where the ghost will end up.
    let events = rewind(&mut world);
    assert_eq!(events.len(), 2, "rewind spawns the helper ghost");
    assert_eq!(query::ghost_view(&world).len(), 1);
    assert!(!query::door_open(&world));

    let mut reopened_mid_replay = false;
    let mut parked = false;
    for _ in 0..200 {
        let _ = step(&mut world, StepInput::idle());
        let ghosts = query::ghost_view(&world);
        let helper = ghosts.iter().next().expect("ghost persists");
        if helper.active && query::door_open(&world) {
            reopened_mid_replay = true;
        }
        if !helper.active {
            parked = true;
            break;
        }
    }
    assert!(
        reopened_mid_replay,
        "the replay re-presses the switch while frames remain on its path"
    );
    assert!(parked, "the replay runs out inside the step budget");

    let ghosts = query::ghost_view(&world);
    let helper = ghosts.iter().next().expect("ghost persists");
    assert_eq!(
        cell_kind(&world, helper.position),
        TileKind::Switch,
        "the ghost comes to rest inside the switch cell"
    );
    for _ in 0..30 {
        let _ = step(&mut world, StepInput::idle());
        assert!(
            query::door_open(&world),
            "the parked ghost keeps the door open"
        );
    }
}

#[test]
fn without_a_helper_ghost_the_door_blocks_the_corridor() {
    let mut world = switch_door_corridor();
    let won = step_until(&mut world, RIGHT, 600, |world| {
        query::phase(world) == SessionPhase::Won
    });
    assert!(!won, "running straight through must stall at the door");

    let player = query::player(&world);
    assert_eq!(
        player.position.x(),
        137.0,
        "pinned flush against the closed door"
    );
    assert_eq!(query::phase(&world), SessionPhase::Running);
}

#[test]
fn history_is_bounded_by_the_configured_horizon() {
    let rows: &[&str] = &[
        "##########",
        "#P.....G.#",
        "##########",
    ];
    let level = Level::parse(rows, 24.0).expect("test grid parses");
    let levels = LevelSet::new(vec![level]).expect("catalog is non-empty");
    let config = SessionConfig {
        history_frames: 16,
        ..SessionConfig::default()
    };
    let mut world = World::from_levels(levels, config);

    for _ in 0..40 {
        let _ = step(&mut world, StepInput::idle());
    }
    assert_eq!(query::history_len(&world), 16);

    let _ = rewind(&mut world);
    let ghosts = query::ghost_view(&world);
    let ghost = ghosts.iter().next().expect("rewind spawned a ghost");
    assert_eq!(ghost.replay_len, 15, "replay spans the horizon minus the newest frame");
}

#[test]
fn repeated_rewinds_accumulate_ghosts_up_to_the_cap() {
    let rows: &[&str] = &[
        "##########",
        "#P.....G.#",
        "##########",
    ];
    let level = Level::parse(rows, 24.0).expect("test grid parses");
    let levels = LevelSet::new(vec![level]).expect("catalog is non-empty");
    let config = SessionConfig {
        ghost_cap: 2,
        ..SessionConfig::default()
    };
    let mut world = World::from_levels(levels, config);

    for round in 0..3 {
        for _ in 0..8 {
            let _ = step(&mut world, StepInput::idle());
        }
        let events = rewind(&mut world);
        let expected = usize::min(round + 1, 2);
        assert_eq!(
            events.last(),
            Some(&Event::GhostCountChanged { count: expected })
        );
    }
    assert_eq!(query::ghost_view(&world).len(), 2);
}

#[test]
fn chaotic_input_never_embeds_the_player_in_terrain() {
    let mut world = flat_gauntlet();
    for frame in 0..500_u32 {
        let input = StepInput {
            left: frame % 7 == 0,
            right: frame % 3 != 0,
            jump: frame % 11 == 0,
        };
        let _ = step(&mut world, input);
        if frame % 50 == 49 {
            let _ = rewind(&mut world);
        }
        if query::phase(&world) == SessionPhase::Won {
            break;
        }

        let player = query::player(&world);
        let (x, y) = (player.position.x(), player.position.y());
        assert!(x.is_finite() && y.is_finite());

        let view = query::level_view(&world);
        let tile = view.tile_length();
        for probe_y in [y, y - 6.0, y - 20.0] {
            let column = (x / tile).floor() as u32;
            let row = (probe_y / tile).floor() as u32;
            assert_ne!(
                view.kind_at(column, row),
                TileKind::Wall,
                "player centerline caught inside a wall at frame {frame}"
            );
        }
        // The body's own lateral probes sit at x +/- 6. The right one must
        // stay clear of walls outright; the left one may overlap a wall by
        // up to the spawn offset shortfall of four units, because spawning
        // (and rewinding back to a spawn-adjacent position) parks the body
        // only two units into its cell.
        for probe_y in [y - 6.0, y - 20.0] {
            let row = (probe_y / tile).floor() as u32;
            let right_column = ((x + 6.0) / tile).floor() as u32;
            assert_ne!(
                view.kind_at(right_column, row),
                TileKind::Wall,
                "player right probe caught inside a wall at frame {frame}"
            );
            let left = x - 6.0;
            let left_column = (left / tile).floor() as u32;
            if view.kind_at(left_column, row) == TileKind::Wall {
                assert!(
                    left.rem_euclid(tile) >= tile - 4.0,
                    "player left probe sank past the spawn overlap at frame {frame}"
                );
            }
        }
    }
}

#[test]
fn wall_adjacent_spawns_keep_the_left_probe_overlap_shallow() {
    // The third built-in level spawns one cell off the boundary wall, which
    // puts the left probe inside that wall until the body walks clear.
    let mut world = builtin_world(2);
    let tile = query::level_view(&world).tile_length();

    let mut overlapped = false;
    for _ in 0..10 {
        let _ = step(&mut world, RIGHT);
        let player = query::player(&world);
        let left = player.position.x() - 6.0;
        for probe_y in [player.position.y() - 6.0, player.position.y() - 20.0] {
            if cell_kind(&world, Position::new(left, probe_y)) == TileKind::Wall {
                overlapped = true;
                assert!(
                    left.rem_euclid(tile) >= tile - 4.0,
                    "overlap deeper than the spawn offset shortfall"
                );
            }
        }
    }
    assert!(overlapped, "walking out of spawn crosses the adjacent wall");
}
