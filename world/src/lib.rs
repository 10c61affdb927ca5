#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the Backtrack engine.
//!
//! The [`World`] owns the active level, the player body, the rolling
//! position trace, and the ghost roster. All mutation flows through
//! [`apply`], which reports what happened as [`Event`] values; read
//! access goes through [`query`].

mod ghosts;
mod history;
mod level;

pub use level::{Level, LevelError, LevelSet};

use backtrack_core::{
    Command, Event, GhostSnapshot, GhostView, LevelIndex, LevelView, PlayerSnapshot, Position,
    SessionPhase, StepInput, Velocity, WELCOME_BANNER,
};
use backtrack_system_kinematics::{Body, Tuning};

use crate::{ghosts::GhostRoster, history::TraceBuffer};

/// Number of recent player positions retained for rewinds.
pub const DEFAULT_HISTORY_FRAMES: usize = 480;
/// Upper bound on the number of frames a single ghost replays.
pub const DEFAULT_REPLAY_SPAN: usize = 120;
/// Trace length below which rewind requests are ignored.
pub const DEFAULT_REWIND_MIN_FRAMES: usize = 5;
/// Ghost count beyond which the oldest ghost is evicted.
pub const DEFAULT_GHOST_CAP: usize = 32;

const SPAWN_OFFSET_X: f32 = 2.0;
const SPAWN_OFFSET_Y: f32 = -2.0;

/// Session-level knobs grouped for construction.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// How many recent player positions the trace retains. Older frames
    /// fall off and can never be rewound to.
    pub history_frames: usize,
    /// Longest path a single rewind hands to its ghost, in frames.
    pub replay_span: usize,
    /// Trace length below which a rewind request is silently dropped.
    pub rewind_min_frames: usize,
    /// Maximum simultaneous ghosts; the oldest is evicted beyond this.
    /// Zero disables the bound.
    pub ghost_cap: usize,
    /// Movement tuning forwarded to the kinematics system.
    pub tuning: Tuning,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_frames: DEFAULT_HISTORY_FRAMES,
            replay_span: DEFAULT_REPLAY_SPAN,
            rewind_min_frames: DEFAULT_REWIND_MIN_FRAMES,
            ghost_cap: DEFAULT_GHOST_CAP,
            tuning: Tuning::default(),
        }
    }
}

/// Authoritative state for one play session.
pub struct World {
    banner: &'static str,
    levels: LevelSet,
    level_index: LevelIndex,
    level: Level,
    player: Body,
    trace: TraceBuffer,
    ghosts: GhostRoster,
    door_open: bool,
    phase: SessionPhase,
    frame: u64,
    config: SessionConfig,
}

impl World {
    /// Creates a session on the first built-in level with default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::from_levels(LevelSet::builtin(), SessionConfig::default())
    }

    /// Creates a session on the first built-in level with custom knobs.
    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        Self::from_levels(LevelSet::builtin(), config)
    }

    /// Creates a session over a caller-provided level catalog.
    #[must_use]
    pub fn from_levels(levels: LevelSet, config: SessionConfig) -> Self {
        let (level_index, level) = levels.clamped(LevelIndex::new(0));
        let level = level.clone();
        let player = spawned_body(&level, &config.tuning);
        Self {
            banner: WELCOME_BANNER,
            levels,
            level_index,
            level,
            player,
            trace: TraceBuffer::new(config.history_frames),
            ghosts: GhostRoster::new(config.ghost_cap),
            door_open: false,
            phase: SessionPhase::Running,
            frame: 0,
            config,
        }
    }

    fn load_level(&mut self, index: LevelIndex, out_events: &mut Vec<Event>) {
        let (clamped, level) = self.levels.clamped(index);
        self.level_index = clamped;
        self.level = level.clone();
        self.player = spawned_body(&self.level, &self.config.tuning);
        self.trace.clear();
        self.ghosts.clear();
        self.door_open = false;
        self.phase = SessionPhase::Running;
        self.frame = 0;
        out_events.push(Event::LevelLoaded {
            index: clamped,
            columns: self.level.columns(),
            rows: self.level.rows(),
        });
        out_events.push(Event::GhostCountChanged { count: 0 });
    }

    fn step(&mut self, input: StepInput, out_events: &mut Vec<Event>) {
        if self.phase == SessionPhase::Won {
            return;
        }
        self.frame = self.frame.saturating_add(1);

        // Pre-move position so a ghost replaying this frame stands where
        // the player stood, not where they ended up.
        self.trace
            .record(Position::new(self.player.x, self.player.y));

        // Inactive ghosts keep holding switches from their final position.
        self.door_open = self.level.is_on_switch(self.player.x, self.player.y)
            || self.ghosts.iter().any(|ghost| {
                let position = ghost.position();
                self.level.is_on_switch(position.x(), position.y())
            });

        let level = &self.level;
        let door_open = self.door_open;
        backtrack_system_kinematics::step(
            &self.config.tuning,
            level.tile_length(),
            &mut self.player,
            input,
            |x, y| level.is_solid(x, y, door_open),
        );

        self.ghosts.advance_all();

        if self.level.is_on_goal(self.player.x, self.player.y) {
            out_events.push(Event::Won { frame: self.frame });
            self.phase = SessionPhase::Won;
        }
        out_events.push(Event::Stepped { frame: self.frame });
    }

    fn rewind(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == SessionPhase::Won {
            return;
        }
        if self.trace.len() < self.config.rewind_min_frames {
            return;
        }
        let segment = self.trace.tail_segment(self.config.replay_span);
        let Some(first) = segment.first().copied() else {
            return;
        };
        let keep = self.trace.len() - 1 - segment.len();
        let replay_len = segment.len();
        let Some(ghost) = self.ghosts.spawn(segment) else {
            return;
        };
        // Velocity survives the teleport; only position branches back.
        self.player.x = first.x();
        self.player.y = first.y();
        self.trace.truncate_to(keep);
        out_events.push(Event::RewindPerformed { ghost, replay_len });
        out_events.push(Event::GhostCountChanged {
            count: self.ghosts.len(),
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies a command to the world, appending any resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { index } => world.load_level(index, out_events),
        Command::Reset => {
            let index = world.level_index;
            world.load_level(index, out_events);
        }
        Command::Step { input } => world.step(input, out_events),
        Command::Rewind => world.rewind(out_events),
    }
}

fn spawned_body(level: &Level, tuning: &Tuning) -> Body {
    let (column, row) = level.spawn_cell();
    let x = column as f32 * level.tile_length() + SPAWN_OFFSET_X;
    let y = row as f32 * level.tile_length() + SPAWN_OFFSET_Y;
    Body::spawned_at(x, y, tuning)
}

/// Read-only queries over [`World`] state.
pub mod query {
    use super::{
        GhostSnapshot, GhostView, LevelIndex, LevelView, PlayerSnapshot, Position, SessionPhase,
        Velocity, World,
    };

    /// Banner greeting shown when a session begins.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current phase of the session state machine.
    #[must_use]
    pub fn phase(world: &World) -> SessionPhase {
        world.phase
    }

    /// Frames stepped since the active level was loaded.
    #[must_use]
    pub fn frame(world: &World) -> u64 {
        world.frame
    }

    /// Whether door tiles are currently passable.
    #[must_use]
    pub fn door_open(world: &World) -> bool {
        world.door_open
    }

    /// Number of player positions currently recorded in the trace.
    #[must_use]
    pub fn history_len(world: &World) -> usize {
        world.trace.len()
    }

    /// Snapshot of the player body.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        PlayerSnapshot {
            position: Position::new(world.player.x, world.player.y),
            velocity: Velocity::new(world.player.vx, world.player.vy),
            on_ground: world.player.on_ground,
        }
    }

    /// Ghost snapshots ordered by identifier.
    #[must_use]
    pub fn ghost_view(world: &World) -> GhostView {
        let snapshots = world
            .ghosts
            .iter()
            .map(|ghost| GhostSnapshot {
                id: ghost.id(),
                position: ghost.position(),
                active: ghost.active(),
                replay_index: ghost.cursor(),
                replay_len: ghost.path_len(),
            })
            .collect();
        GhostView::from_snapshots(snapshots)
    }

    /// Borrowed view of the active level's tile grid.
    #[must_use]
    pub fn level_view(world: &World) -> LevelView<'_> {
        world.level.view()
    }

    /// Catalog position of the active level.
    #[must_use]
    pub fn level_index(world: &World) -> LevelIndex {
        world.level_index
    }

    /// Number of levels in the catalog.
    #[must_use]
    pub fn level_count(world: &World) -> usize {
        world.levels.len()
    }
}
