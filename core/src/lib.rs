#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Backtrack engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively through their own pure outputs.

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Backtrack.";

/// Describes whether a session is still being played or already finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// The player can still move, jump, and rewind.
    Running,
    /// The goal was reached; further steps and rewinds are ignored.
    Won,
}

/// Player intent sampled for exactly one simulated frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepInput {
    /// Move toward decreasing x coordinates.
    pub left: bool,
    /// Move toward increasing x coordinates.
    pub right: bool,
    /// Request a jump; buffered briefly if the body is airborne.
    pub jump: bool,
}

impl StepInput {
    /// Input with no buttons held, advancing physics alone.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            left: false,
            right: false,
            jump: false,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Loads a level from the built-in catalog and restarts the session.
    LoadLevel {
        /// Catalog index of the level to load; out-of-range values clamp.
        index: LevelIndex,
    },
    /// Restarts the current level, discarding history and ghosts.
    Reset,
    /// Advances the simulation by exactly one frame.
    Step {
        /// Player intent sampled for this frame.
        input: StepInput,
    },
    /// Branches the timeline: rolls the player back along recorded history
    /// and spawns a ghost replaying the abandoned segment.
    Rewind,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a level was (re)loaded and the session restarted.
    LevelLoaded {
        /// Catalog index of the active level after clamping.
        index: LevelIndex,
        /// Number of tile columns in the loaded level.
        columns: u32,
        /// Number of tile rows in the loaded level.
        rows: u32,
    },
    /// Confirms that one frame of simulation completed.
    Stepped {
        /// Frame counter after the step, starting at 1 for the first step.
        frame: u64,
    },
    /// Announces that the player reached the goal tile.
    Won {
        /// Frame on which goal contact was detected.
        frame: u64,
    },
    /// Confirms that a rewind branched the timeline.
    RewindPerformed {
        /// Identifier assigned to the ghost replaying the abandoned segment.
        ghost: GhostId,
        /// Number of recorded positions the ghost will replay.
        replay_len: usize,
    },
    /// Reports the ghost roster size after it changed.
    GhostCountChanged {
        /// Number of ghosts now present in the session.
        count: usize,
    },
}

/// Unique identifier assigned to a ghost within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GhostId(u32);

impl GhostId {
    /// Creates a new ghost identifier with the provided numeric value.
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

/// Zero-based index into the built-in level catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelIndex(u32);

impl LevelIndex {
    /// Creates a new level index wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying catalog index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Continuous world-space position, x to the right and y downward.
///
/// For the player body this marks the horizontal centre of the feet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position from world-space coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate in world units.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate in world units, increasing downward.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Continuous velocity expressed in world units per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    x: f32,
    y: f32,
}

impl Velocity {
    /// Creates a new velocity from per-frame components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component in world units per frame.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component in world units per frame, positive when falling.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Classification of a single level tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Passable air.
    Empty,
    /// Always solid terrain.
    Wall,
    /// Passable pressure plate; any occupant holds the door open.
    Switch,
    /// Solid barrier that turns passable while a switch is held.
    Door,
    /// Passable tile that ends the session on contact.
    Goal,
}

/// Immutable representation of the player body used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Position of the player's feet centre.
    pub position: Position,
    /// Velocity applied during the most recent step.
    pub velocity: Velocity,
    /// Indicates whether the body rested on solid ground after the step.
    pub on_ground: bool,
}

/// Immutable representation of a single ghost's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostSnapshot {
    /// Unique identifier assigned to the ghost.
    pub id: GhostId,
    /// Position the ghost currently occupies along its recorded path.
    pub position: Position,
    /// Indicates whether the ghost still advances; inactive ghosts hold
    /// their final position and continue to weigh on switches.
    pub active: bool,
    /// Index of the path entry the ghost currently occupies.
    pub replay_index: usize,
    /// Total number of recorded positions in the ghost's path.
    pub replay_len: usize,
}

/// Read-only snapshot describing all ghosts within the session.
#[derive(Clone, Debug, Default)]
pub struct GhostView {
    snapshots: Vec<GhostSnapshot>,
}

impl GhostView {
    /// Creates a new ghost view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<GhostSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured ghost snapshots in deterministic order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &GhostSnapshot> {
        self.snapshots.iter()
    }

    /// Number of ghosts captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no ghosts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<GhostSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the dense row-major tile map of a level.
#[derive(Clone, Copy, Debug)]
pub struct LevelView<'a> {
    tiles: &'a [TileKind],
    columns: u32,
    rows: u32,
    tile_length: f32,
}

impl<'a> LevelView<'a> {
    /// Captures a new level view backed by the provided tile slice.
    #[must_use]
    pub fn new(tiles: &'a [TileKind], columns: u32, rows: u32, tile_length: f32) -> Self {
        Self {
            tiles,
            columns,
            rows,
            tile_length,
        }
    }

    /// Returns the tile at the provided cell, treating out-of-bounds as wall.
    #[must_use]
    pub fn kind_at(&self, column: u32, row: u32) -> TileKind {
        self.index(column, row)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(TileKind::Wall)
    }

    /// Returns an iterator over all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = TileKind> + 'a {
        self.tiles.iter().copied()
    }

    /// Provides the dimensions of the underlying tile map.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    fn index(&self, column: u32, row: u32) -> Option<usize> {
        if column < self.columns && row < self.rows {
            let row = usize::try_from(row).ok()?;
            let column = usize::try_from(column).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
