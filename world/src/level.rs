//! Level grids, parsing, and solidity queries.

use backtrack_core::{LevelIndex, LevelView, TileKind};
use thiserror::Error;

/// Side length of every built-in level tile expressed in world units.
const BUILTIN_TILE_LENGTH: f32 = 24.0;

const BUILTIN_GRIDS: [&[&str]; 3] = [
    &[
        "########################",
        "#......................#",
        "#..P..............S..D.#",
        "#...............#####..#",
        "#..............#.......#",
        "#......#####...#....G..#",
        "#............#.#.......#",
        "#............#.#.......#",
        "########################",
    ],
    &[
        "########################",
        "#..............#####..G#",
        "#..P..........#.....#..#",
        "#..#####.S....#..D..#..#",
        "#..#...#......#.....#..#",
        "#..#...#..###########..#",
        "#..#...#...............#",
        "#..#####...............#",
        "########################",
    ],
    &[
        "########################",
        "#......#####...........#",
        "#####..#...#..######...#",
        "#...#..# S #..#....#...#",
        "#...#..#####..# D..#..G#",
        "#...#.........#....#...#",
        "#...########..######...#",
        "#P.....................#",
        "########################",
    ],
];

/// Reasons level content fails to parse into a playable level.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// The grid contained no rows or rows without columns.
    #[error("level grid contains no tiles")]
    EmptyGrid,
    /// A row length differed from the first row's length.
    #[error("row {row} spans {found} columns, expected {expected}")]
    RaggedRows {
        /// Zero-based index of the offending row.
        row: usize,
        /// Column count established by the first row.
        expected: usize,
        /// Column count found in the offending row.
        found: usize,
    },
    /// No cell carried the spawn marker.
    #[error("level grid does not mark a spawn cell")]
    MissingSpawn,
    /// More than one cell carried the spawn marker.
    #[error("level grid marks more than one spawn cell")]
    DuplicateSpawn,
    /// No cell carried the goal marker, so the level can never be won.
    #[error("level grid does not mark a goal cell")]
    MissingGoal,
    /// A door exists with no switch anywhere to open it.
    #[error("level grid contains a door but no switch")]
    DoorWithoutSwitch,
    /// A cell carried a symbol outside the supported tile alphabet.
    #[error("unknown tile symbol {symbol:?} at column {column}, row {row}")]
    UnknownSymbol {
        /// The unsupported symbol.
        symbol: char,
        /// Zero-based column of the offending cell.
        column: usize,
        /// Zero-based row of the offending cell.
        row: usize,
    },
    /// The provided tile side length was zero or negative.
    #[error("tile length must be positive")]
    NonPositiveTileLength,
    /// A level catalog was constructed without any levels.
    #[error("level catalog contains no levels")]
    EmptyCatalog,
}

/// Immutable tile map derived once per level load.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    columns: u32,
    rows: u32,
    tile_length: f32,
    tiles: Vec<TileKind>,
    spawn_column: u32,
    spawn_row: u32,
}

impl Level {
    /// Parses equal-length rows of tile symbols into a level.
    ///
    /// `#` is wall, `.` and space are empty, `S` switch, `D` door, `G` goal,
    /// and `P` marks the spawn cell, which is blanked to empty after being
    /// recorded. Malformed content fails fast instead of defaulting.
    pub fn parse(rows: &[&str], tile_length: f32) -> Result<Self, LevelError> {
        if !(tile_length > 0.0) {
            return Err(LevelError::NonPositiveTileLength);
        }
        let Some(first) = rows.first() else {
            return Err(LevelError::EmptyGrid);
        };
        let columns = first.chars().count();
        if columns == 0 {
            return Err(LevelError::EmptyGrid);
        }

        let mut tiles = Vec::with_capacity(columns * rows.len());
        let mut spawn = None;
        let mut has_goal = false;
        let mut has_switch = false;
        let mut has_door = false;
        for (row, line) in rows.iter().enumerate() {
            let mut found = 0;
            for (column, symbol) in line.chars().enumerate() {
                found += 1;
                let kind = match symbol {
                    '#' => TileKind::Wall,
                    '.' | ' ' => TileKind::Empty,
                    'S' => {
                        has_switch = true;
                        TileKind::Switch
                    }
                    'D' => {
                        has_door = true;
                        TileKind::Door
                    }
                    'G' => {
                        has_goal = true;
                        TileKind::Goal
                    }
                    'P' => {
                        if spawn.is_some() {
                            return Err(LevelError::DuplicateSpawn);
                        }
                        spawn = Some((column, row));
                        TileKind::Empty
                    }
                    other => {
                        return Err(LevelError::UnknownSymbol {
                            symbol: other,
                            column,
                            row,
                        })
                    }
                };
                tiles.push(kind);
            }
            if found != columns {
                return Err(LevelError::RaggedRows {
                    row,
                    expected: columns,
                    found,
                });
            }
        }

        let Some((spawn_column, spawn_row)) = spawn else {
            return Err(LevelError::MissingSpawn);
        };
        if !has_goal {
            return Err(LevelError::MissingGoal);
        }
        if has_door && !has_switch {
            return Err(LevelError::DoorWithoutSwitch);
        }

        Ok(Self {
            columns: columns as u32,
            rows: rows.len() as u32,
            tile_length,
            tiles,
            spawn_column: spawn_column as u32,
            spawn_row: spawn_row as u32,
        })
    }

    /// Number of tile columns in the level.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows in the level.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Cell that carried the spawn marker, as `(column, row)`.
    #[must_use]
    pub const fn spawn_cell(&self) -> (u32, u32) {
        (self.spawn_column, self.spawn_row)
    }

    /// Captures a borrowed read-only view of the tile map.
    #[must_use]
    pub fn view(&self) -> LevelView<'_> {
        LevelView::new(&self.tiles, self.columns, self.rows, self.tile_length)
    }

    /// Returns the tile containing the provided world-space point.
    ///
    /// Everything outside the level, including negative coordinates,
    /// resolves to wall.
    #[must_use]
    pub fn tile_at(&self, x: f32, y: f32) -> TileKind {
        let column = (x / self.tile_length).floor();
        let row = (y / self.tile_length).floor();
        if column < 0.0 || row < 0.0 || column >= self.columns as f32 || row >= self.rows as f32 {
            return TileKind::Wall;
        }
        let index = row as usize * self.columns as usize + column as usize;
        self.tiles.get(index).copied().unwrap_or(TileKind::Wall)
    }

    /// Reports whether the provided point lies inside solid terrain.
    #[must_use]
    pub fn is_solid(&self, x: f32, y: f32, door_open: bool) -> bool {
        match self.tile_at(x, y) {
            TileKind::Wall => true,
            TileKind::Door => !door_open,
            TileKind::Empty | TileKind::Switch | TileKind::Goal => false,
        }
    }

    /// Reports whether the provided point rests on the switch tile.
    #[must_use]
    pub fn is_on_switch(&self, x: f32, y: f32) -> bool {
        self.tile_at(x, y) == TileKind::Switch
    }

    /// Reports whether the provided point rests on the goal tile.
    #[must_use]
    pub fn is_on_goal(&self, x: f32, y: f32) -> bool {
        self.tile_at(x, y) == TileKind::Goal
    }
}

/// Ordered catalog of parsed levels.
#[derive(Clone, Debug)]
pub struct LevelSet {
    levels: Vec<Level>,
}

impl LevelSet {
    /// Creates a catalog from already-parsed levels.
    pub fn new(levels: Vec<Level>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::EmptyCatalog);
        }
        Ok(Self { levels })
    }

    /// Parses the built-in level catalog.
    ///
    /// The built-in grids are covered by tests, so parsing them never fails.
    #[must_use]
    pub fn builtin() -> Self {
        let levels = BUILTIN_GRIDS
            .iter()
            .map(|grid| {
                Level::parse(grid, BUILTIN_TILE_LENGTH).expect("built-in level data is valid")
            })
            .collect();
        Self { levels }
    }

    /// Number of levels in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Reports whether the catalog holds no levels; never true once built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Retrieves a level by catalog position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// Resolves an index against the catalog bounds, clamping overshoots
    /// to the final level.
    pub(crate) fn clamped(&self, index: LevelIndex) -> (LevelIndex, &Level) {
        let last = self.levels.len().saturating_sub(1);
        let requested = usize::try_from(index.get()).unwrap_or(last);
        let clamped = requested.min(last);
        (LevelIndex::new(clamped as u32), &self.levels[clamped])
    }
}
