//! Replay ghosts that retrace recorded player paths.

use backtrack_core::{GhostId, Position};

/// One ghost walking a recorded path from oldest frame to newest.
#[derive(Clone, Debug)]
pub(crate) struct GhostState {
    id: GhostId,
    path: Vec<Position>,
    cursor: usize,
    active: bool,
    position: Position,
}

impl GhostState {
    pub(crate) const fn id(&self) -> GhostId {
        self.id
    }

    pub(crate) const fn position(&self) -> Position {
        self.position
    }

    pub(crate) const fn active(&self) -> bool {
        self.active
    }

    pub(crate) const fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Steps one frame along the path; past the end the ghost goes
    /// inactive and keeps its final position.
    fn advance(&mut self) {
        if !self.active {
            return;
        }
        if let Some(next) = self.path.get(self.cursor + 1) {
            self.cursor += 1;
            self.position = *next;
        } else {
            self.active = false;
        }
    }
}

/// Ghosts in spawn order, bounded by an optional capacity.
#[derive(Clone, Debug)]
pub(crate) struct GhostRoster {
    ghosts: Vec<GhostState>,
    next_id: u32,
    cap: usize,
}

impl GhostRoster {
    /// Creates an empty roster. A `cap` of zero disables the bound.
    pub(crate) const fn new(cap: usize) -> Self {
        Self {
            ghosts: Vec::new(),
            next_id: 0,
            cap,
        }
    }

    /// Adds a ghost at the start of `path`, evicting the oldest ghosts
    /// once the roster is full. Empty paths spawn nothing.
    pub(crate) fn spawn(&mut self, path: Vec<Position>) -> Option<GhostId> {
        let origin = path.first().copied()?;
        if self.cap != 0 {
            while self.ghosts.len() >= self.cap {
                let _ = self.ghosts.remove(0);
            }
        }
        let id = GhostId::new(self.next_id);
        self.next_id += 1;
        self.ghosts.push(GhostState {
            id,
            path,
            cursor: 0,
            active: true,
            position: origin,
        });
        Some(id)
    }

    pub(crate) fn advance_all(&mut self) {
        for ghost in &mut self.ghosts {
            ghost.advance();
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &GhostState> {
        self.ghosts.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.ghosts.len()
    }

    pub(crate) fn clear(&mut self) {
        self.ghosts.clear();
    }
}
