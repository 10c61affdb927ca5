//! Bounded record of recent player positions.

use std::collections::VecDeque;

use backtrack_core::Position;

/// Rolling buffer of player positions, oldest first.
///
/// Recording beyond the horizon silently drops the oldest entry, so the
/// buffer always holds at most `horizon` frames of history.
#[derive(Clone, Debug)]
pub(crate) struct TraceBuffer {
    entries: VecDeque<Position>,
    horizon: usize,
}

impl TraceBuffer {
    pub(crate) fn new(horizon: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(horizon),
            horizon,
        }
    }

    /// Appends a position, evicting the oldest entry past the horizon.
    pub(crate) fn record(&mut self, position: Position) {
        self.entries.push_back(position);
        while self.entries.len() > self.horizon {
            let _ = self.entries.pop_front();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops everything after the first `keep` entries.
    pub(crate) fn truncate_to(&mut self, keep: usize) {
        self.entries.truncate(keep);
    }

    /// Copies out the newest `span` entries in chronological order,
    /// excluding the most recent one.
    ///
    /// The newest entry is the frame the caller is currently standing on,
    /// so replaying it would duplicate the present. With fewer than two
    /// entries the segment is empty.
    pub(crate) fn tail_segment(&self, span: usize) -> Vec<Position> {
        let taken = span.min(self.entries.len().saturating_sub(1));
        let skip = self.entries.len().saturating_sub(1 + taken);
        self.entries.iter().skip(skip).take(taken).copied().collect()
    }
}
