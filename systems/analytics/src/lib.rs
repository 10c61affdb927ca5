#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure analytics over session event streams.
//!
//! The system never touches world state. It folds [`Event`] batches into
//! per-attempt counters, starting a fresh attempt whenever a level load
//! is observed.

use backtrack_core::Event;

/// Counters covering one attempt at a level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttemptReport {
    /// Latest frame number observed for this attempt.
    pub frames: u64,
    /// Rewinds performed during this attempt.
    pub rewinds: u64,
    /// Total frames handed to ghosts across all rewinds.
    pub replay_frames: u64,
    /// Highest simultaneous ghost count reached.
    pub peak_ghosts: usize,
    /// Frame on which the attempt was won, if it was.
    pub won_at: Option<u64>,
}

/// Event-fed analytics that summarize the current attempt.
#[derive(Debug, Default)]
pub struct AttemptAnalytics {
    report: AttemptReport,
    attempts: u64,
}

impl AttemptAnalytics {
    /// Creates an analytics system with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for the attempt currently in progress.
    #[must_use]
    pub fn report(&self) -> &AttemptReport {
        &self.report
    }

    /// Level loads observed over the lifetime of the system.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Folds a batch of events into the counters.
    ///
    /// A `LevelLoaded` event closes the previous attempt and zeroes the
    /// report before later events in the same batch are counted.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::LevelLoaded { .. } => {
                    self.attempts = self.attempts.saturating_add(1);
                    self.report = AttemptReport::default();
                }
                Event::Stepped { frame } => self.report.frames = *frame,
                Event::Won { frame } => {
                    if self.report.won_at.is_none() {
                        self.report.won_at = Some(*frame);
                    }
                }
                Event::RewindPerformed { replay_len, .. } => {
                    self.report.rewinds = self.report.rewinds.saturating_add(1);
                    self.report.replay_frames = self
                        .report
                        .replay_frames
                        .saturating_add(*replay_len as u64);
                }
                Event::GhostCountChanged { count } => {
                    self.report.peak_ghosts = self.report.peak_ghosts.max(*count);
                }
            }
        }
    }
}
