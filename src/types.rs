//! Core data types shared by the reader, the session and the frontend
//!
//! - [`SessionState`] - Lifecycle of a plot session
//! - [`ReaderStats`] - Counters describing what the serial reader has seen

use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle state of a plot session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created, nothing opened yet
    #[default]
    Idle,
    /// Connection open, waiting for the first frame
    Starting,
    /// Field count known, ticks allowed
    Running,
    /// Reader asked to exit, not yet joined
    Stopping,
    /// Reader joined and connection closed
    Stopped,
}

impl SessionState {
    /// Whether `stop()` has real work to do from this state
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Running | SessionState::Stopping
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Starting => write!(f, "Starting"),
            SessionState::Running => write!(f, "Running"),
            SessionState::Stopping => write!(f, "Stopping"),
            SessionState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Point-in-time copy of the reader counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Complete lines received
    pub lines_read: u64,
    /// Lines that produced at least one field
    pub frames_matched: u64,
    /// Lines that produced no fields
    pub lines_skipped: u64,
}

impl ReaderStats {
    /// Percentage of lines that matched the pattern
    pub fn match_rate(&self) -> f64 {
        if self.lines_read == 0 {
            100.0
        } else {
            (self.frames_matched as f64 / self.lines_read as f64) * 100.0
        }
    }
}

/// Counters updated by the reader thread and read from the UI thread
#[derive(Debug, Default)]
pub struct ReaderCounters {
    lines_read: AtomicU64,
    frames_matched: AtomicU64,
    lines_skipped: AtomicU64,
}

impl ReaderCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_match(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        self.frames_matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
        self.lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReaderStats {
        ReaderStats {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            frames_matched: self.frames_matched.load(Ordering::Relaxed),
            lines_skipped: self.lines_skipped.load(Ordering::Relaxed),
        }
    }
}
