use std::collections::VecDeque;
use std::fmt;

use bevy::prelude::*;
use constants::ar_placement::LOG_HISTORY_LIMIT;

/// Discrete user-facing events raised by the placement core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArLogEvent {
    SessionStarted,
    SessionEnded,
    SurfaceDetected,
    ModelPlaced,
    FindSurfaceFirst,
    SceneCleared,
    PlacementToggled(bool),
    HitTestError(String),
    PlacementFailed(String),
}

impl fmt::Display for ArLogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionStarted => f.write_str("AR session started"),
            Self::SessionEnded => f.write_str("AR session ended"),
            Self::SurfaceDetected => f.write_str("Surface detected!"),
            Self::ModelPlaced => f.write_str("Model placed"),
            Self::FindSurfaceFirst => f.write_str("Find a surface first"),
            Self::SceneCleared => f.write_str("Scene cleared"),
            Self::PlacementToggled(true) => f.write_str("Placement Enabled"),
            Self::PlacementToggled(false) => f.write_str("Placement Disabled"),
            Self::HitTestError(message) => write!(f, "Hit test error: {message}"),
            Self::PlacementFailed(message) => write!(f, "Placement failed: {message}"),
        }
    }
}

/// Append-only log sink consumed by the frontend.
///
/// History is bounded; once full the oldest lines fall off. Events not yet
/// forwarded to the frontend wait in a separate pending queue.
#[derive(Resource)]
pub struct ArLog {
    history: VecDeque<String>,
    pending: VecDeque<ArLogEvent>,
    limit: usize,
}

impl Default for ArLog {
    fn default() -> Self {
        Self::with_limit(LOG_HISTORY_LIMIT)
    }
}

impl ArLog {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            history: VecDeque::new(),
            pending: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, event: ArLogEvent) {
        match &event {
            ArLogEvent::HitTestError(_) | ArLogEvent::PlacementFailed(_) => warn!("{event}"),
            _ => info!("{event}"),
        }

        if self.history.len() == self.limit {
            self.history.pop_front();
        }
        self.history.push_back(event.to_string());

        // Bounded for apps without a frontend draining it
        if self.pending.len() == self.limit {
            self.pending.pop_front();
        }
        self.pending.push_back(event);
    }

    /// Lines in the order they were logged.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn contains(&self, line: &str) -> bool {
        self.history.iter().any(|entry| entry == line)
    }

    pub fn count(&self, line: &str) -> usize {
        self.history.iter().filter(|entry| *entry == line).count()
    }

    pub fn last(&self) -> Option<&str> {
        self.history.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Drop everything except the newest `keep` lines.
    pub fn truncate_history(&mut self, keep: usize) {
        while self.history.len() > keep {
            self.history.pop_front();
        }
    }

    /// Events logged since the last call.
    pub fn take_pending(&mut self) -> Vec<ArLogEvent> {
        self.pending.drain(..).collect()
    }
}
