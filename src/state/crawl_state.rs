/// Crawl state definitions for one target
///
/// A target moves through the happy path in order. Any non-terminal state
/// may drop to `Retrying` (which leads back to `Navigating`) or `Failed`.
use crate::GalleriaError;
use std::fmt;

/// Represents where a crawl target is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Happy Path =====
    /// Page load in progress
    Navigating,

    /// Reading target id and display name
    ExtractingInfo,

    /// Hovering and pausing like a visitor
    SimulatingPresence,

    /// Scrolling until page height stops growing
    LazyLoadScrolling,

    /// Waiting for in-flight responses to land
    Settling,

    /// Picking the final URL list
    SelectingUrls,

    /// Fetching images to disk
    Retrieving,

    // ===== Terminal States =====
    /// Attempt finished (with or without images)
    Done,

    /// Attempt cap exhausted
    Failed,

    // ===== Special States =====
    /// Waiting out backoff before the next attempt
    Retrying,
}

impl CrawlState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns the next state on the happy path
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Navigating => Some(Self::ExtractingInfo),
            Self::ExtractingInfo => Some(Self::SimulatingPresence),
            Self::SimulatingPresence => Some(Self::LazyLoadScrolling),
            Self::LazyLoadScrolling => Some(Self::Settling),
            Self::Settling => Some(Self::SelectingUrls),
            Self::SelectingUrls => Some(Self::Retrieving),
            Self::Retrieving => Some(Self::Done),
            Self::Retrying => Some(Self::Navigating),
            Self::Done | Self::Failed => None,
        }
    }

    /// Returns true if moving from `self` to `to` is allowed
    pub fn can_transition_to(&self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }

        match to {
            Self::Retrying | Self::Failed => *self != Self::Retrying || to == Self::Failed,
            // An empty selection finishes without retrieving
            Self::Done if *self == Self::SelectingUrls => true,
            _ => self.next() == Some(to),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigating => "navigating",
            Self::ExtractingInfo => "extracting_info",
            Self::SimulatingPresence => "simulating_presence",
            Self::LazyLoadScrolling => "lazy_load_scrolling",
            Self::Settling => "settling",
            Self::SelectingUrls => "selecting_urls",
            Self::Retrieving => "retrieving",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the current state of a target and the path it took
#[derive(Debug, Clone)]
pub struct StateTracker {
    current: CrawlState,
    history: Vec<CrawlState>,
}

impl StateTracker {
    /// Starts a tracker in `Navigating`
    pub fn new() -> Self {
        Self {
            current: CrawlState::Navigating,
            history: vec![CrawlState::Navigating],
        }
    }

    pub fn current(&self) -> CrawlState {
        self.current
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[CrawlState] {
        &self.history
    }

    /// Moves to `to`, rejecting transitions the lifecycle does not allow
    pub fn advance(&mut self, to: CrawlState) -> Result<(), GalleriaError> {
        if !self.current.can_transition_to(to) {
            return Err(GalleriaError::InvalidTransition {
                from: self.current,
                to,
            });
        }

        tracing::trace!("State {} -> {}", self.current, to);
        self.current = to;
        self.history.push(to);
        Ok(())
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
