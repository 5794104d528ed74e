/// Crawl phase definitions for tracking run progress
///
/// A run moves `Idle -> Initializing -> (Navigating <-> Extracting)* ->
/// Finalizing -> Idle`. Any phase inside the run may jump straight to
/// `Finalizing` when a fault ends the page loop early.
use serde::Serialize;
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CrawlPhase {
    /// No run is active
    Idle,

    /// Session acquired; consent, page count and the first link batch
    Initializing,

    /// Loading listing page `page`
    Navigating { page: u32 },

    /// Extracting the products linked from listing page `page`
    Extracting { page: u32 },

    /// Exporting and releasing the session
    Finalizing,
}

impl CrawlPhase {
    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: &CrawlPhase) -> bool {
        use CrawlPhase::*;
        match (self, next) {
            (Idle, Initializing) => true,
            (Initializing, Navigating { page }) => *page == 1,
            (Navigating { page: a }, Extracting { page: b }) => a == b,
            // A page that cannot be reached is skipped
            (Navigating { page: a }, Navigating { page: b }) => b > a,
            (Extracting { page: a }, Navigating { page: b }) => b > a,
            (Initializing | Navigating { .. } | Extracting { .. }, Finalizing) => true,
            (Finalizing, Idle) => true,
            _ => false,
        }
    }
}

impl Default for CrawlPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Initializing => write!(f, "initializing"),
            Self::Navigating { page } => write!(f, "navigating page {}", page),
            Self::Extracting { page } => write!(f, "extracting page {}", page),
            Self::Finalizing => write!(f, "finalizing"),
        }
    }
}
