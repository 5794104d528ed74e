//! Shared crawl progress
//!
//! One crawl task writes the status; any number of pollers read it. Readers
//! get a cloned snapshot and tolerate it being slightly stale.

use crate::state::CrawlPhase;
use crate::{HarvestError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Point-in-time view of a crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStatus {
    pub in_progress: bool,
    pub total_products_estimate: u64,
    pub processed_count: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub last_product_name: String,
    pub phase: CrawlPhase,
}

/// Estimated time until the run completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    /// Not running, or nothing processed yet
    Pending,
    Remaining(Duration),
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = match self {
            Self::Pending => return write!(f, "pending"),
            Self::Remaining(remaining) => remaining.as_secs(),
        };
        if secs < 60 {
            write!(f, "{} seconds", secs)
        } else if secs < 3600 {
            write!(f, "{} minutes", secs / 60)
        } else {
            write!(f, "{} hours {} minutes", secs / 3600, (secs % 3600) / 60)
        }
    }
}

impl CrawlStatus {
    /// Estimated time remaining as of `now`
    ///
    /// `(total - processed) / (processed / elapsed)`, once at least one
    /// product has been processed.
    pub fn eta_at(&self, now: DateTime<Utc>) -> Eta {
        let Some(start) = self.start_time else {
            return Eta::Pending;
        };
        if !self.in_progress || self.processed_count == 0 {
            return Eta::Pending;
        }

        let elapsed = (now - start).num_milliseconds().max(0) as f64 / 1000.0;
        if elapsed <= 0.0 {
            return Eta::Pending;
        }
        let remaining = self
            .total_products_estimate
            .saturating_sub(self.processed_count) as f64;

        // remaining / (processed / elapsed), rearranged to keep whole numbers exact
        Eta::Remaining(Duration::from_secs_f64(
            remaining * elapsed / self.processed_count as f64,
        ))
    }

    /// Estimated time remaining as of now
    pub fn eta(&self) -> Eta {
        self.eta_at(Utc::now())
    }
}

/// Cloneable handle to the status of the current run
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<RwLock<CrawlStatus>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer leaves plain scalars behind, which are still fine
    // to report.
    fn read(&self) -> RwLockReadGuard<'_, CrawlStatus> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CrawlStatus> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current status
    pub fn snapshot(&self) -> CrawlStatus {
        self.read().clone()
    }

    /// Resets the status for a new run and marks it in progress
    ///
    /// # Errors
    ///
    /// `HarvestError::AlreadyRunning` if a run is already in progress.
    pub fn begin(&self) -> Result<()> {
        let mut status = self.write();
        if status.in_progress {
            return Err(HarvestError::AlreadyRunning);
        }
        *status = CrawlStatus {
            in_progress: true,
            start_time: Some(Utc::now()),
            phase: CrawlPhase::Initializing,
            ..CrawlStatus::default()
        };
        Ok(())
    }

    /// Moves the run to another phase
    ///
    /// # Errors
    ///
    /// `HarvestError::InvalidTransition` if the phase graph forbids the move.
    pub fn transition(&self, next: CrawlPhase) -> Result<()> {
        let mut status = self.write();
        if !status.phase.can_transition_to(&next) {
            return Err(HarvestError::InvalidTransition {
                from: status.phase,
                to: next,
            });
        }
        tracing::trace!("Crawl phase {} -> {}", status.phase, next);
        status.phase = next;
        Ok(())
    }

    pub fn set_estimate(&self, total: u64) {
        self.write().total_products_estimate = total;
    }

    /// Counts one extracted product
    pub fn record_product(&self, name: &str) {
        let mut status = self.write();
        status.processed_count += 1;
        status.last_product_name = name.to_string();
    }

    /// Ends the run, whatever phase it reached
    pub fn finish(&self) {
        let mut status = self.write();
        status.in_progress = false;
        status.phase = CrawlPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn running(processed: u64, total: u64) -> CrawlStatus {
        CrawlStatus {
            in_progress: true,
            total_products_estimate: total,
            processed_count: processed,
            start_time: Some(Utc::now()),
            ..CrawlStatus::default()
        }
    }

    #[test]
    fn test_eta_from_rate() {
        let status = running(10, 40);
        let now = status.start_time.unwrap() + ChronoDuration::seconds(100);
        let eta = status.eta_at(now);
        assert_eq!(eta, Eta::Remaining(Duration::from_secs(300)));
        assert_eq!(eta.to_string(), "5 minutes");
    }

    #[test]
    fn test_eta_pending() {
        let status = running(0, 40);
        assert_eq!(status.eta(), Eta::Pending);
        assert_eq!(status.eta().to_string(), "pending");

        let mut idle = running(10, 40);
        idle.in_progress = false;
        assert_eq!(idle.eta(), Eta::Pending);
    }

    #[test]
    fn test_eta_never_negative() {
        let status = running(50, 40);
        let now = status.start_time.unwrap() + ChronoDuration::seconds(10);
        assert_eq!(status.eta_at(now), Eta::Remaining(Duration::ZERO));
    }

    #[test]
    fn test_eta_formatting() {
        assert_eq!(Eta::Remaining(Duration::from_secs(42)).to_string(), "42 seconds");
        assert_eq!(Eta::Remaining(Duration::from_secs(3599)).to_string(), "59 minutes");
        assert_eq!(
            Eta::Remaining(Duration::from_secs(2 * 3600 + 15 * 60)).to_string(),
            "2 hours 15 minutes"
        );
    }

    #[test]
    fn test_handle_lifecycle() {
        let handle = StatusHandle::new();
        handle.begin().unwrap();
        assert!(matches!(handle.begin(), Err(HarvestError::AlreadyRunning)));

        handle.set_estimate(6);
        handle.record_product("Crème");
        handle.record_product("Gel");
        let snap = handle.snapshot();
        assert!(snap.in_progress);
        assert_eq!(snap.processed_count, 2);
        assert_eq!(snap.last_product_name, "Gel");
        assert_eq!(snap.phase, CrawlPhase::Initializing);

        handle.finish();
        let snap = handle.snapshot();
        assert!(!snap.in_progress);
        assert_eq!(snap.phase, CrawlPhase::Idle);
        assert_eq!(snap.processed_count, 2);

        handle.begin().unwrap();
        assert_eq!(handle.snapshot().processed_count, 0);
    }

    #[test]
    fn test_invalid_transition_is_rejected() {
        let handle = StatusHandle::new();
        handle.begin().unwrap();
        let err = handle.transition(CrawlPhase::Extracting { page: 1 }).unwrap_err();
        assert!(matches!(err, HarvestError::InvalidTransition { .. }));
        handle.transition(CrawlPhase::Navigating { page: 1 }).unwrap();
    }
}
