//! Result aggregator for a supervised run
//!
//! Both stream watchers and the wait on the child report here. The first
//! upgrade descriptor wins and suppresses every error; otherwise the first
//! error wins. One aggregator exists per supervised run.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::domain::errors::RunError;
use crate::domain::models::{SupervisorOutcome, UpgradeDescriptor};

#[derive(Debug, Default)]
struct AggregatedResult {
    error: Option<RunError>,
    descriptor: Option<UpgradeDescriptor>,
}

/// Lock-guarded verdict shared by the racing producers of one run
#[derive(Debug, Default)]
pub struct ResultAggregator {
    inner: Mutex<AggregatedResult>,
}

impl ResultAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    // The guarded state is two plain options, valid even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, AggregatedResult> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `err` unless a descriptor or an earlier error is held.
    ///
    /// Returns whether the error was recorded.
    pub fn set_error(&self, err: RunError) -> bool {
        let mut result = self.lock();
        if result.descriptor.is_some() || result.error.is_some() {
            debug!(error = %err, "dropping error, verdict already decided");
            return false;
        }
        result.error = Some(err);
        true
    }

    /// Record `upgrade` unless a descriptor is already held, clearing any error.
    ///
    /// Descriptors without a name are ignored. Returns whether the descriptor
    /// was recorded.
    pub fn set_upgrade(&self, upgrade: UpgradeDescriptor) -> bool {
        let mut result = self.lock();
        if result.descriptor.is_some() || !upgrade.is_named() {
            debug!(upgrade = %upgrade, "dropping upgrade descriptor");
            return false;
        }
        result.descriptor = Some(upgrade);
        result.error = None;
        true
    }

    /// Snapshot of the held descriptor and error; at most one is present.
    pub fn read(&self) -> (Option<UpgradeDescriptor>, Option<RunError>) {
        let result = self.lock();
        (result.descriptor.clone(), result.error.clone())
    }

    /// Whether a descriptor has been recorded.
    pub fn has_upgrade(&self) -> bool {
        self.lock().descriptor.is_some()
    }

    /// Current verdict as an outcome.
    pub fn outcome(&self) -> SupervisorOutcome {
        match self.read() {
            (Some(upgrade), _) => SupervisorOutcome::UpgradeRequested(upgrade),
            (None, err) => SupervisorOutcome::ProcessExited(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::StreamKind;
    use std::sync::Arc;

    fn too_long(stream: StreamKind) -> RunError {
        RunError::LineTooLong { stream, limit: 1 }
    }

    #[test]
    fn test_empty_aggregator() {
        let aggregator = ResultAggregator::new();
        let (upgrade, err) = aggregator.read();
        assert!(upgrade.is_none());
        assert!(err.is_none());
        assert!(matches!(
            aggregator.outcome(),
            SupervisorOutcome::ProcessExited(None)
        ));
    }

    #[test]
    fn test_first_error_wins() {
        let aggregator = ResultAggregator::new();
        assert!(aggregator.set_error(too_long(StreamKind::Stdout)));
        assert!(!aggregator.set_error(too_long(StreamKind::Stderr)));

        let (_, err) = aggregator.read();
        assert!(matches!(
            err,
            Some(RunError::LineTooLong {
                stream: StreamKind::Stdout,
                ..
            })
        ));
    }

    #[test]
    fn test_upgrade_clears_error_and_is_permanent() {
        let aggregator = ResultAggregator::new();
        aggregator.set_error(too_long(StreamKind::Stdout));
        assert!(aggregator.set_upgrade(UpgradeDescriptor::new("v2", 10)));
        assert!(!aggregator.set_upgrade(UpgradeDescriptor::new("v3", 11)));
        assert!(!aggregator.set_error(too_long(StreamKind::Stderr)));

        let (upgrade, err) = aggregator.read();
        assert_eq!(upgrade, Some(UpgradeDescriptor::new("v2", 10)));
        assert!(err.is_none());
        assert!(aggregator.has_upgrade());
    }

    #[test]
    fn test_unnamed_upgrade_is_ignored() {
        let aggregator = ResultAggregator::new();
        assert!(!aggregator.set_upgrade(UpgradeDescriptor::new("", 10)));
        assert!(!aggregator.has_upgrade());
    }

    #[test]
    fn test_concurrent_producers_settle_on_one_verdict() {
        for _ in 0..50 {
            let aggregator = Arc::new(ResultAggregator::new());
            let barrier = Arc::new(std::sync::Barrier::new(3));

            let handles: Vec<_> = (0..3)
                .map(|i| {
                    let aggregator = Arc::clone(&aggregator);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        if i == 1 {
                            aggregator.set_upgrade(UpgradeDescriptor::new("v2", 1));
                        } else {
                            aggregator.set_error(too_long(StreamKind::Stdout));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let (upgrade, err) = aggregator.read();
            assert_eq!(upgrade.map(|u| u.name), Some("v2".to_string()));
            assert!(err.is_none());
        }
    }
}
