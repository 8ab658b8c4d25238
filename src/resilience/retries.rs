//! Retry logic for health checks.
//!
//! # Responsibilities
//! - Re-run a failed check until it passes or the retry budget is spent
//! - Summarize absorbed failures in the log
//!
//! # Design Decisions
//! - No delay between attempts; each attempt is bounded by the check timeout
//! - Only consecutive failures count; the first pass ends the evaluation
//! - A budget of zero still makes one attempt

use std::sync::Arc;

use crate::health::HealthProbe;
use crate::resilience::timeouts::BoundedExecutor;
use crate::schedule::TickScheduler;

/// Decides whether a server is healthy by retrying bounded checks.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    executor: BoundedExecutor,
}

impl RetryPolicy {
    pub fn new(executor: BoundedExecutor) -> Self {
        Self { executor }
    }

    /// Returns `true` as soon as one attempt passes, `false` once
    /// `timer.retry_budget()` consecutive attempts have failed.
    pub async fn evaluate(
        &self,
        target: &str,
        probe: &Arc<dyn HealthProbe>,
        timer: &TickScheduler,
    ) -> bool {
        let budget = timer.retry_budget().max(1);
        let mut failed = 0u32;

        loop {
            let outcome = self.executor.run(target, probe, timer.check_timeout()).await;
            if outcome.is_pass() {
                if failed > 0 {
                    tracing::info!(
                        server = target,
                        failures = failed,
                        "Check failed {} time(s) before passing",
                        failed
                    );
                }
                return true;
            }

            failed += 1;
            if failed >= budget {
                tracing::info!(
                    server = target,
                    failures = failed,
                    "Check failed {} times, giving up",
                    failed
                );
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ProbeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails the first `failures` calls, then passes.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl HealthProbe for Flaky {
        async fn check(&self, _address: &str) -> Result<bool, ProbeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(call >= self.failures)
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn flaky(failures: u32) -> Arc<Flaky> {
        Arc::new(Flaky {
            failures,
            calls: AtomicU32::new(0),
        })
    }

    fn timer(retry: u32) -> TickScheduler {
        TickScheduler::new(Duration::from_secs(300), Duration::from_secs(1), retry)
    }

    #[tokio::test]
    async fn absorbs_failures_below_budget() {
        let policy = RetryPolicy::default();
        for k in 0..4 {
            let probe = flaky(k);
            let dyn_probe: Arc<dyn HealthProbe> = probe.clone();
            assert!(policy.evaluate("a", &dyn_probe, &timer(5)).await);
            assert_eq!(probe.calls.load(Ordering::SeqCst), k + 1);
        }
    }

    #[tokio::test]
    async fn gives_up_after_exactly_budget_attempts() {
        let policy = RetryPolicy::default();
        let probe = flaky(u32::MAX);
        let dyn_probe: Arc<dyn HealthProbe> = probe.clone();

        assert!(!policy.evaluate("a", &dyn_probe, &timer(3)).await);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn passing_on_last_attempt_counts() {
        let policy = RetryPolicy::default();
        let probe = flaky(2);
        let dyn_probe: Arc<dyn HealthProbe> = probe.clone();

        assert!(policy.evaluate("a", &dyn_probe, &timer(3)).await);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_budget_makes_one_attempt() {
        let policy = RetryPolicy::default();
        let probe = flaky(u32::MAX);
        let dyn_probe: Arc<dyn HealthProbe> = probe.clone();

        assert!(!policy.evaluate("a", &dyn_probe, &timer(0)).await);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }
}
