//! Per-unit retry loop.

use std::time::Duration;
use tracing::{debug, trace};

use super::{Cancellation, Phase};
use crate::probe::{Probe, ProbeResult, Unit};
use crate::report::Reporter;

/// Attempts `probe` until it succeeds, sleeping `interval` between
/// failures. There is no attempt limit; only `cancel` ends the loop early.
pub async fn retry_until_success(
    phase: Phase,
    index: usize,
    unit: &Unit,
    probe: &dyn Probe,
    interval: Duration,
    reporter: &dyn Reporter,
    cancel: &mut Cancellation,
) -> ProbeResult {
    let mut result = ProbeResult::start();
    reporter.report(phase, index, unit, &result);

    loop {
        if cancel.is_cancelled() {
            break;
        }

        result.record_attempt();
        let outcome = tokio::select! {
            outcome = probe.attempt() => outcome,
            _ = cancel.cancelled() => break,
        };

        match outcome {
            Ok(output) => {
                debug!(phase = %phase, unit = %unit, attempts = result.attempts, "Ready");
                result.record_success(output);
                reporter.report(phase, index, unit, &result);
                return result;
            }
            Err(e) => {
                trace!(phase = %phase, unit = %unit, attempt = result.attempts, error = %e, "Attempt failed");
                result.record_failure(&e);
                reporter.report(phase, index, unit, &result);
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => break,
        }
    }

    debug!(phase = %phase, unit = %unit, attempts = result.attempts, "Abandoned");
    result.abandon();
    reporter.report(phase, index, unit, &result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::ReadinessCheck;
    use crate::error::ProbeError;
    use crate::report::NoopReporter;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails a fixed number of times, then returns a numbered banner.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Probe for Flaky {
        async fn attempt(&self) -> Result<String, ProbeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                Err(ProbeError::Connect {
                    target: "nas:22".into(),
                    source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
                })
            } else {
                Ok(format!("banner {}", call))
            }
        }
    }

    /// Keeps every snapshot it is given.
    #[derive(Default)]
    struct Snapshots(Mutex<Vec<ProbeResult>>);

    impl Reporter for Snapshots {
        fn report(&self, _phase: Phase, _index: usize, _unit: &Unit, result: &ProbeResult) {
            self.0.lock().unwrap().push(result.clone());
        }
    }

    fn unit() -> Unit {
        Unit::Service(ReadinessCheck::new("nas", 22))
    }

    #[tokio::test]
    async fn test_fails_twice_then_succeeds() {
        let probe = Flaky::new(2);
        let mut cancel = Cancellation::never();

        let result = retry_until_success(
            Phase::Wait,
            0,
            &unit(),
            &probe,
            Duration::from_millis(1),
            &NoopReporter,
            &mut cancel,
        )
        .await;

        assert_eq!(result.attempts, 3);
        assert!(result.succeeded);
        assert_eq!(result.last_output.as_deref(), Some("banner 3"));
        assert!(result.last_error.as_deref().unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn test_reports_every_attempt() {
        let probe = Flaky::new(1);
        let reporter = Snapshots::default();
        let mut cancel = Cancellation::never();

        retry_until_success(
            Phase::Wait,
            0,
            &unit(),
            &probe,
            Duration::from_millis(1),
            &reporter,
            &mut cancel,
        )
        .await;

        let snapshots = reporter.0.lock().unwrap();
        let attempts: Vec<u32> = snapshots.iter().map(|r| r.attempts).collect();
        assert_eq!(attempts, vec![0, 1, 2]);
        assert!(snapshots.last().unwrap().succeeded);
    }

    #[tokio::test]
    async fn test_deadline_abandons_unit() {
        let probe = Flaky::new(u32::MAX);
        let mut cancel = Cancellation::never().with_timeout(Duration::from_millis(30));

        let result = retry_until_success(
            Phase::Wait,
            0,
            &unit(),
            &probe,
            Duration::from_millis(5),
            &NoopReporter,
            &mut cancel,
        )
        .await;

        assert!(!result.succeeded);
        assert!(result.is_finished());
        assert!(result.attempts >= 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_attempt() {
        let (tx, mut cancel) = Cancellation::signal();
        tx.send(true).unwrap();

        let result = retry_until_success(
            Phase::Run,
            0,
            &Unit::Command("true".into()),
            &Flaky::new(0),
            Duration::from_millis(1),
            &NoopReporter,
            &mut cancel,
        )
        .await;

        assert_eq!(result.attempts, 0);
        assert!(!result.succeeded);
    }
}
