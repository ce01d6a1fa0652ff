//! Optional cooperative cancellation.
//!
//! By default nothing ever cancels and units retry forever. A shutdown
//! signal, a deadline, or both can be attached; workers check it while
//! attempting and while sleeping between attempts.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Cancellation source shared by the workers of a phase.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    signal: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Never cancels.
    pub fn never() -> Self {
        Self::default()
    }

    /// Creates a cancellation driven by a shutdown flag.
    ///
    /// Sending `true` on the returned sender cancels every clone.
    pub fn signal() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (
            tx,
            Self {
                signal: Some(rx),
                deadline: None,
            },
        )
    }

    /// Additionally cancels once `timeout` has passed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Returns true if cancellation has already happened.
    pub fn is_cancelled(&self) -> bool {
        let signalled = self.signal.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|at| Instant::now() >= at);
        signalled || expired
    }

    /// Completes when cancelled. Pends forever if nothing can cancel.
    pub async fn cancelled(&mut self) {
        let deadline = self.deadline;
        let signal = async {
            if let Some(rx) = self.signal.as_mut() {
                // a dropped sender can no longer cancel
                if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                    return;
                }
            }
            std::future::pending::<()>().await
        };

        match deadline {
            Some(at) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => {}
                    _ = signal => {}
                }
            }
            None => signal.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_never_does_not_fire() {
        let mut cancel = Cancellation::never();
        assert!(!cancel.is_cancelled());
        let fired = tokio::time::timeout(Duration::from_millis(20), cancel.cancelled()).await;
        assert!(fired.is_err());
    }

    #[tokio::test]
    async fn test_signal_fires() {
        let (tx, cancel) = Cancellation::signal();
        let mut waiter = cancel.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_sender_never_fires() {
        let (tx, mut cancel) = Cancellation::signal();
        drop(tx);
        let fired = tokio::time::timeout(Duration::from_millis(20), cancel.cancelled()).await;
        assert!(fired.is_err());
    }

    #[tokio::test]
    async fn test_deadline_fires() {
        let mut cancel = Cancellation::never().with_timeout(Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .unwrap();
        assert!(cancel.is_cancelled());
    }
}
