use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::{KnowlexError, Result};

#[derive(Debug)]
struct BreakerState {
    consecutive_failures: usize,
    opened_at: Option<Instant>,
}

/// Trips after `threshold` consecutive failures and rejects calls until
/// `reset_timeout` has elapsed, after which the next call goes through
/// as a probe. A successful probe closes the breaker; a failed one
/// reopens it for another full timeout.
pub struct CircuitBreaker {
    threshold: usize,
    reset_timeout: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(threshold: usize, reset_timeout: Duration) -> Self {
        Self {
            threshold,
            reset_timeout,
            state: Mutex::new(BreakerState {
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Run `fut` under breaker protection. Rejected calls fail with
    /// [`KnowlexError::CircuitOpen`] without touching the backend.
    pub async fn call<T, Fut>(&self, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        self.check_open()?;
        match fut.await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    /// Whether calls would currently be rejected. Read-only: the
    /// half-open transition only happens when a call is admitted.
    pub fn is_open(&self) -> bool {
        let state = self.state.lock().unwrap();
        match state.opened_at {
            Some(opened_at) => opened_at.elapsed() < self.reset_timeout,
            None => false,
        }
    }

    fn check_open(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(opened_at) = state.opened_at {
            if opened_at.elapsed() < self.reset_timeout {
                return Err(KnowlexError::CircuitOpen);
            }
            // Timeout elapsed: let this call through as a probe. Reset
            // the failure count so one more failure reopens immediately.
            state.opened_at = None;
            state.consecutive_failures = self.threshold.saturating_sub(1);
            log::info!("circuit breaker half-open, probing backend");
        }
        Ok(())
    }

    fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        state.consecutive_failures = 0;
        state.opened_at = None;
    }

    fn record_failure(&self) {
        let mut state = self.state.lock().unwrap();
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.threshold {
            log::warn!(
                "circuit breaker opened after {} consecutive failures",
                state.consecutive_failures
            );
            state.opened_at = Some(Instant::now());
        }
    }
}
