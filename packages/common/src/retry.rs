use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::storage::{ErrorKind, StoreError};

/// Errors that can be sorted into kinds, so a [`Repeater`] can tell fatal
/// failures from transient ones.
pub trait Classify {
    type Kind: PartialEq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

impl Classify for StoreError {
    type Kind = ErrorKind;

    fn kind(&self) -> ErrorKind {
        StoreError::kind(self)
    }
}

/// Pause before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    /// Same pause every time.
    Constant(Duration),
    /// `initial + step * (n - 1)` before retry `n`.
    Linear { initial: Duration, step: Duration },
    /// `base * 2^(n - 1)` plus up to 25% jitter, capped at `ceiling`.
    Exponential { base: Duration, ceiling: Duration },
}

impl Delay {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn after(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match *self {
            Delay::Constant(d) => d,
            Delay::Linear { initial, step } => {
                initial.saturating_add(step.saturating_mul(attempt - 1))
            }
            Delay::Exponential { base, ceiling } => {
                let pause = base.saturating_mul(2u32.saturating_pow(attempt - 1));
                let spread = u64::try_from(pause.as_millis() / 4).unwrap_or(u64::MAX);
                let jitter = Duration::from_millis(rand::rng().random_range(0..=spread));
                pause.saturating_add(jitter).min(ceiling)
            }
        }
    }
}

/// Why a [`Repeater`] gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("attempt {attempt} failed with a fatal error: {error}")]
    Fatal { attempt: u32, error: E },

    #[error("gave up after {attempts} attempt(s): {error}")]
    Exhausted { attempts: u32, error: E },

    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32, last: Option<E> },
}

impl<E> RetryError<E> {
    /// The last error observed, if any attempt ran.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Fatal { error, .. } | Self::Exhausted { error, .. } => Some(error),
            Self::Cancelled { last, .. } => last.as_ref(),
        }
    }

    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::Fatal { error, .. } | Self::Exhausted { error, .. } => Some(error),
            Self::Cancelled { last, .. } => last,
        }
    }

    /// Number of attempts that actually ran.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Fatal { attempt, .. } => *attempt,
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
        }
    }
}

/// Repeats a fallible unit of work until it succeeds, hits a fatal error,
/// runs out of attempts or is cancelled.
///
/// Cancellation is checked before each attempt and during each delay; an
/// attempt already in flight is never interrupted.
#[derive(Debug, Clone)]
pub struct Repeater<K> {
    max_attempts: u32,
    delay: Delay,
    fatal: Vec<K>,
}

impl<K: PartialEq + fmt::Debug> Repeater<K> {
    pub fn new(max_attempts: u32, delay: Delay) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            fatal: Vec::new(),
        }
    }

    /// Declare a kind of error that stops the loop immediately.
    pub fn fatal(mut self, kind: K) -> Self {
        if !self.fatal.contains(&kind) {
            self.fatal.push(kind);
        }
        self
    }

    pub fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn run<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut work: F,
    ) -> Result<T, RetryError<E>>
    where
        E: Classify<Kind = K> + fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut last = None;
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled {
                    attempts: attempt,
                    last,
                });
            }
            attempt += 1;

            let error = match work().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let kind = error.kind();
            if self.fatal.contains(&kind) {
                debug!(attempt, ?kind, error = %error, "Fatal error, not retrying");
                return Err(RetryError::Fatal { attempt, error });
            }
            if attempt >= self.max_attempts {
                warn!(attempts = attempt, error = %error, "Retries exhausted");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    error,
                });
            }

            let pause = self.delay.after(attempt);
            debug!(attempt, ?kind, error = %error, delay_ms = pause.as_millis() as u64, "Attempt failed, retrying");
            last = Some(error);

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled { attempts: attempt, last });
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }
}
