use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use auto_impl::auto_impl;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Source of time for polling loops. Injected so tests can run on virtual
/// time.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait Clock: Send + Sync + Debug {
    /// Monotonic time since the clock was created
    fn elapsed(&self) -> Duration;

    /// Wall clock, in unix seconds
    fn unix_now(&self) -> u64;

    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// The tokio timer and the system clock
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    start: Instant,
}

impl TokioClock {
    /// A clock starting now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn unix_now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Why a polling loop stopped waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollInterrupt {
    /// The caller's timeout passed
    TimedOut,
    /// The caller's token was cancelled
    Cancelled,
}

/// How a polling operation paces and bounds itself
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Pause between two polls
    pub interval: Duration,
    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Cancels the wait from outside
    pub cancel: CancellationToken,
}

impl PollOptions {
    /// Poll every `interval` with no timeout
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Start pacing a poll loop on `clock`
    pub fn start<'a>(&'a self, clock: &'a dyn Clock) -> PollTimer<'a> {
        PollTimer {
            deadline: self.timeout.map(|t| clock.elapsed() + t),
            opts: self,
            clock,
        }
    }
}

/// Paces one poll loop: each [`PollTimer::tick`] waits one interval, or less
/// if the deadline is closer.
#[derive(Debug)]
pub struct PollTimer<'a> {
    opts: &'a PollOptions,
    clock: &'a dyn Clock,
    deadline: Option<Duration>,
}

impl PollTimer<'_> {
    /// Await `fut`, giving up when the deadline passes or the token is
    /// cancelled first. Bounds a single in-flight call.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, PollInterrupt> {
        let expiry = async {
            match self.deadline {
                Some(deadline) => {
                    let now = self.clock.elapsed();
                    if now < deadline {
                        self.clock.sleep(deadline - now).await;
                    }
                }
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            out = fut => Ok(out),
            _ = self.opts.cancel.cancelled() => Err(PollInterrupt::Cancelled),
            _ = expiry => Err(PollInterrupt::TimedOut),
        }
    }

    /// Wait before the next poll. Fails once the deadline has passed or the
    /// token is cancelled.
    pub async fn tick(&self) -> Result<(), PollInterrupt> {
        if self.opts.cancel.is_cancelled() {
            return Err(PollInterrupt::Cancelled);
        }
        let pause = match self.deadline {
            Some(deadline) => {
                let now = self.clock.elapsed();
                if now >= deadline {
                    return Err(PollInterrupt::TimedOut);
                }
                self.opts.interval.min(deadline - now)
            }
            None => self.opts.interval,
        };
        tokio::select! {
            biased;
            _ = self.opts.cancel.cancelled() => return Err(PollInterrupt::Cancelled),
            _ = self.clock.sleep(pause) => {}
        }
        match self.deadline {
            Some(deadline) if self.clock.elapsed() >= deadline => Err(PollInterrupt::TimedOut),
            _ => Ok(()),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-utils"))]
mod manual {
    use super::*;
    use parking_lot::Mutex;

    /// Virtual time: `sleep` advances the clock instead of waiting.
    #[derive(Debug, Default)]
    pub struct ManualClock {
        state: Mutex<State>,
    }

    #[derive(Debug, Default)]
    struct State {
        elapsed: Duration,
        unix_start: u64,
        sleeps: Vec<Duration>,
    }

    impl ManualClock {
        /// A clock whose wall time starts at `unix_start`
        pub fn starting_at(unix_start: u64) -> Self {
            Self {
                state: Mutex::new(State {
                    unix_start,
                    ..Default::default()
                }),
            }
        }

        /// Move time forward without a sleep
        pub fn advance(&self, by: Duration) {
            self.state.lock().elapsed += by;
        }

        /// Every sleep so far
        pub fn sleeps(&self) -> Vec<Duration> {
            self.state.lock().sleeps.clone()
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn elapsed(&self) -> Duration {
            self.state.lock().elapsed
        }

        fn unix_now(&self) -> u64 {
            let state = self.state.lock();
            state.unix_start + state.elapsed.as_secs()
        }

        async fn sleep(&self, duration: Duration) {
            {
                let mut state = self.state.lock();
                state.elapsed += duration;
                state.sleeps.push(duration);
            }
            tokio::task::yield_now().await;
        }
    }
}
