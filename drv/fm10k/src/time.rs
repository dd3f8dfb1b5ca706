// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clock and sleep source, plus the retry policy used when waiting on the
//! firmware agent.

use core::time::Duration;

/// Abstraction over "what time is it" and "wait a while".
///
/// Every delay in the bring-up sequence goes through this trait, so that
/// tests can run the whole thing against a fake clock.
pub trait Timer {
    /// Monotonic time since some arbitrary fixed point
    fn now(&self) -> Duration;

    /// Blocks for at least `d`
    fn sleep(&mut self, d: Duration);
}

impl<T: Timer + ?Sized> Timer for &mut T {
    fn now(&self) -> Duration {
        (**self).now()
    }
    fn sleep(&mut self, d: Duration) {
        (**self).sleep(d)
    }
}

/// How long to wait between successive polls of a busy resource
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Backoff {
    Constant(Duration),
    /// The `n`th wait (counting from 1) lasts `step * n`
    Linear { step: Duration },
}

impl Backoff {
    /// Delay before poll number `attempt + 1`, with `attempt` counting from 1
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Constant(d) => d,
            Backoff::Linear { step } => step.saturating_mul(attempt.max(1)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of times to write the lock word before giving up
    pub claim_attempts: u32,
    pub backoff: Backoff,
    /// Wait between claiming the lock word and checking that the claim held
    pub settle: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            claim_attempts: 3,
            backoff: Backoff::Linear {
                step: Duration::from_millis(1),
            },
            settle: Duration::from_millis(1),
        }
    }
}

/// `Timer` backed by the host's monotonic clock
#[cfg(feature = "std")]
pub struct StdTimer {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdTimer {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Timer for StdTimer {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
    fn sleep(&mut self, d: Duration) {
        std::thread::sleep(d)
    }
}
