//! Pure countdown state machine.
//!
//! Hosts drive it with one [`Countdown::tick`] per period; it never reads a clock.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CountdownError {
    #[error("countdown duration must be > 0 seconds, got {seconds}")]
    InvalidDuration { seconds: i64 },

    #[error("countdown can only start from idle (currently {state:?})")]
    NotIdle { state: CountdownState },
}

/// Lifecycle of a countdown.
///
/// `Idle → Running → Expired`, or `Idle | Running → Stopped`. Both ends are final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountdownState {
    #[default]
    Idle,
    Running,
    Expired,
    Stopped,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One second elapsed; time remains.
    Running { remaining: u32 },
    /// This tick brought the remaining time to zero. Returned exactly once.
    Expired,
    /// Not running; nothing changed.
    Inactive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    state: CountdownState,
    total: u32,
    remaining: u32,
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `seconds`.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::InvalidDuration` for `seconds <= 0` (or beyond `u32`),
    /// and `CountdownError::NotIdle` if the countdown was already started or stopped.
    pub fn start(&mut self, seconds: i64) -> Result<(), CountdownError> {
        if seconds <= 0 {
            return Err(CountdownError::InvalidDuration { seconds });
        }
        let total =
            u32::try_from(seconds).map_err(|_| CountdownError::InvalidDuration { seconds })?;
        if self.state != CountdownState::Idle {
            return Err(CountdownError::NotIdle { state: self.state });
        }

        self.state = CountdownState::Running;
        self.total = total;
        self.remaining = total;
        Ok(())
    }

    /// Advance by one second.
    pub fn tick(&mut self) -> Tick {
        if self.state != CountdownState::Running {
            return Tick::Inactive;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = CountdownState::Expired;
            Tick::Expired
        } else {
            Tick::Running {
                remaining: self.remaining,
            }
        }
    }

    /// Stop the countdown. Idempotent; returns true only when this call stopped it.
    ///
    /// An expired countdown stays expired.
    pub fn stop(&mut self) -> bool {
        match self.state {
            CountdownState::Idle | CountdownState::Running => {
                self.state = CountdownState::Stopped;
                true
            }
            CountdownState::Expired | CountdownState::Stopped => false,
        }
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    /// True once `start` succeeded, even if the countdown was stopped or expired since.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.total > 0
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.total.saturating_sub(self.remaining)
    }
}

/// Render seconds as `MM:SS`, or `H:MM:SS` from one hour up.
#[must_use]
pub fn format_clock(secs: u32) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
