/// Budget used when the caller does not supply one.
pub const DEFAULT_TIME_BUDGET: u32 = 300;

/// Result of a single countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Time remains after this tick.
    Running { remaining: u32 },
    /// This tick reached zero. Reported once per countdown.
    Expired,
    /// The countdown had already expired; nothing changed.
    Stopped,
}

/// One-shot countdown over a fixed budget of time units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    budget: u32,
    remaining: u32,
    expiry_reported: bool,
}

impl Countdown {
    /// Starts a countdown. Zero or negative budgets are already expired.
    #[must_use]
    pub fn start(budget: i64) -> Self {
        let budget = u32::try_from(budget.max(0)).unwrap_or(u32::MAX);
        Self {
            budget,
            remaining: budget,
            expiry_reported: false,
        }
    }

    #[must_use]
    pub fn budget(&self) -> u32 {
        self.budget
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.budget - self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Decrements by one unit. Never goes below zero.
    pub fn tick(&mut self) -> Tick {
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining > 0 {
                return Tick::Running {
                    remaining: self.remaining,
                };
            }
        }
        if self.take_expiry() {
            Tick::Expired
        } else {
            Tick::Stopped
        }
    }

    /// Returns true exactly once after the countdown has reached zero.
    ///
    /// Used for budgets that start expired, where no tick ever fires.
    pub fn take_expiry(&mut self) -> bool {
        if self.is_expired() && !self.expiry_reported {
            self.expiry_reported = true;
            true
        } else {
            false
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::start(i64::from(DEFAULT_TIME_BUDGET))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_expires_once() {
        let mut countdown = Countdown::start(3);
        assert_eq!(countdown.tick(), Tick::Running { remaining: 2 });
        assert_eq!(countdown.tick(), Tick::Running { remaining: 1 });
        assert_eq!(countdown.tick(), Tick::Expired);
        assert!(countdown.is_expired());
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(countdown.tick(), Tick::Stopped);
        assert_eq!(countdown.remaining(), 0);
        assert_eq!(countdown.elapsed(), 3);
    }

    #[test]
    fn non_positive_budget_is_immediately_expired() {
        for budget in [0, -5] {
            let mut countdown = Countdown::start(budget);
            assert!(countdown.is_expired());
            assert!(countdown.take_expiry());
            assert!(!countdown.take_expiry());
            assert_eq!(countdown.tick(), Tick::Stopped);
        }
    }

    #[test]
    fn expired_by_tick_does_not_signal_again() {
        let mut countdown = Countdown::start(1);
        assert_eq!(countdown.tick(), Tick::Expired);
        assert!(!countdown.take_expiry());
    }

    #[test]
    fn default_budget_is_five_minutes() {
        assert_eq!(Countdown::default().remaining(), 300);
    }
}
