//! Mute state of the local user

use chrono::{DateTime, Duration, Utc};

/// Absolute wall-clock expiry of the local user's timeout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutState {
    until: Option<DateTime<Utc>>,
}

impl TimeoutState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a timeout notice; an expiry in the past clears the state
    pub fn set(&mut self, until: DateTime<Utc>, now: DateTime<Utc>) {
        self.until = (until > now).then_some(until);
    }

    pub fn clear(&mut self) {
        self.until = None;
    }

    /// Whether the user is muted at `now`; clears itself once passed
    pub fn is_active(&mut self, now: DateTime<Utc>) -> bool {
        match self.until {
            Some(until) if until > now => true,
            Some(_) => {
                self.until = None;
                false
            }
            None => false,
        }
    }

    /// Time left on the mute, `None` when not muted
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.until.filter(|until| *until > now).map(|until| until - now)
    }

    pub fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }
}
