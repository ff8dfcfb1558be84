//! Bearer credentials and the clock that bounds their validity

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::fmt;

/// Credential string with the instant it stops being valid
///
/// The secret is never printed: `Debug` redacts it and the type has no
/// serialization support.
#[derive(Clone)]
pub struct BearerToken {
    secret: String,
    expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn new(secret: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Creates a token valid for `validity` starting at `now`
    pub fn with_validity(secret: impl Into<String>, validity: Duration, now: DateTime<Utc>) -> Self {
        Self::new(secret, now + validity)
    }

    /// Raw credential, for building the `Authorization` header only
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of the current time for token validity checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let token = BearerToken::new("eyJ0eXAi.super.secret", Utc::now());
        let printed = format!("{:?}", token);

        assert!(!printed.contains("super.secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_validity_window() {
        let start = Utc::now();
        let token = BearerToken::with_validity("t", Duration::hours(1), start);

        assert_eq!(token.expires_at(), start + Duration::hours(1));
        assert!(!token.is_expired_at(start));
        assert!(!token.is_expired_at(start + Duration::minutes(59)));
        assert!(token.is_expired_at(start + Duration::hours(1)));
    }

    #[test]
    fn test_manual_clock() {
        let start = Utc::now();
        let clock = ManualClock::new(start);

        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), start + Duration::seconds(30));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
