//! Session cookie policy.
//!
//! The same [`ExpireOffset`] drives the `Expires` attribute of the cookie and the
//! expiry stored with the session row, so neither outlives the other.

use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};

/// Calendar offset added to the creation instant of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireOffset {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl ExpireOffset {
    pub const fn days(days: u32) -> Self {
        Self {
            years: 0,
            months: 0,
            days,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }

    /// Expiry instant for a session created at `now`.
    ///
    /// Month arithmetic clamps to the last day of the target month
    /// (Jan 31 + 1 month = Feb 28/29). Saturates at the maximum representable
    /// instant.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = self.years.saturating_mul(12).saturating_add(self.months);
        now.checked_add_months(Months::new(months))
            .and_then(|t| t.checked_add_days(Days::new(u64::from(self.days))))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for ExpireOffset {
    fn default() -> Self {
        Self::days(7)
    }
}

/// Cookie attributes and session lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieSettings {
    pub http_only: bool,
    pub secure: bool,
    pub expire_offset: ExpireOffset,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            expire_offset: ExpireOffset::default(),
        }
    }
}
