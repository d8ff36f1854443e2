//! Modified Julian Date epochs.
//!
//! Epochs are carried as an integer day count plus seconds into the day so
//! that differencing two nearby epochs does not lose precision to the large
//! day number, which a single f64 MJD would.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Seconds per day.
pub const SECS_PER_DAY: f64 = 86_400.0;

/// MJD of the Unix epoch, 1970-01-01T00:00:00Z.
const UNIX_EPOCH_MJD: i64 = 40_587;

/// An absolute time as a Modified Julian Date.
///
/// Always stored normalized: `0.0 <= secs < 86400.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    days: i64,
    secs: f64,
}

impl Epoch {
    /// Create an epoch from an integer MJD day and seconds into that day.
    ///
    /// The pair is normalized, so `secs` outside `[0, 86400)` (including
    /// negative values) is folded into the day count.
    pub fn new(days: i64, secs: f64) -> Self {
        let mut e = Self { days, secs };
        e.normalize();
        e
    }

    /// Create an epoch from a fractional MJD.
    pub fn from_mjd(mjd: f64) -> Self {
        let days = mjd.floor();
        Self::new(days as i64, (mjd - days) * SECS_PER_DAY)
    }

    /// Integer MJD day.
    #[inline]
    pub fn days(&self) -> i64 {
        self.days
    }

    /// Seconds into the day, in `[0, 86400)`.
    #[inline]
    pub fn secs(&self) -> f64 {
        self.secs
    }

    /// Fractional MJD. Loses sub-microsecond precision; for display and
    /// coarse comparisons only.
    pub fn as_mjd(&self) -> f64 {
        self.days as f64 + self.secs / SECS_PER_DAY
    }

    /// Seconds elapsed from `other` to `self` (negative if `self` is earlier).
    pub fn diff_secs(&self, other: &Epoch) -> f64 {
        (self.days - other.days) as f64 * SECS_PER_DAY + (self.secs - other.secs)
    }

    /// A new epoch offset by the given number of seconds.
    pub fn add_secs(&self, secs: f64) -> Self {
        Self::new(self.days, self.secs + secs)
    }

    /// UTC calendar time, truncated to whole nanoseconds. For metadata and
    /// logging; timing arithmetic stays in MJD.
    pub fn to_utc(&self) -> DateTime<Utc> {
        let unix_secs = (self.days - UNIX_EPOCH_MJD) * SECS_PER_DAY as i64 + self.secs as i64;
        let nanos = (self.secs.fract() * 1e9) as u32;
        Utc.timestamp_opt(unix_secs, nanos)
            .single()
            .unwrap_or_default()
    }

    fn normalize(&mut self) {
        let extra_days = (self.secs / SECS_PER_DAY).floor();
        self.days += extra_days as i64;
        self.secs -= extra_days * SECS_PER_DAY;
        // Guard against secs == 86400.0 after float rounding.
        if self.secs >= SECS_PER_DAY {
            self.days += 1;
            self.secs -= SECS_PER_DAY;
        }
    }
}

impl PartialOrd for Epoch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.days.cmp(&other.days) {
            Ordering::Equal => self.secs.partial_cmp(&other.secs),
            ord => Some(ord),
        }
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MJD {}.{:09}", self.days, (self.secs / SECS_PER_DAY * 1e9) as u64)
    }
}
