use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Source of wall-clock time for record ids and creation timestamps.
///
/// Passed explicitly into the registry so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Clock pinned at the given milliseconds since the UNIX epoch.
    pub fn from_millis(ms: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH))
    }

    /// Move the clock forward (or backward, for negative values).
    pub fn advance_ms(&self, ms: i64) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += Duration::milliseconds(ms);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

impl fmt::Debug for FixedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedClock({})", format_timestamp(&self.now()))
    }
}

/// Render a timestamp as RFC 3339 UTC with millisecond precision,
/// e.g. `2024-05-01T10:11:12.345Z`.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Record identifier: decimal milliseconds since the UNIX epoch.
///
/// Ids are stored as strings so documents written by other tooling
/// (with non-numeric ids) still decode.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms.to_string())
    }

    /// Generate the id for a record appended at `now` to a document already
    /// holding `existing`.
    ///
    /// The id is `max(now_ms, highest_numeric + 1)`, so ids never repeat or
    /// go backwards within one document even if the wall clock does. Once
    /// `i64::MAX` is taken the id becomes `{now_ms}-{n}` with the smallest
    /// unused `n`. Two writers racing on the same document can still pick
    /// the same id.
    pub fn next<'a>(
        now: &DateTime<Utc>,
        existing: impl IntoIterator<Item = &'a RecordId>,
    ) -> Self {
        let now_ms = now.timestamp_millis();
        let existing: Vec<&RecordId> = existing.into_iter().collect();
        let highest = existing.iter().filter_map(|id| id.as_millis()).max();

        let ms = match highest {
            Some(prev) if prev >= now_ms => prev.checked_add(1),
            _ => Some(now_ms),
        };
        if let Some(ms) = ms {
            return Self::from_millis(ms);
        }

        let mut n = 0u64;
        loop {
            let candidate = format!("{now_ms}-{n}");
            if !existing.iter().any(|id| id.as_str() == candidate) {
                return Self(candidate);
            }
            n += 1;
        }
    }

    /// Numeric value, if the id is a plain decimal millisecond count.
    pub fn as_millis(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
