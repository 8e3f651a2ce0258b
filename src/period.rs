//! Time periods and the `OVERLAPS` rule used for reservation conflicts.
//!
//! The in-memory check mirrors PostgreSQL's `(s1, e1) OVERLAPS (s2, e2)` so that code
//! working without a database (the test store, request pre-checks) agrees with the SQL
//! statements in [`crate::store::postgres`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// A period between two timestamps.
///
/// Endpoints are normalized on construction so that `start <= finish`. A period with
/// `start < finish` covers `[start, finish)`; a period with `start == finish` is the single
/// instant `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    start: NaiveDateTime,
    finish: NaiveDateTime,
}

impl Period {
    pub fn new(start: NaiveDateTime, finish: NaiveDateTime) -> Self {
        if finish < start {
            Self { start: finish, finish: start }
        } else {
            Self { start, finish }
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn finish(&self) -> NaiveDateTime {
        self.finish
    }

    pub fn is_instant(&self) -> bool {
        self.start == self.finish
    }

    /// Same truth table as SQL `OVERLAPS`. Periods that only touch do not overlap.
    pub fn overlaps(&self, other: &Period) -> bool {
        if self.start > other.start {
            self.start < other.finish
        } else if self.start < other.start {
            other.start < self.finish
        } else {
            true
        }
    }
}

/// `0001-01-01 00:00:00`, the timestamp placed in availability rows that have no
/// reservation attached.
pub fn zero_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Serializes a timestamp as milliseconds since the Unix epoch.
pub fn serialize_unix_millis<S: Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    value.and_utc().timestamp_millis().serialize(serializer)
}
