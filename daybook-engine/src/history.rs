use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::model::Task;

/// Immutable record of one closed day: when it ran and what got completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: Date,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
    pub tasks: Vec<Task>,
}

impl DayRecord {
    /// `started_at` is absent when the day ran in degraded mode and the
    /// start never reached the server; the date falls back to the end
    /// timestamp.
    pub fn new(
        started_at: Option<OffsetDateTime>,
        ended_at: OffsetDateTime,
        tasks: Vec<Task>,
    ) -> Self {
        let date = started_at.unwrap_or(ended_at).date();
        Self {
            date,
            started_at,
            ended_at,
            tasks,
        }
    }
}

/// Append-only archive of closed days. Records are never edited or
/// removed once written.
#[derive(Debug, Clone, Default)]
pub struct DayHistory {
    records: Vec<DayRecord>,
}

impl DayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<DayRecord>) -> Self {
        Self { records }
    }

    pub fn append(&mut self, record: DayRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
