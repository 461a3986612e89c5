use chrono::{Days, NaiveDate};
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitCategory {
    Letter,
    Syllable,
    OperationType,
}

/// Something a player learns: a letter, a syllable or an operation type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningUnit {
    pub unit_id: String,
    pub category: UnitCategory,
}

impl LearningUnit {
    pub fn new<S: Into<String>>(unit_id: S, category: UnitCategory) -> Self {
        LearningUnit {
            unit_id: unit_id.into(),
            category,
        }
    }

    pub fn letter<S: Into<String>>(unit_id: S) -> Self {
        Self::new(unit_id, UnitCategory::Letter)
    }

    pub fn syllable<S: Into<String>>(unit_id: S) -> Self {
        Self::new(unit_id, UnitCategory::Syllable)
    }

    pub fn operation<S: Into<String>>(unit_id: S) -> Self {
        Self::new(unit_id, UnitCategory::OperationType)
    }
}

/// Spaced repetition state for one unit, stored in the profile's `reviewData`.
///
/// Stored records may lack their dates. Such a record keeps its level and
/// counters, is never due (`next_review` reads as `NaiveDate::MAX`) and is
/// written back without the missing dates until its next success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub struct MasteryRecord {
    pub mastery_level: u32,
    pub review_count: u32,
    pub success_count: u32,
    pub total_attempts: u32,
    pub last_practiced: NaiveDate,
    pub next_review: NaiveDate,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// On-disk shape of a record. Dates that are absent or unparseable read as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(default)]
    mastery_level: u32,
    #[serde(default)]
    review_count: u32,
    #[serde(default)]
    success_count: u32,
    #[serde(default)]
    total_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_practiced: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_review: Option<serde_json::Value>,
}

fn parse_date(value: Option<&serde_json::Value>) -> Option<NaiveDate> {
    let text = value?.as_str()?;
    NaiveDate::parse_from_str(text.get(..10).unwrap_or(text), DATE_FORMAT).ok()
}

impl From<StoredRecord> for MasteryRecord {
    fn from(stored: StoredRecord) -> Self {
        let next = parse_date(stored.next_review.as_ref());
        let last = parse_date(stored.last_practiced.as_ref());
        if next.is_none() {
            tracing::warn!(
                mastery_level = stored.mastery_level,
                "Mastery record without a review date, keeping it as not due"
            );
        }
        MasteryRecord {
            mastery_level: stored.mastery_level,
            review_count: stored.review_count,
            success_count: stored.success_count,
            total_attempts: stored.total_attempts,
            last_practiced: last.or(next).unwrap_or(NaiveDate::MIN),
            next_review: next.unwrap_or(NaiveDate::MAX),
        }
    }
}

impl From<MasteryRecord> for StoredRecord {
    fn from(record: MasteryRecord) -> Self {
        let date = |d: NaiveDate| {
            (d != NaiveDate::MIN && d != NaiveDate::MAX)
                .then(|| serde_json::Value::String(d.format(DATE_FORMAT).to_string()))
        };
        StoredRecord {
            mastery_level: record.mastery_level,
            review_count: record.review_count,
            success_count: record.success_count,
            total_attempts: record.total_attempts,
            last_practiced: date(record.last_practiced),
            next_review: date(record.next_review),
        }
    }
}

impl MasteryRecord {
    /// A record that has never been reviewed; due on `today`.
    pub fn fresh(today: NaiveDate) -> Self {
        MasteryRecord {
            mastery_level: 0,
            review_count: 0,
            success_count: 0,
            total_attempts: 0,
            last_practiced: today,
            next_review: today,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today
    }

    /// Whole days since `next_review`; negative when not yet due.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.next_review).num_days()
    }

    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.success_count as f64 / self.total_attempts as f64
    }
}

/// Unit id -> mastery record, as nested under an island in the profile.
pub type ReviewData = BTreeMap<String, MasteryRecord>;

/// Days until the next review for a mastery level.
/// Levels past the end of the table use the last interval.
pub fn review_interval(intervals: &[u32], mastery_level: u32) -> u32 {
    let last = intervals.len().saturating_sub(1);
    let idx = (mastery_level as usize).min(last);
    intervals.get(idx).copied().unwrap_or(1)
}

pub fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(days as u64))
        .unwrap_or(NaiveDate::MAX)
}
