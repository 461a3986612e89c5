use chrono::NaiveDate;
use crate::mastery::model::{add_days, review_interval, LearningUnit, MasteryRecord, ReviewData};

/// Applies answer outcomes to review data using a fixed interval ladder.
#[derive(Debug, Clone)]
pub struct MasteryTracker {
    intervals: Vec<u32>,
}

impl MasteryTracker {
    pub fn new(intervals: Vec<u32>) -> Self {
        let intervals = if intervals.is_empty() {
            tracing::warn!("Empty review interval table, using a single 1-day interval");
            vec![1]
        } else {
            intervals
        };
        MasteryTracker { intervals }
    }

    pub fn intervals(&self) -> &[u32] {
        &self.intervals
    }

    /// Highest reachable mastery level (L - 1).
    pub fn max_level(&self) -> u32 {
        self.intervals.len().saturating_sub(1) as u32
    }

    /// Record one attempt at `unit`. Only a success moves mastery forward;
    /// a miss counts the attempt and leaves the schedule alone.
    pub fn record_outcome(
        &self,
        data: &mut ReviewData,
        unit: &LearningUnit,
        succeeded: bool,
        today: NaiveDate,
    ) -> MasteryRecord {
        let record = data
            .entry(unit.unit_id.clone())
            .or_insert_with(|| MasteryRecord::fresh(today));

        record.total_attempts = record.total_attempts.saturating_add(1);

        if succeeded {
            record.review_count = record.review_count.saturating_add(1);
            record.success_count = record.success_count.saturating_add(1);
            record.mastery_level = record.mastery_level.saturating_add(1).min(self.max_level());
            record.last_practiced = today;
            record.next_review = add_days(
                today,
                review_interval(&self.intervals, record.mastery_level),
            );

            tracing::debug!(
                unit = %unit.unit_id,
                category = ?unit.category,
                mastery_level = record.mastery_level,
                next_review = %record.next_review,
                "Mastery advanced"
            );
        } else {
            tracing::debug!(
                unit = %unit.unit_id,
                total_attempts = record.total_attempts,
                "Attempt recorded without mastery change"
            );
        }

        record.clone()
    }

    /// Clamp stored levels into the current ladder. Used after loading data
    /// written with a longer interval table.
    pub fn normalize(&self, data: &mut ReviewData) {
        let max = self.max_level();
        for (unit_id, record) in data.iter_mut() {
            if record.mastery_level > max {
                tracing::warn!(
                    unit = %unit_id,
                    mastery_level = record.mastery_level,
                    max_level = max,
                    "Clamping out-of-range mastery level"
                );
                record.mastery_level = max;
            }
            if record.next_review < record.last_practiced {
                record.next_review = record.last_practiced;
            }
        }
    }
}

/// Units at or above `min_level`.
pub fn mastered_count(data: &ReviewData, min_level: u32) -> usize {
    data.values().filter(|r| r.mastery_level >= min_level).count()
}

/// Units whose last successful practice fell on `date`. Records that only
/// hold misses are not counted.
pub fn practiced_on(data: &ReviewData, date: NaiveDate) -> usize {
    data.values()
        .filter(|r| r.review_count > 0 && r.last_practiced == date)
        .count()
}

/// Units below `below_level`, weakest first, ties by unit id.
pub fn struggling(data: &ReviewData, below_level: u32, limit: usize) -> Vec<(String, MasteryRecord)> {
    let mut weak: Vec<(String, MasteryRecord)> = data
        .iter()
        .filter(|(_, r)| r.mastery_level < below_level)
        .map(|(k, r)| (k.clone(), r.clone()))
        .collect();
    weak.sort_by(|a, b| a.1.mastery_level.cmp(&b.1.mastery_level).then_with(|| a.0.cmp(&b.0)));
    weak.truncate(limit);
    weak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tracker() -> MasteryTracker {
        MasteryTracker::new(vec![1, 3, 7, 14, 30])
    }

    #[test]
    fn test_first_success_creates_record() {
        let mut data = ReviewData::new();
        let record = tracker().record_outcome(&mut data, &LearningUnit::letter("М"), true, date("2024-01-01"));

        assert_eq!(record.mastery_level, 1);
        assert_eq!(record.review_count, 1);
        assert_eq!(record.success_count, 1);
        assert_eq!(record.total_attempts, 1);
        assert_eq!(record.last_practiced, date("2024-01-01"));
        assert_eq!(record.next_review, date("2024-01-04"));
        assert_eq!(data.get("М"), Some(&record));
    }

    #[test]
    fn test_failure_only_counts_attempt() {
        let t = tracker();
        let mut data = ReviewData::new();
        let unit = LearningUnit::letter("А");
        let before = t.record_outcome(&mut data, &unit, true, date("2024-01-01"));
        let after = t.record_outcome(&mut data, &unit, false, date("2024-01-02"));

        assert_eq!(after.mastery_level, before.mastery_level);
        assert_eq!(after.success_count, before.success_count);
        assert_eq!(after.review_count, before.review_count);
        assert_eq!(after.next_review, before.next_review);
        assert_eq!(after.last_practiced, before.last_practiced);
        assert_eq!(after.total_attempts, 2);
    }

    #[test]
    fn test_failure_on_unknown_unit_is_due_today() {
        let mut data = ReviewData::new();
        let record = tracker().record_outcome(&mut data, &LearningUnit::syllable("МА"), false, date("2024-02-10"));
        assert_eq!(record.mastery_level, 0);
        assert_eq!(record.total_attempts, 1);
        assert_eq!(record.success_count, 0);
        assert!(record.is_due(date("2024-02-10")));
    }

    #[test]
    fn test_level_caps_at_top_of_ladder() {
        let t = tracker();
        let mut data = ReviewData::new();
        let unit = LearningUnit::letter("О");
        let mut today = date("2024-01-01");
        let mut last = None;
        for _ in 0..8 {
            let r = t.record_outcome(&mut data, &unit, true, today);
            today = r.next_review;
            last = Some(r);
        }
        let last = last.unwrap();
        assert_eq!(last.mastery_level, 4);
        assert_eq!((last.next_review - last.last_practiced).num_days(), 30);
        assert_eq!(last.success_count, 8);
    }

    #[test]
    fn test_same_day_calls_still_count() {
        let t = tracker();
        let mut data = ReviewData::new();
        let unit = LearningUnit::letter("У");
        t.record_outcome(&mut data, &unit, true, date("2024-01-01"));
        let r = t.record_outcome(&mut data, &unit, true, date("2024-01-01"));
        assert_eq!(r.total_attempts, 2);
        assert_eq!(r.mastery_level, 2);
        assert_eq!(r.next_review, date("2024-01-08"));
    }

    #[test]
    fn test_normalize_clamps_levels() {
        let t = tracker();
        let mut data = ReviewData::new();
        let mut r = MasteryRecord::fresh(date("2024-01-05"));
        r.mastery_level = 12;
        r.next_review = date("2024-01-01");
        data.insert("Ы".into(), r);
        t.normalize(&mut data);
        let r = &data["Ы"];
        assert_eq!(r.mastery_level, 4);
        assert_eq!(r.next_review, r.last_practiced);
    }

    #[test]
    fn test_read_side_helpers() {
        let t = tracker();
        let mut data = ReviewData::new();
        let d1 = date("2024-01-01");
        let d2 = date("2024-01-02");
        for _ in 0..3 {
            t.record_outcome(&mut data, &LearningUnit::letter("А"), true, d1);
        }
        t.record_outcome(&mut data, &LearningUnit::letter("Б"), true, d2);
        t.record_outcome(&mut data, &LearningUnit::letter("В"), false, d2);

        assert_eq!(mastered_count(&data, 2), 1);
        assert_eq!(practiced_on(&data, d1), 1);
        // В only has a miss on d2
        assert_eq!(practiced_on(&data, d2), 1);

        let weak = struggling(&data, 3, 10);
        let ids: Vec<&str> = weak.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["В", "Б"]);
        assert_eq!(struggling(&data, 3, 1).len(), 1);
    }

    #[test]
    fn test_stored_level_at_u32_max_does_not_overflow() {
        let t = tracker();
        let mut data: ReviewData = serde_json::from_str(
            r#"{"Я":{"masteryLevel":4294967295,"lastPracticed":"2024-01-01","nextReview":"2024-01-02"}}"#,
        ).unwrap();

        let r = t.record_outcome(&mut data, &LearningUnit::letter("Я"), true, date("2024-01-03"));
        assert_eq!(r.mastery_level, 4);
        assert_eq!(r.next_review, date("2024-02-02"));
    }
}
