use chrono::NaiveDate;
use serde::{Serialize, Deserialize};
use crate::mastery::{MasteryRecord, ReviewData};

/// How overdue a unit's review is. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    NotDue,
    DueToday,
    Overdue,
    LongOverdue,
}

impl Urgency {
    pub fn from_days_overdue(days: i64) -> Self {
        match days {
            d if d < 0 => Urgency::NotDue,
            0 => Urgency::DueToday,
            1..=2 => Urgency::Overdue,
            _ => Urgency::LongOverdue,
        }
    }

    /// 0 / 50 / 75 / 100 score shown to the UI.
    pub fn score(&self) -> u8 {
        match self {
            Urgency::NotDue => 0,
            Urgency::DueToday => 50,
            Urgency::Overdue => 75,
            Urgency::LongOverdue => 100,
        }
    }

    pub fn garden_state(&self) -> GardenState {
        match self {
            Urgency::NotDue => GardenState::Blooming,
            Urgency::DueToday => GardenState::NeedsWater,
            Urgency::Overdue => GardenState::Wilting,
            Urgency::LongOverdue => GardenState::Withered,
        }
    }
}

/// Flower shown next to a unit in the review garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GardenState {
    Blooming,
    NeedsWater,
    Wilting,
    Withered,
}

impl GardenState {
    pub fn emoji(&self) -> &'static str {
        match self {
            GardenState::Blooming => "🌸",
            GardenState::NeedsWater => "🌼",
            GardenState::Wilting => "🥀",
            GardenState::Withered => "🍂",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueUnit {
    pub unit_id: String,
    pub urgency: Urgency,
    pub mastery_level: u32,
    pub last_practiced: NaiveDate,
}

pub fn urgency(record: &MasteryRecord, today: NaiveDate) -> Urgency {
    Urgency::from_days_overdue(record.days_overdue(today))
}

/// Units whose review date has arrived, most urgent first.
/// Equal urgency is ordered by unit id so the queue is stable between calls.
pub fn due_units(data: &ReviewData, today: NaiveDate) -> Vec<DueUnit> {
    let mut due: Vec<DueUnit> = data
        .iter()
        .filter(|(_, record)| record.is_due(today))
        .map(|(unit_id, record)| DueUnit {
            unit_id: unit_id.clone(),
            urgency: urgency(record, today),
            mastery_level: record.mastery_level,
            last_practiced: record.last_practiced,
        })
        .collect();

    sort_by_urgency(&mut due, |d| (d.urgency, d.unit_id.as_str()));
    due
}

pub fn due_count(data: &ReviewData, today: NaiveDate) -> usize {
    data.values().filter(|r| r.is_due(today)).count()
}

/// Descending urgency, then ascending by the secondary key.
pub(crate) fn sort_by_urgency<T, F>(items: &mut [T], key: F)
where
    F: for<'a> Fn(&'a T) -> (Urgency, &'a str),
{
    items.sort_by(|a, b| {
        let (ua, ka) = key(a);
        let (ub, kb) = key(b);
        ub.cmp(&ua).then_with(|| ka.cmp(kb))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record_due(next_review: &str) -> MasteryRecord {
        let mut r = MasteryRecord::fresh(date("2023-12-01"));
        r.next_review = date(next_review);
        r
    }

    #[test]
    fn test_urgency_boundaries() {
        let r = record_due("2024-01-10");
        assert_eq!(urgency(&r, date("2024-01-09")).score(), 0);
        assert_eq!(urgency(&r, date("2024-01-10")).score(), 50);
        assert_eq!(urgency(&r, date("2024-01-11")).score(), 75);
        assert_eq!(urgency(&r, date("2024-01-12")).score(), 75);
        assert_eq!(urgency(&r, date("2024-01-13")).score(), 100);
        assert_eq!(urgency(&r, date("2025-01-13")).score(), 100);
    }

    #[test]
    fn test_garden_states() {
        assert_eq!(Urgency::NotDue.garden_state(), GardenState::Blooming);
        assert_eq!(Urgency::DueToday.garden_state(), GardenState::NeedsWater);
        assert_eq!(Urgency::Overdue.garden_state(), GardenState::Wilting);
        assert_eq!(Urgency::LongOverdue.garden_state().emoji(), "🍂");
    }

    #[test]
    fn test_due_units_sorted_and_filtered() {
        let mut data = ReviewData::new();
        data.insert("Б".into(), record_due("2024-01-10"));
        data.insert("А".into(), record_due("2024-01-10"));
        data.insert("В".into(), record_due("2024-01-01"));
        data.insert("Г".into(), record_due("2024-01-11"));
        data.insert("Д".into(), record_due("2024-01-09"));

        let due = due_units(&data, date("2024-01-10"));
        let order: Vec<(&str, u8)> = due.iter().map(|d| (d.unit_id.as_str(), d.urgency.score())).collect();
        assert_eq!(order, vec![("В", 100), ("Д", 75), ("А", 50), ("Б", 50)]);
        assert_eq!(due_count(&data, date("2024-01-10")), 4);
    }

    #[test]
    fn test_nothing_due() {
        let mut data = ReviewData::new();
        data.insert("А".into(), record_due("2024-02-01"));
        assert!(due_units(&data, date("2024-01-10")).is_empty());
        assert!(due_units(&ReviewData::new(), date("2024-01-10")).is_empty());
    }
}
