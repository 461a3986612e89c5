use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use crate::difficulty::{DifficultyOverride, PerformanceLogEntry};
use crate::mastery::ReviewData;

/// Per-day activity counters stored under `stats["YYYY-MM-DD"]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    #[serde(default, deserialize_with = "lenient")]
    pub tasks: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub stars: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IslandProgress {
    #[serde(default, deserialize_with = "lenient")]
    pub unlocked: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub letters: BTreeMap<String, bool>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub review_data: ReviewData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default, deserialize_with = "lenient_map")]
    pub islands: BTreeMap<String, IslandProgress>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The persisted player document. Fields the engine does not model are kept
/// in `extra` so a whole-document save never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    #[serde(default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub character: String,
    #[serde(default, deserialize_with = "lenient")]
    pub stars: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub total_stars: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub progress: Progress,
    #[serde(default, deserialize_with = "lenient_map")]
    pub stats: BTreeMap<String, DayStats>,
    #[serde(default, deserialize_with = "lenient")]
    pub difficulty_level: DifficultyOverride,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlayerProfile {
    pub fn new<S: Into<String>>(id: S, name: S, character: S, created_at: S) -> Self {
        let mut progress = Progress::default();
        progress.islands.insert(
            "1".to_string(),
            IslandProgress {
                unlocked: true,
                ..IslandProgress::default()
            },
        );
        PlayerProfile {
            id: id.into(),
            name: name.into(),
            character: character.into(),
            created_at: created_at.into(),
            progress,
            ..PlayerProfile::default()
        }
    }

    /// Island progress, created unlocked on first touch.
    pub fn island_mut(&mut self, island: &str) -> &mut IslandProgress {
        self.progress
            .islands
            .entry(island.to_string())
            .or_insert_with(|| IslandProgress {
                unlocked: true,
                ..IslandProgress::default()
            })
    }

    /// Daily stats as a performance log. Keys that are not dates are skipped.
    pub fn performance_log(&self) -> Vec<PerformanceLogEntry> {
        self.stats
            .iter()
            .filter_map(|(day, stats)| {
                let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
                Some(PerformanceLogEntry {
                    date,
                    tasks_completed: stats.tasks,
                    stars_earned: stats.stars,
                })
            })
            .collect()
    }

    /// Count one finished activity for `today` and bank its stars.
    pub fn record_day(&mut self, today: NaiveDate, stars: u32) -> &DayStats {
        self.stars = self.stars.saturating_add(stars);
        self.total_stars = self.total_stars.saturating_add(stars);
        let day = self.stats.entry(today.format("%Y-%m-%d").to_string()).or_default();
        day.tasks = day.tasks.saturating_add(1);
        day.stars = day.stars.saturating_add(stars);
        day
    }
}

/// Deserialize `T`, substituting the default for anything malformed or null.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    match serde_json::from_value(value) {
        Ok(v) => Ok(v),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed profile field, using default");
            Ok(T::default())
        }
    }
}

/// Deserialize a string-keyed map, dropping entries that do not parse.
fn lenient_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        if !value.is_null() {
            tracing::warn!("Profile map field is not an object, using empty map");
        }
        return Ok(BTreeMap::new());
    };

    let mut out = BTreeMap::new();
    for (key, entry) in entries {
        match serde_json::from_value::<T>(entry) {
            Ok(v) => {
                out.insert(key, v);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping malformed profile entry");
            }
        }
    }
    Ok(out)
}
