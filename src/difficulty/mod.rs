use chrono::NaiveDate;
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierKind {
    Easy,
    Medium,
    Hard,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Easy => "easy",
            TierKind::Medium => "medium",
            TierKind::Hard => "hard",
        }
    }
}

/// Session parameters the UI applies for a difficulty tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyTier {
    pub kind: TierKind,
    pub time_limit_seconds: u32,
    pub hints_enabled: bool,
    pub targets_per_session: u32,
    pub mistakes_allowed: u32,
}

/// Player's difficulty preference as stored in the profile (`difficultyLevel`).
/// Anything other than a known tier name reads as `Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DifficultyOverride {
    #[default]
    Auto,
    Pinned(TierKind),
}

impl From<String> for DifficultyOverride {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "easy" => DifficultyOverride::Pinned(TierKind::Easy),
            "medium" => DifficultyOverride::Pinned(TierKind::Medium),
            "hard" => DifficultyOverride::Pinned(TierKind::Hard),
            _ => DifficultyOverride::Auto,
        }
    }
}

impl From<DifficultyOverride> for String {
    fn from(value: DifficultyOverride) -> Self {
        match value {
            DifficultyOverride::Auto => "auto".to_string(),
            DifficultyOverride::Pinned(kind) => kind.as_str().to_string(),
        }
    }
}

/// One day of activity, aggregated from the profile's `stats` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceLogEntry {
    pub date: NaiveDate,
    pub tasks_completed: u32,
    pub stars_earned: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Number of most recent days considered
    pub window: usize,
    /// Success rate assumed when there is no usable history
    pub default_success_rate: f64,
    /// Average stars per task that counts as full success
    pub stars_per_task_target: f64,
    pub hard_threshold: f64,
    pub medium_threshold: f64,
    pub easy: DifficultyTier,
    pub medium: DifficultyTier,
    pub hard: DifficultyTier,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        DifficultyConfig {
            window: 5,
            default_success_rate: 0.7,
            stars_per_task_target: 3.0,
            hard_threshold: 0.85,
            medium_threshold: 0.65,
            easy: DifficultyTier {
                kind: TierKind::Easy,
                time_limit_seconds: 40,
                hints_enabled: true,
                targets_per_session: 5,
                mistakes_allowed: 4,
            },
            medium: DifficultyTier {
                kind: TierKind::Medium,
                time_limit_seconds: 25,
                hints_enabled: true,
                targets_per_session: 7,
                mistakes_allowed: 2,
            },
            hard: DifficultyTier {
                kind: TierKind::Hard,
                time_limit_seconds: 20,
                hints_enabled: false,
                targets_per_session: 10,
                mistakes_allowed: 1,
            },
        }
    }
}

impl DifficultyConfig {
    pub fn tier(&self, kind: TierKind) -> &DifficultyTier {
        match kind {
            TierKind::Easy => &self.easy,
            TierKind::Medium => &self.medium,
            TierKind::Hard => &self.hard,
        }
    }

    /// Estimated success rate over the most recent `window` days.
    /// Entries may arrive in any order; the newest dates win.
    pub fn success_rate(&self, log: &[PerformanceLogEntry]) -> f64 {
        let mut recent: Vec<&PerformanceLogEntry> = log.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(self.window);

        if recent.is_empty() {
            return self.default_success_rate;
        }

        let total_tasks: u64 = recent.iter().map(|e| e.tasks_completed as u64).sum();
        let total_stars: u64 = recent.iter().map(|e| e.stars_earned as u64).sum();

        if total_tasks == 0 || self.stars_per_task_target <= 0.0 {
            return self.default_success_rate;
        }

        let avg_stars_per_task = total_stars as f64 / total_tasks as f64;
        (avg_stars_per_task / self.stars_per_task_target).min(1.0)
    }

    /// Pick the tier for the next session. A pinned override always wins.
    pub fn recommend(
        &self,
        log: &[PerformanceLogEntry],
        manual_override: DifficultyOverride,
    ) -> DifficultyTier {
        if let DifficultyOverride::Pinned(kind) = manual_override {
            return self.tier(kind).clone();
        }

        let success_rate = self.success_rate(log);
        let kind = if success_rate >= self.hard_threshold {
            TierKind::Hard
        } else if success_rate >= self.medium_threshold {
            TierKind::Medium
        } else {
            TierKind::Easy
        };

        tracing::debug!(
            success_rate = success_rate,
            days = log.len().min(self.window),
            tier = kind.as_str(),
            "Recommended difficulty tier"
        );

        self.tier(kind).clone()
    }
}
