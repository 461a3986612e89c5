pub mod analytics;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod logging;
pub mod mastery;
pub mod metrics;
pub mod profile;
pub mod review;
pub mod session;
pub mod tasks;
pub mod weak;

pub use analytics::{ChallengeKind, DailyChallenge, DayStreak, ProgressReport};
pub use config::{load_config, EngineConfig};
pub use difficulty::{DifficultyConfig, DifficultyOverride, DifficultyTier, PerformanceLogEntry, TierKind};
pub use error::EngineError;
pub use mastery::{LearningUnit, MasteryRecord, MasteryTracker, ReviewData, UnitCategory};
pub use metrics::SessionCounters;
pub use profile::{FileProfileStore, HttpProfileStore, PlayerProfile, ProfileStore};
pub use review::{due_units, urgency, DueUnit, GardenState, Urgency};
pub use session::{AnswerOutcome, PlaySession, ReviewItem};
pub use tasks::{Answer, StageChange, Task, TaskArchetype, TaskGenerator, TaskKind};
pub use weak::{SessionWeakTopics, WeakTopicMap, WeakTopicSampler};

/// Today's calendar date in the local timezone. Engine calls take the date
/// as a parameter; this is the usual source for it.
pub fn today_local() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
