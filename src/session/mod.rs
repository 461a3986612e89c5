use chrono::NaiveDate;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use crate::config::EngineConfig;
use crate::difficulty::{DifficultyOverride, DifficultyTier};
use crate::error::EngineError;
use crate::mastery::{LearningUnit, MasteryRecord, MasteryTracker};
use crate::metrics::SessionCounters;
use crate::profile::{DayStats, PlayerProfile, ProfileStore};
use crate::review::{due_units, sort_by_urgency, Urgency};
use crate::tasks::{Answer, StageChange, StageTracker, Task, TaskContext, TaskGenerator};
use crate::weak::{SessionWeakTopics, WeakTopicSampler};

/// Result of checking one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub correct: bool,
    pub stage: u8,
    pub streak: i32,
    pub stage_change: Option<StageChange>,
}

/// One entry of the cross-island review queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub island: String,
    pub unit_id: String,
    pub urgency: Urgency,
    pub mastery_level: u32,
}

/// One player's sitting. Owns the profile in memory and pushes snapshots to
/// the store in the background after every change.
pub struct PlaySession<S: ProfileStore> {
    store: Arc<S>,
    config: Arc<EngineConfig>,
    profile: Arc<RwLock<PlayerProfile>>,
    tracker: MasteryTracker,
    generator: TaskGenerator,
    stages: StageTracker,
    weak: SessionWeakTopics,
    counters: SessionCounters,
    pending: Vec<JoinHandle<()>>,
    save_seq: u64,
    // highest snapshot sequence already written
    written_seq: Arc<Mutex<u64>>,
}

impl<S: ProfileStore> PlaySession<S> {
    pub fn new(store: Arc<S>, mut profile: PlayerProfile, config: Arc<EngineConfig>) -> Self {
        let tracker = MasteryTracker::new(config.review_intervals.clone());
        for island in profile.progress.islands.values_mut() {
            tracker.normalize(&mut island.review_data);
        }

        let generator = TaskGenerator::new(
            config.stages.clone(),
            WeakTopicSampler::new(config.weak_topic_probability),
            config.add_sub_max_attempts,
        );
        let stages = StageTracker::new(1, generator.stage_count(), config.streaks);

        tracing::info!(profile_id = %profile.id, "Play session started");

        PlaySession {
            store,
            config,
            profile: Arc::new(RwLock::new(profile)),
            tracker,
            generator,
            stages,
            weak: SessionWeakTopics::new(),
            counters: SessionCounters::new(),
            pending: Vec::new(),
            save_seq: 0,
            written_seq: Arc::new(Mutex::new(0)),
        }
    }

    /// Load `profile_id` from the store and start a session on it.
    pub async fn open(store: Arc<S>, profile_id: &str, config: Arc<EngineConfig>) -> Result<Self, EngineError> {
        let profile = store.load_profile(profile_id).await?;
        Ok(Self::new(store, profile, config))
    }

    pub fn profile(&self) -> PlayerProfile {
        self.profile.read().clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.counters
    }

    pub fn weak_topics(&self) -> &SessionWeakTopics {
        &self.weak
    }

    pub fn stage(&self) -> u8 {
        self.stages.stage()
    }

    pub fn streak(&self) -> i32 {
        self.stages.streak()
    }

    pub fn best_streak(&self) -> u32 {
        self.stages.best_streak()
    }

    pub fn current_tier(&self) -> DifficultyTier {
        let profile = self.profile.read();
        self.config
            .difficulty
            .recommend(&profile.performance_log(), profile.difficulty_level)
    }

    pub fn set_difficulty_override(&mut self, value: DifficultyOverride) {
        self.profile.write().difficulty_level = value;
        tracing::info!(difficulty = %String::from(value), "Difficulty override changed");
        self.persist();
    }

    pub fn next_task<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Task {
        let tier = self.current_tier();
        let ctx = TaskContext {
            tier: &tier,
            weak: &self.weak,
        };
        let task = self.generator.generate(self.stages.stage(), &ctx, rng);
        self.counters.record_task();
        task
    }

    /// Check an answer, feed the streak and remember misses for this session.
    pub fn submit_answer(&mut self, task: &Task, answer: &Answer) -> AnswerOutcome {
        let correct = task.is_correct(answer);
        self.counters.record_answer(correct);
        if !correct {
            self.weak.record_miss(task);
        }

        let stage_change = self.stages.record(correct);
        if stage_change.is_some() {
            self.counters.record_stage_change();
        }

        AnswerOutcome {
            correct,
            stage: self.stages.stage(),
            streak: self.stages.streak(),
            stage_change,
        }
    }

    /// Record an attempt at a unit on `island` and persist.
    pub fn record_unit(&mut self, island: &str, unit: &LearningUnit, succeeded: bool, today: NaiveDate) -> MasteryRecord {
        let record = {
            let mut profile = self.profile.write();
            let progress = profile.island_mut(island);
            self.tracker.record_outcome(&mut progress.review_data, unit, succeeded, today)
        };
        self.persist();
        record
    }

    pub fn complete_unit(&mut self, island: &str, unit: &LearningUnit, today: NaiveDate) -> MasteryRecord {
        self.record_unit(island, unit, true, today)
    }

    /// Close out one activity: count it for today and bank its stars.
    pub fn finish_activity(&mut self, today: NaiveDate, stars: u32) -> DayStats {
        let day = self.profile.write().record_day(today, stars).clone();
        tracing::info!(date = %today, stars = stars, tasks_today = day.tasks, "Activity finished");
        self.persist();
        day
    }

    /// Due units across every unlocked island, most urgent first.
    pub fn due_review(&self, today: NaiveDate) -> Vec<ReviewItem> {
        let profile = self.profile.read();
        let mut items: Vec<ReviewItem> = profile
            .progress
            .islands
            .iter()
            .filter(|(_, progress)| progress.unlocked)
            .flat_map(|(island, progress)| {
                due_units(&progress.review_data, today)
                    .into_iter()
                    .map(move |due| ReviewItem {
                        island: island.clone(),
                        unit_id: due.unit_id,
                        urgency: due.urgency,
                        mastery_level: due.mastery_level,
                    })
            })
            .collect();

        sort_by_urgency(&mut items, |item| (item.urgency, item.unit_id.as_str()));
        items
    }

    /// Spawn a save of the current profile. Failures are logged and counted;
    /// the in-memory profile stays as it is.
    fn persist(&mut self) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No async runtime, profile change not persisted");
                self.counters.record_persist_failure();
                return;
            }
        };

        self.pending.retain(|h| !h.is_finished());
        self.save_seq += 1;
        let seq = self.save_seq;
        let snapshot = self.profile.read().clone();
        let store = Arc::clone(&self.store);
        let counters = self.counters.clone();
        let written_seq = Arc::clone(&self.written_seq);

        self.pending.push(handle.spawn(async move {
            let mut written = written_seq.lock().await;
            if *written > seq {
                tracing::debug!(seq = seq, "Skipping stale profile snapshot");
                return;
            }
            match store.save_profile(&snapshot).await {
                Ok(()) => {
                    *written = seq;
                    counters.record_save();
                }
                Err(e) => {
                    counters.record_persist_failure();
                    tracing::warn!(profile_id = %snapshot.id, error = %e, "Failed to persist profile");
                }
            }
        }));
    }

    /// Wait for background saves, then write the current profile once more.
    pub async fn flush(&mut self) -> Result<(), EngineError> {
        for handle in self.pending.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Background save task did not complete");
            }
        }

        self.save_seq += 1;
        let seq = self.save_seq;
        let snapshot = self.profile.read().clone();
        let mut written = self.written_seq.lock().await;
        match self.store.save_profile(&snapshot).await {
            Ok(()) => {
                *written = seq;
                self.counters.record_save();
                Ok(())
            }
            Err(e) => {
                self.counters.record_persist_failure();
                Err(e.with_context("flush"))
            }
        }
    }
}
