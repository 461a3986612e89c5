use serde::{Serialize, Deserialize};
use crate::tasks::task::TaskArchetype;

/// One row of the learning stage table: number range and allowed archetypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub min: i32,
    pub max: i32,
    pub archetypes: Vec<TaskArchetype>,
}

impl StageConfig {
    fn new(name: &str, min: i32, max: i32, archetypes: &[TaskArchetype]) -> Self {
        StageConfig {
            name: name.to_string(),
            min,
            max,
            archetypes: archetypes.to_vec(),
        }
    }

    /// Stage table used by the racing game.
    pub fn default_table() -> Vec<StageConfig> {
        use TaskArchetype::*;
        vec![
            StageConfig::new("count_to_3", 1, 3, &[Count]),
            StageConfig::new("compare", 1, 5, &[Count, Compare, Bigger, Smaller]),
            StageConfig::new("sequences", 1, 10, &[Count, Compare, Bigger, Smaller, Sequence]),
            StageConfig::new("add_subtract", 1, 10, &[Count, Compare, Sequence, AddSub]),
        ]
    }

    pub fn values(&self) -> Vec<i32> {
        (self.min..=self.max).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageChange {
    Advanced { from: u8, to: u8 },
    Regressed { from: u8, to: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakThresholds {
    /// Streak that moves the player up a stage
    pub advance_at: i32,
    /// Magnitude of the losing streak that moves the player down (also the floor)
    pub regress_at: i32,
}

impl Default for StreakThresholds {
    fn default() -> Self {
        StreakThresholds {
            advance_at: 4,
            regress_at: 3,
        }
    }
}

/// Learning stage hysteresis driven by a signed answer streak.
/// Every stage change resets the streak, so one run moves one stage.
#[derive(Debug, Clone)]
pub struct StageTracker {
    stage: u8,
    max_stage: u8,
    streak: i32,
    best_streak: u32,
    thresholds: StreakThresholds,
}

impl StageTracker {
    pub fn new(start: u8, max_stage: u8, thresholds: StreakThresholds) -> Self {
        let max_stage = max_stage.max(1);
        StageTracker {
            stage: start.clamp(1, max_stage),
            max_stage,
            streak: 0,
            best_streak: 0,
            thresholds,
        }
    }

    pub fn stage(&self) -> u8 {
        self.stage
    }

    pub fn streak(&self) -> i32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn record(&mut self, correct: bool) -> Option<StageChange> {
        let from = self.stage;

        if correct {
            self.streak += 1;
            if self.streak > 0 {
                self.best_streak = self.best_streak.max(self.streak as u32);
            }
            if self.streak >= self.thresholds.advance_at && self.stage < self.max_stage {
                self.stage += 1;
                self.streak = 0;
                tracing::info!(from = from, to = self.stage, "Learning stage advanced");
                return Some(StageChange::Advanced { from, to: self.stage });
            }
        } else {
            self.streak = (self.streak - 1).max(-self.thresholds.regress_at);
            if self.streak <= -self.thresholds.regress_at && self.stage > 1 {
                self.stage -= 1;
                self.streak = 0;
                tracing::info!(from = from, to = self.stage, "Learning stage regressed");
                return Some(StageChange::Regressed { from, to: self.stage });
            }
        }

        None
    }
}
