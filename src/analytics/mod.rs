use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::config::EngineConfig;
use crate::difficulty::{DifficultyTier, PerformanceLogEntry};
use crate::mastery::tracker::{mastered_count, practiced_on, struggling};
use crate::mastery::MasteryRecord;
use crate::profile::PlayerProfile;
use crate::review::due_count;

const STRUGGLING_LIMIT: usize = 10;
const RECENT_DAYS: usize = 7;
const LETTERS_CHALLENGE_TARGET: u32 = 3;
const STARS_CHALLENGE_TARGET: u32 = 15;
const CHALLENGE_REWARD: u32 = 5;

/// Consecutive active days. A day is active when its stats hold any tasks or stars.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayStreak {
    /// Zero unless the last active day is today or yesterday
    pub current: u32,
    pub longest: u32,
    pub last_active: Option<NaiveDate>,
}

impl DayStreak {
    pub fn compute(log: &[PerformanceLogEntry], today: NaiveDate) -> Self {
        let mut days: Vec<NaiveDate> = log
            .iter()
            .filter(|e| e.tasks_completed > 0 || e.stars_earned > 0)
            .map(|e| e.date)
            .collect();
        days.sort_unstable();
        days.dedup();

        let Some(&last) = days.last() else {
            return DayStreak::default();
        };

        let mut longest = 1;
        let mut run = 1;
        for pair in days.windows(2) {
            if pair[0].succ_opt() == Some(pair[1]) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 1;
            }
        }

        let recent = last == today || last.succ_opt() == Some(today);
        DayStreak {
            current: if recent { run } else { 0 },
            longest,
            last_active: Some(last),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChallengeKind {
    /// Distinct units successfully practiced today
    PracticeLetters,
    EarnStars,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub kind: ChallengeKind,
    /// Capped at `target`
    pub current: u32,
    pub target: u32,
    pub reward: u32,
    pub completed: bool,
}

impl DailyChallenge {
    fn new(kind: ChallengeKind, progress: u32, target: u32) -> Self {
        DailyChallenge {
            kind,
            current: progress.min(target),
            target,
            reward: CHALLENGE_REWARD,
            completed: progress >= target,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrugglingUnit {
    pub island: String,
    pub unit_id: String,
    pub mastery_level: u32,
    pub accuracy: f64,
}

/// Parent-facing summary of one profile.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub stars: u32,
    pub total_stars: u32,
    pub letters_learned: usize,
    pub units_tracked: usize,
    pub needs_review: usize,
    pub mastered: usize,
    pub practiced_today: usize,
    pub struggling: Vec<StrugglingUnit>,
    /// Newest first
    pub recent_days: Vec<PerformanceLogEntry>,
    pub success_rate: f64,
    pub tier: DifficultyTier,
    pub streak: DayStreak,
    pub challenges: Vec<DailyChallenge>,
}

impl ProgressReport {
    pub fn compute(profile: &PlayerProfile, config: &EngineConfig, today: NaiveDate) -> Self {
        let mut letters_learned = 0;
        let mut units_tracked = 0;
        let mut needs_review = 0;
        let mut mastered = 0;
        let mut practiced_today = 0;
        let mut weak: Vec<(String, String, MasteryRecord)> = Vec::new();

        for (island, progress) in &profile.progress.islands {
            let data = &progress.review_data;
            letters_learned += progress.letters.values().filter(|learned| **learned).count();
            units_tracked += data.len();
            needs_review += due_count(data, today);
            mastered += mastered_count(data, config.mastered_level);
            practiced_today += practiced_on(data, today);
            weak.extend(
                struggling(data, config.struggling_below_level, STRUGGLING_LIMIT)
                    .into_iter()
                    .map(|(unit, record)| (island.clone(), unit, record)),
            );
        }

        weak.sort_by(|a, b| {
            a.2.mastery_level
                .cmp(&b.2.mastery_level)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.0.cmp(&b.0))
        });
        weak.truncate(STRUGGLING_LIMIT);

        let mut recent_days = profile.performance_log();
        recent_days.sort_by(|a, b| b.date.cmp(&a.date));
        recent_days.truncate(RECENT_DAYS);

        let log = profile.performance_log();
        let stars_today = profile
            .stats
            .get(&today.format("%Y-%m-%d").to_string())
            .map_or(0, |day| day.stars);
        let letters_today = u32::try_from(practiced_today).unwrap_or(u32::MAX);
        let report = ProgressReport {
            stars: profile.stars,
            total_stars: profile.total_stars,
            letters_learned,
            units_tracked,
            needs_review,
            mastered,
            practiced_today,
            struggling: weak
                .into_iter()
                .map(|(island, unit_id, record)| StrugglingUnit {
                    accuracy: record.accuracy(),
                    mastery_level: record.mastery_level,
                    island,
                    unit_id,
                })
                .collect(),
            recent_days,
            success_rate: config.difficulty.success_rate(&log),
            tier: config.difficulty.recommend(&log, profile.difficulty_level),
            streak: DayStreak::compute(&log, today),
            challenges: vec![
                DailyChallenge::new(ChallengeKind::PracticeLetters, letters_today, LETTERS_CHALLENGE_TARGET),
                DailyChallenge::new(ChallengeKind::EarnStars, stars_today, STARS_CHALLENGE_TARGET),
            ],
        };

        tracing::debug!(
            profile_id = %profile.id,
            units_tracked = report.units_tracked,
            needs_review = report.needs_review,
            "Computed progress report"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::TierKind;
    use crate::mastery::{LearningUnit, MasteryTracker};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_report_aggregates_across_islands() {
        let config = EngineConfig::default();
        let tracker = MasteryTracker::new(config.review_intervals.clone());
        let mut profile = PlayerProfile::new("p1", "Маша", "fox", "now");

        let d1 = date("2024-01-01");
        let d2 = date("2024-01-02");
        {
            let island = profile.island_mut("1");
            island.letters.insert("А".into(), true);
            island.letters.insert("Б".into(), false);
            tracker.record_outcome(&mut island.review_data, &LearningUnit::letter("А"), true, d1);
            tracker.record_outcome(&mut island.review_data, &LearningUnit::letter("А"), true, d2);
            tracker.record_outcome(&mut island.review_data, &LearningUnit::letter("Б"), false, d1);
        }
        {
            let island = profile.island_mut("2");
            island.letters.insert("М".into(), true);
            for _ in 0..3 {
                tracker.record_outcome(&mut island.review_data, &LearningUnit::letter("М"), true, d2);
            }
        }
        profile.record_day(d1, 1);
        profile.record_day(d2, 2);

        let report = ProgressReport::compute(&profile, &config, d2);
        assert_eq!(report.letters_learned, 2);
        assert_eq!(report.units_tracked, 3);
        assert_eq!(report.mastered, 2);
        assert_eq!(report.practiced_today, 2);
        // Б was created by a miss on d1 and is the only unit due on d2
        assert_eq!(report.needs_review, 1);

        let ids: Vec<_> = report.struggling.iter().map(|s| s.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["Б", "А"]);
        assert_eq!(report.struggling[0].accuracy, 0.0);

        assert_eq!(report.recent_days[0].date, d2);
        assert_eq!(report.stars, 3);
        assert!((report.success_rate - 0.5).abs() < 1e-9);
        assert_eq!(report.tier.kind, TierKind::Easy);
    }

    #[test]
    fn test_empty_profile_report() {
        let config = EngineConfig::default();
        let profile = PlayerProfile::default();
        let report = ProgressReport::compute(&profile, &config, date("2024-01-01"));
        assert_eq!(report.units_tracked, 0);
        assert!(report.struggling.is_empty());
        assert!(report.recent_days.is_empty());
        assert_eq!(report.success_rate, 0.7);
        assert_eq!(report.tier.kind, TierKind::Medium);
        assert_eq!(report.streak, DayStreak::default());
        assert!(report.challenges.iter().all(|c| c.current == 0 && !c.completed));
    }

    fn active(days: &[&str]) -> Vec<PerformanceLogEntry> {
        days.iter()
            .map(|d| PerformanceLogEntry { date: date(d), tasks_completed: 1, stars_earned: 1 })
            .collect()
    }

    #[test]
    fn test_streak_breaks_on_gap() {
        let log = active(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-05", "2024-01-06"]);
        let streak = DayStreak::compute(&log, date("2024-01-06"));
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 3);
        assert_eq!(streak.last_active, Some(date("2024-01-06")));
    }

    #[test]
    fn test_streak_ending_yesterday_still_counts() {
        let log = active(&["2024-01-04", "2024-01-05"]);
        assert_eq!(DayStreak::compute(&log, date("2024-01-06")).current, 2);

        // two days idle ends it, the longest run stays
        let streak = DayStreak::compute(&log, date("2024-01-07"));
        assert_eq!(streak.current, 0);
        assert_eq!(streak.longest, 2);
    }

    #[test]
    fn test_idle_days_do_not_extend_streak() {
        let mut log = active(&["2024-01-01", "2024-01-03"]);
        log.push(PerformanceLogEntry { date: date("2024-01-02"), tasks_completed: 0, stars_earned: 0 });
        let streak = DayStreak::compute(&log, date("2024-01-03"));
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 1);
    }

    #[test]
    fn test_daily_challenges_progress() {
        let config = EngineConfig::default();
        let tracker = MasteryTracker::new(config.review_intervals.clone());
        let mut profile = PlayerProfile::new("p1", "Маша", "fox", "now");
        let today = date("2024-03-10");
        {
            let island = profile.island_mut("1");
            for letter in ["А", "М", "Л"] {
                tracker.record_outcome(&mut island.review_data, &LearningUnit::letter(letter), true, today);
            }
            tracker.record_outcome(&mut island.review_data, &LearningUnit::letter("Р"), true, today);
            tracker.record_outcome(&mut island.review_data, &LearningUnit::letter("С"), false, today);
        }
        profile.record_day(today, 9);

        let report = ProgressReport::compute(&profile, &config, today);
        let letters = &report.challenges[0];
        assert_eq!(letters.kind, ChallengeKind::PracticeLetters);
        assert_eq!(letters.current, 3);
        assert!(letters.completed);

        let stars = &report.challenges[1];
        assert_eq!(stars.kind, ChallengeKind::EarnStars);
        assert_eq!(stars.current, 9);
        assert!(!stars.completed);
        assert_eq!(report.streak.current, 1);
    }

    #[test]
    fn test_recent_days_capped_at_a_week() {
        let config = EngineConfig::default();
        let mut profile = PlayerProfile::default();
        for day in 1..=10 {
            profile.record_day(date(&format!("2024-01-{:02}", day)), 1);
        }
        let report = ProgressReport::compute(&profile, &config, date("2024-01-10"));
        assert_eq!(report.recent_days.len(), 7);
        assert_eq!(report.recent_days[0].date, date("2024-01-10"));
        assert_eq!(report.recent_days[6].date, date("2024-01-04"));
    }
}
