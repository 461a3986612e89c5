use rand::seq::SliceRandom;
use rand::Rng;
use crate::difficulty::DifficultyTier;
use crate::tasks::stage::StageConfig;
use crate::tasks::task::{Answer, Operation, Side, Task, TaskArchetype, TaskKind};
use crate::weak::{SessionWeakTopics, WeakTopicSampler};

const COUNT_ICONS: [&str; 8] = ["⭐", "🍎", "🚗", "🐸", "🌸", "⚽", "🍕", "🎈"];
const MAX_OPTIONS: usize = 3;

/// Inputs that shape a task beyond the stage: the current tier and the
/// session's miss history.
#[derive(Debug, Clone, Copy)]
pub struct TaskContext<'a> {
    pub tier: &'a DifficultyTier,
    pub weak: &'a SessionWeakTopics,
}

#[derive(Debug, Clone)]
pub struct TaskGenerator {
    stages: Vec<StageConfig>,
    sampler: WeakTopicSampler,
    add_sub_max_attempts: u32,
}

impl TaskGenerator {
    pub fn new(stages: Vec<StageConfig>, sampler: WeakTopicSampler, add_sub_max_attempts: u32) -> Self {
        let stages = if stages.is_empty() {
            tracing::warn!("Empty stage table, using the built-in one");
            StageConfig::default_table()
        } else {
            stages
        };
        TaskGenerator {
            stages,
            sampler,
            add_sub_max_attempts: add_sub_max_attempts.max(1),
        }
    }

    pub fn stage_count(&self) -> u8 {
        self.stages.len().min(u8::MAX as usize) as u8
    }

    /// Stage row for a 1-based stage; unknown stages read as stage 1.
    pub fn stage_config(&self, stage: u8) -> (u8, &StageConfig) {
        let idx = stage as usize;
        if idx >= 1 && idx <= self.stages.len() {
            return (stage, &self.stages[idx - 1]);
        }
        tracing::warn!(stage = stage, "Invalid learning stage, defaulting to 1");
        (1, &self.stages[0])
    }

    pub fn generate<R: Rng + ?Sized>(&self, stage: u8, ctx: &TaskContext<'_>, rng: &mut R) -> Task {
        let (stage, config) = self.stage_config(stage);
        let (min, max) = if config.min <= config.max {
            (config.min, config.max)
        } else {
            (config.max, config.min)
        };

        let archetype = self
            .sampler
            .biased_pick(&config.archetypes, &ctx.weak.archetypes, rng)
            .unwrap_or(TaskArchetype::Count);

        let (kind, options, correct) = match archetype {
            TaskArchetype::Count => self.count(min, max, ctx, rng),
            TaskArchetype::Compare if min < max => self.compare(min, max, rng),
            TaskArchetype::Compare => self.count(min, max, ctx, rng),
            TaskArchetype::Bigger => self.extreme(min, max, true, rng),
            TaskArchetype::Smaller => self.extreme(min, max, false, rng),
            TaskArchetype::Sequence if max - min >= 3 => self.sequence(min, max, rng),
            TaskArchetype::Sequence => self.count(min, max, ctx, rng),
            TaskArchetype::AddSub => self.add_sub(min, max, rng),
        };

        tracing::debug!(
            stage = stage,
            archetype = kind.archetype().as_str(),
            options = options.len(),
            "Generated task"
        );

        Task {
            kind,
            options,
            correct,
            stage,
            time_limit_seconds: ctx.tier.time_limit_seconds,
            hints_enabled: ctx.tier.hints_enabled,
        }
    }

    fn count<R: Rng + ?Sized>(
        &self,
        min: i32,
        max: i32,
        ctx: &TaskContext<'_>,
        rng: &mut R,
    ) -> (TaskKind, Vec<Answer>, Answer) {
        let values: Vec<i32> = (min..=max).collect();
        let count = self
            .sampler
            .biased_pick(&values, &ctx.weak.numbers, rng)
            .unwrap_or(min);
        let icon = COUNT_ICONS.choose(rng).copied().unwrap_or("⭐").to_string();

        let mut opts = vec![count];
        if count > min {
            opts.push(count - 1);
        }
        if count < max {
            opts.push(count + 1);
        }

        (
            TaskKind::Count { count, icon },
            numeric_options(opts, rng),
            Answer::Number(count),
        )
    }

    fn compare<R: Rng + ?Sized>(&self, min: i32, max: i32, rng: &mut R) -> (TaskKind, Vec<Answer>, Answer) {
        let left = rng.gen_range(min..=max);
        let mut right = rng.gen_range(min..=max);
        while right == left {
            right = rng.gen_range(min..=max);
        }
        let correct = if left > right { Side::Left } else { Side::Right };

        (
            TaskKind::Compare { left, right },
            vec![Answer::Side(Side::Left), Answer::Side(Side::Right)],
            Answer::Side(correct),
        )
    }

    /// Bigger / smaller: up to three distinct numbers, pick the max or min.
    fn extreme<R: Rng + ?Sized>(&self, min: i32, max: i32, bigger: bool, rng: &mut R) -> (TaskKind, Vec<Answer>, Answer) {
        let values: Vec<i32> = (min..=max).collect();
        let mut numbers: Vec<i32> = values
            .choose_multiple(rng, MAX_OPTIONS.min(values.len()))
            .copied()
            .collect();
        numbers.shuffle(rng);

        let pick = if bigger {
            numbers.iter().max()
        } else {
            numbers.iter().min()
        };
        let correct = pick.copied().unwrap_or(min);
        let options = numbers.iter().map(|n| Answer::Number(*n)).collect();

        let kind = if bigger {
            TaskKind::Bigger { numbers }
        } else {
            TaskKind::Smaller { numbers }
        };
        (kind, options, Answer::Number(correct))
    }

    fn sequence<R: Rng + ?Sized>(&self, min: i32, max: i32, rng: &mut R) -> (TaskKind, Vec<Answer>, Answer) {
        let max_start = min.max(max - 3);
        let start = rng.gen_range(min..=max_start);
        let cells = [start, start + 1, start + 2, start + 3];
        let missing_index = rng.gen_range(0..cells.len());
        let answer = cells[missing_index];

        let mut opts = vec![answer];
        if answer > min {
            opts.push(answer - 1);
        }
        if answer < max {
            opts.push(answer + 1);
        }

        (
            TaskKind::Sequence { cells, missing_index },
            numeric_options(opts, rng),
            Answer::Number(answer),
        )
    }

    /// Addition or subtraction with the result kept inside [0, max].
    /// Operands are rejection sampled up to `add_sub_max_attempts` times,
    /// then clamped into range.
    fn add_sub<R: Rng + ?Sized>(&self, min: i32, max: i32, rng: &mut R) -> (TaskKind, Vec<Answer>, Answer) {
        let op = if rng.gen_bool(0.5) { Operation::Add } else { Operation::Subtract };

        let mut operands = None;
        for attempt in 0..self.add_sub_max_attempts {
            let a = rng.gen_range(min..=max);
            let b = rng.gen_range(min..=max);
            let result = op.apply(a, b);
            if (0..=max).contains(&result) {
                operands = Some((a, b));
                break;
            }
            tracing::trace!(attempt = attempt, a = a, b = b, op = %op.symbol(), "Rejected add/sub operands");
        }

        let (left, right) = operands.unwrap_or_else(|| {
            let a = rng.gen_range(min..=max);
            match op {
                Operation::Add => (a, max - a),
                Operation::Subtract => (a, rng.gen_range(min.min(a)..=a)),
            }
        });
        let result = op.apply(left, right);

        let mut opts = vec![result];
        if result > 0 {
            opts.push(result - 1);
        }
        if result < max {
            opts.push(result + 1);
        }
        opts.retain(|n| (0..=max).contains(n));

        (
            TaskKind::AddSub { left, right, op },
            numeric_options(opts, rng),
            Answer::Number(result),
        )
    }
}

/// De-duplicate, cap at three and shuffle.
fn numeric_options<R: Rng + ?Sized>(mut values: Vec<i32>, rng: &mut R) -> Vec<Answer> {
    let mut seen = Vec::with_capacity(values.len());
    values.retain(|v| {
        if seen.contains(v) {
            false
        } else {
            seen.push(*v);
            true
        }
    });
    values.truncate(MAX_OPTIONS);
    values.shuffle(rng);
    values.into_iter().map(Answer::Number).collect()
}
