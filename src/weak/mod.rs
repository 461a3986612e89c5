use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::hash::Hash;
use crate::tasks::task::{Task, TaskArchetype};

/// Miss counts per key for the current session. Never persisted.
#[derive(Debug, Clone)]
pub struct WeakTopicMap<K: Eq + Hash> {
    misses: HashMap<K, u32>,
}

impl<K: Eq + Hash> Default for WeakTopicMap<K> {
    fn default() -> Self {
        WeakTopicMap { misses: HashMap::new() }
    }
}

impl<K: Eq + Hash> WeakTopicMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a miss for `key`, returning the new total.
    pub fn record_miss(&mut self, key: K) -> u32 {
        let count = self.misses.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    pub fn miss_count(&self, key: &K) -> u32 {
        self.misses.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.misses.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.misses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.misses.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &u32)> {
        self.misses.iter()
    }

    pub fn clear(&mut self) {
        self.misses.clear();
    }
}

/// Coin-flip bias toward previously missed keys.
#[derive(Debug, Clone, Copy)]
pub struct WeakTopicSampler {
    probability: f64,
}

impl WeakTopicSampler {
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) };
        WeakTopicSampler { probability }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// False for an empty map; otherwise true with the configured probability.
    pub fn should_prioritize_weak<K, R>(&self, map: &WeakTopicMap<K>, rng: &mut R) -> bool
    where
        K: Eq + Hash,
        R: Rng + ?Sized,
    {
        !map.is_empty() && rng.gen_bool(self.probability)
    }

    /// Uniform pick over `candidates`, or over the weak ones among them when
    /// the coin says to prioritize. `None` only for an empty slice.
    pub fn biased_pick<K, R>(&self, candidates: &[K], map: &WeakTopicMap<K>, rng: &mut R) -> Option<K>
    where
        K: Eq + Hash + Clone,
        R: Rng + ?Sized,
    {
        if candidates.is_empty() {
            return None;
        }

        if self.should_prioritize_weak(map, rng) {
            let weak: Vec<&K> = candidates.iter().filter(|c| map.contains(c)).collect();
            if let Some(pick) = weak.choose(rng) {
                return Some((*pick).clone());
            }
        }

        candidates.choose(rng).cloned()
    }
}

impl Default for WeakTopicSampler {
    fn default() -> Self {
        Self::new(0.3)
    }
}

/// The two miss maps a play session keeps: by numeric answer and by archetype.
#[derive(Debug, Clone, Default)]
pub struct SessionWeakTopics {
    pub numbers: WeakTopicMap<i32>,
    pub archetypes: WeakTopicMap<TaskArchetype>,
}

impl SessionWeakTopics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a wrong answer to `task`.
    pub fn record_miss(&mut self, task: &Task) {
        if let Some(n) = task.correct.as_number() {
            self.numbers.record_miss(n);
        }
        self.archetypes.record_miss(task.archetype());
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty() && self.archetypes.is_empty()
    }

    pub fn reset(&mut self) {
        self.numbers.clear();
        self.archetypes.clear();
    }
}
