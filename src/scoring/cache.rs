use std::collections::HashMap;

use crate::model::{ForestryId, IndicatorId, Period};

/// Composite cache key: one score per forestry, indicator and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScoreKey {
    pub forestry: ForestryId,
    pub indicator: IndicatorId,
    pub period: Period,
}

impl ScoreKey {
    pub fn new(forestry: ForestryId, indicator: IndicatorId, period: Period) -> Self {
        Self {
            forestry,
            indicator,
            period,
        }
    }
}

/// Hit/miss counters. A miss is exactly one calculator invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoized per-indicator scores.
///
/// Each key is either absent (next read computes) or present (served as is).
/// Entries only leave through `invalidate_*` or `clear`.
#[derive(Debug, Default)]
pub struct ScoreCache {
    entries: HashMap<ScoreKey, f64>,
    stats: CacheStats,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ScoreKey) -> Option<f64> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: ScoreKey, score: f64) {
        self.entries.insert(key, score);
    }

    /// Return the cached score, or run `compute` once and remember its result.
    pub fn get_or_compute<F>(&mut self, key: ScoreKey, compute: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        if let Some(score) = self.entries.get(&key) {
            self.stats.hits += 1;
            return *score;
        }
        self.stats.misses += 1;
        let score = compute();
        self.entries.insert(key, score);
        score
    }

    /// Drop every entry for `indicator`, across all forestries and periods.
    /// Returns how many entries were removed.
    pub fn invalidate_indicator(&mut self, indicator: IndicatorId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.indicator != indicator);
        before - self.entries.len()
    }

    /// Drop the entries of one peer group (indicator within one period).
    pub fn invalidate_indicator_period(&mut self, indicator: IndicatorId, period: Period) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| !(key.indicator == indicator && key.period == period));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &ScoreKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn test_get_or_compute_runs_once() {
        let mut cache = ScoreCache::new();
        let key = ScoreKey::new(1, 1, period("2024-01"));
        let mut calls = 0;

        let a = cache.get_or_compute(key, || {
            calls += 1;
            5.0
        });
        let b = cache.get_or_compute(key, || {
            calls += 1;
            99.0
        });

        assert_eq!(a, 5.0);
        assert_eq!(b, 5.0);
        assert_eq!(calls, 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_invalidate_indicator_spans_forestries_and_periods() {
        let mut cache = ScoreCache::new();
        cache.insert(ScoreKey::new(1, 1, period("2024-01")), 1.0);
        cache.insert(ScoreKey::new(2, 1, period("2024-02")), 2.0);
        cache.insert(ScoreKey::new(1, 2, period("2024-01")), 3.0);

        assert_eq!(cache.invalidate_indicator(1), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&ScoreKey::new(1, 2, period("2024-01"))));
    }

    #[test]
    fn test_invalidate_indicator_period_keeps_other_periods() {
        let mut cache = ScoreCache::new();
        cache.insert(ScoreKey::new(1, 1, period("2024-01")), 1.0);
        cache.insert(ScoreKey::new(2, 1, period("2024-01")), 1.5);
        cache.insert(ScoreKey::new(1, 1, period("2024-02")), 2.0);
        cache.insert(ScoreKey::new(1, 2, period("2024-01")), 3.0);

        assert_eq!(cache.invalidate_indicator_period(1, period("2024-01")), 2);
        assert!(cache.contains(&ScoreKey::new(1, 1, period("2024-02"))));
        assert!(cache.contains(&ScoreKey::new(1, 2, period("2024-01"))));
        assert!(!cache.contains(&ScoreKey::new(2, 1, period("2024-01"))));
    }

    #[test]
    fn test_clear() {
        let mut cache = ScoreCache::new();
        cache.insert(ScoreKey::new(1, 1, period("2024-01")), 1.0);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&ScoreKey::new(1, 1, period("2024-01"))), None);
    }
}
