//! Collection-level reporting: dashboard counters and stage distribution.
//!
//! Batch helpers run on rayon; every value is derived from the states on demand.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::memory::MemoryModel;
use crate::types::{MemoryState, Stage};

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total: usize,
    /// Items currently due ("fading")
    pub due: usize,
    pub stabilized: usize,
    /// Mean predicted recall of seen items, percent
    pub connectivity: u32,
}

/// Items per half-life band
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDistribution {
    pub new: usize,
    pub learning: usize,
    pub reviewing: usize,
    pub mastered: usize,
}

impl StageDistribution {
    fn add(mut self, state: &MemoryState, config: &SchedulerConfig) -> Self {
        match state.stage(config) {
            Stage::New => self.new += 1,
            Stage::Learning => self.learning += 1,
            Stage::Stabilized if state.halflife > config.mastered_halflife => self.mastered += 1,
            Stage::Stabilized => self.reviewing += 1,
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            new: self.new + other.new,
            learning: self.learning + other.learning,
            reviewing: self.reviewing + other.reviewing,
            mastered: self.mastered + other.mastered,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.learning + self.reviewing + self.mastered
    }
}

/// Predicted recall for every state, in input order
pub fn batch_predict_recall<M: MemoryModel>(
    model: &M,
    states: &[MemoryState],
    now: i64,
) -> Vec<f64> {
    states
        .par_iter()
        .map(|state| model.predict_recall(state, now))
        .collect()
}

pub fn compute_stats<M: MemoryModel>(model: &M, states: &[MemoryState], now: i64) -> CollectionStats {
    let config = model.config();

    let (due, stabilized, seen, recall_sum) = states
        .par_iter()
        .map(|state| {
            let is_seen = !state.is_new();
            (
                usize::from(state.is_due(now)),
                usize::from(state.stage(config) == Stage::Stabilized),
                usize::from(is_seen),
                if is_seen { model.predict_recall(state, now) } else { 0.0 },
            )
        })
        .reduce(
            || (0, 0, 0, 0.0),
            |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2, a.3 + b.3),
        );

    let connectivity = if seen == 0 {
        0
    } else {
        ((recall_sum / seen as f64) * 100.0).round().clamp(0.0, 100.0) as u32
    };

    CollectionStats {
        total: states.len(),
        due,
        stabilized,
        connectivity,
    }
}

pub fn stage_distribution(states: &[MemoryState], config: &SchedulerConfig) -> StageDistribution {
    states
        .par_iter()
        .fold(StageDistribution::default, |acc, state| acc.add(state, config))
        .reduce(StageDistribution::default, StageDistribution::merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::HalfLifeModel;

    const NOW: i64 = 1_700_000_000_000;

    fn seen(halflife: f64, last_seen: i64, due_at: i64) -> MemoryState {
        MemoryState {
            success_weight: 3.0,
            failure_weight: 1.0,
            halflife,
            last_seen: Some(last_seen),
            total_exposure: 2,
            due_at,
        }
    }

    fn sample() -> Vec<MemoryState> {
        let config = SchedulerConfig::default();
        vec![
            MemoryState::initial(&config, NOW),
            seen(60.0, NOW - 60 * 60_000, NOW - 1),
            seen(5000.0, NOW, NOW + 1_000_000),
            seen(30_000.0, NOW, NOW + 1_000_000),
        ]
    }

    #[test]
    fn test_compute_stats() {
        let model = HalfLifeModel::default();
        let stats = compute_stats(&model, &sample(), NOW);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.due, 2);
        assert_eq!(stats.stabilized, 2);
        // recalls: 0.5, 1.0, 1.0 -> 83%
        assert_eq!(stats.connectivity, 83);
    }

    #[test]
    fn test_empty_collection() {
        let model = HalfLifeModel::default();
        assert_eq!(compute_stats(&model, &[], NOW), CollectionStats::default());
        assert_eq!(
            stage_distribution(&[], model.config()),
            StageDistribution::default()
        );
    }

    #[test]
    fn test_stage_distribution() {
        let dist = stage_distribution(&sample(), &SchedulerConfig::default());
        assert_eq!(
            dist,
            StageDistribution {
                new: 1,
                learning: 1,
                reviewing: 1,
                mastered: 1,
            }
        );
        assert_eq!(dist.total(), 4);
    }

    #[test]
    fn test_stage_distribution_band_edges() {
        let config = SchedulerConfig::default();
        let states = vec![
            seen(config.stabilized_halflife, NOW, NOW + 1),
            seen(config.mastered_halflife, NOW, NOW + 1),
            seen(config.mastered_halflife + 1.0, NOW, NOW + 1),
        ];
        let dist = stage_distribution(&states, &config);
        assert_eq!(dist.learning, 1);
        assert_eq!(dist.reviewing, 1);
        assert_eq!(dist.mastered, 1);
    }

    #[test]
    fn test_batch_predict_preserves_order() {
        let model = HalfLifeModel::default();
        let recalls = batch_predict_recall(&model, &sample(), NOW);
        assert_eq!(recalls.len(), 4);
        assert_eq!(recalls[0], 0.0);
        assert!((recalls[1] - 0.5).abs() < 1e-9);
        assert!((recalls[2] - 1.0).abs() < 1e-9);
    }
}
