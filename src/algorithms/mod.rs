pub mod ranker;
pub mod solver;

use crate::config::RecommendationConfig;
use crate::store::ModelStore;
use nalgebra::DVector;

pub use ranker::rank_top_n;
pub use solver::NormalEquations;

/// Fixed model constants captured once at engine construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    /// Rating-confidence scale λ.
    pub lambda: f64,
    /// Ridge regularization τ. Must be positive.
    pub tau: f64,
    /// Weight β of the raw item bias in the final score.
    pub bias_weight: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            lambda: 0.02,
            tau: 0.02,
            bias_weight: 0.005,
        }
    }
}

impl From<&RecommendationConfig> for EngineParams {
    fn from(config: &RecommendationConfig) -> Self {
        Self {
            lambda: config.lambda,
            tau: config.tau,
            bias_weight: config.bias_weight,
        }
    }
}

/// `score_j = factors_j · u + β bias_j` for every item in the store.
pub fn score_items(store: &ModelStore, user_vector: &DVector<f64>, bias_weight: f64) -> DVector<f64> {
    let mut scores = store.factors().tr_mul(user_vector);
    scores.axpy(bias_weight, store.biases(), 1.0);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemId;
    use std::collections::HashMap;

    #[test]
    fn test_score_items() {
        let index: HashMap<ItemId, usize> =
            [("a", 0), ("b", 1), ("c", 2)].into_iter().map(|(k, v)| (ItemId::from(k), v)).collect();
        let store = ModelStore::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            vec![2.0, 0.0, -2.0],
            index,
        )
        .unwrap();

        let u = DVector::from_vec(vec![2.5, -1.0]);
        let scores = score_items(&store, &u, 0.5);
        assert!((scores[0] - 3.5).abs() < 1e-12);
        assert!((scores[1] + 1.0).abs() < 1e-12);
        assert!((scores[2] - 0.5).abs() < 1e-12);
    }
}
