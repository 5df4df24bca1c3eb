use crate::algorithms::{rank_top_n, score_items, EngineParams, NormalEquations};
use crate::error::{RecommendError, RecommendResult};
use crate::models::{ItemId, ItemIndex, RatingInput, ScoredItem};
use crate::store::ModelStore;
use nalgebra::DVector;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Folds a new user's ratings into the trained item model and ranks the
/// catalog for them.
///
/// Holds no per-request state: every call allocates its own normal
/// equations and user vector, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    store: Arc<ModelStore>,
    params: EngineParams,
}

impl RecommendationEngine {
    pub fn new(store: Arc<ModelStore>, params: EngineParams) -> Self {
        Self { store, params }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn params(&self) -> EngineParams {
        self.params
    }

    /// Maps ids to indices, dropping ids the model does not know.
    ///
    /// Keyed by index so accumulation order never depends on the caller's
    /// map iteration order.
    pub fn usable_ratings<'a, I>(&self, ratings: I) -> BTreeMap<ItemIndex, f64>
    where
        I: IntoIterator<Item = (&'a ItemId, &'a f64)>,
    {
        let mut usable = BTreeMap::new();
        let mut unknown = 0usize;
        for (item_id, &rating) in ratings {
            match self.store.index_of(item_id) {
                Some(index) => {
                    usable.insert(index, rating);
                }
                None => unknown += 1,
            }
        }
        if unknown > 0 {
            debug!("Dropped {} ratings for items unknown to the model", unknown);
        }
        usable
    }

    pub fn user_vector<'a, I>(&self, ratings: I) -> RecommendResult<DVector<f64>>
    where
        I: IntoIterator<Item = (&'a ItemId, &'a f64)>,
    {
        let usable = self.usable_ratings(ratings);
        self.solve_user_vector(&usable)
    }

    fn solve_user_vector(&self, usable: &BTreeMap<ItemIndex, f64>) -> RecommendResult<DVector<f64>> {
        if usable.is_empty() {
            return Err(RecommendError::InsufficientData);
        }

        let mut equations = NormalEquations::new(
            self.store.factor_dimension(),
            self.params.lambda,
            self.params.tau,
        );
        for (&index, &rating) in usable {
            equations.accumulate(self.store.factor_row(index), rating, self.store.bias(index));
        }

        let user_vector = equations.solve()?;
        debug!(
            "Solved user vector from {} ratings, norm {:.4}",
            equations.observations(),
            user_vector.norm()
        );
        Ok(user_vector)
    }

    /// Top `n` unrated items with their predicted scores, best first.
    pub fn recommend_scored<'a, I>(&self, ratings: I, n: usize) -> RecommendResult<Vec<ScoredItem>>
    where
        I: IntoIterator<Item = (&'a ItemId, &'a f64)>,
    {
        let usable = self.usable_ratings(ratings);
        let user_vector = self.solve_user_vector(&usable)?;

        let scores = score_items(&self.store, &user_vector, self.params.bias_weight);
        let rated: BTreeSet<ItemIndex> = usable.keys().copied().collect();

        Ok(rank_top_n(scores.as_slice(), &rated, n)
            .into_iter()
            .map(|(index, score)| ScoredItem {
                item_id: self.store.id_of(index).clone(),
                index,
                score,
            })
            .collect())
    }

    pub fn recommend<'a, I>(&self, ratings: I, n: usize) -> RecommendResult<Vec<ItemId>>
    where
        I: IntoIterator<Item = (&'a ItemId, &'a f64)>,
    {
        Ok(self
            .recommend_scored(ratings, n)?
            .into_iter()
            .map(|item| item.item_id)
            .collect())
    }

    /// Independent requests solved in parallel; results keep input order.
    pub fn recommend_batch(&self, requests: &[(RatingInput, usize)]) -> Vec<RecommendResult<Vec<ScoredItem>>> {
        requests
            .par_iter()
            .map(|(ratings, n)| self.recommend_scored(ratings, *n))
            .collect()
    }
}
