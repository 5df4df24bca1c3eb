use crate::config::Config;
use crate::error::RecommendError;
use crate::models::*;
use crate::services::catalog::{seeded_sample, Catalog};
use crate::services::recommendation::RecommendationEngine;
use crate::utils::resolve_top_n;
use chrono::Utc;
use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetails {
    pub item_id: ItemId,
    pub index: ItemIndex,
    pub bias: f64,
    pub title: Option<String>,
    pub poster_url: Option<String>,
}

/// Request-facing wrapper around the engine: applies the fallback policy,
/// joins catalog metadata and keeps serving counters.
pub struct ServingService {
    engine: RecommendationEngine,
    catalog: Arc<Catalog>,
    config: Arc<Config>,
    serving_stats: Arc<DashMap<String, u64>>,
}

impl ServingService {
    pub fn new(engine: RecommendationEngine, catalog: Arc<Catalog>, config: Arc<Config>) -> Self {
        Self {
            engine,
            catalog,
            config,
            serving_stats: Arc::new(DashMap::new()),
        }
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    /// Never fails: requests the engine cannot personalize get the default listing.
    pub fn serve(&self, request: &RecommendationRequest) -> RecommendationResponse {
        self.increment_stat("total_requests");
        let start_time = Instant::now();

        let n = resolve_top_n(request.num_recommendations, &self.config.recommendation);
        let request_id = Uuid::new_v4();

        let (personalized, recommendations) = match self.engine.recommend_scored(&request.ratings, n) {
            Ok(scored) => {
                self.increment_stat("personalized_requests");
                let items = scored
                    .iter()
                    .map(|item| RecommendationItem::personalized(item, self.catalog.get(&item.item_id)))
                    .collect();
                (true, items)
            }
            Err(e) => {
                if matches!(e, RecommendError::Solve(_)) {
                    self.increment_stat("solve_failures");
                }
                warn!("Request {} falls back to default listing: {}", request_id, e);
                self.increment_stat("fallback_requests");
                (false, self.default_listing(n))
            }
        };

        let latency = start_time.elapsed().as_micros() as u64;
        self.update_latency_stat(latency);

        info!(
            "Served {} recommendations for request {} in {}us (personalized: {})",
            recommendations.len(),
            request_id,
            latency,
            personalized
        );

        RecommendationResponse {
            request_id,
            personalized,
            recommendations,
            generated_at: Utc::now(),
        }
    }

    /// Requests are independent; output order matches input order.
    pub fn serve_batch(&self, requests: &[RecommendationRequest]) -> Vec<RecommendationResponse> {
        self.increment_stat("batch_requests");
        let start_time = Instant::now();

        let responses: Vec<RecommendationResponse> =
            requests.par_iter().map(|request| self.serve(request)).collect();

        info!(
            "Batch served {} requests in {}us",
            responses.len(),
            start_time.elapsed().as_micros()
        );
        responses
    }

    /// Seeded, non-personalized listing. Drawn from the catalog when one is
    /// loaded, otherwise from the model's own item ids.
    pub fn default_listing(&self, n: usize) -> Vec<RecommendationItem> {
        let seed = self.config.recommendation.fallback_seed;

        if !self.catalog.is_empty() {
            return self
                .catalog
                .default_listing(n, seed)
                .into_iter()
                .map(|entry| RecommendationItem::default_pick(entry.item_id.clone(), Some(entry)))
                .collect();
        }

        let store = self.engine.store();
        seeded_sample(store.item_count(), n, seed)
            .into_iter()
            .map(|index| RecommendationItem::default_pick(store.id_of(index).clone(), None))
            .collect()
    }

    pub fn item_details(&self, item_id: &ItemId) -> Option<ItemDetails> {
        let store = self.engine.store();
        let index = store.index_of(item_id)?;
        let entry = self.catalog.get(item_id);

        Some(ItemDetails {
            item_id: item_id.clone(),
            index,
            bias: store.bias(index),
            title: entry.map(|e| e.title.clone()),
            poster_url: entry.and_then(|e| e.poster_url.clone()),
        })
    }

    /// Snapshot of the counters plus `avg_latency_us`, derived from the
    /// latency sum and sample count.
    pub fn get_serving_stats(&self) -> HashMap<String, u64> {
        let mut stats: HashMap<String, u64> = self
            .serving_stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        let total = stats.get("latency_total_us").copied().unwrap_or(0);
        let samples = stats.get("latency_samples").copied().unwrap_or(0);
        if samples > 0 {
            stats.insert("avg_latency_us".to_string(), total / samples);
        }
        stats
    }

    fn increment_stat(&self, key: &str) {
        let mut counter = self.serving_stats.entry(key.to_string()).or_insert(0);
        *counter += 1;
    }

    // Each counter is read-modify-written under its own entry guard.
    fn update_latency_stat(&self, latency_us: u64) {
        {
            let mut total = self.serving_stats.entry("latency_total_us".to_string()).or_insert(0);
            *total = total.saturating_add(latency_us);
        }
        self.increment_stat("latency_samples");

        let mut max = self.serving_stats.entry("max_latency_us".to_string()).or_insert(0);
        if latency_us > *max {
            *max = latency_us;
        }
    }
}
