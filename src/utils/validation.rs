use crate::config::RecommendationConfig;
use crate::models::*;
use crate::store::ModelStore;
use anyhow::{anyhow, Result};

/// Checks only ratings for items the model knows; unknown ids are ignored
/// downstream whatever their value, so they are ignored here too.
pub fn validate_recommendation_request(
    request: &RecommendationRequest,
    config: &RecommendationConfig,
    store: &ModelStore,
) -> Result<()> {
    if let Some(n) = request.num_recommendations {
        if n == 0 {
            return Err(anyhow!("Number of recommendations must be greater than 0"));
        }
        if n > config.max_top_n {
            return Err(anyhow!(
                "Number of recommendations too large (max {})",
                config.max_top_n
            ));
        }
    }

    let known: Vec<(&ItemId, f64)> = request
        .ratings
        .iter()
        .filter(|(item_id, _)| store.index_of(item_id).is_some())
        .map(|(item_id, &rating)| (item_id, rating))
        .collect();

    if known.len() > config.max_ratings_per_request {
        return Err(anyhow!(
            "Too many ratings in one request (max {})",
            config.max_ratings_per_request
        ));
    }

    for (item_id, rating) in known {
        validate_rating(rating, config)
            .map_err(|e| anyhow!("Invalid rating for item {}: {}", item_id, e))?;
    }

    Ok(())
}

pub fn validate_rating(rating: f64, config: &RecommendationConfig) -> Result<()> {
    if !rating.is_finite() {
        return Err(anyhow!("rating must be finite"));
    }
    if rating < config.min_rating || rating > config.max_rating {
        return Err(anyhow!(
            "rating {} outside [{}, {}]",
            rating,
            config.min_rating,
            config.max_rating
        ));
    }
    Ok(())
}

pub fn validate_batch_size(batch_size: usize, max_batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(anyhow!("Batch size must be greater than 0"));
    }

    if batch_size > max_batch_size {
        return Err(anyhow!("Batch size too large (max {})", max_batch_size));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn store() -> ModelStore {
        let index: HashMap<ItemId, ItemIndex> =
            (1..=3).map(|i| (ItemId::from(i as i64), i - 1)).collect();
        ModelStore::new(vec![vec![1.0], vec![0.5], vec![-1.0]], vec![0.0; 3], index).unwrap()
    }

    fn request(pairs: &[(&str, f64)]) -> RecommendationRequest {
        RecommendationRequest::new(pairs.iter().map(|(id, r)| (ItemId::from(*id), *r)).collect())
    }

    #[test]
    fn test_valid_request() {
        let config = RecommendationConfig::default();
        let store = store();
        assert!(validate_recommendation_request(&request(&[("1", 5.0), ("2", 1.0)]), &config, &store).is_ok());
        assert!(validate_recommendation_request(&request(&[]), &config, &store).is_ok());
    }

    #[test]
    fn test_rating_bounds() {
        let config = RecommendationConfig::default();
        let store = store();
        assert!(validate_recommendation_request(&request(&[("1", 0.0)]), &config, &store).is_err());
        assert!(validate_recommendation_request(&request(&[("1", 5.5)]), &config, &store).is_err());
        assert!(validate_recommendation_request(&request(&[("1", f64::NAN)]), &config, &store).is_err());
        assert!(validate_recommendation_request(&request(&[("1", 3.5)]), &config, &store).is_ok());
    }

    #[test]
    fn test_unknown_ids_are_not_validated() {
        let config = RecommendationConfig::default();
        let store = store();
        let req = request(&[("1", 4.0), ("ghost", 0.0), ("", f64::NAN), ("99", 42.0)]);
        assert!(validate_recommendation_request(&req, &config, &store).is_ok());
    }

    #[test]
    fn test_num_recommendations_bounds() {
        let config = RecommendationConfig::default();
        let store = store();
        let zero = request(&[("1", 4.0)]).with_num_recommendations(0);
        assert!(validate_recommendation_request(&zero, &config, &store).is_err());

        let huge = request(&[("1", 4.0)]).with_num_recommendations(config.max_top_n + 1);
        assert!(validate_recommendation_request(&huge, &config, &store).is_err());
    }

    #[test]
    fn test_too_many_ratings_counts_known_items_only() {
        let config = RecommendationConfig {
            max_ratings_per_request: 2,
            ..RecommendationConfig::default()
        };
        let store = store();
        let req = request(&[("1", 4.0), ("2", 4.0), ("3", 4.0)]);
        assert!(validate_recommendation_request(&req, &config, &store).is_err());

        let req = request(&[("1", 4.0), ("2", 4.0), ("x", 4.0), ("y", 4.0)]);
        assert!(validate_recommendation_request(&req, &config, &store).is_ok());
    }

    #[test]
    fn test_batch_size() {
        assert!(validate_batch_size(0, 10).is_err());
        assert!(validate_batch_size(11, 10).is_err());
        assert!(validate_batch_size(10, 10).is_ok());
    }
}
