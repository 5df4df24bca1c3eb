use crate::config::RecommendationConfig;
use crate::models::ItemId;
use anyhow::{anyhow, Context, Result};

pub mod validation;

/// Parses an `ID=RATING` pair as accepted on the command line.
pub fn parse_rating_pair(input: &str) -> Result<(ItemId, f64)> {
    let (id, rating) = input
        .split_once('=')
        .ok_or_else(|| anyhow!("expected ID=RATING, got {:?}", input))?;

    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("missing item id in {:?}", input));
    }

    let rating: f64 = rating
        .trim()
        .parse()
        .with_context(|| format!("invalid rating in {:?}", input))?;

    Ok((ItemId::from(id), rating))
}

/// Requested result size, or the configured default.
pub fn resolve_top_n(requested: Option<usize>, config: &RecommendationConfig) -> usize {
    requested.unwrap_or(config.top_n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating_pair() {
        let (id, rating) = parse_rating_pair("318=5").unwrap();
        assert_eq!(id, ItemId::from(318));
        assert_eq!(rating, 5.0);

        let (id, rating) = parse_rating_pair(" tt0111161 = 4.5 ").unwrap();
        assert_eq!(id.as_str(), "tt0111161");
        assert_eq!(rating, 4.5);
    }

    #[test]
    fn test_parse_rating_pair_errors() {
        assert!(parse_rating_pair("318").is_err());
        assert!(parse_rating_pair("=4").is_err());
        assert!(parse_rating_pair("318=great").is_err());
    }

    #[test]
    fn test_resolve_top_n() {
        let config = RecommendationConfig::default();
        assert_eq!(resolve_top_n(None, &config), 12);
        assert_eq!(resolve_top_n(Some(3), &config), 3);
    }
}
