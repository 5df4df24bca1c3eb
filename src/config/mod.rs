use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// JSON file with item factors, biases and the id -> index mapping.
    pub artifacts_path: PathBuf,
    /// Optional JSON catalog used to decorate results and build the default listing.
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub lambda: f64,
    pub tau: f64,
    pub bias_weight: f64,
    pub top_n: usize,
    pub max_top_n: usize,
    pub min_rating: f64,
    pub max_rating: f64,
    pub max_ratings_per_request: usize,
    pub fallback_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            model: ModelConfig {
                artifacts_path: PathBuf::from("artifacts/model.json"),
                catalog_path: None,
            },
            recommendation: RecommendationConfig::default(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            lambda: 0.02,
            tau: 0.02,
            bias_weight: 0.005,
            top_n: 12,
            max_top_n: 500,
            min_rating: 1.0,
            max_rating: 5.0,
            max_ratings_per_request: 1000,
            fallback_seed: 42,
        }
    }
}

impl Config {
    /// Defaults, overridden by `path`, overridden by `LATENTREC_*` env vars
    /// (`LATENTREC_RECOMMENDATION__TAU=0.05`).
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name(path))
            .add_source(Self::environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment only.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(Self::environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("LATENTREC")
            .prefix_separator("_")
            .separator("__")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.recommendation.validate()
    }
}

impl RecommendationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.tau.is_finite() && self.tau > 0.0) {
            bail!("tau must be a positive finite number, got {}", self.tau);
        }
        if !(self.lambda.is_finite() && self.lambda > 0.0) {
            bail!("lambda must be a positive finite number, got {}", self.lambda);
        }
        if !self.bias_weight.is_finite() {
            bail!("bias_weight must be finite, got {}", self.bias_weight);
        }
        if self.top_n == 0 || self.top_n > self.max_top_n {
            bail!(
                "top_n must be in 1..={}, got {}",
                self.max_top_n,
                self.top_n
            );
        }
        if !(self.min_rating.is_finite()
            && self.max_rating.is_finite()
            && self.min_rating < self.max_rating)
        {
            bail!(
                "rating bounds must satisfy min < max, got [{}, {}]",
                self.min_rating,
                self.max_rating
            );
        }
        Ok(())
    }
}
