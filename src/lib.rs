pub mod algorithms;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{LoadError, RecommendError, SolveError};
pub use models::*;
pub use services::recommendation::RecommendationEngine;
pub use store::{ModelArtifacts, ModelStore};

use anyhow::{Context, Result};
use services::catalog::Catalog;
use services::serving::ServingService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<ModelStore>,
    pub serving_service: Arc<ServingService>,
}

impl AppState {
    /// Loads artifacts and catalog named by `config`. Any inconsistency is fatal.
    pub fn load(config: Config) -> Result<Self> {
        config.validate()?;

        let store = ModelStore::load(&config.model.artifacts_path).with_context(|| {
            format!(
                "failed to load model artifacts from {}",
                config.model.artifacts_path.display()
            )
        })?;

        let catalog = match &config.model.catalog_path {
            Some(path) => Catalog::from_json_file(path)?,
            None => Catalog::default(),
        };

        Ok(Self::from_parts(config, store, catalog))
    }

    pub fn from_parts(config: Config, store: ModelStore, catalog: Catalog) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(store);

        let engine = RecommendationEngine::new(
            store.clone(),
            algorithms::EngineParams::from(&config.recommendation),
        );

        let serving_service = Arc::new(ServingService::new(
            engine,
            Arc::new(catalog),
            config.clone(),
        ));

        Self {
            config,
            store,
            serving_service,
        }
    }
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
