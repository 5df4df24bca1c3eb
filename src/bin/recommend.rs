use anyhow::Result;
use clap::Parser;
use latentrec::utils::parse_rating_pair;
use latentrec::utils::validation::validate_recommendation_request;
use latentrec::{init_tracing, AppState, Config, RatingInput, RecommendationRequest};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Recommend items for a set of ratings", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Overrides `model.artifacts_path`.
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Overrides `model.catalog_path`.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// A rating as ID=VALUE; repeat for more items.
    #[arg(short, long = "rating", value_parser = parse_rating_pair)]
    ratings: Vec<(latentrec::ItemId, f64)>,

    #[arg(short, long)]
    num: Option<usize>,

    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let mut config = if Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using defaults and environment");
        Config::from_env()?
    };
    if let Some(artifacts) = args.artifacts {
        config.model.artifacts_path = artifacts;
    }
    if let Some(catalog) = args.catalog {
        config.model.catalog_path = Some(catalog);
    }

    let ratings: RatingInput = args.ratings.into_iter().collect();
    let request = RecommendationRequest {
        ratings,
        num_recommendations: args.num,
    };

    let state = AppState::load(config)?;
    validate_recommendation_request(&request, &state.config.recommendation, &state.store)?;
    let response = state.serving_service.serve(&request);

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
