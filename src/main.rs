use clap::Parser;
use latentrec::{api::create_router, init_tracing, AppState, Config};
use std::path::Path;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve latent-factor recommendations over HTTP", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = if Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file {} not found, using defaults and environment", args.config);
        Config::from_env()?
    };
    info!("Starting latentrec server with config: {:?}", config.server);

    let addr = config.server.socket_addr()?;
    let state = AppState::load(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
