use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tracing::info;

use dish_recommender::{
    api::{create_router, AppState},
    cli::Shell,
    config::Config,
    db::{load_inventory, CsvRatingStore},
    services::{EngineSettings, RecommendationService},
};

#[derive(Parser, Debug)]
#[command(name = "dish-recommender")]
#[command(about = "Recommends dishes from the ingredients at hand")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Rating table path (overrides config)
    #[arg(long, global = true, env = "RATINGS_PATH")]
    ratings: Option<PathBuf>,

    /// Dish inventory path (overrides config)
    #[arg(long, global = true, env = "INVENTORY_PATH")]
    inventory: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Serve the JSON API (default)
    Serve {
        /// HTTP port (overrides config)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Run a terminal session on stdin/stdout
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve { port: None });

    // The terminal session owns stdout, so logs stay on stderr and quieter
    let default_filter = match command {
        Command::Serve { .. } => "dish_recommender=info,tower_http=info",
        Command::Interactive => "dish_recommender=warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env()?;
    if let Some(ratings) = cli.ratings {
        config.ratings_path = ratings;
    }
    if let Some(inventory) = cli.inventory {
        config.inventory_path = inventory;
    }
    if let Command::Serve { port: Some(port) } = command {
        config.port = port;
    }

    info!(
        ratings = %config.ratings_path.display(),
        inventory = %config.inventory_path.display(),
        recommendation_limit = config.recommendation_limit,
        neighborhood_size = config.neighborhood_size,
        "Configuration loaded"
    );

    let inventory = load_inventory(&config.inventory_path).await?;
    let store = Arc::new(CsvRatingStore::new(config.ratings_path.clone()));
    let settings = EngineSettings {
        recommendation_limit: config.recommendation_limit,
        neighborhood_size: config.neighborhood_size,
    };
    let service = Arc::new(RecommendationService::load(store, &inventory, settings).await?);

    match command {
        Command::Serve { .. } => serve(&config, service).await,
        Command::Interactive => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            Shell::new(&service, input, tokio::io::stdout()).run().await?;
            Ok(())
        }
    }
}

async fn serve(config: &Config, service: Arc<RecommendationService>) -> anyhow::Result<()> {
    let app = create_router(AppState::from(service));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
