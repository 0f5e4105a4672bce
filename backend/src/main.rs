//! ThunderCast - thunderstorm forecasting service
//!
//! Collects hourly weather observations, trains a seasonal thunderstorm
//! model on historical data, publishes short-range forecasts and serves them
//! to the dashboard.

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thundercast::{
    create_app,
    external::WeatherClient,
    scheduler::{collect_once, run_collection_loop},
    services::{IngestorService, PredictionService, TrainingService},
    store::PgWeatherStore,
    AppState, Config, WeatherStore,
};

#[derive(Parser)]
#[command(name = "thundercast")]
#[command(about = "Thunderstorm forecasting: collect, train, predict, serve")]
#[command(version)]
struct Cli {
    /// Print command results as JSON on stdout
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collection scheduler and the dashboard API
    Serve {
        /// Serve the API without collecting
        #[arg(long, default_value_t = false)]
        no_collect: bool,
    },
    /// Fetch and store one observation
    Collect,
    /// Clean and feature a raw history CSV
    Prepare {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Train the forecaster on a raw history CSV
    Train {
        #[arg(long)]
        input: PathBuf,
        /// Overrides forecast.model_path
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Score the latest observation and publish forecasts
    Predict,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thundercast=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load()?;

    tracing::info!("Environment: {}", config.environment);

    match cli.command {
        Commands::Serve { no_collect } => serve(config, no_collect).await?,
        Commands::Collect => {
            let store = connect_store(&config).await?;
            let ingestor = build_ingestor(&config, store)?;
            let observation = collect_once(&ingestor, config.scheduler.fetch_timeout()).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&observation)?);
            }
        }
        Commands::Prepare { input, output } => {
            let service = TrainingService::new(config.forecast.model_path.clone());
            let prepared = service.prepare(&input, &output)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&prepared.report)?);
            }
        }
        Commands::Train { input, model } => {
            let model_path = model.unwrap_or_else(|| config.forecast.model_path.clone());
            let service = TrainingService::new(model_path);
            let summary = service.train_from_csv(&input)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        Commands::Predict => {
            let store = connect_store(&config).await?;
            let service = PredictionService::new(store, &config.forecast);
            let outcome = service.run_cycle().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
        }
    }

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn WeatherStore>> {
    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    Ok(Arc::new(PgWeatherStore::new(db_pool)))
}

fn build_ingestor(config: &Config, store: Arc<dyn WeatherStore>) -> anyhow::Result<IngestorService> {
    let client = WeatherClient::new(&config.weather)?;
    Ok(IngestorService::new(store, client, config.location.to_location()))
}

async fn serve(config: Config, no_collect: bool) -> anyhow::Result<()> {
    let store = connect_store(&config).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let collector = if no_collect {
        None
    } else {
        let ingestor = build_ingestor(&config, store.clone())?;
        Some(tokio::spawn(run_collection_loop(
            ingestor,
            config.scheduler.clone(),
            shutdown_rx,
        )))
    };

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown requested");
        })
        .await?;

    // Stop the collector once the server has drained
    let _ = shutdown_tx.send(true);
    if let Some(handle) = collector {
        handle.await?;
    }

    Ok(())
}
