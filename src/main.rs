//! Binary-market keeper entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use poly_market_keeper::clob::ClobClient;
use poly_market_keeper::config::Config;
use poly_market_keeper::keeper::Keeper;
use poly_market_keeper::market::PriceFeed;
use poly_market_keeper::metrics;
use poly_market_keeper::orderbook::OrderBookManager;
use poly_market_keeper::strategy::Strategy;
use poly_market_keeper::utils::shutdown_signal;

/// Delay between starting the refresh worker and the first tick, so the
/// first synchronization sees a populated snapshot.
const STARTUP_DELAY: Duration = Duration::from_secs(5);

/// Market-making keeper for binary outcome markets.
#[derive(Parser, Debug)]
#[command(name = "poly-market-keeper")]
#[command(about = "Automated market-making keeper for binary outcome markets on a CLOB")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the keeper loop (default).
    Run,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("poly_market_keeper=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::Run) | None => cmd_run().await,
    }
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("MARKET KEEPER - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Loading strategy config... ");
    let kind = config.strategy_kind().map_err(|e| anyhow::anyhow!(e))?;
    match Strategy::load(kind, &config.strategy_config) {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Strategy config invalid"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Condition ID: {}", config.condition_id);
    println!("  CLOB API: {}", config.clob_api_url);
    println!("  Strategy: {}", config.strategy);
    println!("  Strategy Config: {}", config.strategy_config.display());
    println!("  Sync Interval: {}s", config.sync_interval_secs);
    println!("  Refresh Interval: {}s", config.refresh_interval_secs);
    println!("  Metrics Port: {}", config.metrics_port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the keeper loop.
async fn cmd_run() -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()?;
    metrics::init_metrics();
    info!("Metrics exporter listening on {}", metrics_addr);

    let kind = config.strategy_kind().map_err(|e| anyhow::anyhow!(e))?;
    let strategy = Strategy::load(kind, &config.strategy_config)?;

    let client = Arc::new(ClobClient::connect(&config).await?);
    let market = client.get_market(&config.condition_id).await?;
    info!(
        condition_id = %market.condition_id,
        token_a = %market.token_a_id,
        token_b = %market.token_b_id,
        "Market resolved"
    );

    let manager = Arc::new(OrderBookManager::new(
        Arc::clone(&client),
        market.clone(),
        Duration::from_secs(config.refresh_interval_secs),
    ));
    manager.start();

    let feed = PriceFeed::new(Arc::clone(&client), market);
    let keeper = Keeper::new(Arc::clone(&manager), feed, strategy);

    info!("========================================");
    info!("MARKET KEEPER STARTED");
    info!("========================================");
    info!("Strategy: {}", config.strategy);
    info!("Sync interval: {}s", config.sync_interval_secs);
    info!("========================================");

    tokio::time::sleep(STARTUP_DELAY).await;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.sync_interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let actions = keeper.synchronize().await;
                if actions > 0 {
                    info!(actions, "Tick complete");
                }
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    keeper.shutdown().await;
    info!("Keeper stopped");

    Ok(())
}
