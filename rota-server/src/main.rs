//! Rota - pull request reviewer assignment service

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rota_core::config::CliOverrides;
use rota_core::Config;
use rota_db::Database;
use rota_server::{router, AppState};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Rota: assigns pull request reviewers by open review load
#[derive(Parser, Debug)]
#[command(name = "rota")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/rota/config.toml)
    #[arg(short, long, global = true, env = "ROTA_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config and env)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port to listen on (overrides config and env)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// SQLite database file (overrides config and env)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create or upgrade the database schema and exit
    Migrate,

    /// Show current configuration
    Config,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let overrides = CliOverrides {
        host: cli.host.clone(),
        port: cli.port,
        db_path: cli.db_path.clone(),
    };
    let config = Config::load_with_overrides(cli.config.as_deref(), overrides)?;

    if cli.verbose {
        info!(
            address = %config.server.bind_address(),
            db_path = %config.database.path.display(),
            tie_break = %config.assignment.tie_break,
            "Configuration loaded"
        );
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config).await?,
        Commands::Migrate => {
            let db = Database::connect(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;
            db.close().await;
            println!("Database ready at {}", config.database.path.display());
        }
        Commands::Config => print_config(&config, cli.config.as_deref()),
        Commands::Version => {
            println!("rota {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let db = Database::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    let app = router(AppState::from_database(&db, &config.assignment));

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!(%address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

fn print_config(config: &Config, explicit_path: Option<&std::path::Path>) {
    println!("Rota Configuration");
    println!("==================");
    println!();
    println!("Server:");
    println!("  address: {}", config.server.bind_address());
    println!();
    println!("Database:");
    println!("  path: {}", config.database.path.display());
    println!("  max_connections: {}", config.database.max_connections);
    println!("  connect_attempts: {}", config.database.connect_attempts);
    println!();
    println!("Assignment:");
    println!("  tie_break: {}", config.assignment.tie_break);
    println!();

    let path = explicit_path
        .map(|p| p.to_path_buf())
        .or_else(Config::default_config_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
}
