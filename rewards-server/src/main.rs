use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::{Parser, Subcommand};
use common::db::{stats, Database};
use config::Config;
use routes::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod error;
mod routes;
mod security;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Apply pending migrations before accepting requests
        #[clap(long)]
        migrate: bool,
    },

    /// Apply pending migrations and exit
    Migrate,

    /// Report users whose credited earnings differ from their answer history
    Reconcile,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = Database::connect(&config.database).await?;

    let result = match cli.command {
        Commands::Serve { migrate } => serve(&db, config, migrate).await,
        Commands::Migrate => db.migrate().await.map_err(Into::into),
        Commands::Reconcile => reconcile(&db).await,
    };

    db.close().await;
    result
}

async fn serve(db: &Database, config: Config, migrate: bool) -> anyhow::Result<()> {
    if migrate {
        db.migrate().await?;
    }

    let address = config.server_address();
    let allowed_origins = config.allowed_origins.clone();
    let app_state = web::Data::new(AppState {
        pool: db.pool().clone(),
        config,
    });

    info!("Starting HTTP server on {}", address);
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .wrap(security::configure_cors(&allowed_origins))
            .configure(routes::configure)
    })
    .bind(&address)?
    .run()
    .await?;

    Ok(())
}

async fn reconcile(db: &Database) -> anyhow::Result<()> {
    let drift = stats::find_unreconciled(db.pool()).await?;

    if drift.is_empty() {
        info!("All user earnings reconcile with their answer history");
        return Ok(());
    }

    for row in &drift {
        warn!(
            user_id = row.user_id,
            credited = %row.credited,
            earned = %row.earned,
            "Earnings out of balance"
        );
    }
    anyhow::bail!("{} user(s) have unreconciled earnings", drift.len())
}
