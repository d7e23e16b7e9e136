//! nutridash command line interface.
//!
//! The interactive surface of the dashboard: pick a fetch strategy and a
//! country, render the four summary charts, and optionally persist or
//! reload aggregated summaries. Every recoverable failure prints a message
//! and leaves the session usable; only configuration or connection-setup
//! problems exit non-zero.

use clap::{Parser, Subcommand, ValueEnum};

use nutridash_core::{CountryCatalog, ResolvedCountry};
use nutridash_fetch::{fetch_products, FetchStrategy, TracingProgress};

mod render;
mod session;

use session::Session;

#[derive(Debug, Parser)]
#[command(name = "nutridash")]
#[command(about = "Food products dashboard: fetch, aggregate, persist")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Paginated search-API crawl.
    Api,
    /// Streaming filter of the local compressed dump.
    Dump,
    /// Batch filter of the remote columnar snapshot.
    Columnar,
}

impl From<StrategyArg> for FetchStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Api => FetchStrategy::Api,
            StrategyArg::Dump => FetchStrategy::BulkDump,
            StrategyArg::Columnar => FetchStrategy::Columnar,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the selectable country names.
    Countries,
    /// Fetch products for a country and render the four summary charts.
    Fetch {
        #[arg(long, value_enum)]
        strategy: StrategyArg,
        #[arg(long)]
        country: String,
        /// Persist the aggregated summary after a successful fetch.
        #[arg(long)]
        save: bool,
    },
    /// List saved summaries, most recent first.
    List,
    /// Reload a saved summary by its display name and render it.
    Show { display_name: String },
    /// Delete a saved summary by its display name.
    Delete { display_name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = nutridash_core::load_app_config_from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Countries => {
            let catalog = CountryCatalog::new();
            for name in catalog.display_names() {
                println!("{name}");
            }
        }
        Commands::Fetch {
            strategy,
            country,
            save,
        } => {
            let catalog = CountryCatalog::new();
            let Some(resolved) = catalog.resolve(&country) else {
                println!("unknown country \"{country}\"; run `nutridash countries` for the list");
                return Ok(());
            };
            run_fetch(strategy.into(), resolved, &config, save).await;
        }
        Commands::List => match connect(&config).await {
            Ok(pool) => run_list(&pool).await,
            Err(message) => println!("{message}"),
        },
        Commands::Show { display_name } => match connect(&config).await {
            Ok(pool) => run_show(&pool, &display_name).await,
            Err(message) => println!("{message}"),
        },
        Commands::Delete { display_name } => match connect(&config).await {
            Ok(pool) => run_delete(&pool, &display_name).await,
            Err(message) => println!("{message}"),
        },
    }

    Ok(())
}

/// One fetch-and-render cycle, with an optional save at the end.
async fn run_fetch(
    strategy: FetchStrategy,
    country: &ResolvedCountry,
    config: &nutridash_core::AppConfig,
    save: bool,
) {
    let mut session = Session::new();
    let outcome = fetch_products(strategy, country, config, &TracingProgress).await;

    for message in &outcome.messages {
        println!("{message}");
    }
    if outcome.is_empty() {
        return;
    }

    session.set_products(&country.display_name, outcome.products);
    if let Some(aggregation) = session.aggregation() {
        println!(
            "{} products for {}",
            session.products().len(),
            country.display_name
        );
        println!("{}", render::render(aggregation));
    }

    if save {
        save_session(&session, config).await;
    }
}

/// Persists the current session; failure is reported and the session is
/// left unchanged.
async fn save_session(session: &Session, config: &nutridash_core::AppConfig) {
    let (Some(country), Some(captured_at)) = (session.country(), session.captured_at()) else {
        println!("nothing to save");
        return;
    };
    let pool = match connect(config).await {
        Ok(pool) => pool,
        Err(message) => {
            println!("{message}");
            return;
        }
    };
    match nutridash_db::save_summary(&pool, country, captured_at, session.products()).await {
        Ok(row) => println!("saved \"{}\"", row.display_name),
        Err(err) => println!("save failed: {err}"),
    }
}

async fn run_list(pool: &sqlx::PgPool) {
    match nutridash_db::list_summaries(pool).await {
        Ok(rows) if rows.is_empty() => println!("no saved summaries"),
        Ok(rows) => {
            for row in rows {
                println!("{}", row.display_name);
            }
        }
        Err(err) => println!("list failed: {err}"),
    }
}

async fn run_show(pool: &sqlx::PgPool, display_name: &str) {
    match nutridash_db::load_summary(pool, display_name).await {
        Ok(Some(row)) => match row.aggregation() {
            Ok(aggregation) => {
                let mut session = Session::new();
                session.set_loaded(&row.country, aggregation, row.captured_at);
                println!(
                    "{} ({} products, saved {})",
                    row.country,
                    row.total_products,
                    row.captured_at.format("%Y-%m-%d %H:%M")
                );
                if let Some(aggregation) = session.aggregation() {
                    println!("{}", render::render(aggregation));
                }
            }
            Err(err) => println!("could not decode saved summary: {err}"),
        },
        Ok(None) => println!("no saved summary named \"{display_name}\""),
        Err(err) => println!("load failed: {err}"),
    }
}

async fn run_delete(pool: &sqlx::PgPool, display_name: &str) {
    match nutridash_db::delete_summary(pool, display_name).await {
        Ok(true) => println!("deleted \"{display_name}\""),
        Ok(false) => println!("no saved summary named \"{display_name}\""),
        Err(err) => println!("delete failed: {err}"),
    }
}

/// Connects to the summary store and runs pending migrations.
///
/// A missing `DATABASE_URL` or a connection failure is a user-facing
/// message, not a session-fatal error.
async fn connect(config: &nutridash_core::AppConfig) -> Result<sqlx::PgPool, String> {
    let Some(database_url) = &config.database_url else {
        return Err("persistence is disabled: DATABASE_URL is not set".to_owned());
    };
    let pool_config = nutridash_db::PoolConfig::from_app_config(config);
    let pool = nutridash_db::connect_pool(database_url, pool_config)
        .await
        .map_err(|err| format!("could not connect to the summary store: {err}"))?;
    nutridash_db::run_migrations(&pool)
        .await
        .map_err(|err| format!("migration failed: {err}"))?;
    Ok(pool)
}
