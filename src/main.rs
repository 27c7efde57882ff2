use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ppserver::api::{self, AppState, PageLinks, PageRenderer, RateLimiter};
use ppserver::config::AppConfig;
use ppserver::db::Database;
use ppserver::store::CampaignStore;

#[derive(Parser)]
#[command(name = "ppserver")]
#[command(about = "Character roster and relationship graph for a pen & paper campaign")]
struct Cli {
    /// Config file (default: <config dir>/ppserver/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the roster page
    Serve {
        /// Port for HTTP, overrides the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the relationship graph as DOT
    Graph,
    /// Print the roster as an HTML table
    Roster,
    /// Drop all cached tables
    ClearCache,
}

/// Initialize tracing. Logs go to stderr so `graph`/`roster` output stays clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "ppserver=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_cache(config: &AppConfig) -> anyhow::Result<Database> {
    let db = Database::open(config.cache_path()?)?;
    db.migrate()?;
    Ok(db)
}

fn build_store(config: &AppConfig) -> anyhow::Result<CampaignStore> {
    let cache = open_cache(config)?;
    Ok(CampaignStore::new(
        config.table_source()?,
        Arc::new(cache),
        config.table_names(),
    )
    .with_fetch_timeout(config.fetch_timeout()))
}

async fn serve(config: AppConfig, port: u16) -> anyhow::Result<()> {
    let store = Arc::new(build_store(&config)?);
    if let Err(e) = store.reload(false).await {
        tracing::error!("Initial load failed, starting with an empty roster: {}", e);
    }

    let page = PageRenderer::new(
        PageLinks {
            character_sheet: config.characters.link(),
            relations_sheet: config.relations.link(),
        },
        &config.vis_js_url,
    )?;

    let limiter = RateLimiter::per_minute(config.reload_rate_limit)
        .trust_forwarded_headers(config.trust_proxy_headers);
    let mut state = AppState::new(store, page).with_reload_limiter(limiter.clone());
    if let Some(dir) = config.static_dir.clone() {
        state = state.with_static_dir(dir);
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("ppserver listening on http://127.0.0.1:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(config.port);
            serve(config, port).await?;
        }
        None => {
            let port = config.port;
            serve(config, port).await?;
        }
        Some(Commands::Graph) => {
            let store = build_store(&config)?;
            store.reload(false).await.context("Failed to load campaign")?;
            println!("{}", store.graph_document());
        }
        Some(Commands::Roster) => {
            let store = build_store(&config)?;
            store.reload(false).await.context("Failed to load campaign")?;
            println!("{}", store.roster_html());
        }
        Some(Commands::ClearCache) => {
            let cache = open_cache(&config)?;
            let removed = cache.clear_cache()?;
            println!("Cleared {} cached tables", removed);
        }
    }

    Ok(())
}
