use anyhow::{Context, Result};
use clap::Parser;
use pollroom_core::{AppState, PollCatalog, RoomRegistry};
use pollroom_ws::OriginPolicy;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pollroom=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;

    // CLI flags override the config file
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(path) = args.catalog {
        config.catalog.path = Some(path);
    }
    if let Ok(raw) = std::env::var(config::ALLOWED_ORIGINS_ENV) {
        config.add_allowed_origins(&raw);
    }

    let (catalog, catalog_source) = match config.catalog.path.as_deref() {
        Some(path) => (
            PollCatalog::load(path).with_context(|| format!("loading poll catalog {}", path))?,
            path.to_string(),
        ),
        None => (PollCatalog::builtin(), "builtin".to_string()),
    };
    let poll_count = catalog.polls.len();

    let rooms = RoomRegistry::new(catalog, config.gateway.broadcast_capacity)?
        .with_idle_ttl(config.room_idle_ttl());
    let app_config = config.app_config();
    for origin in OriginPolicy::new(&app_config).ignored() {
        tracing::warn!(%origin, "ignoring allowed origin; expected scheme://host[:port]");
    }
    let state = AppState::new(rooms, app_config);

    let app = pollroom_ws::gateway_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("binding {}", config.server.bind_address))?;

    print_startup_banner(
        &config.server.bind_address,
        &config.server.public_url,
        &catalog_source,
        poll_count,
    );

    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        println!();
        tracing::info!("Shutting down...");
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn print_startup_banner(
    bind_address: &str,
    public_url: &Option<String>,
    catalog_source: &str,
    poll_count: usize,
) {
    println!();
    println!("  pollroom");
    println!();
    println!("  Listening:   http://{}", bind_address);
    println!("  Rooms:       ws://{}/rooms/<room>", bind_address);
    if let Some(url) = public_url {
        println!("  Public URL:  {}", url);
    }
    println!("  Catalog:     {} ({} polls)", catalog_source, poll_count);
    println!();
}
