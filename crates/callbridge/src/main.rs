use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use callbridge::api::{self, AppState, DialPlan};
use callbridge::gateway::{HttpMediaSessionGateway, HttpTelephonyGateway};
use callbridge::types::RoomName;
use callbridge::{AppConfig, CallOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "callbridge")]
#[command(about = "Bridges browser media sessions with outbound PSTN calls")]
#[command(version)]
struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, env = "CALLBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, env = "CALLBRIDGE_VERBOSE")]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_logging(&config, cli.verbose, cli.json);
    config.validate().context("validating configuration")?;

    let timeout = config.request_timeout();
    let media = HttpMediaSessionGateway::new(&config.media.base_url, config.media_auth(), timeout)
        .context("creating media-session client")?;
    let telephony =
        HttpTelephonyGateway::new(&config.telephony.base_url, config.telephony_auth(), timeout)
            .context("creating telephony client")?;

    let orchestrator_config = config.orchestrator();
    let answer_url = orchestrator_config.answer_url(&RoomName::default());
    let orchestrator = Arc::new(CallOrchestrator::new(
        orchestrator_config,
        Arc::new(media),
        Arc::new(telephony),
    ));
    let state = AppState::new(
        orchestrator,
        DialPlan {
            from_number: config.telephony.from_number.clone(),
            to_number: config.telephony.to_number.clone(),
        },
    );

    if let Some(dir) = &config.server.static_dir {
        if !dir.is_dir() {
            warn!("Static directory does not exist: {}", dir.display());
        }
    }
    let app = api::create_router_with_static(state, config.server.static_dir.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .context("parsing bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    info!("Starting callbridge on {}", addr);
    info!("Answer callbacks expected at {}", answer_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running server")?;

    info!("Server stopped");
    Ok(())
}

fn init_logging(config: &AppConfig, verbose: bool, json: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("callbridge={level},tower_http={level}")));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .ok();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
