use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webhook_relay::application::relay::RelayPolicy;
use webhook_relay::config::{Config, LogFormat};
use webhook_relay::domain::ports::{DeliveryPortBox, SignatureVerifierBox};
use webhook_relay::infrastructure::http_delivery::HttpDeliveryAdapter;
use webhook_relay::infrastructure::in_memory::InMemoryDeliveryPort;
use webhook_relay::infrastructure::signature::{ChecksumVerifier, NoVerification};
use webhook_relay::interfaces::http::{AppState, router};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on (overrides RELAY_BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Record events in memory instead of forwarding them to the destinations
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path).into_diagnostic()?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let config = Config::from_env().into_diagnostic()?;
    init_tracing(config.log_format);

    let port: DeliveryPortBox = if cli.dry_run {
        eprintln!(
            "WARNING: --dry-run set. Events are recorded in memory and not forwarded to any destination."
        );
        Box::new(InMemoryDeliveryPort::new())
    } else {
        Box::new(HttpDeliveryAdapter::new(&config.delivery).into_diagnostic()?)
    };

    let verifier: SignatureVerifierBox = match &config.events_secret {
        Some(secret) => Box::new(ChecksumVerifier::new(secret.clone())),
        None => {
            warn!("WOMPI_EVENTS_SECRET not set, inbound event checksums will not be verified");
            Box::new(NoVerification)
        }
    };

    let relay = RelayPolicy::new(port).with_attempt_timeout(config.delivery.attempt_budget());
    let app = router(AppState::new(relay, verifier));

    let addr = cli.bind.unwrap_or(config.bind_addr);
    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    info!(
        %addr,
        primary = %config.delivery.primary_url,
        secondary = %config.delivery.secondary_url,
        "Webhook relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("Webhook relay stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "webhook_relay=info,tower_http=info".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
