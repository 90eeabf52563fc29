use anyhow::Context;
use bankflow_application::ConsentFlowService;
use bankflow_infrastructure::{FsAccountDataStore, SettingsService};
use bankflow_interaction::{ReqwestTransport, RetryPolicy};
use bankflow_web::{AppState, create_router};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bankflow", version, about = "Open banking account data demo")]
struct Args {
    /// Settings file; defaults to ./settings.toml, then the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured listen host
    #[arg(long)]
    host: Option<String>,

    /// Overrides the configured listen port
    #[arg(long)]
    port: Option<u16>,

    /// Used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut settings = SettingsService::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(missing) = settings.readiness() {
        tracing::warn!("{}", missing.user_message());
    }

    let retry = RetryPolicy::fixed(
        settings.max_retries,
        Duration::from_millis(settings.retry_backoff_ms),
    )
    .with_non_idempotent(settings.retry_non_idempotent);
    let mut transport = ReqwestTransport::builder().retry_policy(retry);
    if let Some(timeout) = settings.request_timeout() {
        transport = transport.timeout(timeout);
    }
    let transport = Arc::new(transport.build()?);

    let store = Arc::new(FsAccountDataStore::new(settings.output_dir.clone()));
    let settings = Arc::new(settings);
    let flows = Arc::new(ConsentFlowService::new(
        settings.clone(),
        transport,
        store.clone(),
    ));
    tracing::info!(end_user_id = flows.end_user_id(), "Consent flow service ready");

    let app = create_router(AppState::new(flows, store)?);
    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("Listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}
