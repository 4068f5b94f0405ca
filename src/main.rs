//! OAuth relay
//!
//! Main entry point for the relay server.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oauth_relay::cli::Cli;
use oauth_relay::config::Config;
use oauth_relay::server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose, cli.json_logs);

    let config_path = cli.config.as_deref().unwrap_or("config/relay.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    tracing::info!(
        port = config.server.port,
        allowed_origin = %config.server.allowed_origin,
        notifier = %config.notifier.callback_url,
        "Starting OAuth relay"
    );

    server::serve(config).await
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "oauth_relay=debug,tower_http=debug"
    } else {
        "oauth_relay=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
