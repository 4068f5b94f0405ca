//! Command-line interface definition for the OAuth relay
//!
//! The relay has a single job, so there are no subcommands; flags only
//! adjust where configuration comes from and how logs are emitted.

use clap::Parser;

/// OAuth relay - hands a Google sign-in to a local desktop application
///
/// Runs the web server that drives the Google consent flow, forwards the
/// resulting bearer token to the desktop listener, and answers identity
/// lookups for that token.
#[derive(Parser, Debug, Clone)]
#[command(name = "oauth-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/relay.yaml")]
    pub config: Option<String>,

    /// Port to listen on (overrides config and OAUTH_RELAY_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/relay.yaml".to_string()),
            port: None,
            verbose: false,
            json_logs: false,
        }
    }
}
