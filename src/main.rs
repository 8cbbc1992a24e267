//! Antigravity proxy
//!
//! An intercepting HTTP(S) proxy that swaps the API key on requests to the
//! Gemini API for one loaded from Secret Manager or the environment.
//!
//! # Architecture Overview
//!
//! ```text
//!   client ──HTTP_PROXY──▶ http::server ──▶ http::handler ──▶ upstream API
//!                          (CONNECT, TLS     │
//!                           via net::tls)    ▼
//!                                  interception::Interceptor
//!                                  (header / query rewrite, logs)
//!                                            │
//!                                            ▼
//!                                  observability::StatsRegistry ──▶ GET /metrics
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use antigravity_proxy::config::{load_config, ConfigError, LogFormat, ProxyConfig};
use antigravity_proxy::lifecycle::startup;
use antigravity_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "antigravity-proxy", version, about = "Credential-substituting HTTPS proxy")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proxy listen address (overrides listener.bind_address).
    #[arg(long)]
    listen: Option<String>,

    /// Metrics endpoint port.
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Disable the metrics endpoint.
    #[arg(long)]
    no_metrics: bool,

    /// Host whose requests get the credential rewritten.
    #[arg(long)]
    target_host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn apply(self, config: &mut ProxyConfig) {
        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if let Some(port) = self.metrics_port {
            config.observability.metrics_port = port;
        }
        if self.no_metrics {
            config.observability.metrics_enabled = false;
        }
        if let Some(host) = self.target_host {
            config.interception.target_host = host;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if self.log_json {
            config.observability.log_format = LogFormat::Json;
        }
    }
}

fn load(cli: Cli) -> Result<ProxyConfig, ConfigError> {
    let path = cli.config.clone();
    load_config(path.as_deref(), |config| cli.apply(config))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = match load(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level, config.observability.log_format);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "antigravity-proxy starting");

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_file_values() {
        let cli = Cli::parse_from([
            "antigravity-proxy",
            "--listen",
            "127.0.0.1:9999",
            "--metrics-port",
            "9191",
            "--target-host",
            "example.com",
            "--log-json",
        ]);
        let mut config = ProxyConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.observability.metrics_port, 9191);
        assert_eq!(config.interception.target_host, "example.com");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn no_metrics_flag_disables_endpoint() {
        let cli = Cli::parse_from(["antigravity-proxy", "--no-metrics"]);
        let mut config = ProxyConfig::default();
        cli.apply(&mut config);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let cli = Cli::parse_from(["antigravity-proxy", "--listen", "not-an-address"]);
        assert!(matches!(load(cli), Err(ConfigError::Validation(_))));
    }
}
