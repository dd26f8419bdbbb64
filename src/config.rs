use crate::errors::ConfigError;
use clap::{ArgAction, Parser};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "entity_exporter", version, about)]
pub struct Config {
    /// Address to bind the metrics server.
    #[arg(long, env = "ENTITY_EXPORTER_WEB_ADDRESS", default_value = "0.0.0.0:9504")]
    pub web_address: String,

    /// Path to bind the metrics endpoint.
    #[arg(long, env = "ENTITY_EXPORTER_WEB_PATH", default_value = "/metrics")]
    pub web_path: String,

    /// Base URL of the REST API.
    #[arg(long, env = "ENTITY_EXPORTER_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Access token sent as bearer authorization, passed through unchanged.
    #[arg(long, env = "ENTITY_EXPORTER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Comma-separated list of organizations to scrape.
    #[arg(long, env = "ENTITY_EXPORTER_ORGS", value_delimiter = ',')]
    pub orgs: Vec<String>,

    /// Timeout for a single API request in milliseconds.
    #[arg(long, env = "ENTITY_EXPORTER_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    /// Enable the org collector.
    #[arg(
        long,
        env = "ENTITY_EXPORTER_COLLECTOR_ORG",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub collector_org: bool,

    /// Enable JSON structured logging.
    #[arg(long, env = "ENTITY_EXPORTER_JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, env = "ENTITY_EXPORTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Print the exported metric catalog and exit.
    #[arg(long, default_value_t = false)]
    pub list_metrics: bool,
}

/// Probe routes served next to the metrics endpoint.
const RESERVED_PATHS: [&str; 2] = ["/healthz", "/readyz"];

/// What a collector polls on every scrape. Fixed for the collector's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub orgs: Vec<String>,
    pub timeout: Duration,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Org names trimmed, blanks and repeats dropped, first occurrence order kept.
    pub fn org_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.orgs.len());
        for org in self.orgs.iter().map(|org| org.trim()) {
            if !org.is_empty() && !names.iter().any(|seen| seen == org) {
                names.push(org.to_string());
            }
        }
        names
    }

    pub fn target(&self) -> Target {
        Target {
            orgs: self.org_names(),
            timeout: self.request_timeout(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.web_path.starts_with('/') || RESERVED_PATHS.contains(&self.web_path.as_str()) {
            return Err(ConfigError::InvalidWebPath {
                path: self.web_path.clone(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.collector_org && self.org_names().is_empty() {
            return Err(ConfigError::MissingOrgs);
        }
        Ok(())
    }
}
