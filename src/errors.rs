use thiserror::Error;

//create types errors for easy testability

/// Failure to fetch one organization record. Absorbed per entity by the collector.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request for {name} failed: {source}")]
    Transport {
        name: String,
        source: reqwest::Error,
    },

    #[error("request for {name} returned HTTP {status}")]
    Status { name: String, status: u16 },

    #[error("failed to decode response for {name}: {source}")]
    Decode {
        name: String,
        source: serde_json::Error,
    },

    #[error("request for {name} timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SampleError {
    #[error("metric {metric} expects {expected} label values, got {got}")]
    LabelMismatch {
        metric: &'static str,
        expected: usize,
        got: usize,
    },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid API url {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("metric {name} from collector {collector} is already registered")]
    DuplicateMetric {
        name: &'static str,
        collector: &'static str,
    },

    #[error("failed to encode metrics: {0}")]
    Encode(#[from] std::fmt::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("org collector is enabled but no orgs are configured")]
    MissingOrgs,

    #[error("web path {path:?} must start with '/' and not shadow a probe route")]
    InvalidWebPath { path: String },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}
