use anyhow::Context;
use clap::Parser;
use entity_exporter::client::GithubClient;
use entity_exporter::collectors::org::OrgCollector;
use entity_exporter::collectors::Collector;
use entity_exporter::config::Config;
use entity_exporter::exporter::Exporter;
use entity_exporter::metrics::RequestMetrics;
use entity_exporter::{logging, server};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::init(&config.log_level, config.json_logs)?;

    // Print the catalog without touching the network
    if config.list_metrics {
        for descriptor in OrgCollector::catalog() {
            println!(
                "{}\tgauge\t{}\t{}",
                descriptor.name,
                descriptor.labels.join(","),
                descriptor.help
            );
        }
        return Ok(());
    }

    config.validate().context("invalid configuration")?;

    let metrics = RequestMetrics::new();
    let mut exporter = Exporter::new(metrics.clone());
    if config.collector_org {
        let client = GithubClient::new(&config.api_url, config.token.clone())
            .context("failed to build API client")?;
        let org = OrgCollector::new(
            Arc::new(client),
            metrics.failures.clone(),
            metrics.duration.clone(),
            config.target(),
        );
        info!(orgs = ?config.org_names(), "enabled {} collector", org.name());
        exporter.register(Box::new(org))?;
    }

    let listener = TcpListener::bind(&config.web_address)
        .await
        .with_context(|| format!("failed to bind {}", config.web_address))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        web_path = %config.web_path,
        api_url = %config.api_url,
        timeout_ms = config.request_timeout_ms,
        "starting entity exporter"
    );

    server::serve(listener, server::router(Arc::new(exporter), &config.web_path)).await
}
