use super::{Collector, Descriptor, Sample, SampleSender};
use crate::client::{Organization, OrganizationSource};
use crate::config::Target;
use crate::errors::FetchError;
use crate::metrics::{CollectorLabels, DurationHistogram, FailureCounter};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, warn};

pub const ORG_COLLECTOR: &str = "org";

const LABELS: &[&str] = &["name"];

/// Pulls a metric value out of a record; `None` means "no sample this scrape".
type Extract = fn(&Organization) -> Option<f64>;

/// One row of the field-to-metric mapping table.
struct FieldMetric {
    descriptor: Descriptor,
    extract: Extract,
}

impl FieldMetric {
    fn new(name: &'static str, help: &'static str, extract: Extract) -> Self {
        Self {
            descriptor: Descriptor::new(name, help, LABELS),
            extract,
        }
    }
}

fn count(value: Option<i64>) -> Option<f64> {
    value.map(|v| v as f64)
}

fn field_metrics() -> Vec<FieldMetric> {
    vec![
        FieldMetric::new(
            "entity_public_repos",
            "Number of public repositories from org",
            |o| count(o.public_repos),
        ),
        FieldMetric::new(
            "entity_public_gists",
            "Number of public gists from org",
            |o| count(o.public_gists),
        ),
        FieldMetric::new(
            "entity_private_gists",
            "Number of private gists from org",
            |o| count(o.private_gists),
        ),
        FieldMetric::new(
            "entity_followers",
            "Number of followers for org",
            |o| count(o.followers),
        ),
        FieldMetric::new(
            "entity_following",
            "Number of following other users by org",
            |o| count(o.following),
        ),
        FieldMetric::new(
            "entity_collaborators",
            "Number of collaborators within org",
            |o| count(o.collaborators),
        ),
        FieldMetric::new(
            "entity_disk_usage",
            "Used diskspace by the org",
            |o| count(o.disk_usage),
        ),
        FieldMetric::new(
            "entity_private_repos_total",
            "Total amount of private repositories",
            |o| count(o.total_private_repos),
        ),
        FieldMetric::new(
            "entity_private_repos_owned",
            "Owned private repositories by org",
            |o| count(o.owned_private_repos),
        ),
        FieldMetric::new(
            "entity_create_timestamp",
            "Timestamp of the creation of org",
            |o| Some(o.created_at.timestamp() as f64),
        ),
        FieldMetric::new(
            "entity_updated_timestamp",
            "Timestamp of the last modification of org",
            |o| Some(o.updated_at.timestamp() as f64),
        ),
    ]
}

/// Collects organization account metadata on every scrape.
pub struct OrgCollector {
    client: Arc<dyn OrganizationSource>,
    failures: FailureCounter,
    duration: DurationHistogram,
    target: Target,
    fields: Vec<FieldMetric>,
}

impl OrgCollector {
    pub fn new(
        client: Arc<dyn OrganizationSource>,
        failures: FailureCounter,
        duration: DurationHistogram,
        target: Target,
    ) -> Self {
        // expose the series at 0 before the first failure happens
        let _ = failures.get_or_create(&CollectorLabels::new(ORG_COLLECTOR));

        Self {
            client,
            failures,
            duration,
            target,
            fields: field_metrics(),
        }
    }

    /// The descriptor catalog, available without a client or target.
    pub fn catalog() -> Vec<Descriptor> {
        field_metrics().into_iter().map(|f| f.descriptor).collect()
    }

    /// Every descriptor, in exposition order. Used for documentation output.
    pub fn metrics(&self) -> Vec<Descriptor> {
        self.fields.iter().map(|f| f.descriptor).collect()
    }

    /// One fetch bounded by its own deadline; the timer is dropped with the
    /// future on every exit path.
    async fn fetch(&self, name: &str) -> Result<Organization, FetchError> {
        match timeout(self.target.timeout, self.client.get_organization(name)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                name: name.to_string(),
                timeout_ms: self.target.timeout.as_millis() as u64,
            }),
        }
    }

    /// Map a record onto samples. Returns false once the receiver is gone.
    fn emit(&self, name: &str, record: &Organization, out: &SampleSender) -> bool {
        for field in &self.fields {
            let Some(value) = (field.extract)(record) else {
                continue;
            };

            match Sample::gauge(field.descriptor, value, vec![name.to_string()]) {
                Ok(sample) => {
                    if out.send(sample).is_err() {
                        return false;
                    }
                }
                Err(e) => warn!(collector = ORG_COLLECTOR, error = %e, "dropping sample"),
            }
        }
        true
    }
}

#[async_trait]
impl Collector for OrgCollector {
    fn name(&self) -> &'static str {
        ORG_COLLECTOR
    }

    fn describe(&self, out: &mut Vec<Descriptor>) {
        out.extend(self.fields.iter().map(|f| f.descriptor));
    }

    async fn collect(&self, out: SampleSender) {
        let labels = CollectorLabels::new(ORG_COLLECTOR);

        for name in &self.target.orgs {
            let started = Instant::now();
            let result = self.fetch(name).await;
            self.duration
                .get_or_create(&labels)
                .observe(started.elapsed().as_secs_f64());

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    error!(
                        collector = ORG_COLLECTOR,
                        name = %name,
                        error = %e,
                        "Failed to fetch org"
                    );
                    self.failures.get_or_create(&labels).inc();
                    continue;
                }
            };

            if !self.emit(name, &record, &out) {
                debug!(collector = ORG_COLLECTOR, "sample receiver dropped, stopping scrape");
                return;
            }
        }
    }
}
