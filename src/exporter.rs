//! Ties collectors to the OpenMetrics exposition.
//!
//! Each call to [`Exporter::gather`] runs every registered collector to
//! completion, keeps the samples that match a described metric and encodes
//! them together with the shared request instruments.

use crate::collectors::{sample_channel, Collector, Descriptor, Sample};
use crate::errors::ExporterError;
use crate::metrics::RequestMetrics;
use prometheus_client::collector::Collector as EncodeCollector;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric};
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::metrics::MetricType;
use prometheus_client::registry::Registry;
use tracing::{debug, warn};

struct Registered {
    collector: Box<dyn Collector>,
    descriptors: Vec<Descriptor>,
}

pub struct Exporter {
    collectors: Vec<Registered>,
    metrics: RequestMetrics,
}

impl Exporter {
    pub fn new(metrics: RequestMetrics) -> Self {
        Self {
            collectors: Vec::new(),
            metrics,
        }
    }

    /// Register a collector after checking its descriptors don't clash with
    /// anything already exposed.
    pub fn register(&mut self, collector: Box<dyn Collector>) -> Result<(), ExporterError> {
        let mut descriptors = Vec::new();
        collector.describe(&mut descriptors);

        let mut taken: Vec<&str> = RequestMetrics::names().to_vec();
        taken.extend(self.descriptors().map(|d| d.name));
        for descriptor in &descriptors {
            if taken.contains(&descriptor.name) {
                return Err(ExporterError::DuplicateMetric {
                    name: descriptor.name,
                    collector: collector.name(),
                });
            }
            taken.push(descriptor.name);
        }

        debug!(
            collector = collector.name(),
            metrics = descriptors.len(),
            "registered collector"
        );
        self.collectors.push(Registered {
            collector,
            descriptors,
        });
        Ok(())
    }

    /// Every registered descriptor, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.collectors.iter().flat_map(|r| r.descriptors.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Run one scrape across all collectors.
    pub async fn scrape(&self) -> Snapshot {
        let mut families: Vec<SampleFamily> = self
            .descriptors()
            .map(|descriptor| SampleFamily {
                descriptor: *descriptor,
                samples: Vec::new(),
            })
            .collect();

        for registered in &self.collectors {
            let (tx, mut rx) = sample_channel();
            registered.collector.collect(tx).await;

            while let Some(sample) = rx.recv().await {
                match families
                    .iter_mut()
                    .find(|f| f.descriptor == *sample.descriptor())
                {
                    Some(family) => family.samples.push(sample),
                    None => warn!(
                        collector = registered.collector.name(),
                        metric = sample.descriptor().name,
                        "dropping sample for undescribed metric"
                    ),
                }
            }
        }

        Snapshot { families }
    }

    /// Scrape and render the full exposition in OpenMetrics text format.
    pub async fn gather(&self) -> Result<String, ExporterError> {
        let snapshot = self.scrape().await;

        let mut registry = Registry::default();
        self.metrics.register(&mut registry);
        registry.register_collector(Box::new(snapshot));

        let mut buffer = String::new();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }
}

#[derive(Debug)]
struct SampleFamily {
    descriptor: Descriptor,
    samples: Vec<Sample>,
}

/// Samples gathered during one scrape, grouped per descriptor.
#[derive(Debug)]
pub struct Snapshot {
    families: Vec<SampleFamily>,
}

impl Snapshot {
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.families.iter().flat_map(|f| f.samples.iter())
    }

    pub fn len(&self) -> usize {
        self.families.iter().map(|f| f.samples.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EncodeCollector for Snapshot {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        // families without samples this scrape are left out entirely
        for family in self.families.iter().filter(|f| !f.samples.is_empty()) {
            let mut metric_encoder = encoder.encode_descriptor(
                family.descriptor.name,
                family.descriptor.help,
                None,
                MetricType::Gauge,
            )?;
            for sample in &family.samples {
                let labels = sample.labels();
                let gauge = ConstGauge::new(sample.value());
                gauge.encode(metric_encoder.encode_family(&labels)?)?;
            }
        }
        Ok(())
    }
}
