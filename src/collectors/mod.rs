pub mod org;

use crate::errors::SampleError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Channel a collector streams its samples into during one scrape.
pub type SampleSender = mpsc::UnboundedSender<Sample>;
pub type SampleReceiver = mpsc::UnboundedReceiver<Sample>;

pub fn sample_channel() -> (SampleSender, SampleReceiver) {
    mpsc::unbounded_channel()
}

#[async_trait]
pub trait Collector: Send + Sync {
    /// name of the collector as used in the `collector` label
    fn name(&self) -> &'static str;

    /// push every descriptor this collector can ever emit, in fixed order.
    /// Must not perform I/O.
    fn describe(&self, out: &mut Vec<Descriptor>);

    /// fetch live data and stream the resulting samples. Failures are
    /// absorbed here; the scrape completes once this returns.
    async fn collect(&self, out: SampleSender);
}

/// Static definition of one exposed gauge family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

impl Descriptor {
    pub const fn new(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self { name, help, labels }
    }
}

/// One gauge observation for a single scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    descriptor: Descriptor,
    label_values: Vec<String>,
    value: f64,
}

impl Sample {
    /// Build a sample, rejecting label values that don't line up with the
    /// descriptor's label names.
    pub fn gauge(
        descriptor: Descriptor,
        value: f64,
        label_values: Vec<String>,
    ) -> Result<Self, SampleError> {
        if label_values.len() != descriptor.labels.len() {
            return Err(SampleError::LabelMismatch {
                metric: descriptor.name,
                expected: descriptor.labels.len(),
                got: label_values.len(),
            });
        }
        Ok(Self {
            descriptor,
            label_values,
            value,
        })
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// (label name, label value) pairs in declaration order.
    pub fn labels(&self) -> Vec<(&'static str, &str)> {
        self.descriptor
            .labels
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
            .collect()
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}
