use std::sync::Arc;

use async_trait::async_trait;

use crate::metrics::types::{ConstSample, MetricDescriptor};

/// Receives samples as a collector produces them.
pub trait SampleSink: Send {
    fn emit(&mut self, sample: ConstSample);
}

impl SampleSink for Vec<ConstSample> {
    fn emit(&mut self, sample: ConstSample) {
        self.push(sample);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectStatus {
    Complete,
    /// Some samples were emitted before the cycle stopped.
    Partial,
    Failed,
}

impl CollectStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// A source of metrics that are fetched fresh on every scrape.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &str;

    /// Static descriptor list. Must not block or touch the network.
    fn describe(&self) -> Vec<Arc<MetricDescriptor>>;

    async fn collect(&self, sink: &mut dyn SampleSink) -> CollectStatus;
}
