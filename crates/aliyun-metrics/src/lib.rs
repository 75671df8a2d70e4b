pub mod handlers;
pub mod metrics;
pub mod router;

pub use metrics::{
    CollectStatus, Collector, ConstSample, MetricDescriptor, MetricsRegistry, SampleSink,
    ScrapeMetrics, ScrapeStage,
};
pub use router::{ExporterState, exporter_router};
