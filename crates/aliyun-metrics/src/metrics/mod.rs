pub mod collector;
pub mod collectors;
pub mod registry;
pub mod types;

pub use collector::{CollectStatus, Collector, SampleSink};
pub use collectors::scrape::{ScrapeMetrics, ScrapeStage};
pub use registry::{CounterMetric, GaugeMetric, HistogramMetric, MetricsRegistry};
pub use types::{ConstSample, MetricDescriptor, MetricType, MetricValue};
