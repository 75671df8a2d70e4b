use std::{sync::Arc, time::Duration};

use aliyun_common::error::Result;

use crate::metrics::registry::{CounterMetric, GaugeMetric, HistogramMetric, MetricsRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeStage {
    Inventory,
    Monitoring,
}

impl ScrapeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Monitoring => "monitoring",
        }
    }
}

/// Instrumentation the exporter keeps about its own scrape cycles.
pub struct ScrapeMetrics {
    scrape_duration_seconds: Arc<HistogramMetric>,
    scrape_errors_total: Arc<CounterMetric>,
    malformed_datapoints_total: Arc<CounterMetric>,
    last_scrape_success: Arc<GaugeMetric>,
    samples_emitted: Arc<GaugeMetric>,
}

impl ScrapeMetrics {
    pub fn register(registry: &MetricsRegistry) -> Result<Self> {
        Ok(Self {
            scrape_duration_seconds: registry.register_histogram(
                "aliyun_exporter_scrape_duration_seconds",
                "Duration of one domain scrape cycle in seconds",
                &["domain"],
                &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0],
            )?,
            scrape_errors_total: registry.register_counter(
                "aliyun_exporter_scrape_errors_total",
                "Scrape cycles that stopped on a failed cloud API call",
                &["domain", "stage"],
            )?,
            malformed_datapoints_total: registry.register_counter(
                "aliyun_exporter_malformed_datapoints_total",
                "Datapoints skipped because a required field was missing or invalid",
                &["domain"],
            )?,
            last_scrape_success: registry.register_gauge(
                "aliyun_exporter_last_scrape_success",
                "Whether the last scrape cycle of a domain completed (1) or not (0)",
                &["domain"],
            )?,
            samples_emitted: registry.register_gauge(
                "aliyun_exporter_samples_emitted",
                "Samples emitted by the last scrape cycle of a domain",
                &["domain"],
            )?,
        })
    }

    pub fn record_scrape(&self, domain: &str, complete: bool, emitted: usize, duration: Duration) {
        self.scrape_duration_seconds
            .observe(&[domain], duration.as_secs_f64());
        self.last_scrape_success
            .set(&[domain], i64::from(complete));
        self.samples_emitted
            .set(&[domain], i64::try_from(emitted).unwrap_or(i64::MAX));
    }

    pub fn record_error(&self, domain: &str, stage: ScrapeStage) {
        self.scrape_errors_total.inc_one(&[domain, stage.as_str()]);
    }

    pub fn record_malformed(&self, domain: &str, count: u64) {
        if count > 0 {
            self.malformed_datapoints_total.inc(&[domain], count);
        }
    }
}
