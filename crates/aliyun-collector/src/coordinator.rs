use std::{sync::Arc, time::Instant};

use aliyun_cloud::{InventoryClient, MonitoringClient};
use aliyun_common::error::Result;
use aliyun_metrics::{
    CollectStatus, Collector, MetricDescriptor, SampleSink, ScrapeMetrics, ScrapeStage,
};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    catalog::MetricCatalog,
    domain::DomainSpec,
    error::{ScrapeError, TranslateError},
    translate::translate,
};

/// How a scrape cycle ended.
#[derive(Debug)]
pub enum ScrapeOutcome {
    Completed,
    /// The inventory snapshot could not be fetched, no metric was queried.
    InventoryFailed(ScrapeError),
    /// A metric fetch failed at catalog `position`; later metrics were skipped.
    Aborted { position: usize, error: ScrapeError },
}

#[derive(Debug)]
pub struct ScrapeReport {
    pub domain: &'static str,
    pub emitted: usize,
    /// Datapoints dropped because they could not be translated.
    pub skipped: u64,
    pub outcome: ScrapeOutcome,
}

impl ScrapeReport {
    pub fn status(&self) -> CollectStatus {
        match self.outcome {
            ScrapeOutcome::Completed => CollectStatus::Complete,
            ScrapeOutcome::InventoryFailed(_) => CollectStatus::Failed,
            ScrapeOutcome::Aborted { .. } if self.emitted > 0 => CollectStatus::Partial,
            ScrapeOutcome::Aborted { .. } => CollectStatus::Failed,
        }
    }
}

/// Runs scrape cycles for one resource domain. Cycles on the same
/// coordinator never overlap.
pub struct ScrapeCoordinator {
    domain: &'static DomainSpec,
    catalog: MetricCatalog,
    inventory: Arc<dyn InventoryClient>,
    monitoring: Arc<dyn MonitoringClient>,
    metrics: Option<Arc<ScrapeMetrics>>,
    lock: Mutex<()>,
}

impl ScrapeCoordinator {
    pub fn new(
        domain: &'static DomainSpec,
        product: &str,
        inventory: Arc<dyn InventoryClient>,
        monitoring: Arc<dyn MonitoringClient>,
    ) -> Result<Self> {
        Ok(Self {
            domain,
            catalog: MetricCatalog::build(product, domain)?,
            inventory,
            monitoring,
            metrics: None,
            lock: Mutex::new(()),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<ScrapeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn domain(&self) -> &'static DomainSpec {
        self.domain
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub async fn scrape(&self, sink: &mut dyn SampleSink) -> ScrapeReport {
        let _guard = self.lock.lock().await;
        let started = Instant::now();
        let domain = self.domain.key;

        let report = self.run_cycle(sink).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_malformed(domain, report.skipped);
            match &report.outcome {
                ScrapeOutcome::Completed => {}
                ScrapeOutcome::InventoryFailed(_) => {
                    metrics.record_error(domain, ScrapeStage::Inventory)
                }
                ScrapeOutcome::Aborted { .. } => {
                    metrics.record_error(domain, ScrapeStage::Monitoring)
                }
            }
            metrics.record_scrape(
                domain,
                report.status().is_complete(),
                report.emitted,
                started.elapsed(),
            );
        }

        info!(
            domain,
            emitted = report.emitted,
            skipped = report.skipped,
            status = ?report.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape finished"
        );
        report
    }

    async fn run_cycle(&self, sink: &mut dyn SampleSink) -> ScrapeReport {
        let domain = self.domain.key;
        let mut report = ScrapeReport {
            domain,
            emitted: 0,
            skipped: 0,
            outcome: ScrapeOutcome::Completed,
        };

        let inventory = match self.inventory.fetch(self.domain.inventory).await {
            Ok(inventory) => inventory,
            Err(source) => {
                warn!(domain, code = source.code().unwrap_or(""), error = %source, "inventory fetch failed");
                report.outcome =
                    ScrapeOutcome::InventoryFailed(ScrapeError::InventoryFetch { domain, source });
                return report;
            }
        };
        debug!(domain, resources = inventory.len(), "inventory snapshot loaded");

        for (position, entry) in self.catalog.entries().iter().enumerate() {
            let batch = match self
                .monitoring
                .fetch_latest(entry.query_key, self.domain.namespace)
                .await
            {
                Ok(batch) => batch,
                Err(source) => {
                    warn!(
                        domain,
                        metric = entry.query_key,
                        code = source.code().unwrap_or(""),
                        error = %source,
                        "metric fetch failed, aborting scrape"
                    );
                    report.outcome = ScrapeOutcome::Aborted {
                        position,
                        error: ScrapeError::MonitoringFetch {
                            domain,
                            metric: entry.query_key.to_string(),
                            source,
                        },
                    };
                    return report;
                }
            };

            for result in translate(batch, entry, self.domain, &inventory) {
                match result {
                    Ok(sample) => {
                        sink.emit(sample);
                        report.emitted += 1;
                    }
                    Err(TranslateError::Malformed(reason)) => {
                        warn!(domain, metric = entry.query_key, %reason, "skipping datapoint");
                        report.skipped += 1;
                    }
                    Err(TranslateError::Sample(error)) => {
                        warn!(domain, metric = entry.query_key, %error, "dropping sample");
                        report.skipped += 1;
                    }
                }
            }
        }

        report
    }
}

#[async_trait]
impl Collector for ScrapeCoordinator {
    fn name(&self) -> &str {
        self.domain.key
    }

    fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        self.catalog.descriptors()
    }

    async fn collect(&self, sink: &mut dyn SampleSink) -> CollectStatus {
        self.scrape(sink).await.status()
    }
}
