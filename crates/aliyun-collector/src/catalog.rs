use std::{collections::HashSet, sync::Arc};

use aliyun_common::error::{ExporterError, Result};
use aliyun_metrics::MetricDescriptor;

use crate::domain::DomainSpec;

pub const PRODUCT_PREFIX: &str = "aliyun";

/// One row of a domain's static metric table.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    /// Exposed name suffix, appended to `<product>_<domain>_`.
    pub suffix: &'static str,
    /// Metric name as the monitoring backend knows it.
    pub query_key: &'static str,
    pub help: &'static str,
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub descriptor: Arc<MetricDescriptor>,
    pub query_key: &'static str,
}

/// Ordered descriptors for one domain, built once at startup.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    entries: Vec<CatalogEntry>,
}

impl MetricCatalog {
    pub fn build(product: &str, domain: &DomainSpec) -> Result<Self> {
        let mut names = HashSet::new();
        let mut entries = Vec::with_capacity(domain.metrics.len());

        for spec in domain.metrics {
            let name = format!("{product}_{}_{}", domain.key, spec.suffix);
            if !is_valid_metric_name(&name) {
                return Err(ExporterError::InvalidArgument(format!(
                    "metric name is not lower snake case: {name}"
                )));
            }
            if !names.insert(name.clone()) {
                return Err(ExporterError::InvalidArgument(format!(
                    "duplicate metric in {} catalog: {name}",
                    domain.key
                )));
            }

            entries.push(CatalogEntry {
                descriptor: Arc::new(MetricDescriptor::gauge(name, spec.help, domain.label_schema)),
                query_key: spec.query_key,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn descriptors(&self) -> Vec<Arc<MetricDescriptor>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(&entry.descriptor))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_lowercase() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use aliyun_cloud::InventoryKind;

    use super::*;
    use crate::{datapoint::DataPoint, domains};

    fn no_labels(_: &DataPoint, _: &aliyun_cloud::Inventory) -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn builds_prefixed_names_in_table_order() {
        let catalog = MetricCatalog::build(PRODUCT_PREFIX, &domains::eip::EIP).unwrap();

        let names: Vec<_> = catalog
            .entries()
            .iter()
            .map(|entry| entry.descriptor.name.as_str())
            .collect();
        assert_eq!(names[0], "aliyun_eip_net_rx_rate");
        assert_eq!(catalog.entries()[0].query_key, "net_rx.rate");
        assert_eq!(catalog.len(), domains::eip::EIP.metrics.len());
    }

    #[test]
    fn every_builtin_catalog_is_valid() {
        for domain in domains::ALL {
            let catalog = MetricCatalog::build(PRODUCT_PREFIX, domain).unwrap();
            assert!(!catalog.is_empty());
            for entry in catalog.entries() {
                assert_eq!(entry.descriptor.variable_labels.len(), domain.arity());
            }
        }
    }

    #[test]
    fn rejects_duplicate_and_invalid_names() {
        static DUPLICATED: &[MetricSpec] = &[
            MetricSpec { suffix: "rx", query_key: "a", help: "" },
            MetricSpec { suffix: "rx", query_key: "b", help: "" },
        ];
        static UPPERCASE: &[MetricSpec] = &[MetricSpec { suffix: "packet_RX", query_key: "PacketRX", help: "" }];

        let mut domain = DomainSpec {
            key: "test",
            namespace: "acs_test",
            label_schema: &[],
            inventory: InventoryKind::None,
            metrics: DUPLICATED,
            join_labels: no_labels,
        };
        assert!(MetricCatalog::build(PRODUCT_PREFIX, &domain).is_err());

        domain.metrics = UPPERCASE;
        assert!(MetricCatalog::build(PRODUCT_PREFIX, &domain).is_err());
    }
}
