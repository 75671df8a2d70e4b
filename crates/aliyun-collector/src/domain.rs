use aliyun_cloud::{Inventory, InventoryKind};

use crate::{catalog::MetricSpec, datapoint::DataPoint};

/// Builds the positional label tuple for one datapoint. The result must be
/// as long as the domain's `label_schema`.
pub type LabelJoin = fn(&DataPoint, &Inventory) -> Vec<String>;

/// Everything that distinguishes one resource domain from another.
#[derive(Debug)]
pub struct DomainSpec {
    /// Short key used in metric names and logs, e.g. `slb`.
    pub key: &'static str,
    /// Monitoring backend namespace queried for every catalog entry.
    pub namespace: &'static str,
    pub label_schema: &'static [&'static str],
    pub inventory: InventoryKind,
    pub metrics: &'static [MetricSpec],
    pub join_labels: LabelJoin,
}

impl DomainSpec {
    pub fn arity(&self) -> usize {
        self.label_schema.len()
    }
}
