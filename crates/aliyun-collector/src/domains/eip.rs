use aliyun_cloud::{Inventory, InventoryKind};

use crate::{catalog::MetricSpec, datapoint::DataPoint, domain::DomainSpec};

pub static EIP: DomainSpec = DomainSpec {
    key: "eip",
    namespace: "acs_vpc_eip",
    label_schema: &["user_id", "instance_id", "ip"],
    inventory: InventoryKind::EipAddresses,
    metrics: METRICS,
    join_labels,
};

fn join_labels(point: &DataPoint, inventory: &Inventory) -> Vec<String> {
    vec![
        point.owner_id.clone(),
        point.resource_id.clone(),
        inventory.resolve(&point.resource_id).to_string(),
    ]
}

// EIP metric names contain dots, so the query key differs from the suffix.
const METRICS: &[MetricSpec] = &[
    MetricSpec {
        suffix: "net_rx_rate",
        query_key: "net_rx.rate",
        help: "Inbound bandwidth, bit/s",
    },
    MetricSpec {
        suffix: "net_rx_pkgs_rate",
        query_key: "net_rxPkgs.rate",
        help: "Inbound packet rate, Packets/s",
    },
    MetricSpec {
        suffix: "net_tx_rate",
        query_key: "net_tx.rate",
        help: "Outbound bandwidth, bit/s",
    },
    MetricSpec {
        suffix: "net_tx_pkgs_rate",
        query_key: "net_txPkgs.rate",
        help: "Outbound packet rate, Packets/s",
    },
    MetricSpec {
        suffix: "out_rate_limit_drop_speed",
        query_key: "out_ratelimit_drop_speed",
        help: "Packets dropped by outbound rate limiting, Packets/s",
    },
    MetricSpec {
        suffix: "net_in_rate_percentage",
        query_key: "net_in.rate_percentage",
        help: "Inbound bandwidth utilization, %",
    },
    MetricSpec {
        suffix: "net_out_rate_percentage",
        query_key: "net_out.rate_percentage",
        help: "Outbound bandwidth utilization, %",
    },
];
