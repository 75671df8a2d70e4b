use aliyun_cloud::{Inventory, InventoryKind};

use crate::{catalog::MetricSpec, datapoint::DataPoint, domain::DomainSpec};

pub static NAT: DomainSpec = DomainSpec {
    key: "nat",
    namespace: "acs_nat_gateway",
    label_schema: &["user_id", "instance_id"],
    inventory: InventoryKind::None,
    metrics: METRICS,
    join_labels,
};

fn join_labels(point: &DataPoint, _inventory: &Inventory) -> Vec<String> {
    vec![point.owner_id.clone(), point.resource_id.clone()]
}

const fn metric(suffix: &'static str, query_key: &'static str, help: &'static str) -> MetricSpec {
    MetricSpec {
        suffix,
        query_key,
        help,
    }
}

const METRICS: &[MetricSpec] = &[
    metric("session_active_connection", "SessionActiveConnection", "Concurrent sessions, Count"),
    metric(
        "session_active_connection_waterlever",
        "SessionActiveConnectionWaterLever",
        "Concurrent session usage against the gateway tier limit, %",
    ),
    metric(
        "session_limit_drop_connection",
        "SessionLimitDropConnection",
        "Sessions dropped for exceeding the concurrency limit, Count/s",
    ),
    metric("session_new_connection", "SessionNewConnection", "New session rate, Count/s"),
    metric(
        "session_newconnection_waterlever",
        "SessionNewConnectionWaterLever",
        "New session rate usage against the gateway tier limit, %",
    ),
    metric(
        "session_newlimit_drop_connection",
        "SessionNewLimitDropConnection",
        "New sessions dropped for exceeding the rate limit, Count/s",
    ),
    metric("ppsrate_in_from_inside", "PPSRateInFromInside", "Packet rate received from the VPC, Count/s"),
    metric("ppsrate_in_from_outside", "PPSRateInFromOutside", "Packet rate received from the internet, Count/s"),
    metric("ppsrate_out_to_inside", "PPSRateOutToInside", "Packet rate sent into the VPC, Count/s"),
    metric("ppsrate_out_to_outside", "PPSRateOutToOutside", "Packet rate sent to the internet, Count/s"),
    metric("bwrate_in_from_inside", "BWRateInFromInside", "Bandwidth received from the VPC, bps"),
    metric("bwrate_in_from_outside", "BWRateInFromOutside", "Bandwidth received from the internet, bps"),
    metric("bwrate_out_to_inside", "BWRateOutToInside", "Bandwidth sent into the VPC, bps"),
    metric("bwrate_out_to_outside", "BWRateOutToOutside", "Bandwidth sent to the internet, bps"),
    metric("bytes_in_from_inside", "BytesInFromInside", "Traffic received from the VPC, Byte"),
    metric("bytes_in_from_outside", "BytesInFromOutside", "Traffic received from the internet, Byte"),
    metric("bytes_out_to_inside", "BytesOutToInside", "Traffic sent into the VPC, Byte"),
    metric("bytes_out_to_outside", "BytesOutToOutside", "Traffic sent to the internet, Byte"),
];
