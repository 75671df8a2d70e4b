use aliyun_cloud::{Inventory, InventoryKind};

use crate::{catalog::MetricSpec, datapoint::DataPoint, domain::DomainSpec};

pub static SLB: DomainSpec = DomainSpec {
    key: "slb",
    namespace: "acs_slb_dashboard",
    label_schema: &["user_id", "instance_id", "port", "vip", "instance_name"],
    inventory: InventoryKind::LoadBalancerNames,
    metrics: METRICS,
    join_labels,
};

/// `port` and `vip` come and go per datapoint, even within one metric;
/// an absent dimension is rendered as an empty label value.
fn join_labels(point: &DataPoint, inventory: &Inventory) -> Vec<String> {
    vec![
        point.owner_id.clone(),
        point.resource_id.clone(),
        point.port.clone().unwrap_or_default(),
        point.vip.clone().unwrap_or_default(),
        inventory.resolve(&point.resource_id).to_string(),
    ]
}

const fn metric(suffix: &'static str, query_key: &'static str, help: &'static str) -> MetricSpec {
    MetricSpec {
        suffix,
        query_key,
        help,
    }
}

// Exposed names keep the historical spelling (e.g. `heathy_servercount`),
// which also matches the backend metric name.
const METRICS: &[MetricSpec] = &[
    metric("active_connection", "ActiveConnection", "Active TCP connections per port, Count"),
    metric("max_connection", "MaxConnection", "Concurrent connections per port, Count/s"),
    metric("new_connection", "NewConnection", "New TCP connections per port, Count"),
    metric("packet_rx", "PacketRX", "Inbound packets per port, Count/s"),
    metric("packet_tx", "PacketTX", "Outbound packets per port, Count/s"),
    metric("traffic_rxnew", "TrafficRXNew", "Inbound bandwidth per port, bit/s"),
    metric("traffic_txnew", "TrafficTXNew", "Outbound bandwidth per port, bit/s"),
    metric("inactive_connection", "InactiveConnection", "Inactive connections per port, Count"),
    metric("heathy_servercount", "HeathyServerCount", "Healthy backend servers, Count"),
    metric("unhealthy_servercount", "UnhealthyServerCount", "Unhealthy backend servers, Count"),
    metric("drop_connection", "DropConnection", "Connections dropped per port, Count/s"),
    metric("drop_packet_rx", "DropPacketRX", "Inbound packets dropped per port, Count/s"),
    metric("drop_packet_tx", "DropPacketTX", "Outbound packets dropped per port, Count/s"),
    metric("drop_traffic_rx", "DropTrafficRX", "Inbound bandwidth dropped per port, bit/s"),
    metric("drop_traffic_tx", "DropTrafficTX", "Outbound bandwidth dropped per port, bit/s"),
    metric("instance_drop_connection", "InstanceDropConnection", "Connections dropped per instance, Count/s"),
    metric("instance_drop_packet_rx", "InstanceDropPacketRX", "Inbound packets dropped per instance, Count/s"),
    metric("instance_drop_packet_tx", "InstanceDropPacketTX", "Outbound packets dropped per instance, Count/s"),
    metric("instance_drop_traffic_rx", "InstanceDropTrafficRX", "Inbound bandwidth dropped per instance, bit/s"),
    metric("instance_drop_traffic_tx", "InstanceDropTrafficTX", "Outbound bandwidth dropped per instance, bit/s"),
    metric("instance_active_connection", "InstanceActiveConnection", "Active connections per instance, Count/s"),
    metric(
        "instance_inactive_connection",
        "InstanceInactiveConnection",
        "Inactive connections per instance, Count/s",
    ),
    metric("instance_maxconnection", "InstanceMaxConnection", "Concurrent connections per instance, Count/s"),
    metric(
        "instance_maxconnection_utilization",
        "InstanceMaxConnectionUtilization",
        "Concurrent connection utilization per instance, %",
    ),
    metric("instance_new_connection", "InstanceNewConnection", "New connections per instance, Count/s"),
    metric(
        "instance_newconnection_utilization",
        "InstanceNewConnectionUtilization",
        "New connection utilization per instance, %",
    ),
    metric("instance_packet_rx", "InstancePacketRX", "Inbound packets per instance, Count/s"),
    metric("instance_packet_tx", "InstancePacketTX", "Outbound packets per instance, Count/s"),
    metric("instance_traffic_rx", "InstanceTrafficRX", "Inbound bandwidth per instance, bit/s"),
    metric("instance_traffic_tx", "InstanceTrafficTX", "Outbound bandwidth per instance, bit/s"),
    metric(
        "instance_traffic_tx_utilization",
        "InstanceTrafficTXUtilization",
        "Outbound bandwidth utilization per instance, %",
    ),
];
