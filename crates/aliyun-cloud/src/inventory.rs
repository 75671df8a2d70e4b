use std::{collections::HashMap, sync::Arc};

use aliyun_common::config::CloudConfig;
use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    client::{RpcRequest, RpcTransport, decode_body},
    error::Result,
};

pub const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 1000;

const SLB_API_VERSION: &str = "2014-05-15";
const VPC_API_VERSION: &str = "2016-04-28";

/// Which control-plane listing backs a domain's derived label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryKind {
    /// The domain has no derived label; nothing is fetched.
    None,
    /// Load balancer id to display name.
    LoadBalancerNames,
    /// EIP allocation id to public address.
    EipAddresses,
}

/// Resource id to display metadata, valid for a single scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    records: HashMap<String, String>,
}

impl Inventory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource_id: impl Into<String>, metadata: impl Into<String>) {
        self.records.insert(resource_id.into(), metadata.into());
    }

    /// Metadata for `resource_id`, or `""` when the resource is unknown.
    pub fn resolve(&self, resource_id: &str) -> &str {
        self.records
            .get(resource_id)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut inventory = Self::empty();
        for (resource_id, metadata) in iter {
            inventory.insert(resource_id, metadata);
        }
        inventory
    }
}

#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn fetch(&self, kind: InventoryKind) -> Result<Inventory>;
}

trait InventoryPage: DeserializeOwned {
    fn total_count(&self) -> Option<usize>;
    fn into_records(self) -> Vec<(String, String)>;
}

#[derive(Debug, Deserialize)]
struct LoadBalancersPage {
    #[serde(rename = "TotalCount")]
    total_count: Option<usize>,
    #[serde(rename = "LoadBalancers", default)]
    load_balancers: LoadBalancerList,
}

#[derive(Debug, Default, Deserialize)]
struct LoadBalancerList {
    #[serde(rename = "LoadBalancer", default)]
    items: Vec<LoadBalancerRecord>,
}

#[derive(Debug, Deserialize)]
struct LoadBalancerRecord {
    #[serde(rename = "LoadBalancerId", default)]
    id: String,
    #[serde(rename = "LoadBalancerName", default)]
    name: String,
}

impl InventoryPage for LoadBalancersPage {
    fn total_count(&self) -> Option<usize> {
        self.total_count
    }

    fn into_records(self) -> Vec<(String, String)> {
        self.load_balancers
            .items
            .into_iter()
            .map(|record| (record.id, record.name))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct EipAddressesPage {
    #[serde(rename = "TotalCount")]
    total_count: Option<usize>,
    #[serde(rename = "EipAddresses", default)]
    eip_addresses: EipAddressList,
}

#[derive(Debug, Default, Deserialize)]
struct EipAddressList {
    #[serde(rename = "EipAddress", default)]
    items: Vec<EipAddressRecord>,
}

#[derive(Debug, Deserialize)]
struct EipAddressRecord {
    #[serde(rename = "AllocationId", default)]
    allocation_id: String,
    #[serde(rename = "IpAddress", default)]
    ip_address: String,
}

impl InventoryPage for EipAddressesPage {
    fn total_count(&self) -> Option<usize> {
        self.total_count
    }

    fn into_records(self) -> Vec<(String, String)> {
        self.eip_addresses
            .items
            .into_iter()
            .map(|record| (record.allocation_id, record.ip_address))
            .collect()
    }
}

pub struct AcsInventoryClient {
    transport: Arc<dyn RpcTransport>,
    region_id: String,
    slb_endpoint: String,
    vpc_endpoint: String,
}

impl AcsInventoryClient {
    pub fn new(transport: Arc<dyn RpcTransport>, config: &CloudConfig) -> Self {
        Self {
            transport,
            region_id: config.region_id.clone(),
            slb_endpoint: config.slb_endpoint(),
            vpc_endpoint: config.vpc_endpoint(),
        }
    }

    async fn fetch_paged<P: InventoryPage>(&self, template: RpcRequest) -> Result<Inventory> {
        let mut inventory = Inventory::empty();
        let mut seen = 0usize;

        for page_number in 1..=MAX_PAGES {
            let request = template
                .clone()
                .param("RegionId", self.region_id.as_str())
                .param("PageNumber", page_number.to_string())
                .param("PageSize", PAGE_SIZE.to_string());
            let body = self.transport.call(&request).await?;
            let page: P = decode_body(request.action, &body)?;

            let total = page.total_count();
            let records = page.into_records();
            if records.is_empty() {
                break;
            }
            seen += records.len();

            for (resource_id, metadata) in records {
                if !resource_id.is_empty() {
                    inventory.insert(resource_id, metadata);
                }
            }

            match total {
                Some(total) if seen < total => continue,
                None if records_filled_page(seen, page_number) => continue,
                _ => break,
            }
        }

        debug!(
            action = template.action,
            records = inventory.len(),
            "fetched inventory"
        );
        Ok(inventory)
    }
}

fn records_filled_page(seen: usize, page_number: usize) -> bool {
    seen == page_number * PAGE_SIZE
}

#[async_trait]
impl InventoryClient for AcsInventoryClient {
    async fn fetch(&self, kind: InventoryKind) -> Result<Inventory> {
        match kind {
            InventoryKind::None => Ok(Inventory::empty()),
            InventoryKind::LoadBalancerNames => {
                self.fetch_paged::<LoadBalancersPage>(RpcRequest::new(
                    self.slb_endpoint.as_str(),
                    "DescribeLoadBalancers",
                    SLB_API_VERSION,
                ))
                .await
            }
            InventoryKind::EipAddresses => {
                self.fetch_paged::<EipAddressesPage>(RpcRequest::new(
                    self.vpc_endpoint.as_str(),
                    "DescribeEipAddresses",
                    VPC_API_VERSION,
                ))
                .await
            }
        }
    }
}
