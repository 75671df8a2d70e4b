pub mod client;
pub mod error;
pub mod inventory;
pub mod monitoring;
pub mod signature;

pub use client::{AcsClient, RpcRequest, RpcTransport};
pub use error::{CloudError, Result};
pub use inventory::{AcsInventoryClient, Inventory, InventoryClient, InventoryKind};
pub use monitoring::{AcsMonitoringClient, DatapointBatch, MonitoringClient};
