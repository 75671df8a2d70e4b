use aliyun_cloud::CloudError;
use aliyun_common::error::ExporterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("inventory fetch failed for {domain}: {source}")]
    InventoryFetch {
        domain: &'static str,
        #[source]
        source: CloudError,
    },
    #[error("monitoring fetch failed for {domain} metric {metric}: {source}")]
    MonitoringFetch {
        domain: &'static str,
        metric: String,
        #[source]
        source: CloudError,
    },
}

impl ScrapeError {
    pub fn cloud_error(&self) -> &CloudError {
        match self {
            Self::InventoryFetch { source, .. } | Self::MonitoringFetch { source, .. } => source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedDatapoint {
    #[error("datapoint is not a JSON object")]
    NotAnObject,
    #[error("datapoint has no valid `{0}` field")]
    MissingField(&'static str),
}

/// Why a single datapoint produced no sample.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Malformed(#[from] MalformedDatapoint),
    #[error(transparent)]
    Sample(#[from] ExporterError),
}
