pub mod catalog;
pub mod coordinator;
pub mod datapoint;
pub mod domain;
pub mod domains;
pub mod error;
pub mod translate;

pub use catalog::{CatalogEntry, MetricCatalog, MetricSpec, PRODUCT_PREFIX};
pub use coordinator::{ScrapeCoordinator, ScrapeOutcome, ScrapeReport};
pub use datapoint::DataPoint;
pub use domain::{DomainSpec, LabelJoin};
pub use error::{MalformedDatapoint, ScrapeError, TranslateError};
