pub mod config;
pub mod error;
pub mod time;

pub use config::{CloudConfig, Credentials};
pub use error::{ExporterError, Result};
