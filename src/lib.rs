pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use crate::adapters::ShipStationClient;
pub use crate::config::{AppConfig, CliConfig};
pub use crate::core::auto_tag::AutoTagger;
pub use crate::core::tag_batch::TagBatchCoordinator;
pub use crate::domain::ports::ShippingApi;
pub use crate::utils::error::{DashError, Result};
