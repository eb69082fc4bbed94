pub mod auto_tag;
pub mod report;
pub mod tag_batch;

pub use crate::domain::model::{TagBatchReport, TagBatchRequest};
pub use crate::domain::ports::ShippingApi;
pub use crate::utils::error::Result;
