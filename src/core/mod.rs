pub mod etl;
pub mod formatter;
pub mod normalizer;
pub mod retry;
pub mod template;
pub mod writer;

pub use crate::domain::model::{RawListing, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RuleFormatter, Storage};
pub use crate::utils::error::Result;
