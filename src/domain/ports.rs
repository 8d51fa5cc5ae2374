use crate::core::retry::RetryPolicy;
use crate::domain::model::{
    CanonicalDomain, FilterFormat, RawListing, RuleOrder, TransformResult, WriteMode,
    WrittenOutput,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub trait Storage: Send + Sync {
    /// Replaces `path` with `data` in one step; readers never see a partial file.
    fn write_file(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_url(&self) -> &str;
    fn proxy(&self) -> Option<&str>;
    fn adguard_output(&self) -> &Path;
    fn hosts_output(&self) -> &Path;
    fn retry_policy(&self) -> &RetryPolicy;
    fn connect_timeout(&self) -> Duration;
    fn read_timeout(&self) -> Duration;
    fn rule_order(&self) -> RuleOrder;
    fn adguard_trailing_caret(&self) -> bool;
    fn write_mode(&self) -> WriteMode;
    fn verbose(&self) -> bool;
}

/// Maps canonical domains to rule lines of one filter format and back.
pub trait RuleFormatter: Send + Sync {
    fn format(&self) -> FilterFormat;
    fn format_rule(&self, domain: &CanonicalDomain) -> String;
    fn parse_rule(&self, line: &str) -> Result<CanonicalDomain>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawListing>;
    async fn transform(&self, data: RawListing) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<Vec<WrittenOutput>>;
}
