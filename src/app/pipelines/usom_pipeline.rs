use crate::adapters::http::{FetchOptions, Fetcher};
use crate::core::formatter::{format_rules, AdGuardFormatter, HostsFormatter};
use crate::core::normalizer::normalize;
use crate::core::template::OutputDocument;
use crate::core::writer::write_document;
use crate::domain::model::{
    CanonicalDomain, RawListing, RuleSet, TransformResult, WriteMode, WrittenOutput,
};
use crate::domain::ports::{ConfigProvider, Pipeline, RuleFormatter, Storage};
use crate::utils::error::{EtlError, Result};
use crate::utils::reporter::{Reporter, TracingReporter};
use chrono::Local;
use std::sync::Arc;

/// USOM list → AdGuard + hosts files.
pub struct UsomPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) fetcher: Fetcher,
    pub(crate) reporter: Arc<dyn Reporter>,
}

impl<S: Storage, C: ConfigProvider> UsomPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        Self::with_reporter(storage, config, Arc::new(TracingReporter))
    }

    pub fn with_reporter(storage: S, config: C, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let fetcher = Fetcher::new(FetchOptions::from_config(&config))?;
        Ok(Self {
            storage,
            config,
            fetcher,
            reporter,
        })
    }

    fn build_rules(
        &self,
        formatter: &dyn RuleFormatter,
        domains: &[CanonicalDomain],
    ) -> Result<RuleSet> {
        let format = formatter.format();
        self.reporter
            .info(&format!("Converting URLs to {} format...", format));

        let rules = format_rules(formatter, domains);
        if rules.is_empty() {
            self.reporter.error(&format!("No valid {} rules to save.", format));
            return Err(EtlError::NoRules {
                format: format.to_string(),
            });
        }
        Ok(rules)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for UsomPipeline<S, C> {
    async fn extract(&self) -> Result<RawListing> {
        let url = self.config.source_url();
        tracing::debug!("Fetching source list from: {}", url);

        let listing = self.fetcher.fetch(url, self.reporter.as_ref()).await?;

        if listing.body.is_empty() {
            self.reporter.error(&format!("No content retrieved from {}", url));
            return Err(EtlError::EmptyContent {
                url: url.to_string(),
            });
        }

        if self.config.verbose() {
            self.reporter
                .info(&format!("Total URLs downloaded: {}", listing.line_count()));
        }

        Ok(listing)
    }

    async fn transform(&self, data: RawListing) -> Result<TransformResult> {
        let normalized = normalize(&data.body, self.reporter.as_ref())
            .ordered(self.config.rule_order());
        let stats = normalized.stats.clone();
        let domains = normalized.domains;

        let adguard_formatter = AdGuardFormatter {
            trailing_caret: self.config.adguard_trailing_caret(),
        };
        let adguard = self.build_rules(&adguard_formatter, &domains)?;
        let hosts = self.build_rules(&HostsFormatter, &domains)?;

        Ok(TransformResult {
            stats,
            domain_count: domains.len(),
            adguard,
            hosts,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<Vec<WrittenOutput>> {
        // 兩份檔案使用同一個產生時間
        let generated_at = Local::now();
        let adguard_doc = OutputDocument::new(result.adguard, generated_at);
        let hosts_doc = OutputDocument::new(result.hosts, generated_at);

        let reporter = self.reporter.as_ref();
        let adguard_path = self.config.adguard_output();
        let hosts_path = self.config.hosts_output();

        let outputs = match self.config.write_mode() {
            WriteMode::Sequential => {
                let adguard =
                    write_document(&self.storage, &adguard_doc, adguard_path, reporter).await?;
                let hosts =
                    write_document(&self.storage, &hosts_doc, hosts_path, reporter).await?;
                vec![adguard, hosts]
            }
            WriteMode::Concurrent => {
                let (adguard, hosts) = tokio::try_join!(
                    write_document(&self.storage, &adguard_doc, adguard_path, reporter),
                    write_document(&self.storage, &hosts_doc, hosts_path, reporter),
                )?;
                vec![adguard, hosts]
            }
        };

        Ok(outputs)
    }
}
