use crate::config::toml_config::TomlConfig;
use crate::core::retry::RetryPolicy;
use crate::core::ConfigProvider;
use crate::domain::model::{RuleOrder, WriteMode};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, validate_range, validate_url, Validate};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_SOURCE_URL: &str = "https://www.usom.gov.tr/url-list.txt";
pub const DEFAULT_ADGUARD_OUTPUT: &str = "usom_adguard_blacklist.txt";
pub const DEFAULT_HOSTS_OUTPUT: &str = "usom_hosts_blacklist.txt";

/// Fully resolved run settings: built-in defaults, then the TOML file, then CLI flags.
#[derive(Clone)]
pub struct Settings {
    pub source_url: String,
    pub proxy: Option<String>,
    pub adguard_output: PathBuf,
    pub hosts_output: PathBuf,
    pub retry: RetryPolicy,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub rule_order: RuleOrder,
    pub adguard_trailing_caret: bool,
    pub write_mode: WriteMode,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            proxy: None,
            adguard_output: PathBuf::from(DEFAULT_ADGUARD_OUTPUT),
            hosts_output: PathBuf::from(DEFAULT_HOSTS_OUTPUT),
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(120),
            rule_order: RuleOrder::default(),
            adguard_trailing_caret: true,
            write_mode: WriteMode::default(),
            verbose: false,
        }
    }
}

impl Settings {
    /// Overlay every value present in `file`.
    pub fn merge_file(mut self, file: &TomlConfig) -> Self {
        let source = &file.source;
        if let Some(url) = &source.url {
            self.source_url = url.clone();
        }
        if let Some(proxy) = &source.proxy {
            self.proxy = Some(proxy.clone());
        }
        if let Some(secs) = source.connect_timeout_secs {
            self.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = source.read_timeout_secs {
            self.read_timeout = Duration::from_secs(secs);
        }

        let retry = &file.retry;
        if let Some(max_attempts) = retry.max_attempts {
            self.retry.max_attempts = max_attempts;
        }
        if let Some(secs) = retry.max_elapsed_secs {
            self.retry.max_elapsed = Duration::from_secs(secs);
        }
        if let Some(ms) = retry.initial_delay_ms {
            self.retry.initial_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = retry.multiplier {
            self.retry.multiplier = multiplier;
        }
        if let Some(secs) = retry.max_delay_secs {
            self.retry.max_delay = Some(Duration::from_secs(secs));
        }
        if let Some(jitter) = retry.jitter {
            self.retry.jitter = jitter;
        }

        let output = &file.output;
        if let Some(path) = &output.adguard_path {
            self.adguard_output = path.clone();
        }
        if let Some(path) = &output.hosts_path {
            self.hosts_output = path.clone();
        }
        if let Some(mode) = output.write_mode {
            self.write_mode = mode;
        }

        if let Some(order) = file.format.ordering {
            self.rule_order = order;
        }
        if let Some(caret) = file.format.adguard_trailing_caret {
            self.adguard_trailing_caret = caret;
        }

        self
    }

    // PROXY="" 視同未設定
    pub(crate) fn normalize_proxy(mut self) -> Self {
        self.proxy = self.proxy.filter(|p| !p.trim().is_empty());
        self
    }
}

// 代理網址可能帶帳密，輸出前遮蔽
fn redact_proxy(proxy: &str) -> String {
    match Url::parse(proxy) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            let _ = url.set_username("***");
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(_) => proxy.to_string(),
        Err(_) => "<unparseable>".to_string(),
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("source_url", &self.source_url)
            .field("proxy", &self.proxy.as_deref().map(redact_proxy))
            .field("adguard_output", &self.adguard_output)
            .field("hosts_output", &self.hosts_output)
            .field("retry", &self.retry)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("rule_order", &self.rule_order)
            .field("adguard_trailing_caret", &self.adguard_trailing_caret)
            .field("write_mode", &self.write_mode)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("source.url", &self.source_url)?;
        if let Some(proxy) = &self.proxy {
            validate_url("source.proxy", proxy)?;
        }

        let adguard = self.adguard_output.to_string_lossy();
        let hosts = self.hosts_output.to_string_lossy();
        validate_path("output.adguard_path", &adguard)?;
        validate_path("output.hosts_path", &hosts)?;
        if self.adguard_output == self.hosts_output {
            return Err(EtlError::ConfigValidationError {
                field: "output".to_string(),
                message: format!("AdGuard and hosts outputs both point to {}", adguard),
            });
        }

        validate_positive_number("retry.max_attempts", u64::from(self.retry.max_attempts), 1)?;
        validate_positive_number("retry.max_elapsed_secs", self.retry.max_elapsed.as_secs(), 1)?;
        validate_range("retry.multiplier", self.retry.multiplier, 1.0, 10.0)?;
        validate_positive_number("source.connect_timeout_secs", self.connect_timeout.as_secs(), 1)?;
        validate_positive_number("source.read_timeout_secs", self.read_timeout.as_secs(), 1)?;

        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn source_url(&self) -> &str {
        &self.source_url
    }

    fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    fn adguard_output(&self) -> &Path {
        &self.adguard_output
    }

    fn hosts_output(&self) -> &Path {
        &self.hosts_output
    }

    fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn rule_order(&self) -> RuleOrder {
        self.rule_order
    }

    fn adguard_trailing_caret(&self) -> bool {
        self.adguard_trailing_caret
    }

    fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    fn verbose(&self) -> bool {
        self.verbose
    }
}
