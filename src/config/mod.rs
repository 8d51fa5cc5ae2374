pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::{RuleOrder, WriteMode};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::logger::LogFormat;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use settings::Settings;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "usom-filter")]
#[command(about = "Convert the USOM malicious URL list into AdGuard and hosts blocklists")]
pub struct CliConfig {
    /// Source list URL
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// AdGuard output file
    #[arg(short = 'o', long = "output")]
    pub adguard_output: Option<PathBuf>,

    /// Hosts output file
    #[arg(long = "hosts-output")]
    pub hosts_output: Option<PathBuf>,

    /// Proxy used for both HTTP and HTTPS
    #[arg(long, env = "PROXY")]
    pub proxy: Option<String>,

    /// Optional TOML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub write_mode: Option<WriteMode>,

    #[arg(long, value_enum)]
    pub order: Option<RuleOrder>,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 合併順序：命令列 > TOML 檔 > 預設值
    pub fn into_settings(self) -> Result<Settings> {
        let mut settings = Settings::default();
        if let Some(path) = &self.config {
            let file = TomlConfig::from_file(path)?;
            settings = settings.merge_file(&file);
        }

        if let Some(url) = self.url {
            settings.source_url = url;
        }
        if let Some(path) = self.adguard_output {
            settings.adguard_output = path;
        }
        if let Some(path) = self.hosts_output {
            settings.hosts_output = path;
        }
        if let Some(proxy) = self.proxy {
            settings.proxy = Some(proxy);
        }
        if let Some(mode) = self.write_mode {
            settings.write_mode = mode;
        }
        if let Some(order) = self.order {
            settings.rule_order = order;
        }
        settings.verbose = self.verbose;

        Ok(settings.normalize_proxy())
    }
}
