use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use usom_filter::utils::{format::group_thousands, logger, validation::Validate};
use usom_filter::{CliConfig, EtlEngine, LocalStorage, Settings, UsomPipeline};

fn resolve_settings(cli: CliConfig) -> anyhow::Result<Settings> {
    let config_path = cli.config.clone();
    let settings = cli.into_settings().with_context(|| match &config_path {
        Some(path) => format!("failed to load config file {}", path.display()),
        None => "failed to resolve settings".to_string(),
    })?;
    settings.validate().context("invalid configuration")?;
    Ok(settings)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.log_format);

    let settings = match resolve_settings(cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {:#}", e);
            if let Some(etl_error) = e.downcast_ref::<usom_filter::EtlError>() {
                tracing::error!("💡 Suggestion: {}", etl_error.recovery_suggestion());
            }
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!("Resolved settings: {:?}", settings);

    // 檔案路徑相對於目前工作目錄
    let pipeline = match UsomPipeline::new(LocalStorage::new("."), settings) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!("❌ {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            return ExitCode::FAILURE;
        }
    };

    let engine = EtlEngine::new(pipeline);
    match engine.run().await {
        Ok(summary) => {
            tracing::info!(
                "✅ Done: {} lines from {} -> {} unique domains",
                group_thousands(summary.input_lines),
                summary.source_url,
                group_thousands(summary.domain_count)
            );
            for output in &summary.outputs {
                tracing::info!(
                    "📁 {}: {} ({} rules)",
                    output.format,
                    output.path.display(),
                    group_thousands(output.rule_count)
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("❌ Run failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            ExitCode::FAILURE
        }
    }
}
