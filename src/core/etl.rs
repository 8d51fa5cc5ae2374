use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Fetch, convert and write once. Any error ends the run.
    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting ETL process...");

        // Extract
        let raw_data = self.pipeline.extract().await?;
        let source_url = raw_data.url.clone();
        let input_lines = raw_data.line_count();
        tracing::debug!("Extracted {} lines", input_lines);

        // Transform
        let transformed = self.pipeline.transform(raw_data).await?;
        let domain_count = transformed.domain_count;
        tracing::debug!(
            "Transformed {} lines into {} unique domains",
            input_lines,
            domain_count
        );

        // Load
        let outputs = self.pipeline.load(transformed).await?;
        for output in &outputs {
            tracing::debug!(
                "{} output: {} ({} rules)",
                output.format,
                output.path.display(),
                output.rule_count
            );
        }

        Ok(RunSummary {
            source_url,
            input_lines,
            domain_count,
            outputs,
        })
    }
}
