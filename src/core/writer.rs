use crate::core::template::OutputDocument;
use crate::domain::model::{FilterFormat, WrittenOutput};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use crate::utils::reporter::Reporter;
use std::path::Path;

/// Render `document` and hand it to storage as a single replacement of `path`.
pub async fn write_document<S: Storage>(
    storage: &S,
    document: &OutputDocument,
    path: &Path,
    reporter: &dyn Reporter,
) -> Result<WrittenOutput> {
    let format = document.format();
    let rendered = document.render();

    reporter.debug(&format!(
        "Writing {} list ({} bytes) to {}",
        format,
        rendered.len(),
        path.display()
    ));

    if let Err(e) = storage.write_file(path, rendered.as_bytes()).await {
        reporter.error(&format!("ERROR: Failed to save {} list - {}", format, e));
        return Err(e);
    }

    let rule_count = document.rules.len();
    reporter.info(&format!("{} list saved to {}", format, path.display()));
    match format {
        FilterFormat::AdGuard => reporter.info(&format!("Total rules: {}", rule_count)),
        FilterFormat::Hosts => reporter.info(&format!("Total domains: {}", rule_count)),
    }

    Ok(WrittenOutput {
        format,
        path: path.to_path_buf(),
        rule_count,
    })
}
