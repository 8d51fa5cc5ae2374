use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Files on the local disk. Relative paths resolve against `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_path.join(path)
    }
}

// 先寫入同目錄暫存檔，再原子性地 rename，避免下游讀到半份檔案
fn write_atomic_with<F>(full_path: &Path, fill: F) -> std::io::Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let parent = match full_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp_file = NamedTempFile::new_in(parent)?;
    fill(temp_file.as_file_mut())?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(full_path).map_err(|e| e.error)?;
    Ok(())
}

fn write_atomic(full_path: &Path, data: &[u8]) -> std::io::Result<()> {
    write_atomic_with(full_path, |file| file.write_all(data))
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);
        let data = data.to_vec();
        let target = full_path.clone();

        let outcome = tokio::task::spawn_blocking(move || write_atomic(&target, &data))
            .await
            .map_err(std::io::Error::other)
            .and_then(|inner| inner);

        outcome.map_err(|source| EtlError::WriteError {
            path: full_path,
            source,
        })
    }
}
