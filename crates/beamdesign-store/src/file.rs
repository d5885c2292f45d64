//! File-backed corpus adapter.

use async_trait::async_trait;
use beamdesign_core::error::{BeamdesignError, Result};
use beamdesign_core::models::HistoricalDesign;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::codec;
use crate::ports::DesignCorpus;

/// Corpus stored as a `;`-delimited text file.
///
/// Appends from this process are serialized; each row reaches the file in a
/// single write followed by `sync_data`. Loads never take the append lock.
#[derive(Debug, Clone)]
pub struct FileDesignCorpus {
    path: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl FileDesignCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DesignCorpus for FileDesignCorpus {
    async fn load(&self) -> Result<Vec<HistoricalDesign>> {
        let path = self.path.clone();
        let rows = tokio::task::spawn_blocking(move || read_corpus(&path))
            .await
            .map_err(|e| BeamdesignError::resource(&self.path, format!("load task failed: {}", e)))??;

        tracing::debug!(path = %self.path.display(), rows = rows.len(), "Loaded corpus");
        Ok(rows)
    }

    async fn append(&self, row: &HistoricalDesign) -> Result<()> {
        row.validate()?;
        let line = codec::format_row(row);

        let _guard = self.append_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .map_err(|e| {
                BeamdesignError::resource(&self.path, format!("append task failed: {}", e))
            })??;

        tracing::info!(
            path = %self.path.display(),
            material = %row.material,
            length_mm = row.length_mm,
            provenance = %row.provenance,
            "Appended design to corpus"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn read_corpus(path: &Path) -> Result<Vec<HistoricalDesign>> {
    let content = fs::read_to_string(path).map_err(|e| io_resource(path, e))?;
    codec::parse_corpus(&content, path)
}

/// Append one row, writing the header first when the file is new or empty.
fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| io_resource(path, e))?;

    let len = file.metadata().map_err(|e| io_resource(path, e))?.len();

    let mut buffer = String::with_capacity(line.len() + 128);
    if len == 0 {
        buffer.push_str(&codec::header_line());
        buffer.push('\n');
    } else if !ends_with_newline(&mut file).map_err(|e| io_resource(path, e))? {
        // A previous write was cut short; terminate it so the new row stands alone
        tracing::warn!(path = %path.display(), "Corpus ended mid-line, terminating it");
        buffer.push('\n');
    }
    buffer.push_str(line);
    buffer.push('\n');

    file.write_all(buffer.as_bytes()).map_err(|e| io_resource(path, e))?;
    file.sync_data().map_err(|e| io_resource(path, e))?;
    Ok(())
}

fn ends_with_newline(file: &mut fs::File) -> io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn io_resource(path: &Path, err: io::Error) -> BeamdesignError {
    BeamdesignError::resource(path, err.to_string())
}
