// JSON export of the resolved event database

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cjedb_recon::model::{ResolvedEvent, ResolvedTable};

use crate::error::IoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub events: Vec<ResolvedEvent>,
}

impl Database {
    /// Events in ascending story id order, choice text formatted for display.
    pub fn from_table(table: &ResolvedTable) -> Self {
        Self {
            events: table.export(),
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `db` as compact UTF-8 JSON. The file at `path` is replaced only
/// after the whole document has been written; on failure neither it nor the
/// staging file is left behind.
pub fn write_json(db: &Database, path: &Path) -> Result<(), IoError> {
    let staging = staging_path(path);
    let result = write_staging(db, &staging)
        .and_then(|()| fs::rename(&staging, path).map_err(IoError::from));
    if result.is_err() && staging.exists() {
        if let Err(e) = fs::remove_file(&staging) {
            tracing::warn!(path = %staging.display(), "could not remove staging file: {e}");
        }
    }
    result
}

fn write_staging(db: &Database, staging: &Path) -> Result<(), IoError> {
    let file = File::create(staging)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, db)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
fn read_json(path: &Path) -> Result<Database, IoError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
