//! Snapshots of a table taken before it is overwritten.

use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of the backup prefix, e.g. `goals-pre-write`.
pub const PRE_WRITE: &str = "pre-write";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

/// What a snapshot file holds.
#[derive(Serialize)]
struct Snapshot<'a> {
    table: &'a str,
    source: &'a str,
    rows: &'a [Vec<String>],
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves the rows of `table`, as they were read from `source`, as a pretty-printed JSON file.
    ///
    /// The filename format is `{table}-pre-write.YYYY-MM-DD-NNN.json` where NNN is a sequence
    /// number and `table` is lowercase. Old snapshots are rotated, keeping only `backup_copies`
    /// files per table. Nothing is written when `backup_copies` is zero.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_snapshot(
        &self,
        table: &str,
        source: &str,
        rows: &[Vec<String>],
    ) -> Result<Option<PathBuf>> {
        if self.backup_copies == 0 {
            return Ok(None);
        }
        let prefix = prefix(table);
        let date = today();
        let seq = self
            .next_sequence_number(&prefix, &date, "json")
            .await
            .pub_result(ErrorType::Internal)?;
        let path = self.backups_dir.join(format!("{prefix}.{date}-{seq:03}.json"));

        let json = serde_json::to_string_pretty(&Snapshot {
            table,
            source,
            rows,
        })
        .context("Failed to serialize the table snapshot")
        .pub_result(ErrorType::Internal)?;
        utils::write(&path, json)
            .await
            .pub_result(ErrorType::Internal)?;
        debug!("Saved a snapshot of {table} to {}", path.display());

        self.rotate(&prefix, "json")
            .await
            .pub_result(ErrorType::Internal)?;

        Ok(Some(path))
    }

    pub fn dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str, extension: &str) -> Res<u32> {
        let pattern_start = format!("{prefix}.{date}-");
        let mut max_seq: u32 = 0;

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if name.starts_with(&pattern_start) {
                if let Some(seq) = parse_sequence_number(&name, prefix, date, extension) {
                    max_seq = max_seq.max(seq);
                }
            }
        }

        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str, extension: &str) -> Res<()> {
        let mut files: Vec<(PathBuf, String)> = Vec::new();

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy().to_string();

            if is_backup_file(&name, prefix, extension) {
                files.push((entry.path(), name));
            }
        }

        // The name format sorts by date, then sequence number.
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }

        Ok(())
    }
}

fn prefix(table: &str) -> String {
    format!("{}-{PRE_WRITE}", table.to_lowercase())
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the sequence number from a backup filename.
/// Returns None if the filename doesn't match the expected pattern.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str, extension: &str) -> Option<u32> {
    let expected_start = format!("{prefix}.{date}-");
    let remainder = filename.strip_prefix(&expected_start)?;
    let seq_str = remainder.strip_suffix(&format!(".{extension}"))?;
    seq_str.parse().ok()
}

/// Checks if a filename is a backup file with the given prefix and extension.
fn is_backup_file(filename: &str, prefix: &str, extension: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{extension}"))
}
