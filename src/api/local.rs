//! Implements the `Sheet` trait over two CSV files on the local filesystem.

use crate::api::{Sheet, GOALS, TRANSACTIONS};
use crate::error::{Error, ErrorType, IntoResult};
use crate::{utils, Result};
use anyhow::Context;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::trace;

/// Stores the Transactions and Goals tables as CSV files.
pub(crate) struct LocalFiles {
    transactions: PathBuf,
    goals: PathBuf,
}

impl LocalFiles {
    pub(crate) fn new(transactions: PathBuf, goals: PathBuf) -> Self {
        Self {
            transactions,
            goals,
        }
    }

    fn path(&self, table: &str) -> Result<&Path> {
        match table {
            TRANSACTIONS => Ok(&self.transactions),
            GOALS => Ok(&self.goals),
            bad => Err(Error::msg(
                ErrorType::TableNotFound,
                format!("There is no file for a table named '{bad}'"),
            )),
        }
    }
}

#[async_trait::async_trait]
impl Sheet for LocalFiles {
    async fn get(&mut self, table: &str) -> Result<Vec<Vec<String>>> {
        let path = self.path(table)?;
        trace!("get {table} from {}", path.display());
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::msg(
                    ErrorType::TableNotFound,
                    format!("The {table} file '{}' does not exist", path.display()),
                ))
            }
            Err(e) => {
                return Err(Error::new(ErrorType::SourceUnreachable, e)
                    .context(format!("Unable to read the {table} file '{}'", path.display())))
            }
        };
        let content = String::from_utf8(bytes)
            .pub_result(ErrorType::MalformedData)
            .map_err(|e| {
                e.context(format!(
                    "The {table} file '{}' is not UTF-8, save it as UTF-8 CSV",
                    path.display()
                ))
            })?;
        parse_csv(&content)
            .pub_result(ErrorType::MalformedData)
            .map_err(|e| e.context(format!("The {table} file '{}' is not valid CSV", path.display())))
    }

    async fn put(&mut self, table: &str, rows: &[Vec<String>]) -> Result<()> {
        let path = self.path(table)?;
        trace!("put {} rows to {table} at {}", rows.len(), path.display());
        let data = write_csv(rows).pub_result(ErrorType::Internal)?;
        utils::write(path, data)
            .await
            .pub_result(ErrorType::SourceUnreachable)
    }

    /// Appends one record to the end of the file, adding a line break first if the file does not
    /// end with one.
    async fn append(&mut self, table: &str, row: &[String]) -> Result<()> {
        let path = self.path(table)?;
        trace!("append to {table} at {}", path.display());
        let existing = match tokio::fs::read(path).await {
            Ok(existing) => existing,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::msg(
                    ErrorType::TableNotFound,
                    format!("The {table} file '{}' does not exist", path.display()),
                ))
            }
            Err(e) => return Err(Error::new(ErrorType::SourceUnreachable, e)),
        };

        let mut data = Vec::new();
        if existing.last().is_some_and(|&b| b != b'\n') {
            data.push(b'\n');
        }
        data.extend(write_csv(&[row.to_vec()]).pub_result(ErrorType::Internal)?);

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Unable to open '{}' for appending", path.display()))
            .pub_result(ErrorType::SourceUnreachable)?;
        file.write_all(&data)
            .await
            .with_context(|| format!("Unable to append to '{}'", path.display()))
            .pub_result(ErrorType::SourceUnreachable)?;
        file.flush()
            .await
            .pub_result(ErrorType::SourceUnreachable)
    }

    fn describe(&self) -> String {
        format!(
            "local files '{}' and '{}'",
            self.transactions.display(),
            self.goals.display()
        )
    }
}

/// Parses CSV text into rows. Rows may have different lengths.
pub(crate) fn parse_csv(content: &str) -> std::result::Result<Vec<Vec<String>>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(content.as_bytes()));
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

fn write_csv(rows: &[Vec<String>]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish writing CSV: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallback;
    use tempfile::TempDir;

    fn files(dir: &TempDir) -> LocalFiles {
        LocalFiles::new(
            dir.path().join("transactions.csv"),
            dir.path().join("goals.csv"),
        )
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_file_is_table_not_found() {
        let dir = TempDir::new().unwrap();
        let e = files(&dir).get(GOALS).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::TableNotFound);
        let e = files(&dir).append(GOALS, &row(&["Gas", "1"])).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::TableNotFound);
    }

    #[tokio::test]
    async fn test_put_get_with_quoting() {
        let dir = TempDir::new().unwrap();
        let mut sheet = files(&dir);
        let rows = vec![
            row(&["date", "category", "amount", "note"]),
            row(&["2025-10-05", "Groceries", "$1,200.00", "said \"hi\", left"]),
        ];
        sheet.put(TRANSACTIONS, &rows).await.unwrap();
        assert_eq!(sheet.get(TRANSACTIONS).await.unwrap(), rows);
    }

    #[tokio::test]
    async fn test_append_without_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("goals.csv");
        utils::write(&path, "category,monthly_goal\nGas,100").await.unwrap();
        let mut sheet = files(&dir);
        sheet.append(GOALS, &row(&["Dining", "75"])).await.unwrap();
        assert_eq!(
            utils::read(&path).await.unwrap(),
            "category,monthly_goal\nGas,100\nDining,75\n"
        );
        assert_eq!(
            sheet.get(GOALS).await.unwrap(),
            vec![
                row(&["category", "monthly_goal"]),
                row(&["Gas", "100"]),
                row(&["Dining", "75"])
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let dir = TempDir::new().unwrap();
        let e = files(&dir).get("Categories").await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::TableNotFound);
    }

    #[tokio::test]
    async fn test_latin1_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        utils::write(
            dir.path().join("goals.csv"),
            b"category,monthly_goal\nCaf\xe9,100\n",
        )
        .await
        .unwrap();
        let e = files(&dir).get(GOALS).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::MalformedData);
        assert_eq!(e.fallback(), Fallback::Abort);
        assert!(format!("{e:#}").contains("not UTF-8"));
    }
}
