//! Row-level access to the Transactions and Goals tables.
//!
//! The `Sheet` trait is deliberately small: read every row of a table, overwrite every row of a
//! table, append a row. Everything that understands headers and types lives above it in
//! `Budget`.

mod google;
mod local;
mod public;
mod test_sheet;
mod token;

use crate::config::Source;
use crate::{Config, Result};
use tracing::debug;

pub(crate) use google::GoogleSheet;
pub(crate) use local::LocalFiles;
pub(crate) use public::PublicSheet;
pub(crate) use test_sheet::{TestSheet, TestSheetState};

/// The name of the transactions tab (or the stem of the transactions file).
pub const TRANSACTIONS: &str = "Transactions";

/// The name of the goals tab (or the stem of the goals file).
pub const GOALS: &str = "Goals";

/// The environment variable that, when set and non-empty, puts the program in `Mode::Testing`.
pub const TEST_MODE_ENV: &str = "BUDGET_IN_TEST_MODE";

/// Whether we talk to the configured data source or to an in-memory stand-in.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Live,
    /// Every table lives in memory, seeded with demo data. Nothing leaves the process.
    Testing,
}

impl Mode {
    /// `Mode::Testing` if `BUDGET_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Live`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Live,
        }
    }
}

/// A place where tables of string cells are stored.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    /// Reads every row of `table`, header row included. Trailing empty cells may be missing.
    async fn get(&mut self, table: &str) -> Result<Vec<Vec<String>>>;

    /// Replaces every row of `table` with `rows`.
    async fn put(&mut self, table: &str, rows: &[Vec<String>]) -> Result<()>;

    /// Adds `row` after the last row of `table`.
    async fn append(&mut self, table: &str, row: &[String]) -> Result<()> {
        let mut rows = self.get(table).await?;
        rows.push(row.to_vec());
        self.put(table, &rows).await
    }

    /// A short human-readable description of where the data lives.
    fn describe(&self) -> String;
}

/// Creates the `Sheet` for the configured source, or an in-memory `TestSheet` in `Mode::Testing`.
pub(crate) async fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    if mode == Mode::Testing {
        debug!("Using the in-memory test sheet for {}", config.source_id());
        return Ok(Box::new(TestSheet::new(config.source_id())));
    }
    Ok(match config.source() {
        Source::Local {
            transactions,
            goals,
        } => Box::new(LocalFiles::new(transactions.clone(), goals.clone())),
        Source::Public { spreadsheet_id } => Box::new(PublicSheet::new(spreadsheet_id.clone())),
        Source::Google {
            spreadsheet_id,
            credentials,
        } => Box::new(GoogleSheet::new(spreadsheet_id.clone(), credentials).await?),
    })
}
