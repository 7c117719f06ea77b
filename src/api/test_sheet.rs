//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a spreadsheet or any files (see `Mode::Testing`).

use crate::api::{Sheet, GOALS, TRANSACTIONS};
use crate::error::{Error, ErrorType};
use crate::Result;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{LazyLock, Mutex};

/// The tables of one test sheet. The map key is the table name and the map value is its rows.
pub(crate) type TestSheetState = HashMap<String, Vec<Vec<String>>>;

/// Every test sheet in the process, keyed by source id. Separate `TestSheet` values with the same
/// id see the same tables, which lets a test inspect what a command wrote.
static SHEETS: LazyLock<Mutex<HashMap<String, TestSheetState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// An implementation of the `Sheet` trait that does not use a spreadsheet or files. Its tables are
/// seeded with demo data the first time an id is used.
pub(crate) struct TestSheet {
    id: String,
}

impl TestSheet {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        with_sheets(|sheets| {
            sheets.entry(id.clone()).or_insert_with(default_data);
        });
        Self { id }
    }

    /// A copy of every table in this sheet.
    pub(crate) fn get_state(&self) -> TestSheetState {
        with_sheets(|sheets| sheets.get(&self.id).cloned().unwrap_or_default())
    }

    /// Replaces every table in this sheet.
    pub(crate) fn set_state(&self, state: TestSheetState) {
        with_sheets(|sheets| {
            sheets.insert(self.id.clone(), state);
        })
    }
}

fn with_sheets<T>(f: impl FnOnce(&mut HashMap<String, TestSheetState>) -> T) -> T {
    // A panic while holding the lock cannot leave a half-written table behind, so a poisoned lock
    // is still usable.
    let mut sheets = SHEETS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut sheets)
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, table: &str) -> Result<Vec<Vec<String>>> {
        with_sheets(|sheets| {
            sheets
                .get(&self.id)
                .and_then(|tables| tables.get(table))
                .cloned()
                .ok_or_else(|| {
                    Error::msg(
                        ErrorType::TableNotFound,
                        format!("Table '{table}' not found in the test sheet"),
                    )
                })
        })
    }

    async fn put(&mut self, table: &str, rows: &[Vec<String>]) -> Result<()> {
        with_sheets(|sheets| {
            sheets
                .entry(self.id.clone())
                .or_default()
                .insert(table.to_string(), rows.to_vec());
        });
        Ok(())
    }

    fn describe(&self) -> String {
        format!("the in-memory test sheet '{}'", self.id)
    }
}

/// Provides the seed data from this module.
fn default_data() -> TestSheetState {
    let mut map = HashMap::new();
    map.insert(TRANSACTIONS.to_string(), load_csv(TRANSACTION_DATA));
    map.insert(GOALS.to_string(), load_csv(GOAL_DATA));
    map
}

/// Loads data from a CSV-formatted string. The seed data is a compile-time constant, so a bad
/// record is skipped rather than reported.
fn load_csv(csv_data: &str) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    rdr.records()
        .filter_map(|record| record.ok())
        .map(|record| record.iter().map(|field| field.to_string()).collect())
        .collect()
}

/// Seed transaction data.
const TRANSACTION_DATA: &str = r##"Date,Category,Amount,Note
10/1/2025,Utilities,$45.88,City Water District
10/2/2025,Restaurants,$9.75,In-N-Out Burger
10/3/2025,Gas & Fuel,$61.45,Shell Station #4521
10/4/2025,Coffee Shops,$5.95,Starbucks #1923
10/5/2025,Groceries,$118.56,Costco Wholesale
10/6/2025,Utilities,$75.00,AT&T Wireless
10/7/2025,Restaurants,$42.30,Olive Garden
10/8/2025,Gas & Fuel,$55.20,76 Gas Station
10/9/2025,Coffee Shops,$8.50,Blue Bottle Coffee
10/10/2025,Groceries,$95.82,Safeway #1534
10/11/2025,Utilities,$89.99,Comcast Internet
10/12/2025,Restaurants,$12.40,Panera Bread
10/13/2025,Gas & Fuel,$48.90,Chevron Gas
10/14/2025,Coffee Shops,$7.25,Peet's Coffee & Tea
10/15/2025,Groceries,$63.21,Trader Joe's #429
10/16/2025,Utilities,$142.67,PG&E Electric
10/17/2025,Restaurants,$14.85,Chipotle Mexican Grill
10/18/2025,Gas & Fuel,$52.30,Shell Gas Station
10/19/2025,Coffee Shops,$6.75,Starbucks #2847
10/20/2025,Groceries,$87.43,Whole Foods Market
10/21/2025,Entertainment,$15.99,Movie tickets
"##;

/// Seed goal data.
const GOAL_DATA: &str = r##"Category,Monthly Goal
Groceries,$500.00
Gas & Fuel,$200.00
Restaurants,$100.00
Coffee Shops,$40.00
Utilities,$350.00
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_tables() {
        let mut sheet = TestSheet::new("test_seeded_tables");
        let goals = sheet.get(GOALS).await.unwrap();
        assert_eq!(goals[0], vec!["Category", "Monthly Goal"]);
        assert_eq!(goals.len(), 6);
        let transactions = sheet.get(TRANSACTIONS).await.unwrap();
        assert_eq!(transactions.len(), 22);
    }

    #[tokio::test]
    async fn test_shared_state_by_id() {
        let mut a = TestSheet::new("test_shared_state_by_id");
        let b = TestSheet::new("test_shared_state_by_id");
        a.append(GOALS, &["Pets".to_string(), "60".to_string()])
            .await
            .unwrap();
        let state = b.get_state();
        let goals = state.get(GOALS).unwrap();
        assert_eq!(goals.last().unwrap(), &vec!["Pets", "60"]);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let mut sheet = TestSheet::new("test_missing_table");
        sheet.set_state(TestSheetState::new());
        let e = sheet.get(GOALS).await.unwrap_err();
        assert_eq!(e.error_type(), ErrorType::TableNotFound);
    }
}
