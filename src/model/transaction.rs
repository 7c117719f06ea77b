use crate::model::items::{Item, Items};
use crate::model::lenient::{parse_date, Lenient};
use crate::model::Amount;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// The rows of the Transactions table.
pub type Transactions = Items<Transaction>;

/// Represents a single row from the Transactions table.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub(crate) date: Lenient<NaiveDate>,
    pub(crate) category: String,
    pub(crate) amount: Lenient<Amount>,
    pub(crate) note: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        amount: Amount,
        note: impl Into<String>,
    ) -> Self {
        Self {
            date: Lenient::Parsed(date),
            category: category.into(),
            amount: Lenient::Parsed(amount),
            note: note.into(),
            other_fields: BTreeMap::new(),
        }
    }

    /// The date, or `None` if the cell is blank or could not be parsed.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date.parsed().copied()
    }

    /// The date cell as it was read (or as it will be written).
    pub fn date_cell(&self) -> &Lenient<NaiveDate> {
        &self.date
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The amount. Blank and non-numeric amounts are zero.
    pub fn amount(&self) -> Decimal {
        self.amount
            .parsed()
            .map(Amount::value)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn amount_cell(&self) -> &Lenient<Amount> {
        &self.amount
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn other_fields(&self) -> &BTreeMap<String, String> {
        &self.other_fields
    }
}

impl Item for Transaction {
    const TABLE: &'static str = "Transactions";
    const HEADERS: &'static [&'static str] = &[DATE_COL, CATEGORY_COL, AMOUNT_COL, NOTE_COL];
    const REQUIRED: &'static [&'static str] = &[CATEGORY_COL, AMOUNT_COL];

    fn set_with_column(&mut self, column: &str, header: &str, value: String) {
        match TransactionColumn::from_str(column) {
            Ok(TransactionColumn::Date) => self.date = Lenient::parse_with(value, parse_date),
            Ok(TransactionColumn::Category) => self.category = value,
            Ok(TransactionColumn::Amount) => {
                self.amount = Lenient::parse_with(value, |s| Amount::from_str(s).ok())
            }
            Ok(TransactionColumn::Note) => self.note = value,
            Err(_) => {
                let _ = self.other_fields.insert(header.to_string(), value);
            }
        }
    }

    fn get_by_column(&self, column: &str, header: &str) -> String {
        match TransactionColumn::from_str(column) {
            Ok(TransactionColumn::Date) => self.date.to_string(),
            Ok(TransactionColumn::Category) => self.category.clone(),
            Ok(TransactionColumn::Amount) => self.amount.to_string(),
            Ok(TransactionColumn::Note) => self.note.clone(),
            Err(_) => self.other_fields.get(header).cloned().unwrap_or_default(),
        }
    }
}

/// Represents the known columns of the Transactions table.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionColumn {
    Date,
    Category,
    Amount,
    Note,
}

serde_plain::derive_display_from_serialize!(TransactionColumn);
serde_plain::derive_fromstr_from_deserialize!(TransactionColumn);

pub(super) const DATE_COL: &str = "date";
pub(super) const CATEGORY_COL: &str = "category";
pub(super) const AMOUNT_COL: &str = "amount";
pub(super) const NOTE_COL: &str = "note";

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_column_names_match_consts() {
        assert_eq!(TransactionColumn::Date.to_string(), DATE_COL);
        assert_eq!(TransactionColumn::Category.to_string(), CATEGORY_COL);
        assert_eq!(TransactionColumn::Amount.to_string(), AMOUNT_COL);
        assert_eq!(TransactionColumn::Note.to_string(), NOTE_COL);
    }

    #[test]
    fn test_parse_transaction_row() {
        let txns = Transactions::parse(rows(&[
            &["Date", "Category", "Amount", "Note"],
            &["10/5/2025", "Groceries", "$120.00", "weekly shop"],
        ]))
        .unwrap();
        let txn = &txns.data()[0];
        assert_eq!(txn.date(), NaiveDate::from_ymd_opt(2025, 10, 5));
        assert_eq!(txn.category(), "Groceries");
        assert_eq!(txn.amount(), Decimal::new(120, 0));
        assert_eq!(txn.note(), "weekly shop");
        // Dates are written back as ISO; amounts keep their format.
        assert_eq!(
            txns.row_of(txn),
            vec!["2025-10-05", "Groceries", "$120.00", "weekly shop"]
        );
    }

    #[test]
    fn test_bad_cells_are_kept_and_count_as_zero() {
        let txns = Transactions::parse(rows(&[
            &["date", "category", "amount", "note"],
            &["last week", "Dining", "about 30", ""],
            &["2025-10-06", "Dining", "", ""],
        ]))
        .unwrap();
        assert_eq!(txns.data()[0].date(), None);
        assert_eq!(txns.data()[0].amount(), Decimal::ZERO);
        assert!(txns.data()[0].amount_cell().is_invalid());
        assert_eq!(txns.data()[1].amount(), Decimal::ZERO);
        assert_eq!(
            txns.to_rows()[1],
            vec!["last week", "Dining", "about 30", ""]
        );
    }

    #[test]
    fn test_serialize_uses_cell_text() {
        let txn = Transaction::new(
            NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
            "Gas",
            "$40.00".parse().unwrap(),
            "",
        );
        let json = serde_json::to_string(&txn).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2025-01-09","category":"Gas","amount":"$40.00","note":""}"#
        );
    }
}
