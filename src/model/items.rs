use crate::error::{Error, ErrorType, IntoResult};
use crate::model::Mapping;
use crate::Result;
use serde::Serialize;
use std::fmt::Debug;

/// One row type of a table, e.g. `Transaction` or `Goal`.
pub trait Item: Default + Debug + Clone + Serialize {
    /// The tab name in a spreadsheet, which is also the stem of the local CSV file.
    const TABLE: &'static str;

    /// The headers written to a new, empty table.
    const HEADERS: &'static [&'static str];

    /// Columns that must be present in the header row for the table to make sense.
    const REQUIRED: &'static [&'static str];

    /// Given the snake_case `column` name (and the original `header` text), set the appropriate
    /// struct field. Unknown columns are kept, keyed by `header`.
    fn set_with_column(&mut self, column: &str, header: &str, value: String);

    /// Given the snake_case `column` name (and the original `header` text), retrieve the
    /// appropriate struct field value as cell text.
    fn get_by_column(&self, column: &str, header: &str) -> String;

    /// Converts the struct to cells in the order of `mapping`.
    fn to_row(&self, mapping: &Mapping) -> Vec<String> {
        mapping
            .columns()
            .iter()
            .zip(mapping.headers())
            .map(|(c, h)| self.get_by_column(c.as_ref(), h.as_ref()))
            .collect()
    }
}

/// The rows of a table, together with its header mapping.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[serde(bound(serialize = "I: Serialize"))]
pub struct Items<I>
where
    I: Item,
{
    mapping: Mapping,
    data: Vec<I>,
}

impl<I> Default for Items<I>
where
    I: Item,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<I> Items<I>
where
    I: Item,
{
    /// An empty table with the default headers.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A table with the default headers holding `data`.
    pub fn new(data: Vec<I>) -> Self {
        Self {
            // The default headers are distinct constants, so this cannot fail.
            mapping: Mapping::new(I::HEADERS).unwrap_or_default(),
            data,
        }
    }

    /// Given the rows read from a sheet or file, parse the header row and the data rows.
    ///
    /// A table with no rows at all is an empty table with the default headers. Fully blank rows
    /// are skipped. A row with more non-blank cells than there are headers is malformed.
    pub(crate) fn parse(rows: Vec<Vec<String>>) -> Result<Self> {
        let mut rows = rows.into_iter().filter(|row| !is_blank(row));
        let header_row = match rows.next() {
            Some(header_row) => header_row,
            None => return Ok(Self::empty()),
        };

        let mapping = Mapping::new(&header_row)
            .pub_result(ErrorType::MalformedData)
            .map_err(|e| e.context(format!("Bad header row in the {} table", I::TABLE)))?;

        if let Some(missing) = I::REQUIRED.iter().find(|c| !mapping.contains(c)) {
            return Err(Error::msg(
                ErrorType::MalformedData,
                format!(
                    "The {} table has no '{missing}' column. Its headers are {:?}",
                    I::TABLE,
                    header_row
                ),
            ));
        }

        let mut data = Vec::new();
        for (ix, row) in rows.enumerate() {
            if row.iter().skip(mapping.len()).any(|cell| !cell.trim().is_empty()) {
                return Err(Error::msg(
                    ErrorType::MalformedData,
                    format!(
                        "Data row {} of the {} table has {} cells but there are only {} headers",
                        ix + 1,
                        I::TABLE,
                        row.len(),
                        mapping.len()
                    ),
                ));
            }
            let mut item = I::default();
            for ((column, header), value) in mapping
                .columns()
                .iter()
                .zip(mapping.headers())
                .zip(row.into_iter().chain(std::iter::repeat(String::new())))
            {
                item.set_with_column(column.as_ref(), header.as_ref(), value);
            }
            data.push(item);
        }

        Ok(Self { mapping, data })
    }

    pub fn header_row(&self) -> Vec<String> {
        self.mapping
            .headers()
            .iter()
            .map(|h| h.as_ref().to_string())
            .collect()
    }

    /// The cells of `item` in this table's column order.
    pub fn row_of(&self, item: &I) -> Vec<String> {
        item.to_row(&self.mapping)
    }

    /// The header row followed by every data row, suitable for overwriting the table.
    pub(crate) fn to_rows(&self) -> Vec<Vec<String>> {
        let mut rows = Vec::with_capacity(self.data.len() + 1);
        rows.push(self.header_row());
        rows.extend(self.data.iter().map(|item| self.row_of(item)));
        rows
    }

    pub fn data(&self) -> &[I] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut Vec<I> {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<I> {
        self.data
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, I> {
        self.data.iter()
    }

    pub(crate) fn push(&mut self, item: I) {
        self.data.push(item)
    }
}

impl<'a, I> IntoIterator for &'a Items<I>
where
    I: Item,
{
    type Item = &'a I;
    type IntoIter = std::slice::Iter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Goal, Goals, Transactions};

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_parse_no_rows_is_empty_with_default_headers() {
        let goals = Goals::parse(Vec::new()).unwrap();
        assert!(goals.is_empty());
        assert_eq!(goals.header_row(), vec!["category", "monthly_goal"]);
    }

    #[test]
    fn test_parse_headers_in_any_order_and_spelling() {
        let goals = Goals::parse(rows(&[
            &["Monthly Goal", "Category"],
            &["500", "Groceries"],
            &["$100.00", "Gas"],
        ]))
        .unwrap();
        assert_eq!(goals.len(), 2);
        assert_eq!(goals.data()[0].category(), "Groceries");
        assert_eq!(goals.data()[1].monthly_goal().to_string(), "100.00");
        assert_eq!(
            goals.to_rows(),
            rows(&[
                &["Monthly Goal", "Category"],
                &["500", "Groceries"],
                &["$100.00", "Gas"],
            ])
        );
    }

    #[test]
    fn test_parse_skips_blank_rows_and_pads_short_rows() {
        let txns = Transactions::parse(rows(&[
            &["date", "category", "amount", "note"],
            &["", "", "", ""],
            &["2025-10-05", "Groceries", "120"],
            &[],
        ]))
        .unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns.data()[0].note(), "");
    }

    #[test]
    fn test_parse_long_row_is_malformed() {
        let e = Goals::parse(rows(&[
            &["category", "monthly_goal"],
            &["Gas", "100", "surprise"],
        ]))
        .unwrap_err();
        assert_eq!(e.error_type(), ErrorType::MalformedData);
        assert!(e.to_string().contains("Data row 1 of the Goals table"));
    }

    #[test]
    fn test_parse_trailing_blank_cells_are_fine() {
        let goals =
            Goals::parse(rows(&[&["category", "monthly_goal"], &["Gas", "100", "", " "]])).unwrap();
        assert_eq!(goals.len(), 1);
    }

    #[test]
    fn test_parse_missing_required_column() {
        let e = Goals::parse(rows(&[&["category", "goal"], &["Gas", "100"]])).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::MalformedData);
        assert!(e.to_string().contains("no 'monthly_goal' column"));
    }

    #[test]
    fn test_unknown_columns_survive() {
        let goals = Goals::parse(rows(&[
            &["category", "Owner", "monthly_goal"],
            &["Gas", "sam", "100"],
        ]))
        .unwrap();
        let mut goals = goals;
        goals.push(Goal::new("Dining", "75".parse().unwrap()));
        assert_eq!(
            goals.to_rows(),
            rows(&[
                &["category", "Owner", "monthly_goal"],
                &["Gas", "sam", "100"],
                &["Dining", "", "75"],
            ])
        );
    }
}
