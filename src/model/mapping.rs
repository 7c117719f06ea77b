use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MappingError(String);

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for MappingError {}

/// The header row of a table, together with the snake_case column name of each header.
///
/// `Monthly Goal`, `monthly goal` and `monthly_goal` all map to the column `monthly_goal`, so a
/// sheet can use whichever spelling its owner prefers. The original header text is what gets
/// written back.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<Header>,
    columns: Vec<Column>,
    column_map: HashMap<Column, usize>,
}

impl Mapping {
    /// Create a new `Mapping` from a list of header strings. Headers are trimmed and their column
    /// names are the snake_case form of the header.
    pub fn new<S, I>(headers: I) -> Result<Self, MappingError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<Header> = headers
            .into_iter()
            .map(|s| Header::from(s.as_ref().trim()))
            .collect();
        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(ix, h)| Column::from_header(h, ix))
            .collect();

        let mut column_map = HashMap::with_capacity(columns.len());
        for (ix, column) in columns.iter().enumerate() {
            if let Some(first) = column_map.insert(column.clone(), ix) {
                return Err(MappingError(format!(
                    "The headers '{}' and '{}' are the same column '{}'",
                    headers[first].as_ref(),
                    headers[ix].as_ref(),
                    column.as_ref()
                )));
            }
        }

        Ok(Self {
            headers,
            columns,
            column_map,
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.column_map.get(&Column(column.to_string())).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.headers.len()))?;
        for header in &self.headers {
            seq.serialize_element(header.as_ref())?;
        }
        seq.end()
    }
}

/// A header as it appears in the sheet or file, for example `Monthly Goal`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct Header(String);

impl AsRef<str> for Header {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl<S: Into<String>> From<S> for Header {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

/// The normalized name of a column, for example `monthly_goal`.
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct Column(String);

impl AsRef<str> for Column {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Column {
    /// Blank headers get a positional name so that two of them do not collide.
    fn from_header(header: &Header, ix: usize) -> Self {
        let snake = to_snake_case(header);
        if snake.is_empty() {
            Column(format!("no_name_{ix}"))
        } else {
            Column(snake)
        }
    }
}

pub(crate) fn to_snake_case(s: impl AsRef<str>) -> String {
    let lower = s.as_ref().trim().to_lowercase().replace('#', "number");
    let mut out = String::with_capacity(lower.len());
    let mut pending_underscore = false;
    for c in lower.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_underscore && !out.is_empty() {
                out.push('_');
            }
            pending_underscore = false;
            out.push(c);
        } else if c == '_' || c == '-' || c.is_whitespace() {
            pending_underscore = true;
        }
    }
    match out.chars().next() {
        Some(c) if !c.is_ascii_alphabetic() => format!("x_{out}"),
        _ => out,
    }
}
