use serde::{Deserialize, Serialize};

/// How transaction categories are matched against goal categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Matching {
    /// Categories match only when they are the same string.
    Exact,
    /// Categories match after trimming whitespace and folding case, so `groceries ` is
    /// `Groceries`.
    #[default]
    Normalized,
}

serde_plain::derive_display_from_serialize!(Matching);
serde_plain::derive_fromstr_from_deserialize!(Matching);

impl Matching {
    /// The key that two categories must share to match.
    pub fn key(&self, category: &str) -> String {
        match self {
            Matching::Exact => category.to_string(),
            Matching::Normalized => category.trim().to_lowercase(),
        }
    }

    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            Matching::Exact => a == b,
            Matching::Normalized => self.key(a) == self.key(b),
        }
    }
}
