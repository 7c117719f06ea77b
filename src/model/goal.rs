use crate::model::items::{Item, Items};
use crate::model::lenient::Lenient;
use crate::model::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// The rows of the Goals table.
pub type Goals = Items<Goal>;

/// A named spending category with its monthly budget ceiling.
///
/// Nothing stops a Goals table from listing the same category twice. Readers use the first
/// occurrence.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Goal {
    pub(crate) category: String,
    pub(crate) monthly_goal: Lenient<Amount>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl Goal {
    pub fn new(category: impl Into<String>, monthly_goal: Amount) -> Self {
        Self {
            category: category.into(),
            monthly_goal: Lenient::Parsed(monthly_goal),
            other_fields: BTreeMap::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The goal amount. Blank and non-numeric goals are zero.
    pub fn monthly_goal(&self) -> Decimal {
        self.monthly_goal
            .parsed()
            .map(Amount::value)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn monthly_goal_cell(&self) -> &Lenient<Amount> {
        &self.monthly_goal
    }

    pub(crate) fn set_monthly_goal(&mut self, amount: Amount) {
        self.monthly_goal = Lenient::Parsed(amount);
    }
}

impl Item for Goal {
    const TABLE: &'static str = "Goals";
    const HEADERS: &'static [&'static str] = &[CATEGORY_COL, MONTHLY_GOAL_COL];
    const REQUIRED: &'static [&'static str] = &[CATEGORY_COL, MONTHLY_GOAL_COL];

    fn set_with_column(&mut self, column: &str, header: &str, value: String) {
        match GoalColumn::from_str(column) {
            Ok(GoalColumn::Category) => self.category = value,
            Ok(GoalColumn::MonthlyGoal) => {
                self.monthly_goal = Lenient::parse_with(value, |s| Amount::from_str(s).ok())
            }
            Err(_) => {
                let _ = self.other_fields.insert(header.to_string(), value);
            }
        }
    }

    fn get_by_column(&self, column: &str, header: &str) -> String {
        match GoalColumn::from_str(column) {
            Ok(GoalColumn::Category) => self.category.clone(),
            Ok(GoalColumn::MonthlyGoal) => self.monthly_goal.to_string(),
            Err(_) => self.other_fields.get(header).cloned().unwrap_or_default(),
        }
    }
}

/// Represents the known columns of the Goals table.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalColumn {
    Category,
    MonthlyGoal,
}

serde_plain::derive_display_from_serialize!(GoalColumn);
serde_plain::derive_fromstr_from_deserialize!(GoalColumn);

pub(super) const CATEGORY_COL: &str = "category";
pub(super) const MONTHLY_GOAL_COL: &str = "monthly_goal";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_columns() {
        assert_eq!(GoalColumn::MonthlyGoal.to_string(), MONTHLY_GOAL_COL);
        assert_eq!(
            GoalColumn::from_str("monthly_goal").unwrap(),
            GoalColumn::MonthlyGoal
        );
        assert!(GoalColumn::from_str("Monthly Goal").is_err());
    }

    #[test]
    fn test_set_monthly_goal_replaces_bad_cell() {
        let mut goal = Goal::default();
        goal.set_with_column("monthly_goal", "Monthly Goal", "lots".to_string());
        assert_eq!(goal.monthly_goal(), Decimal::ZERO);
        assert!(goal.monthly_goal_cell().is_invalid());
        goal.set_monthly_goal("250".parse().unwrap());
        assert_eq!(goal.monthly_goal(), Decimal::new(250, 0));
        assert_eq!(goal.get_by_column("monthly_goal", "Monthly Goal"), "250");
    }
}
