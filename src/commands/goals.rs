//! Goal command handlers.

use crate::args::{DeleteGoalArgs, SetGoalArgs};
use crate::budget::GoalChange;
use crate::commands::Out;
use crate::error::{Error, ErrorType};
use crate::model::{Amount, Goal, Goals};
use crate::{render, Budget, Result};
use std::str::FromStr;

/// Lists every goal.
pub async fn goals_list(budget: &Budget) -> Result<Out<Goals>> {
    let goals = budget.goals().await?;
    let display = render::goals(&goals);
    Ok(Out::new(format!("Found {} goals", goals.len()), goals).with_display(display))
}

/// Sets the monthly goal of a category. The first goal whose category matches is updated; if
/// there is none, a goal is appended.
///
/// # Errors
/// - Returns a `Request` error if the category is blank or the amount is not a number.
/// - Returns an `Authentication` error for a public (read-only) sheet.
pub async fn goals_set(budget: &Budget, args: &SetGoalArgs) -> Result<Out<GoalChange>> {
    let amount = parse_amount(&args.amount)?;
    let change = budget.set_goal(&args.category, amount).await?;
    Ok(Out::new(
        format!(
            "{} the monthly goal for '{}' to {amount}",
            match change {
                GoalChange::Updated => "Updated",
                GoalChange::Inserted => "Set",
            },
            args.category.trim()
        ),
        change,
    ))
}

/// Deletes the goal of a category.
pub async fn goals_delete(budget: &Budget, args: &DeleteGoalArgs) -> Result<Out<Goal>> {
    let removed = budget.delete_goal(&args.category).await?;
    Ok(Out::new(
        format!("Deleted the goal for '{}'", removed.category()),
        removed,
    ))
}

/// Parses an amount typed by a person. Unlike a cell read from a table, a blank is an error.
pub(super) fn parse_amount(s: &str) -> Result<Amount> {
    if s.trim().is_empty() {
        return Err(Error::msg(ErrorType::Request, "The amount is blank"));
    }
    Amount::from_str(s).map_err(|e| Error::new(ErrorType::Request, e))
}
