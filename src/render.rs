//! Text tables and gauges for the terminal.

use crate::model::{Amount, AmountFormat, Goals, Transaction};
use crate::reconcile::Reconciliation;
use comfy_table::{Cell, CellAlignment, Color, Table, TableComponent};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// The number of characters in a gauge.
pub const GAUGE_WIDTH: usize = 20;

const FULL: char = '█';
const EMPTY: char = '░';

/// Draws a bar of `width` characters showing how much of `goal` has been spent. Spend beyond the
/// goal fills the bar. A zero goal shows a full bar if anything was spent.
pub fn gauge(spent: Decimal, goal: Decimal, width: usize) -> String {
    let filled = if goal <= Decimal::ZERO {
        if spent > Decimal::ZERO {
            width
        } else {
            0
        }
    } else {
        // A quotient too large for a decimal is far past the goal.
        let ratio = spent
            .checked_div(goal)
            .unwrap_or(Decimal::ONE)
            .clamp(Decimal::ZERO, Decimal::ONE);
        (ratio * Decimal::from(width))
            .round()
            .to_usize()
            .unwrap_or(width)
            .min(width)
    };
    let mut bar = String::with_capacity(width * FULL.len_utf8());
    bar.extend(std::iter::repeat_n(FULL, filled));
    bar.extend(std::iter::repeat_n(EMPTY, width - filled));
    bar
}

/// Formats a value as dollars with thousands separators, e.g. `-$1,204.50`.
pub fn money(value: Decimal) -> String {
    Amount::new_with_format(value, AmountFormat::CURRENCY).to_string()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.remove_style(TableComponent::HorizontalLines);
    table.remove_style(TableComponent::MiddleIntersections);
    table.remove_style(TableComponent::LeftBorderIntersections);
    table.remove_style(TableComponent::RightBorderIntersections);
    table
}

fn right(s: impl Into<String>) -> Cell {
    Cell::new(s.into()).set_alignment(CellAlignment::Right)
}

/// The goal-by-goal table, the unmatched categories and the totals.
pub fn summary(r: &Reconciliation) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Category",
        "Goal",
        "Spent",
        "Remaining",
        "Used",
        "Progress",
    ]);
    for line in &r.lines {
        let remaining = right(money(line.remaining));
        let remaining = if line.is_over() {
            remaining.fg(Color::Red)
        } else {
            remaining
        };
        let used = line
            .percent_used
            .map(|p| format!("{p}%"))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&line.category),
            right(money(line.goal)),
            right(money(line.spent)),
            remaining,
            right(used),
            Cell::new(gauge(line.spent, line.goal, GAUGE_WIDTH)),
        ]);
    }

    let mut out = format!("Period: {}\n{table}\n", r.options.period);

    if !r.unmatched.is_empty() {
        let mut unmatched = new_table();
        unmatched.set_header(vec!["Category without a goal", "Spent", "Transactions"]);
        for u in &r.unmatched {
            unmatched.add_row(vec![
                Cell::new(&u.category),
                right(money(u.spent)),
                right(u.transactions.to_string()),
            ]);
        }
        out.push_str(&format!("{unmatched}\n"));
    }

    let t = &r.totals;
    let mut totals = new_table();
    totals.set_header(vec!["Budget", "Spent", "Remaining", "Unmatched", "All spending"]);
    totals.add_row(vec![
        right(money(t.total_budget)),
        right(money(t.total_spent)),
        right(money(t.total_remaining)),
        right(money(t.total_unmatched)),
        right(money(t.total_spent_all)),
    ]);
    out.push_str(&format!("{totals}\n"));

    if !r.duplicate_goals.is_empty() {
        out.push_str(&format!(
            "Ignored duplicate goals: {}\n",
            r.duplicate_goals.join(", ")
        ));
    }
    if r.invalid_amounts > 0 {
        out.push_str(&format!(
            "{} transactions have an amount that is not a number and count as zero\n",
            r.invalid_amounts
        ));
    }
    if r.overflows > 0 {
        out.push_str(&format!(
            "{} sums were too large to represent and are clamped, check for stray digits in \
            the amounts\n",
            r.overflows
        ));
    }
    out
}

pub fn goals(goals: &Goals) -> String {
    let mut table = new_table();
    table.set_header(vec!["Category", "Monthly Goal"]);
    for goal in goals {
        table.add_row(vec![
            Cell::new(goal.category()),
            right(goal.monthly_goal_cell().to_string()),
        ]);
    }
    table.to_string()
}

/// Lists transactions with their row numbers, which is what `transactions delete --row` takes.
pub fn transactions<'a>(transactions: impl IntoIterator<Item = (usize, &'a Transaction)>) -> String {
    let mut table = new_table();
    table.set_header(vec!["Row", "Date", "Category", "Amount", "Note"]);
    for (row, txn) in transactions {
        table.add_row(vec![
            right(row.to_string()),
            Cell::new(txn.date_cell().to_string()),
            Cell::new(txn.category()),
            right(txn.amount_cell().to_string()),
            Cell::new(txn.note()),
        ]);
    }
    table.to_string()
}
