//! Spend-vs-goal reconciliation.
//!
//! Transactions are joined to goals by category. Each goal gets a line with what was spent against
//! it and what remains. Transactions whose category matches no goal are left out of the lines and
//! listed separately, but they still count toward `total_spent_all`.

use crate::model::{Goal, Goals, Matching, Transaction, Transactions};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The span of transactions considered by a reconciliation. Goals are monthly ceilings and are
/// never filtered.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Period {
    All,
    Month { year: i32, month: u32 },
}

impl Period {
    pub fn month_of(date: NaiveDate) -> Self {
        Period::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month containing today's local date.
    pub fn current_month() -> Self {
        Self::month_of(chrono::Local::now().date_naive())
    }

    /// Whether a transaction dated `date` falls in the period. Undated transactions only fall in
    /// `All`.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        match (self, date) {
            (Period::All, _) => true,
            (Period::Month { year, month }, Some(d)) => d.year() == *year && d.month() == *month,
            (Period::Month { .. }, None) => false,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::All => f.write_str("all"),
            Period::Month { year, month } => write!(f, "{year:04}-{month:02}"),
        }
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    /// Parses `all` or a month written as `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Period::All);
        }
        let date = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("'{s}' is not a month, expected YYYY-MM or 'all'"))?;
        Ok(Period::month_of(date))
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// What to reconcile and how.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Options {
    pub period: Period,
    pub matching: Matching,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            period: Period::All,
            matching: Matching::default(),
        }
    }
}

/// One goal category and the spending attributed to it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Line {
    pub category: String,
    pub goal: Decimal,
    pub spent: Decimal,
    /// `goal - spent`. Negative when over budget.
    pub remaining: Decimal,
    pub transactions: usize,
    /// Spend as a percentage of the goal, rounded to one decimal place. `None` when the goal is
    /// zero.
    pub percent_used: Option<Decimal>,
}

impl Line {
    pub fn is_over(&self) -> bool {
        self.remaining < Decimal::ZERO
    }
}

/// Spending in a category that matches no goal.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Unmatched {
    /// The category as first written in the transactions.
    pub category: String,
    pub spent: Decimal,
    pub transactions: usize,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct Totals {
    /// Sum of the goals that produced a line.
    pub total_budget: Decimal,
    /// Spend attributed to a goal.
    pub total_spent: Decimal,
    /// `total_budget - total_spent`.
    pub total_remaining: Decimal,
    /// Spend in categories with no goal.
    pub total_unmatched: Decimal,
    /// Spend of every transaction in the period, matched or not.
    pub total_spent_all: Decimal,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Reconciliation {
    pub options: Options,
    /// One line per goal category, in goal order.
    pub lines: Vec<Line>,
    /// Categories with spending but no goal, in order of first appearance.
    pub unmatched: Vec<Unmatched>,
    /// Goal rows that repeat an earlier category and were ignored.
    pub duplicate_goals: Vec<String>,
    pub totals: Totals,
    /// The transactions that fell in the period, in table order.
    pub transactions: Vec<Transaction>,
    /// Transactions with an amount cell that could not be read. They count as zero.
    pub invalid_amounts: usize,
    /// Sums that went past the range of a decimal. Those sums are clamped to the largest (or
    /// smallest) representable value.
    pub overflows: usize,
}

/// Reconciles `goals` against `transactions`.
pub fn reconcile(goals: &Goals, transactions: &Transactions, options: &Options) -> Reconciliation {
    let matching = options.matching;

    let mut lines: Vec<Line> = Vec::new();
    let mut duplicate_goals = Vec::new();
    let mut line_index: HashMap<String, usize> = HashMap::new();
    for goal in goals.data() {
        let key = matching.key(goal.category());
        if line_index.contains_key(&key) {
            duplicate_goals.push(goal.category().to_string());
            continue;
        }
        line_index.insert(key, lines.len());
        lines.push(empty_line(goal));
    }

    let mut unmatched: Vec<Unmatched> = Vec::new();
    let mut unmatched_index: HashMap<String, usize> = HashMap::new();
    let mut in_period = Vec::new();
    let mut invalid_amounts = 0;
    let mut overflows = 0;
    let mut total_spent_all = Decimal::ZERO;

    for txn in transactions.data() {
        if !options.period.contains(txn.date()) {
            continue;
        }
        if txn.amount_cell().is_invalid() {
            invalid_amounts += 1;
        }
        let amount = txn.amount();
        total_spent_all = clamped_add(total_spent_all, amount, &mut overflows);

        let key = matching.key(txn.category());
        if let Some(&ix) = line_index.get(&key) {
            let line = &mut lines[ix];
            line.spent = clamped_add(line.spent, amount, &mut overflows);
            line.transactions += 1;
        } else {
            let ix = *unmatched_index.entry(key).or_insert_with(|| {
                unmatched.push(Unmatched {
                    category: txn.category().to_string(),
                    spent: Decimal::ZERO,
                    transactions: 0,
                });
                unmatched.len() - 1
            });
            unmatched[ix].spent = clamped_add(unmatched[ix].spent, amount, &mut overflows);
            unmatched[ix].transactions += 1;
        }
        in_period.push(txn.clone());
    }

    for line in &mut lines {
        line.remaining = clamped_sub(line.goal, line.spent, &mut overflows);
        line.percent_used = percent(line.spent, line.goal);
    }

    let total_budget = clamped_sum(lines.iter().map(|l| l.goal), &mut overflows);
    let total_spent = clamped_sum(lines.iter().map(|l| l.spent), &mut overflows);
    let total_unmatched = clamped_sum(unmatched.iter().map(|u| u.spent), &mut overflows);
    let total_remaining = clamped_sub(total_budget, total_spent, &mut overflows);

    Reconciliation {
        options: *options,
        lines,
        unmatched,
        duplicate_goals,
        totals: Totals {
            total_budget,
            total_spent,
            total_remaining,
            total_unmatched,
            total_spent_all,
        },
        transactions: in_period,
        invalid_amounts,
        overflows,
    }
}

/// `a + b`, clamped to the decimal range. Each clamp is counted in `overflows`.
fn clamped_add(a: Decimal, b: Decimal, overflows: &mut usize) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        *overflows += 1;
        if b.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

/// `a - b`, clamped to the decimal range. Each clamp is counted in `overflows`.
fn clamped_sub(a: Decimal, b: Decimal, overflows: &mut usize) -> Decimal {
    a.checked_sub(b).unwrap_or_else(|| {
        *overflows += 1;
        if b.is_sign_negative() {
            Decimal::MAX
        } else {
            Decimal::MIN
        }
    })
}

fn clamped_sum(values: impl Iterator<Item = Decimal>, overflows: &mut usize) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| clamped_add(acc, v, overflows))
}

fn empty_line(goal: &Goal) -> Line {
    Line {
        category: goal.category().to_string(),
        goal: goal.monthly_goal(),
        spent: Decimal::ZERO,
        remaining: goal.monthly_goal(),
        transactions: 0,
        percent_used: None,
    }
}

fn percent(spent: Decimal, goal: Decimal) -> Option<Decimal> {
    if goal.is_zero() {
        return None;
    }
    // A ratio too large for a decimal has no meaningful percentage either.
    spent
        .checked_div(goal)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|p| p.round_dp(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goals(data: &[(&str, &str)]) -> Goals {
        Goals::new(data.iter().map(|(c, g)| Goal::new(*c, amt(g))).collect())
    }

    fn txns(data: &[(&str, &str)]) -> Transactions {
        Transactions::new(
            data.iter()
                .map(|(c, a)| Transaction::new(date(2025, 10, 5), *c, amt(a), ""))
                .collect(),
        )
    }

    fn line<'a>(r: &'a Reconciliation, category: &str) -> &'a Line {
        r.lines.iter().find(|l| l.category == category).unwrap()
    }

    #[test]
    fn test_groceries_gas_dining_scenario() {
        let g = goals(&[("Groceries", "500"), ("Gas", "100")]);
        let t = txns(&[("Groceries", "120"), ("Groceries", "45"), ("Dining", "30")]);
        for matching in [Matching::Exact, Matching::Normalized] {
            let options = Options {
                period: Period::All,
                matching,
            };
            let r = reconcile(&g, &t, &options);

            assert_eq!(r.lines.len(), 2);
            assert_eq!(r.lines[0].category, "Groceries");
            assert_eq!(r.lines[1].category, "Gas");

            let groceries = line(&r, "Groceries");
            assert_eq!(groceries.spent, dec("165"));
            assert_eq!(groceries.remaining, dec("335"));
            assert_eq!(groceries.transactions, 2);
            assert_eq!(groceries.percent_used, Some(dec("33.0")));

            let gas = line(&r, "Gas");
            assert_eq!(gas.spent, Decimal::ZERO);
            assert_eq!(gas.remaining, dec("100"));
            assert_eq!(gas.percent_used, Some(Decimal::ZERO));

            assert!(r.lines.iter().all(|l| l.category != "Dining"));
            assert_eq!(r.unmatched.len(), 1);
            assert_eq!(r.unmatched[0].category, "Dining");
            assert_eq!(r.unmatched[0].spent, dec("30"));

            assert_eq!(r.totals.total_budget, dec("600"));
            assert_eq!(r.totals.total_spent, dec("165"));
            assert_eq!(r.totals.total_remaining, dec("435"));
            assert_eq!(r.totals.total_unmatched, dec("30"));
            assert_eq!(r.totals.total_spent_all, dec("195"));
        }
    }

    #[test]
    fn test_goal_without_transactions_has_zero_spend() {
        let g = goals(&[("Travel", "$1,200.00"), ("Gifts", "0")]);
        let r = reconcile(&g, &Transactions::empty(), &Options::default());
        for l in &r.lines {
            assert_eq!(l.spent, Decimal::ZERO);
            assert_eq!(l.remaining, l.goal);
            assert_eq!(l.transactions, 0);
        }
        assert_eq!(line(&r, "Travel").goal, dec("1200"));
        assert_eq!(line(&r, "Gifts").percent_used, None);
    }

    #[test]
    fn test_matched_spend_equals_spend_in_goal_categories() {
        let g = goals(&[("Rent", "2000"), ("Fun", "50"), ("Pets", "80")]);
        let t = txns(&[
            ("Rent", "2000"),
            ("Fun", "12.34"),
            ("Coffee", "4.50"),
            ("Fun", "60"),
            ("Pets", "-10"),
            ("", "7"),
        ]);
        let r = reconcile(&g, &t, &Options::default());
        let per_line: Decimal = r.lines.iter().map(|l| l.spent).sum();
        let in_goals: Decimal = t
            .data()
            .iter()
            .filter(|txn| ["Rent", "Fun", "Pets"].contains(&txn.category()))
            .map(|txn| txn.amount())
            .sum();
        assert_eq!(per_line, in_goals);
        assert_eq!(r.totals.total_spent, in_goals);
        assert_eq!(
            r.totals.total_spent + r.totals.total_unmatched,
            r.totals.total_spent_all
        );
        assert!(line(&r, "Fun").is_over());
        assert_eq!(line(&r, "Fun").remaining, dec("-22.34"));
    }

    #[test]
    fn test_normalized_matching_folds_case_and_whitespace() {
        let g = goals(&[("Groceries", "500")]);
        let t = txns(&[("groceries ", "20"), (" GROCERIES", "5")]);

        let normalized = reconcile(&g, &t, &Options::default());
        assert_eq!(normalized.lines[0].spent, dec("25"));
        assert!(normalized.unmatched.is_empty());

        let exact = reconcile(
            &g,
            &t,
            &Options {
                period: Period::All,
                matching: Matching::Exact,
            },
        );
        assert_eq!(exact.lines[0].spent, Decimal::ZERO);
        assert_eq!(exact.unmatched.len(), 2);
    }

    #[test]
    fn test_unmatched_groups_by_matching_key() {
        let g = goals(&[("Gas", "100")]);
        let t = txns(&[("Dining", "10"), ("dining", "5"), ("Books", "3")]);
        let r = reconcile(&g, &t, &Options::default());
        assert_eq!(r.unmatched.len(), 2);
        assert_eq!(r.unmatched[0].category, "Dining");
        assert_eq!(r.unmatched[0].spent, dec("15"));
        assert_eq!(r.unmatched[0].transactions, 2);
        assert_eq!(r.unmatched[1].category, "Books");
    }

    #[test]
    fn test_duplicate_goals_first_wins() {
        let g = goals(&[("Gas", "100"), ("Food", "300"), ("gas", "999")]);
        let t = txns(&[("Gas", "40")]);
        let r = reconcile(&g, &t, &Options::default());
        assert_eq!(r.lines.len(), 2);
        assert_eq!(line(&r, "Gas").goal, dec("100"));
        assert_eq!(line(&r, "Gas").spent, dec("40"));
        assert_eq!(r.duplicate_goals, vec!["gas".to_string()]);
        assert_eq!(r.totals.total_budget, dec("400"));
    }

    #[test]
    fn test_month_period_filters_spend_and_listing() {
        let g = goals(&[("Gas", "100")]);
        let t = Transactions::new(vec![
            Transaction::new(date(2025, 9, 30), "Gas", amt("50"), "september"),
            Transaction::new(date(2025, 10, 1), "Gas", amt("20"), "october"),
            Transaction::new(date(2025, 10, 31), "Dining", amt("8"), "october"),
        ]);
        let options = Options {
            period: Period::Month {
                year: 2025,
                month: 10,
            },
            matching: Matching::Normalized,
        };
        let r = reconcile(&g, &t, &options);
        assert_eq!(r.lines[0].spent, dec("20"));
        assert_eq!(r.lines[0].goal, dec("100"));
        assert_eq!(r.totals.total_spent_all, dec("28"));
        assert_eq!(r.transactions.len(), 2);
        assert!(r.transactions.iter().all(|t| t.note() == "october"));
    }

    #[test]
    fn test_bad_cells_count_as_zero_and_undated_rows_only_count_in_all() {
        let g = goals(&[("Gas", "100")]);
        let t = Transactions::parse(vec![
            vec!["date".into(), "category".into(), "amount".into()],
            vec!["2025-10-02".into(), "Gas".into(), "ten".into()],
            vec!["someday".into(), "Gas".into(), "15".into()],
            vec!["2025-10-03".into(), "Gas".into(), "".into()],
        ])
        .unwrap();

        let all = reconcile(&g, &t, &Options::default());
        assert_eq!(all.lines[0].spent, dec("15"));
        assert_eq!(all.lines[0].transactions, 3);
        assert_eq!(all.invalid_amounts, 1);

        let october = reconcile(
            &g,
            &t,
            &Options {
                period: "2025-10".parse().unwrap(),
                matching: Matching::Normalized,
            },
        );
        assert_eq!(october.lines[0].spent, Decimal::ZERO);
        assert_eq!(october.lines[0].transactions, 2);
    }

    #[test]
    fn test_period_parse_and_display() {
        assert_eq!("all".parse::<Period>().unwrap(), Period::All);
        let p: Period = "2025-03".parse().unwrap();
        assert_eq!(
            p,
            Period::Month {
                year: 2025,
                month: 3
            }
        );
        assert_eq!(p.to_string(), "2025-03");
        assert!("2025-13".parse::<Period>().is_err());
        assert!("March".parse::<Period>().is_err());
        assert!(p.contains(Some(date(2025, 3, 31))));
        assert!(!p.contains(Some(date(2024, 3, 1))));
        assert!(!p.contains(None));
        assert!(Period::All.contains(None));
    }

    #[test]
    fn test_tiny_goal_has_no_percentage() {
        let g = goals(&[("Groceries", "0.0000000000000000000000000001")]);
        let t = txns(&[("Groceries", "1000000")]);
        let r = reconcile(&g, &t, &Options::default());
        let groceries = line(&r, "Groceries");
        assert_eq!(groceries.spent, dec("1000000"));
        assert_eq!(groceries.percent_used, None);
        assert!(groceries.is_over());
    }

    #[test]
    fn test_huge_amounts_are_clamped() {
        let max = "79228162514264337593543950335";
        let g = goals(&[("Groceries", "500")]);
        let t = txns(&[("Groceries", max), ("Groceries", max)]);
        let r = reconcile(&g, &t, &Options::default());
        let groceries = line(&r, "Groceries");
        assert_eq!(groceries.spent, Decimal::MAX);
        assert_eq!(groceries.transactions, 2);
        assert_eq!(groceries.percent_used, None);
        assert_eq!(r.totals.total_spent_all, Decimal::MAX);
        assert_eq!(r.totals.total_remaining, dec("500") - Decimal::MAX);
        assert_eq!(r.overflows, 2);
        assert_eq!(r.invalid_amounts, 0);
    }
}
