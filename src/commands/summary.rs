use crate::args::SummaryArgs;
use crate::commands::Out;
use crate::reconcile::Reconciliation;
use crate::{render, Budget, Result};

/// Reconciles spending against goals. Tables that cannot be read are shown as empty, with a
/// warning.
pub async fn summary(budget: &Budget, args: &SummaryArgs) -> Result<Out<Reconciliation>> {
    let options = args.options(budget.config().reconcile())?;
    let r = budget.reconcile(&options).await?;
    let over: Vec<&str> = r
        .lines
        .iter()
        .filter(|line| line.is_over())
        .map(|line| line.category.as_str())
        .collect();
    let mut message = format!(
        "Spent {} of {} for {}",
        render::money(r.totals.total_spent),
        render::money(r.totals.total_budget),
        r.options.period
    );
    if !over.is_empty() {
        message.push_str(&format!(". Over budget: {}", over.join(", ")));
    }
    let display = render::summary(&r);
    Ok(Out::new(message, r).with_display(display))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Mode;
    use crate::args::PeriodArgs;
    use crate::model::Matching;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_summary_october() {
        let env = TestEnv::new().await;
        let budget = env.budget(Mode::Testing).await;
        let args = SummaryArgs {
            period: PeriodArgs {
                month: Some("2025-10".to_string()),
                all: false,
            },
            matching: Some(Matching::Exact),
        };
        let out = summary(&budget, &args).await.unwrap();
        assert_eq!(
            out.message(),
            "Spent $1,044.16 of $1,190.00 for 2025-10. Over budget: Gas & Fuel, Utilities"
        );
        let r = out.structure().unwrap();
        let gas = r.lines.iter().find(|l| l.category == "Gas & Fuel").unwrap();
        assert_eq!(gas.remaining, Decimal::from_str("-17.85").unwrap());
        assert!(out.display().unwrap().contains("Entertainment"));
    }

    #[tokio::test]
    async fn test_summary_other_month_is_empty() {
        let env = TestEnv::new().await;
        let budget = env.budget(Mode::Testing).await;
        let args = SummaryArgs {
            period: PeriodArgs {
                month: Some("2024-01".to_string()),
                all: false,
            },
            matching: None,
        };
        let out = summary(&budget, &args).await.unwrap();
        let r = out.structure().unwrap();
        assert_eq!(r.totals.total_spent_all, Decimal::ZERO);
        assert_eq!(r.lines.len(), 5);
        assert!(r.lines.iter().all(|l| l.remaining == l.goal));
    }

    #[tokio::test]
    async fn test_summary_with_missing_goals_table() {
        let env = TestEnv::new().await;
        crate::utils::remove(env.goals_csv()).await.unwrap();
        let budget = env.budget(Mode::Live).await;
        let args = SummaryArgs {
            period: PeriodArgs {
                month: None,
                all: true,
            },
            matching: None,
        };
        let out = summary(&budget, &args).await.unwrap();
        assert!(out.structure().unwrap().lines.is_empty());
    }
}
