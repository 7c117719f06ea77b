use crate::commands::Out;
use crate::{Budget, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub source: String,
    pub transactions: usize,
    pub goals: usize,
}

/// Reads both tables without falling back to empty tables, so that any problem with the source
/// is reported.
pub async fn verify(budget: &Budget) -> Result<Out<VerifyReport>> {
    let source = budget.describe().await;
    let transactions = budget
        .transactions()
        .await
        .map_err(|e| e.context(format!("Unable to read the transactions from {source}")))?;
    let goals = budget
        .goals()
        .await
        .map_err(|e| e.context(format!("Unable to read the goals from {source}")))?;
    let report = VerifyReport {
        source,
        transactions: transactions.len(),
        goals: goals.len(),
    };
    Ok(Out::new(
        format!(
            "Read {} transactions and {} goals from {}",
            report.transactions, report.goals, report.source
        ),
        report,
    ))
}
