//! Transaction command handlers.

use crate::args::{AddTransactionArgs, DeleteTransactionArgs, PeriodArgs};
use crate::commands::goals::parse_amount;
use crate::commands::Out;
use crate::error::{Error, ErrorType};
use crate::model::{parse_date, Transaction};
use crate::{render, Budget, Result};
use chrono::Local;
use serde::Serialize;

/// A transaction together with its row number. Row 1 is the first transaction below the header.
#[derive(Debug, Clone, Serialize)]
pub struct NumberedTransaction {
    pub row: usize,
    #[serde(flatten)]
    pub transaction: Transaction,
}

/// Lists the transactions that fall in the requested period.
pub async fn transactions_list(
    budget: &Budget,
    args: &PeriodArgs,
) -> Result<Out<Vec<NumberedTransaction>>> {
    let period = args.period(budget.config().reconcile())?;
    let transactions = budget.transactions().await?;
    let total = transactions.len();
    let listed: Vec<NumberedTransaction> = transactions
        .into_data()
        .into_iter()
        .enumerate()
        .filter(|(_, txn)| period.contains(txn.date()))
        .map(|(ix, transaction)| NumberedTransaction {
            row: ix + 1,
            transaction,
        })
        .collect();
    let display = render::transactions(listed.iter().map(|n| (n.row, &n.transaction)));
    Ok(Out::new(
        format!(
            "Found {} of {total} transactions for {period}",
            listed.len()
        ),
        listed,
    )
    .with_display(display))
}

/// Appends a transaction. The date defaults to today.
///
/// # Errors
/// - Returns a `Request` error if the date or amount cannot be parsed or the category is blank.
/// - Returns an `Authentication` error for a public (read-only) sheet.
pub async fn transactions_add(
    budget: &Budget,
    args: &AddTransactionArgs,
) -> Result<Out<Transaction>> {
    let date = match args.date.as_deref() {
        Some(s) => parse_date(s).ok_or_else(|| {
            Error::msg(
                ErrorType::Request,
                format!("'{s}' is not a date, expected e.g. 2025-10-05 or 10/5/2025"),
            )
        })?,
        None => Local::now().date_naive(),
    };
    let amount = parse_amount(&args.amount)?;
    let transaction = Transaction::new(
        date,
        args.category.trim(),
        amount,
        args.note.clone().unwrap_or_default(),
    );
    budget.add_transaction(transaction.clone()).await?;
    Ok(Out::new(
        format!(
            "Added {amount} for '{}' on {date}",
            transaction.category()
        ),
        transaction,
    ))
}

/// Deletes the last transaction or the one at `args.row`.
pub async fn transactions_delete(
    budget: &Budget,
    args: &DeleteTransactionArgs,
) -> Result<Out<Transaction>> {
    let removed = match (args.last, args.row) {
        (true, None) => budget.delete_last_transaction().await?,
        (false, Some(row)) => budget.delete_transaction(row).await?,
        _ => {
            return Err(Error::msg(
                ErrorType::Request,
                "Give exactly one of 'last' or 'row'",
            ))
        }
    };
    Ok(Out::new(
        format!(
            "Deleted the transaction {} '{}' {}",
            removed.date_cell(),
            removed.category(),
            removed.amount_cell()
        ),
        removed,
    ))
}
