//! The budget data source: typed reads and serialized read-modify-write cycles over a `Sheet`.

use crate::api::{self, Mode, Sheet};
use crate::error::{Error, ErrorType, Fallback};
use crate::model::{Amount, Goal, Goals, Item, Items, Transaction, Transactions};
use crate::reconcile::{self, Options, Reconciliation};
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What `Budget::set_goal` did.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalChange {
    Updated,
    Inserted,
}

serde_plain::derive_display_from_serialize!(GoalChange);

/// Owns the connection to the configured data source. Share it (e.g. in an `Arc`) rather than
/// opening a second one: writes are serialized per table only within one `Budget`.
pub struct Budget {
    config: Config,
    mode: Mode,
    sheet: Mutex<Box<dyn Sheet + Send>>,
    transactions_lock: Mutex<()>,
    goals_lock: Mutex<()>,
}

impl Debug for Budget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Budget")
            .field("config", &self.config)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Budget {
    /// Connects to the source named by `config`, or to the in-memory test sheet in
    /// `Mode::Testing`.
    pub async fn open(config: Config, mode: Mode) -> Result<Self> {
        let sheet = api::sheet(&config, mode).await?;
        debug!("Opened {}", sheet.describe());
        Ok(Self {
            config,
            mode,
            sheet: Mutex::new(sheet),
            transactions_lock: Mutex::new(()),
            goals_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Where the data lives, e.g. "local files '…' and '…'".
    pub async fn describe(&self) -> String {
        self.sheet.lock().await.describe()
    }

    pub async fn goals(&self) -> Result<Goals> {
        Ok(self.read::<Goal>().await?.1)
    }

    pub async fn transactions(&self) -> Result<Transactions> {
        Ok(self.read::<Transaction>().await?.1)
    }

    /// Like `goals`, but a source that cannot be reached or a missing table gives an empty table.
    pub async fn goals_or_empty(&self) -> Result<Goals> {
        self.read_or_empty::<Goal>().await
    }

    /// Like `transactions`, but a source that cannot be reached or a missing table gives an empty
    /// table.
    pub async fn transactions_or_empty(&self) -> Result<Transactions> {
        self.read_or_empty::<Transaction>().await
    }

    /// Reads both tables, applying the empty-table fallback, and reconciles them.
    pub async fn reconcile(&self, options: &Options) -> Result<Reconciliation> {
        let goals = self.goals_or_empty().await?;
        let transactions = self.transactions_or_empty().await?;
        Ok(reconcile::reconcile(&goals, &transactions, options))
    }

    /// Appends `transaction` to the Transactions table. A table without a header row gets the
    /// default header row first.
    pub async fn add_transaction(&self, transaction: Transaction) -> Result<()> {
        if transaction.category().trim().is_empty() {
            return Err(Error::msg(
                ErrorType::Request,
                "A transaction needs a category",
            ));
        }
        let _guard = self.transactions_lock.lock().await;
        let (raw, transactions) = self.read::<Transaction>().await?;
        let mut sheet = self.sheet.lock().await;
        if has_header(&raw) {
            let row = transactions.row_of(&transaction);
            sheet.append(Transaction::TABLE, &row).await?;
        } else {
            let fresh = Transactions::new(vec![transaction]);
            sheet.put(Transaction::TABLE, &fresh.to_rows()).await?;
        }
        info!("Added a transaction to {}", sheet.describe());
        Ok(())
    }

    /// Sets the monthly goal of the first goal whose category matches `category`, or appends a new
    /// goal if none does. Categories are compared with the configured matching.
    pub async fn set_goal(&self, category: &str, amount: Amount) -> Result<GoalChange> {
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::msg(ErrorType::Request, "A goal needs a category"));
        }
        let matching = self.config.reconcile().category_matching;
        let _guard = self.goals_lock.lock().await;
        let (raw, mut goals) = self.read::<Goal>().await?;

        if let Some(ix) = goals
            .iter()
            .position(|g| matching.matches(g.category(), category))
        {
            goals.data_mut()[ix].set_monthly_goal(amount);
            self.overwrite(&raw, &goals).await?;
            return Ok(GoalChange::Updated);
        }

        let goal = Goal::new(category, amount);
        let mut sheet = self.sheet.lock().await;
        if has_header(&raw) {
            let row = goals.row_of(&goal);
            sheet.append(Goal::TABLE, &row).await?;
        } else {
            goals.push(goal);
            sheet.put(Goal::TABLE, &goals.to_rows()).await?;
        }
        info!("Added a goal for '{category}' to {}", sheet.describe());
        Ok(GoalChange::Inserted)
    }

    /// Removes the first goal whose category matches `category` and returns it.
    pub async fn delete_goal(&self, category: &str) -> Result<Goal> {
        let matching = self.config.reconcile().category_matching;
        let _guard = self.goals_lock.lock().await;
        let (raw, mut goals) = self.read::<Goal>().await?;
        let ix = goals
            .iter()
            .position(|g| matching.matches(g.category(), category))
            .ok_or_else(|| {
                Error::msg(
                    ErrorType::Request,
                    format!("There is no goal for the category '{category}'"),
                )
            })?;
        let removed = goals.data_mut().remove(ix);
        self.overwrite(&raw, &goals).await?;
        Ok(removed)
    }

    /// Removes the last transaction and returns it.
    pub async fn delete_last_transaction(&self) -> Result<Transaction> {
        let _guard = self.transactions_lock.lock().await;
        let (raw, mut transactions) = self.read::<Transaction>().await?;
        let removed = transactions.data_mut().pop().ok_or_else(|| {
            Error::msg(ErrorType::Request, "There are no transactions to delete")
        })?;
        self.overwrite(&raw, &transactions).await?;
        Ok(removed)
    }

    /// Removes the transaction at `row`, counting data rows from 1, and returns it.
    pub async fn delete_transaction(&self, row: usize) -> Result<Transaction> {
        let _guard = self.transactions_lock.lock().await;
        let (raw, mut transactions) = self.read::<Transaction>().await?;
        if row == 0 || row > transactions.len() {
            return Err(Error::msg(
                ErrorType::Request,
                format!(
                    "Row {row} does not exist, there are {} transactions",
                    transactions.len()
                ),
            ));
        }
        let removed = transactions.data_mut().remove(row - 1);
        self.overwrite(&raw, &transactions).await?;
        Ok(removed)
    }

    /// Reads `I::TABLE`, returning the raw rows alongside the parsed table.
    async fn read<I: Item>(&self) -> Result<(Vec<Vec<String>>, Items<I>)> {
        let raw = self.sheet.lock().await.get(I::TABLE).await?;
        let items = Items::<I>::parse(raw.clone())?;
        debug!("Read {} rows from the {} table", items.len(), I::TABLE);
        Ok((raw, items))
    }

    async fn read_or_empty<I: Item>(&self) -> Result<Items<I>> {
        match self.read::<I>().await {
            Ok((_, items)) => Ok(items),
            Err(e) if e.fallback() == Fallback::EmptyTable => {
                warn!(
                    "Unable to read the {} table, showing it as empty: {e:#}. {}",
                    I::TABLE,
                    e.remedy()
                );
                Ok(Items::empty())
            }
            Err(e) => Err(e),
        }
    }

    /// Snapshots `raw` and then replaces the table with `items`.
    async fn overwrite<I: Item>(&self, raw: &[Vec<String>], items: &Items<I>) -> Result<()> {
        let mut sheet = self.sheet.lock().await;
        let source = sheet.describe();
        if let Some(path) = self
            .config
            .backup()
            .save_snapshot(I::TABLE, &source, raw)
            .await?
        {
            debug!("Backed up the {} table to {}", I::TABLE, path.display());
        }
        sheet.put(I::TABLE, &items.to_rows()).await?;
        info!("Rewrote the {} table in {source}", I::TABLE);
        Ok(())
    }
}

fn has_header(raw: &[Vec<String>]) -> bool {
    raw.iter()
        .any(|row| row.iter().any(|cell| !cell.trim().is_empty()))
}
