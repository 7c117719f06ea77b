//! The MCP tools. Each one calls the command handler of the same name.

use crate::args::{
    AddTransactionArgs, DeleteGoalArgs, DeleteTransactionArgs, PeriodArgs, SetGoalArgs,
    SummaryArgs,
};
use crate::commands;
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::BudgetServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use tracing::info;

#[tool_router(vis = "pub(super)")]
impl BudgetServer {
    #[tool]
    /// Initialize the budget MCP service for this session and return usage instructions. You
    /// **MUST** call this **ONCE** before using other tools so that you have the full usage
    /// instructions. You **MAY** call it more than once if you have forgotten the usage
    /// instructions.
    async fn initialize_service(&self) -> Result<CallToolResult, McpError> {
        let mut initialized = self.initialized.lock().await;
        *initialized = true;
        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            include_str!("docs/INSTRUCTIONS.md"),
        )]))
    }

    /// Read both the Transactions and Goals tables and report how many rows each has. Unlike
    /// `summary` this does not substitute an empty table when a table cannot be read. Use it to
    /// diagnose connection and sharing problems or a missing tab.
    #[tool]
    async fn verify_source(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: verify_source called");
        tool_result(commands::verify(&self.budget).await)
    }

    /// Compare spending to monthly goals.
    ///
    /// # Parameters
    ///
    /// - `month`: A month written as `YYYY-MM`. Only transactions dated in that month count.
    /// - `all`: Count every transaction regardless of date. Do not combine with `month`.
    /// - `matching`: `normalized` (ignore case and surrounding spaces) or `exact`.
    ///
    /// With neither `month` nor `all`, the configured default applies (usually the current
    /// month).
    ///
    /// # Returns
    ///
    /// A one-line summary and a JSON object with:
    ///
    /// - `lines`: one entry per goal category, in goal order, with `goal`, `spent`, `remaining`
    ///   (negative when over budget), `transactions` and `percent_used`.
    /// - `unmatched`: categories that have spending but no goal. Their spend is not in any line.
    /// - `duplicate_goals`: goal rows that repeat a category and were ignored.
    /// - `totals`: `total_budget`, `total_spent` (matched categories only), `total_remaining`,
    ///   `total_unmatched` and `total_spent_all`.
    ///
    /// If a table cannot be reached it is treated as empty and a warning is logged.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "month": "2025-10"
    /// }
    /// ```
    #[tool]
    async fn summary(
        &self,
        Parameters(args): Parameters<SummaryArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: summary called with {args:?}");
        tool_result(commands::summary(&self.budget, &args).await)
    }

    /// List every monthly goal as it appears in the Goals table.
    #[tool]
    async fn list_goals(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: list_goals called");
        tool_result(commands::goals_list(&self.budget).await)
    }

    /// Set the monthly goal of a category.
    ///
    /// The first goal whose category matches is updated in place (the whole Goals table is
    /// rewritten, after a snapshot is saved to the backups directory). If no goal matches, a new
    /// row is appended. The result is `updated` or `inserted`.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "category": "Groceries",
    ///   "amount": "550"
    /// }
    /// ```
    #[tool]
    async fn set_goal(
        &self,
        Parameters(args): Parameters<SetGoalArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: set_goal called with {args:?}");
        tool_result(commands::goals_set(&self.budget, &args).await)
    }

    /// Delete the goal of a category. Transactions in that category are not touched; they will
    /// show up as unmatched in `summary`. Returns an error if no goal matches.
    #[tool]
    async fn delete_goal(
        &self,
        Parameters(args): Parameters<DeleteGoalArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: delete_goal called with {args:?}");
        tool_result(commands::goals_delete(&self.budget, &args).await)
    }

    /// List transactions with their row numbers. Row numbers count from 1 (the first row below
    /// the header) and are what `delete_transaction` takes.
    ///
    /// # Parameters
    ///
    /// - `month`: A month written as `YYYY-MM`.
    /// - `all`: Every transaction.
    ///
    /// With neither, the configured default applies.
    #[tool]
    async fn list_transactions(
        &self,
        Parameters(args): Parameters<PeriodArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: list_transactions called with {args:?}");
        tool_result(commands::transactions_list(&self.budget, &args).await)
    }

    /// Append a transaction to the Transactions table.
    ///
    /// The `date` may be `YYYY-MM-DD` or `M/D/YYYY` and defaults to today. The `amount` may
    /// include a dollar sign and thousands separators. The `category` should match a goal
    /// category for the spending to count against that goal.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "date": "2025-10-22",
    ///   "category": "Groceries",
    ///   "amount": "45.10",
    ///   "note": "Farmers market"
    /// }
    /// ```
    #[tool]
    async fn add_transaction(
        &self,
        Parameters(args): Parameters<AddTransactionArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: add_transaction called with {args:?}");
        tool_result(commands::transactions_add(&self.budget, &args).await)
    }

    /// Delete one transaction: either the last one (`"last": true`) or the one at `row`.
    ///
    /// The whole Transactions table is rewritten, after a snapshot is saved to the backups
    /// directory. Row numbers shift after a delete, so call `list_transactions` again before
    /// deleting another row.
    #[tool]
    async fn delete_transaction(
        &self,
        Parameters(args): Parameters<DeleteTransactionArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: delete_transaction called with {args:?}");
        tool_result(commands::transactions_delete(&self.budget, &args).await)
    }
}
