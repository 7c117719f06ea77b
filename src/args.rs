//! These structs provide the CLI interface for the budget CLI. Argument structs that are also MCP
//! tool parameters derive `Deserialize` and `JsonSchema` as well as `Parser`.

use crate::config::ReconcileSettings;
use crate::error::{Error, ErrorType};
use crate::model::Matching;
use crate::reconcile::{Options, Period};
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: track spending against monthly goals.
///
/// Your budget is two tables. Transactions holds what you spent (date, category, amount, note)
/// and Goals holds what you plan to spend per month in each category (category, monthly_goal).
/// The tables can live in two local CSV files, in a Google sheet that is shared publicly
/// (read-only), or in a Google sheet that is shared with a Google Cloud service account.
///
/// Start with `budget init`. There is also a mode in which an AI agent can use this program
/// through the mcp subcommand.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the budget home directory and its configuration.
    ///
    /// - With no options, the budget is kept in `transactions.csv` and `goals.csv` in the budget
    ///   home directory.
    ///
    /// - With --sheet-url only, the budget is read from a Google sheet shared as "Anyone with the
    ///   link". This is read-only.
    ///
    /// - With --sheet-url and --credentials, the budget is read from and written to a Google sheet
    ///   that is shared with a service account. The credentials file is the JSON key you download
    ///   for the service account, and it is copied into the budget home.
    ///
    /// The sheet needs two tabs named Transactions and Goals.
    Init(InitArgs),
    /// Read both tables and report what was found.
    Verify,
    /// Show spending against goals.
    Summary(SummaryArgs),
    /// List, set or delete monthly goals.
    Goals(GoalsArgs),
    /// List, add or delete transactions.
    Transactions(TransactionsArgs),
    /// Private key utilities.
    Key(KeyArgs),
    /// Run an MCP server over stdio so that an AI agent can use your budget.
    Mcp(McpArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where budget configuration (and local data) is held. Defaults to ~/budget
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// (Not shown): Args for the `budget init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of your Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: Option<String>,

    /// The path to a service account key (JSON). Requires --sheet-url.
    #[arg(long, requires = "sheet_url")]
    credentials: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(sheet_url: Option<String>, credentials: Option<PathBuf>) -> Self {
        Self {
            sheet_url,
            credentials,
        }
    }

    pub fn sheet_url(&self) -> Option<&str> {
        self.sheet_url.as_deref()
    }

    pub fn credentials(&self) -> Option<&Path> {
        self.credentials.as_deref()
    }
}

/// Which transactions to consider. With neither option the configured default is used.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "PeriodArgs")]
pub struct PeriodArgs {
    /// A month written as YYYY-MM, e.g. 2025-10.
    #[arg(long, conflicts_with = "all")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,

    /// Consider every transaction regardless of its date.
    #[arg(long)]
    #[serde(default)]
    pub all: bool,
}

impl PeriodArgs {
    /// Resolves the period, falling back to `settings` when no option was given.
    pub fn period(&self, settings: &ReconcileSettings) -> crate::Result<Period> {
        match (&self.month, self.all) {
            (Some(_), true) => Err(Error::msg(
                ErrorType::Request,
                "Give either a month or 'all', not both",
            )),
            (Some(month), false) => {
                Period::from_str(month).map_err(|e| Error::new(ErrorType::Request, e))
            }
            (None, true) => Ok(Period::All),
            (None, false) => Ok(settings.period.period()),
        }
    }
}

/// Args for the `budget summary` command and the `summary` tool.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "SummaryArgs")]
pub struct SummaryArgs {
    #[command(flatten)]
    #[serde(flatten)]
    pub period: PeriodArgs,

    /// How categories are matched: 'normalized' ignores case and surrounding spaces, 'exact'
    /// compares the text as written. Defaults to the configured setting.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<Matching>,
}

impl SummaryArgs {
    pub fn options(&self, settings: &ReconcileSettings) -> crate::Result<Options> {
        Ok(Options {
            period: self.period.period(settings)?,
            matching: self.matching.unwrap_or(settings.category_matching),
        })
    }
}

/// (Not shown): Args for the `budget goals` command.
#[derive(Debug, Parser, Clone)]
pub struct GoalsArgs {
    #[command(subcommand)]
    command: GoalsCommand,
}

impl GoalsArgs {
    pub fn new(command: GoalsCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &GoalsCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum GoalsCommand {
    /// Show every goal.
    List,
    /// Set the monthly goal of a category, adding the category if it has no goal yet.
    Set(SetGoalArgs),
    /// Delete the goal of a category.
    Delete(DeleteGoalArgs),
}

/// Args for `budget goals set` and the `set_goal` tool.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "SetGoalArgs")]
pub struct SetGoalArgs {
    /// The category, e.g. "Groceries".
    #[arg(long)]
    pub category: String,

    /// The monthly goal, e.g. "500" or "$1,200.00".
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,
}

/// Args for `budget goals delete` and the `delete_goal` tool.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "DeleteGoalArgs")]
pub struct DeleteGoalArgs {
    /// The category whose goal is deleted.
    #[arg(long)]
    pub category: String,
}

/// (Not shown): Args for the `budget transactions` command.
#[derive(Debug, Parser, Clone)]
pub struct TransactionsArgs {
    #[command(subcommand)]
    command: TransactionsCommand,
}

impl TransactionsArgs {
    pub fn new(command: TransactionsCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &TransactionsCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TransactionsCommand {
    /// Show transactions with their row numbers.
    List(PeriodArgs),
    /// Append a transaction.
    Add(AddTransactionArgs),
    /// Delete the last transaction, or the transaction at a row number.
    Delete(DeleteTransactionArgs),
}

/// Args for `budget transactions add` and the `add_transaction` tool.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "AddTransactionArgs")]
pub struct AddTransactionArgs {
    /// The date, e.g. 2025-10-05 or 10/5/2025. Defaults to today.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// The category, e.g. "Groceries". It should match a goal category to count against it.
    #[arg(long)]
    pub category: String,

    /// The amount spent, e.g. "45.10" or "$1,200.00".
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,

    /// A free-text note, e.g. the merchant.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Args for `budget transactions delete` and the `delete_transaction` tool.
#[derive(Debug, Default, Clone, Parser, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "DeleteTransactionArgs")]
pub struct DeleteTransactionArgs {
    /// Delete the last transaction.
    #[arg(long, conflicts_with = "row", required_unless_present = "row")]
    #[serde(default)]
    pub last: bool,

    /// Delete the transaction at this row number, as shown by `transactions list`. The first
    /// transaction is row 1.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

/// (Not shown): Args for the `budget key` command.
#[derive(Debug, Parser, Clone)]
pub struct KeyArgs {
    #[command(subcommand)]
    command: KeyCommand,
}

impl KeyArgs {
    pub fn new(command: KeyCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &KeyCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum KeyCommand {
    /// Repair a PEM private key that has escaped newlines, extra spaces, or a missing header or
    /// footer, and print it.
    Normalize(NormalizeKeyArgs),
}

/// (Not shown): Args for the `budget key normalize` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct NormalizeKeyArgs {
    /// Read the key from this file instead of stdin. A service account JSON file is accepted too,
    /// in which case its private_key field is normalized.
    #[arg(long)]
    file: Option<PathBuf>,
}

impl NormalizeKeyArgs {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// (Not shown): Args for the `budget mcp` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct McpArgs {}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("budget")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PeriodSetting;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("budget").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_summary() {
        let args = parse(&["--budget-home", "/tmp/b", "summary", "--month", "2025-10"]);
        assert_eq!(args.common().budget_home().path(), Path::new("/tmp/b"));
        match args.command() {
            Command::Summary(s) => {
                let options = s.options(&ReconcileSettings::default()).unwrap();
                assert_eq!(
                    options.period,
                    Period::Month {
                        year: 2025,
                        month: 10
                    }
                );
                assert_eq!(options.matching, Matching::Normalized);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_summary_month_conflicts_with_all() {
        let result = Args::try_parse_from(["budget", "summary", "--month", "2025-10", "--all"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_period_defaults_to_settings() {
        let settings = ReconcileSettings {
            period: PeriodSetting::All,
            category_matching: Matching::Exact,
        };
        let args = SummaryArgs::default();
        let options = args.options(&settings).unwrap();
        assert_eq!(options.period, Period::All);
        assert_eq!(options.matching, Matching::Exact);
    }

    #[test]
    fn test_bad_month_is_request_error() {
        let args = PeriodArgs {
            month: Some("October".to_string()),
            all: false,
        };
        let e = args.period(&ReconcileSettings::default()).unwrap_err();
        assert_eq!(e.error_type(), ErrorType::Request);
    }

    #[test]
    fn test_parse_transactions_add_negative_amount() {
        let args = parse(&[
            "transactions",
            "add",
            "--category",
            "Refunds",
            "--amount",
            "-12.50",
        ]);
        match args.command() {
            Command::Transactions(t) => match t.command() {
                TransactionsCommand::Add(add) => {
                    assert_eq!(add.amount, "-12.50");
                    assert!(add.date.is_none());
                }
                other => panic!("unexpected command {other:?}"),
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_delete_needs_last_or_row() {
        assert!(Args::try_parse_from(["budget", "transactions", "delete"]).is_err());
        assert!(
            Args::try_parse_from(["budget", "transactions", "delete", "--last", "--row", "2"])
                .is_err()
        );
        let args = parse(&["transactions", "delete", "--row", "2"]);
        match args.command() {
            Command::Transactions(t) => match t.command() {
                TransactionsCommand::Delete(d) => assert_eq!(d.row, Some(2)),
                other => panic!("unexpected command {other:?}"),
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_init_credentials_requires_url() {
        assert!(Args::try_parse_from(["budget", "init", "--credentials", "key.json"]).is_err());
        let args = parse(&["init"]);
        match args.command() {
            Command::Init(init) => {
                assert!(init.sheet_url().is_none());
                assert!(init.credentials().is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
