use budgeteer::args::{Args, Command, GoalsCommand, KeyCommand, TransactionsCommand};
use budgeteer::{commands, Budget, Config, Mode, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            error!("{}", e.remedy());
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // When BUDGET_IN_TEST_MODE is set and non-empty the tables live in memory, seeded with demo
    // data, and nothing is read from or written to the configured source.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.sheet_url(), init_args.credentials())
                .await?
                .print()
        }

        Command::Key(key_args) => match key_args.command() {
            KeyCommand::Normalize(args) => commands::key_normalize(args).await?.print(),
        },

        Command::Mcp(_mcp_args) => commands::mcp(Config::load(home).await?, mode)
            .await?
            .print(),

        Command::Verify => commands::verify(&open(home, mode).await?).await?.print(),

        Command::Summary(summary_args) => commands::summary(&open(home, mode).await?, summary_args)
            .await?
            .print(),

        Command::Goals(goals_args) => {
            let budget = open(home, mode).await?;
            match goals_args.command() {
                GoalsCommand::List => commands::goals_list(&budget).await?.print(),
                GoalsCommand::Set(args) => commands::goals_set(&budget, args).await?.print(),
                GoalsCommand::Delete(args) => commands::goals_delete(&budget, args).await?.print(),
            }
        }

        Command::Transactions(transactions_args) => {
            let budget = open(home, mode).await?;
            match transactions_args.command() {
                TransactionsCommand::List(args) => {
                    commands::transactions_list(&budget, args).await?.print()
                }
                TransactionsCommand::Add(args) => {
                    commands::transactions_add(&budget, args).await?.print()
                }
                TransactionsCommand::Delete(args) => {
                    commands::transactions_delete(&budget, args).await?.print()
                }
            }
        }
    };
    Ok(())
}

async fn open(home: &Path, mode: Mode) -> Result<Budget> {
    Budget::open(Config::load(home).await?, mode).await
}

/// Initializes the tracing subscriber. Logs go to stderr so that stdout carries only command
/// output (and the MCP protocol when running as a server).
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME"),
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
