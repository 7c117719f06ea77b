use crate::commands::Out;
use crate::{Config, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// What `init` created.
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub budget_home: PathBuf,
    pub config_path: PathBuf,
    /// `local`, `public` or `google`.
    pub source: String,
}

/// Creates the budget home directory, its subdirectories and an initial `config.json`.
///
/// # Arguments
/// - `budget_home` - The directory that will be the root of the budget home, e.g. `$HOME/budget`
/// - `sheet_url` - The URL of a Google sheet holding `Transactions` and `Goals` tabs. Without it,
///   the budget is kept in local CSV files.
/// - `credentials` - A service account key. This will be copied into the budget home. Without it
///   the sheet is read through its public CSV export and cannot be changed.
///
/// # Errors
/// - Returns an error if the URL or the credentials are invalid.
/// - Returns an error if any file operations fail.
pub async fn init(
    budget_home: &Path,
    sheet_url: Option<&str>,
    credentials: Option<&Path>,
) -> Result<Out<InitReport>> {
    let config = Config::create(budget_home, sheet_url, credentials)
        .await
        .map_err(|e| e.context("Unable to create the budget home directory and config"))?;
    let report = InitReport {
        budget_home: config.root().to_path_buf(),
        config_path: config.config_path().to_path_buf(),
        source: config.source_kind().to_string(),
    };
    Ok(Out::new(
        format!(
            "Successfully created the budget home at '{}' with a {} source",
            report.budget_home.display(),
            report.source
        ),
        report,
    ))
}
