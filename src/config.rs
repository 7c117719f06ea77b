//! Configuration file handling for budgeteer.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json`. It says where the budget data
//! lives (local CSV files, a public Google sheet, or a private Google sheet reached with a service
//! account) and how reconciliation should behave by default.

use crate::backup::Backup;
use crate::credentials::{resolve_credentials, CredentialSource, ServiceAccountCredentials};
use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::{Goal, Item, Matching, Transaction};
use crate::reconcile::Period;
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

const APP_NAME: &str = "budgeteer";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const SERVICE_ACCOUNT_JSON: &str = "service_account.json";
const TRANSACTIONS_CSV: &str = "transactions.csv";
const GOALS_CSV: &str = "goals.csv";

/// When set, this environment variable holds the service account credentials as a JSON string and
/// takes precedence over the credentials in `config.json`.
pub const CREDENTIALS_ENV: &str = "BUDGET_CREDENTIALS_JSON";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`. Everything it
/// points to is resolved when it is loaded: paths are absolute, the spreadsheet id has been
/// extracted, and credentials have been read and normalized.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    source: Source,
}

/// Where the budget tables live, fully resolved.
#[derive(Debug, Clone)]
pub enum Source {
    Local {
        transactions: PathBuf,
        goals: PathBuf,
    },
    Public {
        spreadsheet_id: String,
    },
    Google {
        spreadsheet_id: String,
        credentials: ServiceAccountCredentials,
    },
}

impl Config {
    /// Creates the home directory, its subdirectories and an initial `config.json`.
    ///
    /// - With no `sheet_url` the source is a pair of local CSV files, which are created with
    ///   header rows if they do not exist.
    /// - With a `sheet_url` only, the source is a public (read-only) Google sheet.
    /// - With a `sheet_url` and a `credentials` file, the source is a Google sheet reached with a
    ///   service account. The credentials file is copied to `.secrets/service_account.json`.
    ///
    /// # Errors
    /// - Returns a `Config` error if the URL or credentials are invalid, or `credentials` is given
    ///   without `sheet_url`.
    /// - Returns an error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        sheet_url: Option<&str>,
        credentials: Option<&Path>,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")
            .pub_result(ErrorType::Config)?;
        let root = utils::canonicalize(&maybe_relative)
            .await
            .pub_result(ErrorType::Config)?;

        let backups_dir = root.join(BACKUPS);
        utils::make_dir(&backups_dir)
            .await
            .pub_result(ErrorType::Config)?;
        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir)
            .await
            .pub_result(ErrorType::Config)?;

        let source = match (sheet_url, credentials) {
            (None, None) => {
                create_csv::<Transaction>(&root.join(TRANSACTIONS_CSV)).await?;
                create_csv::<Goal>(&root.join(GOALS_CSV)).await?;
                SourceConfig::Local {
                    transactions_path: None,
                    goals_path: None,
                }
            }
            (None, Some(_)) => {
                return Err(Error::msg(
                    ErrorType::Config,
                    "A credentials file was given without a sheet URL",
                ))
            }
            (Some(url), None) => {
                let _ = extract_spreadsheet_id(url).pub_result(ErrorType::Config)?;
                SourceConfig::Public {
                    spreadsheet: url.to_string(),
                }
            }
            (Some(url), Some(credentials)) => {
                let _ = extract_spreadsheet_id(url).pub_result(ErrorType::Config)?;
                // Fail now, rather than on first use, if the file is not a service account key.
                let _ = ServiceAccountCredentials::load(credentials).await?;
                let destination = secrets_dir.join(SERVICE_ACCOUNT_JSON);
                utils::copy(credentials, &destination)
                    .await
                    .pub_result(ErrorType::Config)?;
                SourceConfig::Google {
                    spreadsheet: Some(url.to_string()),
                    spreadsheet_id: None,
                    credentials: None,
                    credentials_path: None,
                }
            }
        };

        let config_file = ConfigFile {
            source,
            ..ConfigFile::default()
        };
        config_file
            .save(root.join(CONFIG_JSON))
            .await
            .pub_result(ErrorType::Config)?;
        info!("Created {}", root.join(CONFIG_JSON).display());

        Self::load(root).await
    }

    /// This will
    /// - validate that the `budget_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups and secrets directories exist
    /// - resolve the source, reading credentials (`BUDGET_CREDENTIALS_JSON` wins over the file)
    /// - return the loaded configuration object
    pub async fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let env_credentials = std::env::var(CREDENTIALS_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty());
        Self::load_with_credentials(budget_home, env_credentials).await
    }

    pub(crate) async fn load_with_credentials(
        budget_home: impl Into<PathBuf>,
        env_credentials: Option<String>,
    ) -> Result<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The budget home directory is missing")
            .pub_result(ErrorType::Config)?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            return Err(Error::msg(
                ErrorType::Config,
                format!("The config file is missing '{}'", config_path.display()),
            ));
        }
        let config_file = ConfigFile::load(&config_path)
            .await
            .pub_result(ErrorType::Config)?;

        let backups = root.join(BACKUPS);
        let secrets = root.join(SECRETS);
        for dir in [&backups, &secrets] {
            if !dir.is_dir() {
                return Err(Error::msg(
                    ErrorType::Config,
                    format!("The directory '{}' is missing", dir.display()),
                ));
            }
        }

        let source = config_file.source.resolve(&root, env_credentials).await?;
        debug!("Loaded {} with source {:?}", config_path.display(), source);

        Ok(Self {
            root,
            backups,
            secrets,
            config_path,
            config_file,
            source,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The name of the source kind: `local`, `public` or `google`.
    pub fn source_kind(&self) -> &'static str {
        match self.source {
            Source::Local { .. } => "local",
            Source::Public { .. } => "public",
            Source::Google { .. } => "google",
        }
    }

    /// Identifies the data source: the spreadsheet id, or the home directory for local files.
    pub fn source_id(&self) -> String {
        match &self.source {
            Source::Local { .. } => self.root.to_string_lossy().to_string(),
            Source::Public { spreadsheet_id } | Source::Google { spreadsheet_id, .. } => {
                spreadsheet_id.clone()
            }
        }
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn reconcile(&self) -> &ReconcileSettings {
        &self.config_file.reconcile
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

/// Default reconciliation settings. Command-line flags and tool parameters override them.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ReconcileSettings {
    /// Which transactions count: `current_month` or `all`.
    pub period: PeriodSetting,
    /// How categories match: `normalized` or `exact`.
    pub category_matching: Matching,
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PeriodSetting {
    #[default]
    CurrentMonth,
    All,
}

serde_plain::derive_display_from_serialize!(PeriodSetting);
serde_plain::derive_fromstr_from_deserialize!(PeriodSetting);

impl PeriodSetting {
    pub fn period(&self) -> Period {
        match self {
            PeriodSetting::CurrentMonth => Period::current_month(),
            PeriodSetting::All => Period::All,
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budgeteer",
///   "config_version": 1,
///   "backup_copies": 5,
///   "source": {
///     "kind": "google",
///     "spreadsheet": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///     "credentials_path": ".secrets/service_account.json"
///   },
///   "reconcile": {
///     "period": "current_month",
///     "category_matching": "normalized"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budgeteer"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Number of backup copies to keep for each table
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Where the data lives
    source: SourceConfig,

    #[serde(default)]
    reconcile: ReconcileSettings,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
            source: SourceConfig::Local {
                transactions_path: None,
                goals_path: None,
            },
            reconcile: ReconcileSettings::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path and checks its `app_name`.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

/// The `source` object of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SourceConfig {
    /// Two CSV files. Relative paths resolve against the home directory.
    Local {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transactions_path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        goals_path: Option<PathBuf>,
    },
    /// A Google sheet shared as "Anyone with the link". Read-only.
    Public { spreadsheet: String },
    /// A Google sheet shared with a service account.
    Google {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spreadsheet: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        spreadsheet_id: Option<String>,
        /// Inline credentials: a structured bundle or a JSON string.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credentials: Option<CredentialSource>,
        /// Defaults to `.secrets/service_account.json`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credentials_path: Option<PathBuf>,
    },
}

impl SourceConfig {
    async fn resolve(&self, root: &Path, env_credentials: Option<String>) -> Result<Source> {
        match self {
            SourceConfig::Local {
                transactions_path,
                goals_path,
            } => {
                if env_credentials.is_some() {
                    debug!("Ignoring {CREDENTIALS_ENV} because the source is local files");
                }
                Ok(Source::Local {
                    transactions: utils::resolve(
                        root,
                        transactions_path.as_deref().unwrap_or(Path::new(TRANSACTIONS_CSV)),
                    ),
                    goals: utils::resolve(
                        root,
                        goals_path.as_deref().unwrap_or(Path::new(GOALS_CSV)),
                    ),
                })
            }
            SourceConfig::Public { spreadsheet } => Ok(Source::Public {
                spreadsheet_id: extract_spreadsheet_id(spreadsheet)
                    .pub_result(ErrorType::Config)?,
            }),
            SourceConfig::Google {
                spreadsheet,
                spreadsheet_id,
                credentials,
                credentials_path,
            } => {
                let spreadsheet_id = match (spreadsheet_id, spreadsheet) {
                    (Some(id), _) if !id.trim().is_empty() => id.trim().to_string(),
                    (_, Some(url)) => extract_spreadsheet_id(url).pub_result(ErrorType::Config)?,
                    _ => {
                        return Err(Error::msg(
                            ErrorType::Config,
                            "A google source needs 'spreadsheet' or 'spreadsheet_id'",
                        ))
                    }
                };
                let env_source = env_credentials.map(CredentialSource::Blob);
                let inline = env_source.as_ref().or(credentials.as_ref());
                let path = utils::resolve(
                    root,
                    credentials_path
                        .clone()
                        .unwrap_or_else(|| PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON)),
                );
                let credentials = resolve_credentials(inline, &path).await?;
                Ok(Source::Google {
                    spreadsheet_id,
                    credentials,
                })
            }
        }
    }
}

/// Writes a CSV file holding only the default header row, unless the file already exists.
async fn create_csv<I: Item>(path: &Path) -> Result<()> {
    if path.exists() {
        debug!("Keeping existing file {}", path.display());
        return Ok(());
    }
    let header = I::HEADERS.join(",");
    utils::write(path, format!("{header}\n"))
        .await
        .pub_result(ErrorType::Config)
}

/// Extracts the spreadsheet ID from a Google Sheets URL of the form
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...`. Query strings and fragments are
/// ignored.
pub(crate) fn extract_spreadsheet_id(url: &str) -> Res<String> {
    let parsed =
        Url::parse(url.trim()).with_context(|| format!("'{url}' is not a valid sheet URL"))?;
    let mut segments = parsed
        .path_segments()
        .with_context(|| format!("'{url}' is not a valid sheet URL"))?;
    while let Some(segment) = segments.next() {
        if segment == "d" {
            if let Some(id) = segments.next().filter(|id| !id.is_empty()) {
                return Ok(id.to_string());
            }
        }
    }
    anyhow::bail!(
        "Invalid Google Sheets URL '{url}'. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}
