//! Reconciles spending against monthly budget goals. The budget lives in two tables,
//! Transactions and Goals, stored in local CSV files or in a Google Sheet.

mod api;
pub mod args;
mod backup;
mod budget;
pub mod commands;
mod config;
mod credentials;
mod error;
mod mcp;
pub mod model;
pub mod reconcile;
pub mod render;
#[cfg(test)]
mod test;
mod utils;

pub use api::Mode;
pub use backup::Backup;
pub use budget::{Budget, GoalChange};
pub use config::{Config, PeriodSetting, ReconcileSettings, Source};
pub use credentials::{normalize_private_key, CredentialSource, ServiceAccountCredentials};
pub use error::{Error, ErrorType, Fallback, Result};
