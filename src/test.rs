//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{Mode, TestSheet, TestSheetState};
use crate::{Budget, Config};
use std::path::PathBuf;
use tempfile::TempDir;

/// Test environment that sets up a budget home directory with a local source.
/// Holds TempDir to keep the directory alive for the duration of the test.
///
/// In `Mode::Testing` the in-memory sheet is keyed by the home directory, so every `TestEnv` gets
/// its own freshly seeded tables.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a Config and empty, header-only CSV files.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("budget");
        let config = Config::create(&root, None, None).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    pub fn root(&self) -> PathBuf {
        self.config.root().to_path_buf()
    }

    pub fn transactions_csv(&self) -> PathBuf {
        self.root().join("transactions.csv")
    }

    pub fn goals_csv(&self) -> PathBuf {
        self.root().join("goals.csv")
    }

    pub async fn budget(&self, mode: Mode) -> Budget {
        Budget::open(self.config(), mode).await.unwrap()
    }

    /// Gets the current state of the TestSheet associated with this environment.
    pub fn get_state(&self) -> TestSheetState {
        TestSheet::new(self.config.source_id()).get_state()
    }

    /// Sets the state of the TestSheet associated with this environment.
    pub fn set_state(&self, state: TestSheetState) {
        TestSheet::new(self.config.source_id()).set_state(state)
    }
}
