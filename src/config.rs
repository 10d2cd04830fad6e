use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

pub const DEFAULT_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const DEFAULT_RATES_PATH: &str = "exchange_rate.csv";
pub const DEFAULT_CSV_PATH: &str = "Largest_banks_data.csv";
pub const DEFAULT_DB_PATH: &str = "Banks.db";
pub const DEFAULT_TABLE_NAME: &str = "Largest_banks";
pub const DEFAULT_LOG_PATH: &str = "code_log.txt";

/// What to do when the page has no matching market-cap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingTablePolicy {
    /// Carry on with an empty record set (header-only CSV, empty table).
    Continue,
    /// Abort the run.
    Fail,
}

impl fmt::Display for MissingTablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Continue => "continue",
            Self::Fail => "fail",
        })
    }
}

/// Run-scoped configuration, built once from the CLI and passed by
/// reference into each stage.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub url: String,
    pub rates_path: PathBuf,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,
    pub missing_table: MissingTablePolicy,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            rates_path: DEFAULT_RATES_PATH.into(),
            csv_path: DEFAULT_CSV_PATH.into(),
            db_path: DEFAULT_DB_PATH.into(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            log_path: DEFAULT_LOG_PATH.into(),
            missing_table: MissingTablePolicy::Continue,
        }
    }
}
