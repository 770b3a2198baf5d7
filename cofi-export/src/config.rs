//! Configuration for CoFi export

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input configuration
    pub input: InputConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Input file
    pub path: PathBuf,

    /// Input encoding
    pub format: InputFormat,

    /// Which snapshot table feeds the transformer (snapshot input only)
    pub amounts: AmountSource,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/graph.csv"),
            format: InputFormat::Pathfinder2Csv,
            amounts: AmountSource::Capacities,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// CoFi CSV destination
    pub cofi_path: PathBuf,

    /// Optional `index,address` CSV destination
    pub index_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cofi_path: PathBuf::from("./data/graph.cofi.csv"),
            index_path: None,
        }
    }
}

/// Input encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// `from,to,token_owner,capacity_hex` rows
    Pathfinder2Csv,
    /// Binary trust/balance snapshot
    Snapshot,
}

impl FromStr for InputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pathfinder2_csv" | "pathfinder2" | "csv" => Ok(InputFormat::Pathfinder2Csv),
            "snapshot" | "binary" => Ok(InputFormat::Snapshot),
            other => Err(crate::Error::Config(format!("unknown input format {:?}", other))),
        }
    }
}

/// Amounts taken from a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSource {
    /// Utilized balances `holder -> token_owner`
    Balances,
    /// Derived transfer capacities
    Capacities,
}

impl FromStr for AmountSource {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "balances" => Ok(AmountSource::Balances),
            "capacities" => Ok(AmountSource::Capacities),
            other => Err(crate::Error::Config(format!("unknown amount source {:?}", other))),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable
    Pretty,
    /// JSON lines
    Json,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load defaults, then apply environment overrides
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `COFI_*` environment overrides
    pub fn apply_env(&mut self) -> crate::Result<()> {
        if let Ok(path) = std::env::var("COFI_INPUT") {
            self.input.path = PathBuf::from(path);
        }

        if let Ok(format) = std::env::var("COFI_INPUT_FORMAT") {
            self.input.format = format.parse()?;
        }

        if let Ok(amounts) = std::env::var("COFI_AMOUNTS") {
            self.input.amounts = amounts.parse()?;
        }

        if let Ok(path) = std::env::var("COFI_OUTPUT") {
            self.output.cofi_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("COFI_INDEX_OUTPUT") {
            self.output.index_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Reject unusable settings
    pub fn validate(&self) -> crate::Result<()> {
        if self.input.path.as_os_str().is_empty() {
            return Err(crate::Error::Config("input path is empty".to_string()));
        }
        if self.output.cofi_path.as_os_str().is_empty() {
            return Err(crate::Error::Config("output path is empty".to_string()));
        }
        if self.output.index_path.as_ref() == Some(&self.output.cofi_path) {
            return Err(crate::Error::Config(
                "index output would overwrite the CoFi output".to_string(),
            ));
        }
        Ok(())
    }
}
