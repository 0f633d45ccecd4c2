//! Commit log files: the refs and the log-ordered commits of one repository.

use std::path::Path;

use cg_core::{CgError, CommitRecord, VcsRef};
use serde::{Deserialize, Serialize};

pub type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Graph error: {0}")]
    Graph(#[from] CgError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid arguments: {what}")]
    Args { what: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Yaml,
    Json,
}

impl LogFormat {
    /// `.json` files are JSON, everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Yaml,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFile {
    #[serde(default)]
    pub refs: Vec<VcsRef>,
    pub commits: Vec<CommitRecord>,
}

pub fn parse(content: &str, format: LogFormat) -> CliResult<LogFile> {
    let log = match format {
        LogFormat::Yaml => serde_yaml::from_str(content)?,
        LogFormat::Json => serde_json::from_str(content)?,
    };
    Ok(log)
}

pub fn load(path: &Path) -> CliResult<LogFile> {
    let content = std::fs::read_to_string(path)?;
    parse(&content, LogFormat::from_path(path))
}
