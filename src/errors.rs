use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("--runs must be at least 1 (got {runs})")]
    InvalidRunCount { runs: i64 },

    #[error("invalid choice for {field}: '{value}' (choose from {choices})")]
    InvalidChoice {
        field: &'static str,
        value: String,
        choices: String,
    },

    #[error("`{program} {action}` failed with {status}")]
    BuildTool {
        action: String,
        program: String,
        status: ExitStatus,
    },

    #[error("Failed to run `{program} {action}`: {source}")]
    Spawn {
        action: String,
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to read child resource usage: {source}")]
    ResourceUsage { source: std::io::Error },

    #[error("No trial results to aggregate")]
    EmptyResultSet,

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize benchmark report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BenchError {
    /// True for errors raised before any external process is spawned.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BenchError::InvalidRunCount { .. } | BenchError::InvalidChoice { .. }
        )
    }

    /// True when the external build tool could not be run or exited non-zero.
    pub fn is_build_tool_error(&self) -> bool {
        matches!(self, BenchError::BuildTool { .. } | BenchError::Spawn { .. })
    }
}
