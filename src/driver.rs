use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::errors::BenchError;
use crate::types::BenchmarkConfiguration;

/// Default build tool program.
pub const DEFAULT_MAKE: &str = "make";

const CLEAN_TARGET: &str = "distclean";
const SILENT_FLAG: &str = "--silent";

/// The external build system being measured.
///
/// Both actions block until the tool exits and fail on a non-zero status.
pub trait BuildDriver {
    /// Remove every build artifact so the next build starts cold.
    fn clean(&mut self, config: &BenchmarkConfiguration) -> Result<(), BenchError>;

    /// Build the project with the given host compiler, target and link mode.
    fn build(&mut self, config: &BenchmarkConfiguration) -> Result<(), BenchError>;
}

/// Drives a `make`-compatible tool as a child process.
#[derive(Debug, Clone)]
pub struct MakeDriver {
    program: String,
    directory: PathBuf,
}

impl MakeDriver {
    pub fn new(program: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            directory: directory.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn run(&self, action: &str, args: &[String]) -> Result<(), BenchError> {
        log::debug!(
            "running `{} {}` in {}",
            self.program,
            args.join(" "),
            self.directory.display()
        );

        let status = Command::new(&self.program)
            .args(args)
            .current_dir(&self.directory)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| BenchError::Spawn {
                action: action.to_string(),
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(BenchError::BuildTool {
                action: action.to_string(),
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

impl Default for MakeDriver {
    fn default() -> Self {
        Self::new(DEFAULT_MAKE, ".")
    }
}

impl BuildDriver for MakeDriver {
    fn clean(&mut self, _config: &BenchmarkConfiguration) -> Result<(), BenchError> {
        self.run(CLEAN_TARGET, &clean_args())
    }

    fn build(&mut self, config: &BenchmarkConfiguration) -> Result<(), BenchError> {
        self.run("build", &build_args(config))
    }
}

/// Arguments for the distribution-clean action.
pub fn clean_args() -> Vec<String> {
    vec![CLEAN_TARGET.to_string(), SILENT_FLAG.to_string()]
}

/// Arguments for the build action, e.g. `CC=gcc ARCH=arm DYNLINK=0 --silent`.
pub fn build_args(config: &BenchmarkConfiguration) -> Vec<String> {
    vec![
        format!("CC={}", config.host_compiler),
        format!("ARCH={}", config.architecture),
        format!("DYNLINK={}", config.link_mode.flag()),
        SILENT_FLAG.to_string(),
    ]
}
