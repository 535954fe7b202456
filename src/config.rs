use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::BenchError;
use crate::types::{Architecture, BenchmarkConfiguration, HostCompiler, LinkMode};

/// Unvalidated benchmark parameters as they arrive from the command line.
#[derive(Debug, Clone)]
pub struct RawConfig {
    pub hostcc: String,
    pub arch: String,
    pub dynlink: bool,
    pub runs: i64,
    pub output_path: PathBuf,
}

impl FromStr for HostCompiler {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // "cc" and "gcc" name the same compiler
            "cc" | "gcc" => Ok(HostCompiler::Gcc),
            "clang" => Ok(HostCompiler::Clang),
            _ => Err(invalid_choice("hostcc", s, HostCompiler::TOKENS)),
        }
    }
}

impl FromStr for Architecture {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arm" => Ok(Architecture::Arm),
            "riscv" => Ok(Architecture::Riscv),
            _ => Err(invalid_choice("arch", s, Architecture::TOKENS)),
        }
    }
}

fn invalid_choice(field: &'static str, value: &str, tokens: &[&str]) -> BenchError {
    BenchError::InvalidChoice {
        field,
        value: value.to_string(),
        choices: tokens.join(", "),
    }
}

/// Validate and normalize raw parameters into a `BenchmarkConfiguration`.
///
/// The run count is checked first so that `--runs 0` is reported even when
/// other values are also wrong. Nothing is spawned or written here.
pub fn resolve(raw: RawConfig) -> Result<BenchmarkConfiguration, BenchError> {
    let run_count = usize::try_from(raw.runs)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or(BenchError::InvalidRunCount { runs: raw.runs })?;

    let host_compiler = raw.hostcc.parse::<HostCompiler>()?;
    let architecture = raw.arch.parse::<Architecture>()?;

    Ok(BenchmarkConfiguration {
        host_compiler,
        architecture,
        link_mode: LinkMode::from_dynlink(raw.dynlink),
        run_count,
        output_path: raw.output_path,
    })
}
