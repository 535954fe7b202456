use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::Serialize;

/// Header naming the three fields of a configuration label.
pub const CONFIG_FIELDS: &str = "(HOSTCC, ARCH, DYNLINK)";

/// Host C compiler used to build the compiler under test.
///
/// `cc` is accepted on input but collapses to `Gcc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCompiler {
    Gcc,
    Clang,
}

impl HostCompiler {
    /// Every token accepted on input, alias included.
    pub const TOKENS: &'static [&'static str] = &["cc", "gcc", "clang"];

    pub fn as_str(self) -> &'static str {
        match self {
            HostCompiler::Gcc => "gcc",
            HostCompiler::Clang => "clang",
        }
    }
}

impl fmt::Display for HostCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target architecture the compiler under test emits code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    Arm,
    Riscv,
}

impl Architecture {
    pub const TOKENS: &'static [&'static str] = &["arm", "riscv"];

    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::Arm => "arm",
            Architecture::Riscv => "riscv",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkMode {
    #[default]
    Static,
    Dynamic,
}

impl LinkMode {
    pub fn from_dynlink(dynlink: bool) -> Self {
        if dynlink {
            LinkMode::Dynamic
        } else {
            LinkMode::Static
        }
    }

    /// Value passed to the build tool as `DYNLINK=`.
    pub fn flag(self) -> u8 {
        match self {
            LinkMode::Static => 0,
            LinkMode::Dynamic => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkMode::Static => "static",
            LinkMode::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated benchmark parameters. Built once by `config::resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfiguration {
    pub host_compiler: HostCompiler,
    pub architecture: Architecture,
    pub link_mode: LinkMode,
    pub run_count: NonZeroUsize,
    pub output_path: PathBuf,
}

impl BenchmarkConfiguration {
    /// Renders e.g. `(HOSTCC, ARCH, DYNLINK)=(gcc, arm, static)`.
    pub fn label(&self) -> String {
        format!(
            "{}=({}, {}, {})",
            CONFIG_FIELDS, self.host_compiler, self.architecture, self.link_mode
        )
    }
}

/// Measurement of a single clean/build cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    pub elapsed_seconds: f64,
    /// Cumulative high-water mark over all children reaped so far, in KB.
    pub peak_resident_kb: u64,
}

/// Summary of a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub average_elapsed_seconds: f64,
    pub max_peak_resident_kb: u64,
    pub run_count: usize,
    pub configuration_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Float(f64),
    Integer(u64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the fractional part on whole numbers ("2.0").
            MetricValue::Float(v) => write!(f, "{:?}", v),
            MetricValue::Integer(v) => write!(f, "{}", v),
        }
    }
}

/// One entry of the persisted JSON document. Field order is the key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEntry {
    pub name: &'static str,
    pub unit: &'static str,
    pub value: MetricValue,
    pub runs: usize,
    pub config: String,
}
