//! Peak memory accounting for build child processes.
//!
//! The OS only reports a high-water mark over every child this process has
//! ever reaped, so readings never decrease across a run. Per-trial deltas of
//! that counter are meaningless; callers keep a running maximum instead.

use crate::errors::BenchError;

/// Source of the cumulative peak resident set size of reaped children, in KB.
pub trait ResourceCollector {
    fn peak_resident_kb(&mut self) -> Result<u64, BenchError>;
}

/// Reads `getrusage(RUSAGE_CHILDREN)`.
#[derive(Debug, Clone, Copy)]
pub struct ChildrenUsage {
    _private: (),
}

impl ChildrenUsage {
    #[cfg(unix)]
    pub fn new() -> Result<Self, BenchError> {
        Ok(Self { _private: () })
    }

    #[cfg(not(unix))]
    pub fn new() -> Result<Self, BenchError> {
        Err(BenchError::ResourceUsage {
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "child resource usage is only available on Unix",
            ),
        })
    }
}

#[cfg(unix)]
impl ResourceCollector for ChildrenUsage {
    fn peak_resident_kb(&mut self) -> Result<u64, BenchError> {
        // SAFETY: rusage is plain-old-data; an all-zero value is valid.
        let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
        // SAFETY: getrusage only writes into the struct we own.
        let ret = unsafe { libc::getrusage(libc::RUSAGE_CHILDREN, &mut usage) };
        if ret != 0 {
            return Err(BenchError::ResourceUsage {
                source: std::io::Error::last_os_error(),
            });
        }
        Ok(maxrss_to_kb(usage.ru_maxrss as u64))
    }
}

#[cfg(not(unix))]
impl ResourceCollector for ChildrenUsage {
    fn peak_resident_kb(&mut self) -> Result<u64, BenchError> {
        Err(BenchError::ResourceUsage {
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "child resource usage is only available on Unix",
            ),
        })
    }
}

/// macOS reports `ru_maxrss` in bytes, Linux and the BSDs in kilobytes.
#[cfg(unix)]
fn maxrss_to_kb(raw: u64) -> u64 {
    if cfg!(target_os = "macos") {
        raw / 1024
    } else {
        raw
    }
}

/// Running maximum over successive peak memory readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeakMemory {
    max_kb: u64,
}

impl PeakMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one reading and return the updated maximum.
    pub fn observe(&mut self, reading_kb: u64) -> u64 {
        self.max_kb = self.max_kb.max(reading_kb);
        self.max_kb
    }

    pub fn max_kb(&self) -> u64 {
        self.max_kb
    }
}
