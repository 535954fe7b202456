use crate::collector::PeakMemory;
use crate::errors::BenchError;
use crate::types::{AggregateReport, TrialResult};

/// Folds trial results into running totals as they arrive.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    elapsed_total: f64,
    trials: usize,
    peak: PeakMemory,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trial: &TrialResult) {
        self.elapsed_total += trial.elapsed_seconds;
        self.trials += 1;
        self.peak.observe(trial.peak_resident_kb);
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    /// Maximum peak memory folded in so far.
    pub fn max_peak_resident_kb(&self) -> u64 {
        self.peak.max_kb()
    }

    pub fn finish(self, configuration_label: String) -> Result<AggregateReport, BenchError> {
        if self.trials == 0 {
            return Err(BenchError::EmptyResultSet);
        }
        Ok(AggregateReport {
            average_elapsed_seconds: self.elapsed_total / self.trials as f64,
            max_peak_resident_kb: self.peak.max_kb(),
            run_count: self.trials,
            configuration_label,
        })
    }
}

/// Reduce a complete sequence of trials to one report.
pub fn aggregate(
    trials: &[TrialResult],
    configuration_label: String,
) -> Result<AggregateReport, BenchError> {
    let mut aggregator = Aggregator::new();
    for trial in trials {
        aggregator.push(trial);
    }
    aggregator.finish(configuration_label)
}
