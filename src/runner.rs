use std::time::{Duration, Instant};

use crate::aggregate::Aggregator;
use crate::collector::ResourceCollector;
use crate::driver::BuildDriver;
use crate::errors::BenchError;
use crate::types::{AggregateReport, BenchmarkConfiguration, TrialResult};

/// Monotonic time source, as an offset from an arbitrary fixed origin.
pub trait Clock {
    fn now(&mut self) -> Duration;
}

/// `Instant`-backed clock; unaffected by wall-clock adjustments.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Runs clean/build/measure trials one after another.
pub struct TrialRunner<D, C, K> {
    driver: D,
    collector: C,
    clock: K,
}

impl<D, C> TrialRunner<D, C, MonotonicClock>
where
    D: BuildDriver,
    C: ResourceCollector,
{
    pub fn new(driver: D, collector: C) -> Self {
        Self::with_clock(driver, collector, MonotonicClock::new())
    }
}

impl<D, C, K> TrialRunner<D, C, K>
where
    D: BuildDriver,
    C: ResourceCollector,
    K: Clock,
{
    pub fn with_clock(driver: D, collector: C, clock: K) -> Self {
        Self {
            driver,
            collector,
            clock,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Execute `config.run_count` trials and aggregate them.
    ///
    /// `on_trial(i, n)` is called with the 1-based trial number just before
    /// each build. The first failure aborts the loop. A final clean always
    /// runs afterwards; if the loop already failed, its error is returned and
    /// a teardown failure is only logged.
    pub fn run<F>(
        &mut self,
        config: &BenchmarkConfiguration,
        on_trial: F,
    ) -> Result<AggregateReport, BenchError>
    where
        F: FnMut(usize, usize),
    {
        let outcome = self.run_trials(config, on_trial);
        let teardown = self.driver.clean(config);

        match (outcome, teardown) {
            (Ok(aggregator), Ok(())) => aggregator.finish(config.label()),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(teardown_err)) => {
                log::warn!("teardown clean failed after aborted run: {}", teardown_err);
                Err(err)
            }
        }
    }

    fn run_trials<F>(
        &mut self,
        config: &BenchmarkConfiguration,
        mut on_trial: F,
    ) -> Result<Aggregator, BenchError>
    where
        F: FnMut(usize, usize),
    {
        let runs = config.run_count.get();
        let mut aggregator = Aggregator::new();

        for i in 1..=runs {
            let trial = self.run_trial(config, i, runs, &mut on_trial)?;
            log::info!(
                "trial {}/{}: {:.3}s, peak RSS so far {} KB",
                i,
                runs,
                trial.elapsed_seconds,
                trial.peak_resident_kb
            );
            aggregator.push(&trial);
        }

        Ok(aggregator)
    }

    fn run_trial<F>(
        &mut self,
        config: &BenchmarkConfiguration,
        index: usize,
        runs: usize,
        on_trial: &mut F,
    ) -> Result<TrialResult, BenchError>
    where
        F: FnMut(usize, usize),
    {
        self.driver.clean(config)?;
        on_trial(index, runs);

        let start = self.clock.now();
        self.driver.build(config)?;
        let end = self.clock.now();

        Ok(TrialResult {
            elapsed_seconds: end.saturating_sub(start).as_secs_f64(),
            peak_resident_kb: self.collector.peak_resident_kb()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Architecture, HostCompiler, LinkMode};
    use std::collections::VecDeque;
    use std::num::NonZeroUsize;
    use std::path::PathBuf;
    use std::process::ExitStatus;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Clean,
        Build,
    }

    #[derive(Default)]
    struct FakeDriver {
        calls: Vec<Call>,
        fail_build_on: Option<usize>,
        fail_clean_on: Option<usize>,
    }

    impl FakeDriver {
        fn count(&self, call: Call) -> usize {
            self.calls.iter().filter(|c| **c == call).count()
        }
    }

    #[cfg(unix)]
    fn failed_status() -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(2 << 8)
    }

    #[cfg(windows)]
    fn failed_status() -> ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(2)
    }

    fn tool_error(action: &str) -> BenchError {
        BenchError::BuildTool {
            action: action.to_string(),
            program: "make".to_string(),
            status: failed_status(),
        }
    }

    impl BuildDriver for FakeDriver {
        fn clean(&mut self, _config: &BenchmarkConfiguration) -> Result<(), BenchError> {
            self.calls.push(Call::Clean);
            if self.fail_clean_on == Some(self.count(Call::Clean)) {
                return Err(tool_error("distclean"));
            }
            Ok(())
        }

        fn build(&mut self, _config: &BenchmarkConfiguration) -> Result<(), BenchError> {
            self.calls.push(Call::Build);
            if self.fail_build_on == Some(self.count(Call::Build)) {
                return Err(tool_error("build"));
            }
            Ok(())
        }
    }

    struct ScriptedCollector(VecDeque<u64>);

    impl ResourceCollector for ScriptedCollector {
        fn peak_resident_kb(&mut self) -> Result<u64, BenchError> {
            Ok(self.0.pop_front().unwrap_or(0))
        }
    }

    /// Returns the scripted timestamps in order.
    struct ScriptedClock(VecDeque<f64>);

    impl Clock for ScriptedClock {
        fn now(&mut self) -> Duration {
            Duration::from_secs_f64(self.0.pop_front().unwrap_or(0.0))
        }
    }

    fn config(runs: usize) -> BenchmarkConfiguration {
        BenchmarkConfiguration {
            host_compiler: HostCompiler::Gcc,
            architecture: Architecture::Arm,
            link_mode: LinkMode::Static,
            run_count: NonZeroUsize::new(runs).unwrap(),
            output_path: PathBuf::from("out/benchmark.json"),
        }
    }

    fn runner(
        driver: FakeDriver,
        readings: &[u64],
        stamps: &[f64],
    ) -> TrialRunner<FakeDriver, ScriptedCollector, ScriptedClock> {
        TrialRunner::with_clock(
            driver,
            ScriptedCollector(readings.iter().copied().collect()),
            ScriptedClock(stamps.iter().copied().collect()),
        )
    }

    #[test]
    fn clean_and_build_alternate() {
        for runs in 1..=6 {
            let mut runner = runner(FakeDriver::default(), &[], &[]);
            runner.run(&config(runs), |_, _| {}).unwrap();

            let calls = &runner.driver().calls;
            assert_eq!(runner.driver().count(Call::Clean), runs + 1);
            assert_eq!(runner.driver().count(Call::Build), runs);
            for (i, call) in calls.iter().enumerate() {
                let expected = if i % 2 == 0 { Call::Clean } else { Call::Build };
                assert_eq!(*call, expected, "call {} of {:?}", i, calls);
            }
        }
    }

    #[test]
    fn three_trials_scenario() {
        let mut runner = runner(
            FakeDriver::default(),
            &[1000, 1500, 1200],
            &[0.0, 1.0, 10.0, 12.0, 20.0, 23.0],
        );
        let report = runner.run(&config(3), |_, _| {}).unwrap();

        assert!((report.average_elapsed_seconds - 2.0).abs() < 1e-9);
        assert_eq!(report.max_peak_resident_kb, 1500);
        assert_eq!(report.run_count, 3);
        assert_eq!(
            report.configuration_label,
            "(HOSTCC, ARCH, DYNLINK)=(gcc, arm, static)"
        );
    }

    #[test]
    fn progress_reports_each_trial() {
        let mut seen = Vec::new();
        let mut runner = runner(FakeDriver::default(), &[], &[]);
        runner.run(&config(3), |i, n| seen.push((i, n))).unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn build_failure_aborts_and_tears_down() {
        let driver = FakeDriver {
            fail_build_on: Some(2),
            ..Default::default()
        };
        let mut runner = runner(driver, &[], &[]);
        let err = runner.run(&config(5), |_, _| {}).unwrap_err();

        assert!(err.is_build_tool_error());
        assert_eq!(
            runner.driver().calls,
            vec![Call::Clean, Call::Build, Call::Clean, Call::Build, Call::Clean]
        );
    }

    #[test]
    fn pre_trial_clean_failure_aborts_and_tears_down() {
        let driver = FakeDriver {
            fail_clean_on: Some(1),
            ..Default::default()
        };
        let mut runner = runner(driver, &[], &[]);
        let err = runner.run(&config(3), |_, _| {}).unwrap_err();

        assert!(err.is_build_tool_error());
        assert_eq!(runner.driver().calls, vec![Call::Clean, Call::Clean]);
    }

    #[test]
    fn teardown_failure_after_success_is_fatal() {
        let driver = FakeDriver {
            fail_clean_on: Some(3),
            ..Default::default()
        };
        let mut runner = runner(driver, &[], &[]);
        let err = runner.run(&config(2), |_, _| {}).unwrap_err();

        assert!(err.to_string().contains("distclean"));
        assert_eq!(runner.driver().count(Call::Build), 2);
    }

    #[test]
    fn loop_error_wins_over_teardown_error() {
        let driver = FakeDriver {
            fail_build_on: Some(1),
            fail_clean_on: Some(2),
            ..Default::default()
        };
        let mut runner = runner(driver, &[], &[]);
        let err = runner.run(&config(4), |_, _| {}).unwrap_err();

        assert!(err.to_string().contains("`make build`"));
    }

    #[test]
    fn backwards_clock_clamps_to_zero() {
        let mut runner = runner(FakeDriver::default(), &[10], &[5.0, 4.0]);
        let report = runner.run(&config(1), |_, _| {}).unwrap();
        assert_eq!(report.average_elapsed_seconds, 0.0);
    }

    #[test]
    fn monotonic_clock_advances() {
        let mut clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
