use crate::config::ControllerConfig;
use crate::persist::format;
use crate::persist::status::{CampaignStatus, EXIT_FLAG_STOPPED};
use crate::persist::{read_sweep_table, ControlChannel, ControlCommand, ResultStore, StatusStore};
use crate::prelude::{AccumulatorError, CampaignResult, ProviderError, SweepProvider, SweepResult};
use crate::processing::SweepAccumulator;
use crate::telemetry::{LogManager, Metrics, MetricsRecorder};
use std::fs::File;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignState {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The supervisor cleared `run` in the control channel.
    External,
    /// The configured run or time limit was reached.
    Completed,
}

/// Summary of a campaign that reached `Stopped` without a fatal error.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignOutcome {
    pub reason: StopReason,
    pub exit_flag: i64,
    pub sweep_count: u64,
    pub metrics: Metrics,
}

/// Drives the sweep loop and owns the `Running -> Paused -> Running | Stopped`
/// state machine.
///
/// One sweep runs at a time. A stop request is only observed at the poll
/// point after each sweep, so a sweep in flight always completes.
pub struct CampaignController<'a, P, S, C> {
    config: &'a ControllerConfig,
    provider: P,
    results: ResultStore,
    status_store: S,
    control: C,
    accumulator: SweepAccumulator,
    status: CampaignStatus,
    state: CampaignState,
    started: Instant,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl<'a, P, S, C> CampaignController<'a, P, S, C>
where
    P: SweepProvider,
    S: StatusStore,
    C: ControlChannel,
{
    pub fn new(
        config: &'a ControllerConfig,
        provider: P,
        results: ResultStore,
        status_store: S,
        control: C,
    ) -> Self {
        Self {
            config,
            provider,
            results,
            status_store,
            control,
            accumulator: SweepAccumulator::new(),
            status: CampaignStatus::started(config.name.clone(), format::now()),
            state: CampaignState::Running,
            started: Instant::now(),
            logger: LogManager::new(config.name.clone()),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn state(&self) -> CampaignState {
        self.state
    }

    pub fn status(&self) -> &CampaignStatus {
        &self.status
    }

    pub fn accumulator(&self) -> &SweepAccumulator {
        &self.accumulator
    }

    /// Runs the campaign until it stops. Any error is fatal; the status is
    /// still marked as no longer running before the error is returned.
    pub fn run(&mut self) -> CampaignResult<CampaignOutcome> {
        self.status = CampaignStatus::started(self.config.name.clone(), format::now());
        self.state = CampaignState::Running;
        self.started = Instant::now();
        self.logger.record(&format!(
            "campaign started: {:.0}-{:.0} Hz, {} bins, limit {:?}",
            self.config.plan.start_freq,
            self.config.plan.end_freq,
            self.config.plan.bins,
            self.config.limit
        ));

        match self.drive() {
            Ok(reason) => {
                let outcome = CampaignOutcome {
                    reason,
                    exit_flag: self.status.exit_flag,
                    sweep_count: self.status.sweep_count,
                    metrics: self.metrics.snapshot(),
                };
                self.logger.record(&format!(
                    "campaign stopped ({:?}) after {} sweeps, exit flag {}",
                    outcome.reason, outcome.sweep_count, outcome.exit_flag
                ));
                Ok(outcome)
            }
            Err(err) => {
                self.metrics.record_failure();
                self.state = CampaignState::Stopped;
                self.status.running = false;
                self.status.paused = false;
                if let Err(status_err) = self.status_store.write(&self.status) {
                    self.logger
                        .warn(&format!("could not record final status: {}", status_err));
                }
                self.logger.warn(&format!(
                    "campaign aborted after {} sweeps: {}",
                    self.status.sweep_count, err
                ));
                Err(err)
            }
        }
    }

    fn drive(&mut self) -> CampaignResult<StopReason> {
        self.status_store.write(&self.status)?;

        let reason = loop {
            let sweep = self.acquire()?;
            self.absorb(&sweep)?;

            self.status.sweep_count += 1;
            self.status.current_time = format::now();
            self.status_store.write(&self.status)?;
            self.logger
                .record(&format!("sweep {} complete", self.status.sweep_count));

            let mut command = self.control.read()?;
            if command.pause {
                command = self.hold()?;
            }

            if !command.run {
                self.status.exit_flag = EXIT_FLAG_STOPPED;
                self.status_store.write(&self.status)?;
                break StopReason::External;
            }
            if self
                .config
                .limit
                .reached(self.status.sweep_count, self.started.elapsed())
            {
                self.status.exit_flag = self.status.sweep_count as i64;
                self.status_store.write(&self.status)?;
                break StopReason::Completed;
            }
            self.status_store.write(&self.status)?;
        };

        self.state = CampaignState::Stopped;
        self.status.running = false;
        self.status_store.write(&self.status)?;
        Ok(reason)
    }

    /// Requests one sweep and reads the provider's table back.
    fn acquire(&mut self) -> CampaignResult<SweepResult> {
        let sink = self.results.paths().sweep_output.clone();
        self.logger.record(&format!(
            "starting sweep number {}",
            self.status.sweep_count + 1
        ));

        // a provider that succeeds without writing must not replay the last table
        File::create(&sink).map_err(|source| ProviderError::Sink {
            path: sink.clone(),
            source,
        })?;

        let started_at = format::now();
        let clock = Instant::now();
        self.provider.sweep(&self.config.plan, &sink)?;
        let ended_at = format::now();
        self.metrics.record_sweep(clock.elapsed());

        let table = read_sweep_table(&sink)?;
        Ok(SweepResult::new(
            table.frequency,
            table.magnitude_db,
            started_at,
            ended_at,
        )?)
    }

    /// Folds the sweep into the statistics and persists every output.
    fn absorb(&mut self, sweep: &SweepResult) -> CampaignResult<()> {
        if self.accumulator.is_initialized() {
            self.accumulator.accumulate(sweep)?;
        } else {
            self.accumulator.initialize(sweep)?;
            self.results.truncate_logs()?;
            self.results.write_reference_axis(sweep.frequency())?;
            self.logger.detail(&format!(
                "reference axis fixed at {} bins",
                sweep.len()
            ));
        }

        let (max_db, min_db, mean_db) = match (
            self.accumulator.max_db(),
            self.accumulator.min_db(),
            self.accumulator.mean_db(),
        ) {
            (Some(max), Some(min), Some(mean)) => (max, min, mean),
            _ => return Err(AccumulatorError::NotInitialized.into()),
        };

        self.results.append_full(sweep.magnitude_db())?;
        self.results.write_max(max_db)?;
        self.results.write_min(min_db)?;
        self.results.write_mean(&mean_db)?;
        self.results
            .append_timing(&sweep.started_at, &sweep.ended_at)?;
        Ok(())
    }

    /// Suspends the loop until the supervisor clears `pause`, returning the
    /// command that released it.
    fn hold(&mut self) -> CampaignResult<ControlCommand> {
        self.state = CampaignState::Paused;
        self.status.paused = true;
        self.status_store.write(&self.status)?;
        self.logger.record("campaign paused");

        let command = loop {
            std::thread::sleep(self.config.poll_interval);
            self.metrics.record_pause_poll();
            let command = self.control.read()?;
            if !command.pause {
                break command;
            }
        };

        self.status.paused = false;
        self.status_store.write(&self.status)?;
        self.state = CampaignState::Running;
        self.logger.record("campaign resumed");
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunLimit, SweepPlan};
    use crate::persist::format::{format_row, MAGNITUDE_PRECISION};
    use crate::persist::CampaignPaths;
    use crate::prelude::CampaignError;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingStatus {
        writes: Vec<CampaignStatus>,
    }

    impl StatusStore for RecordingStatus {
        fn write(&mut self, status: &CampaignStatus) -> CampaignResult<()> {
            self.writes.push(status.clone());
            Ok(())
        }
    }

    /// Replays commands in order, then keeps returning the last one.
    struct ScriptedControl {
        script: VecDeque<ControlCommand>,
    }

    impl ScriptedControl {
        fn new(script: &[ControlCommand]) -> Self {
            Self {
                script: script.iter().copied().collect(),
            }
        }
    }

    impl ControlChannel for ScriptedControl {
        fn read(&mut self) -> CampaignResult<ControlCommand> {
            if self.script.len() > 1 {
                Ok(self.script.pop_front().unwrap_or_default())
            } else {
                Ok(self.script.front().copied().unwrap_or_default())
            }
        }
    }

    /// Writes one prepared table per call, cycling through `tables`.
    struct TableProvider {
        tables: Vec<(Vec<f64>, Vec<f64>)>,
        calls: usize,
    }

    impl TableProvider {
        fn new(tables: Vec<(Vec<f64>, Vec<f64>)>) -> Self {
            Self { tables, calls: 0 }
        }
    }

    impl SweepProvider for TableProvider {
        fn sweep(&mut self, _plan: &SweepPlan, sink: &Path) -> Result<(), ProviderError> {
            let (frequency, magnitude) = &self.tables[self.calls % self.tables.len()];
            let mut contents = String::from("# test table\n");
            for (f, m) in frequency.iter().zip(magnitude) {
                contents.push_str(&format!("{} {}\n", f, m));
            }
            self.calls += 1;
            fs::write(sink, contents).map_err(|source| ProviderError::Sink {
                path: sink.to_path_buf(),
                source,
            })
        }
    }

    /// Writes a table on the first call only, then reports success silently.
    struct FirstCallOnly {
        calls: usize,
    }

    impl SweepProvider for FirstCallOnly {
        fn sweep(&mut self, _plan: &SweepPlan, sink: &Path) -> Result<(), ProviderError> {
            self.calls += 1;
            if self.calls == 1 {
                fs::write(sink, "1 -10\n2 -20\n").map_err(|source| ProviderError::Sink {
                    path: sink.to_path_buf(),
                    source,
                })?;
            }
            Ok(())
        }
    }

    struct FailingProvider;

    impl SweepProvider for FailingProvider {
        fn sweep(&mut self, _plan: &SweepPlan, _sink: &Path) -> Result<(), ProviderError> {
            Err(ProviderError::Other("device unplugged".into()))
        }
    }

    const RUN: ControlCommand = ControlCommand {
        run: true,
        pause: false,
    };
    const PAUSE: ControlCommand = ControlCommand {
        run: true,
        pause: true,
    };
    const STOP: ControlCommand = ControlCommand {
        run: false,
        pause: false,
    };

    fn config(limit: RunLimit) -> ControllerConfig {
        ControllerConfig::new("test campaign", limit, SweepPlan::default())
            .with_poll_interval(Duration::ZERO)
    }

    fn steady_provider() -> TableProvider {
        TableProvider::new(vec![
            (vec![1.0, 2.0, 3.0], vec![-10.0, -20.0, -30.0]),
            (vec![1.0, 2.0, 3.0], vec![-15.0, -5.0, -35.0]),
        ])
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn stops_after_configured_runs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CampaignPaths::new(dir.path());
        let cfg = config(RunLimit::Runs(3));
        let mut status = RecordingStatus::default();
        let mut provider = steady_provider();

        let outcome = CampaignController::new(
            &cfg,
            &mut provider,
            ResultStore::new(paths.clone()),
            &mut status,
            ScriptedControl::new(&[RUN]),
        )
        .run()
        .unwrap();

        assert_eq!(outcome.reason, StopReason::Completed);
        assert_eq!(outcome.exit_flag, 3);
        assert_eq!(outcome.sweep_count, 3);
        assert_eq!(outcome.metrics.sweeps, 3);
        assert_eq!(provider.calls, 3);

        let last = status.writes.last().unwrap();
        assert!(!last.running);
        assert_eq!(last.exit_flag, 3);
        assert_eq!(last.sweep_count, 3);
        assert_eq!(status.writes[0].sweep_count, 0);
        assert_eq!(status.writes[0].exit_flag, -1);

        assert_eq!(lines(&paths.magnitude_full).len(), 3);
        assert_eq!(lines(&paths.timing).len(), 3);
        assert_eq!(lines(&paths.magnitude_max).len(), 1);
        assert_eq!(lines(&paths.magnitude_min).len(), 1);
        assert_eq!(lines(&paths.magnitude_mean).len(), 1);
        assert_eq!(lines(&paths.frequency), vec!["1.000 2.000 3.000"]);
        assert_eq!(
            lines(&paths.magnitude_max)[0],
            format_row(&[-10.0, -5.0, -30.0], MAGNITUDE_PRECISION).trim_end()
        );
        assert_eq!(
            lines(&paths.magnitude_min)[0],
            format_row(&[-15.0, -20.0, -35.0], MAGNITUDE_PRECISION).trim_end()
        );
    }

    #[test]
    fn external_stop_sets_exit_flag_zero() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(RunLimit::Endless);
        let mut status = RecordingStatus::default();

        let outcome = CampaignController::new(
            &cfg,
            steady_provider(),
            ResultStore::new(CampaignPaths::new(dir.path())),
            &mut status,
            ScriptedControl::new(&[RUN, STOP]),
        )
        .run()
        .unwrap();

        assert_eq!(outcome.reason, StopReason::External);
        assert_eq!(outcome.exit_flag, 0);
        assert_eq!(outcome.sweep_count, 2);
        let last = status.writes.last().unwrap();
        assert!(!last.running);
        assert_eq!(last.exit_flag, 0);
    }

    #[test]
    fn pause_halts_progress_until_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(RunLimit::Runs(2));
        let mut status = RecordingStatus::default();
        let mut provider = steady_provider();

        let outcome = CampaignController::new(
            &cfg,
            &mut provider,
            ResultStore::new(CampaignPaths::new(dir.path())),
            &mut status,
            ScriptedControl::new(&[PAUSE, PAUSE, PAUSE, RUN]),
        )
        .run()
        .unwrap();

        assert_eq!(outcome.sweep_count, 2);
        assert_eq!(outcome.metrics.pause_polls, 3);
        assert_eq!(provider.calls, 2);

        let paused: Vec<_> = status.writes.iter().filter(|s| s.paused).collect();
        assert!(!paused.is_empty());
        assert!(paused.iter().all(|s| s.sweep_count == 1 && s.running));

        let resumed = status
            .writes
            .iter()
            .rposition(|s| s.paused)
            .map(|idx| &status.writes[idx + 1])
            .unwrap();
        assert!(!resumed.paused);
        assert_eq!(resumed.sweep_count, 1);
    }

    #[test]
    fn stop_while_paused_ends_campaign() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(RunLimit::Endless);
        let mut status = RecordingStatus::default();

        let outcome = CampaignController::new(
            &cfg,
            steady_provider(),
            ResultStore::new(CampaignPaths::new(dir.path())),
            &mut status,
            ScriptedControl::new(&[PAUSE, STOP]),
        )
        .run()
        .unwrap();

        assert_eq!(outcome.exit_flag, 0);
        assert_eq!(outcome.sweep_count, 1);
        let last = status.writes.last().unwrap();
        assert!(!last.running);
        assert!(!last.paused);
    }

    #[test]
    fn mean_file_follows_campaign_update_rule() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CampaignPaths::new(dir.path());
        let cfg = config(RunLimit::Runs(2));
        let provider = TableProvider::new(vec![
            (vec![1.0, 2.0, 3.0], vec![0.0, 0.0, 0.0]),
            (vec![1.0, 2.0, 3.0], vec![10.0, 10.0, 10.0]),
        ]);

        let mut controller = CampaignController::new(
            &cfg,
            provider,
            ResultStore::new(paths.clone()),
            RecordingStatus::default(),
            ScriptedControl::new(&[RUN]),
        );
        controller.run().unwrap();

        assert_eq!(
            controller.accumulator().mean_linear().unwrap(),
            &[5.5, 5.5, 5.5]
        );
        let expected = 10.0 * 5.5f64.log10();
        assert_eq!(
            lines(&paths.magnitude_mean)[0],
            format_row(&[expected; 3], MAGNITUDE_PRECISION).trim_end()
        );
        assert_eq!(controller.state(), CampaignState::Stopped);
    }

    #[test]
    fn axis_mismatch_aborts_and_keeps_last_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CampaignPaths::new(dir.path());
        let cfg = config(RunLimit::Endless);
        let mut status = RecordingStatus::default();
        let provider = TableProvider::new(vec![
            (vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]),
            (vec![1.0, 2.5, 3.0], vec![9.0, 9.0, 9.0]),
        ]);

        let err = CampaignController::new(
            &cfg,
            provider,
            ResultStore::new(paths.clone()),
            &mut status,
            ScriptedControl::new(&[RUN]),
        )
        .run()
        .unwrap_err();

        assert!(matches!(
            err,
            CampaignError::Accumulator(crate::prelude::AccumulatorError::FrequencyAxisMismatch {
                sweep: 2,
                ..
            })
        ));
        let last = status.writes.last().unwrap();
        assert!(!last.running);
        assert_eq!(last.exit_flag, -1);
        assert_eq!(last.sweep_count, 1);
        assert_eq!(lines(&paths.magnitude_full).len(), 1);
        assert_eq!(
            lines(&paths.magnitude_max)[0],
            format_row(&[-1.0, -2.0, -3.0], MAGNITUDE_PRECISION).trim_end()
        );
    }

    #[test]
    fn invalid_first_axis_writes_no_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CampaignPaths::new(dir.path());
        let cfg = config(RunLimit::Runs(5));
        let provider = TableProvider::new(vec![(vec![100.0, 50.0, 150.0], vec![0.0; 3])]);

        let err = CampaignController::new(
            &cfg,
            provider,
            ResultStore::new(paths.clone()),
            RecordingStatus::default(),
            ScriptedControl::new(&[RUN]),
        )
        .run()
        .unwrap_err();

        assert!(matches!(
            err,
            CampaignError::Accumulator(crate::prelude::AccumulatorError::InvalidFrequencyAxis(_))
        ));
        assert!(!paths.frequency.exists());
        assert!(!paths.magnitude_max.exists());
    }

    #[test]
    fn provider_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(RunLimit::Runs(1));
        let mut status = RecordingStatus::default();

        let err = CampaignController::new(
            &cfg,
            FailingProvider,
            ResultStore::new(CampaignPaths::new(dir.path())),
            &mut status,
            ScriptedControl::new(&[RUN]),
        )
        .run()
        .unwrap_err();

        assert!(matches!(err, CampaignError::Provider(ProviderError::Other(_))));
        assert!(!status.writes.last().unwrap().running);
    }

    #[test]
    fn unwritten_sink_does_not_replay_previous_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CampaignPaths::new(dir.path());
        let cfg = config(RunLimit::Runs(3));
        let mut status = RecordingStatus::default();

        let err = CampaignController::new(
            &cfg,
            FirstCallOnly { calls: 0 },
            ResultStore::new(paths.clone()),
            &mut status,
            ScriptedControl::new(&[RUN]),
        )
        .run()
        .unwrap_err();

        assert!(matches!(
            err,
            CampaignError::Provider(ProviderError::MalformedTable { .. })
        ));
        assert_eq!(lines(&paths.magnitude_full).len(), 1);
        let last = status.writes.last().unwrap();
        assert_eq!(last.sweep_count, 1);
        assert!(!last.running);
    }
}
