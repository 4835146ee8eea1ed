use crate::generator::profile::GeneratorConfig;
use anyhow::{bail, ensure, Context};
use scancore::config::{ControllerConfig, FftWindow, RunLimit, SweepPlan};
use scancore::provider::command::DEFAULT_PROGRAM;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where sweeps come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// External `soapy_power`-compatible program.
    Command,
    /// Built-in noise and carrier generator.
    Synthetic,
}

/// Fully resolved campaign configuration. Dumped verbatim to the settings
/// file before the first sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub name: String,
    pub campaign_dir: PathBuf,
    pub runs: u64,
    pub endless: bool,
    pub elapsed_secs: Option<f64>,
    pub poll_interval_secs: f64,
    pub provider: ProviderKind,
    pub program: String,
    pub program_args: Vec<String>,
    pub generator: GeneratorConfig,
    pub plan: SweepPlan,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            name: "Unnamed Campaign".to_string(),
            campaign_dir: PathBuf::from("campaign"),
            runs: 1,
            endless: false,
            elapsed_secs: None,
            poll_interval_secs: 10.0,
            provider: ProviderKind::Command,
            program: DEFAULT_PROGRAM.to_string(),
            program_args: Vec::new(),
            generator: GeneratorConfig::default(),
            plan: SweepPlan::default(),
        }
    }
}

impl CampaignConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading campaign config {}", path_ref.display()))?;
        let config: CampaignConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing campaign config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.name.trim().is_empty(), "campaign name must not be empty");
        ensure!(self.runs >= 1, "runs must be at least 1");
        if self.endless && self.elapsed_secs.is_some() {
            bail!("endless and elapsed limits are mutually exclusive");
        }
        if let Some(elapsed) = self.elapsed_secs {
            ensure!(
                elapsed.is_finite() && elapsed > 0.0,
                "elapsed limit must be a positive number of seconds"
            );
        }
        ensure!(
            self.poll_interval_secs.is_finite() && self.poll_interval_secs > 0.0,
            "poll interval must be a positive number of seconds"
        );

        let plan = &self.plan;
        ensure!(plan.bins >= 1, "bins must be at least 1");
        ensure!(plan.repeats >= 1, "repeats must be at least 1");
        ensure!(
            (0.0..100.0).contains(&plan.overlap),
            "overlap/crop must be within [0, 100) percent"
        );
        ensure!(
            (0.0..100.0).contains(&plan.fft_overlap),
            "FFT overlap must be within [0, 100) percent"
        );
        if let FftWindow::Kaiser(param) | FftWindow::Tukey(param) = plan.fft_window {
            ensure!(param.is_finite(), "window shape parameter must be finite");
        }
        ensure!(plan.sample_rate > 0.0, "sample rate must be positive");
        if self.provider == ProviderKind::Command {
            ensure!(!self.program.trim().is_empty(), "sweep program must be set");
        }
        Ok(())
    }

    pub fn run_limit(&self) -> anyhow::Result<RunLimit> {
        Ok(if self.endless {
            RunLimit::Endless
        } else if let Some(elapsed) = self.elapsed_secs {
            RunLimit::Elapsed(
                Duration::try_from_secs_f64(elapsed)
                    .with_context(|| format!("elapsed limit of {} s is out of range", elapsed))?,
            )
        } else {
            RunLimit::Runs(self.runs)
        })
    }

    pub fn to_controller_config(&self) -> anyhow::Result<ControllerConfig> {
        self.validate()
            .with_context(|| format!("invalid configuration for `{}`", self.name))?;
        let poll_interval = Duration::try_from_secs_f64(self.poll_interval_secs).with_context(|| {
            format!(
                "poll interval of {} s is out of range",
                self.poll_interval_secs
            )
        })?;
        Ok(
            ControllerConfig::new(self.name.clone(), self.run_limit()?, self.plan.clone())
                .with_poll_interval(poll_interval),
        )
    }
}
