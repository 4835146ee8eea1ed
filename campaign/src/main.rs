use anyhow::Context;
use clap::{Parser, ValueEnum};
use generator::profile::GeneratorConfig;
use scancore::config::{Detrend, FftWindow, GainMode, SweepPlan};
use std::collections::BTreeMap;
use std::path::PathBuf;
use workflow::config::{CampaignConfig, ProviderKind};
use workflow::parse::{device_settings, float_with_multiplier, frequency_range, specific_gains};
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WindowArg {
    Boxcar,
    Hann,
    Hamming,
    Blackman,
    Bartlett,
    Kaiser,
    Tukey,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DetrendArg {
    #[value(name = "none")]
    Disabled,
    Constant,
}

#[derive(Parser)]
#[command(author, version, about = "Long-term spectrum measurement campaign controller")]
struct Args {
    /// Load the whole campaign configuration from YAML instead of flags
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "Unnamed Campaign")]
    name: String,
    /// Directory holding status, control and result files
    #[arg(long, default_value = "campaign")]
    campaign_dir: PathBuf,
    /// Source of sweeps
    #[arg(long, value_enum, default_value_t = ProviderKind::Command)]
    provider: ProviderKind,
    /// Sweep program invoked once per sweep by the command provider
    #[arg(long, default_value = scancore::provider::command::DEFAULT_PROGRAM)]
    program: String,
    /// Seed for the synthetic provider
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Seconds between control-file polls while paused
    #[arg(long, default_value_t = 10.0)]
    poll_interval: f64,

    /// Centre frequency or `start:end` range, with optional k/M/G multiplier
    #[arg(short = 'f', long, value_parser = frequency_range, default_value = "1420405752")]
    freq: (f64, f64),
    #[arg(short = 'b', long, default_value_t = 512)]
    bins: usize,
    /// Number of spectra to average per sweep
    #[arg(short = 'n', long, default_value_t = 1)]
    repeats: usize,

    /// Repeat the measurement until stopped through the control file
    #[arg(short = 'c', long = "continue", conflicts_with_all = ["runs", "elapsed"])]
    endless: bool,
    #[arg(short = 'u', long, default_value_t = 1, conflicts_with = "elapsed")]
    runs: u64,
    /// Campaign duration limit in seconds
    #[arg(short = 'e', long)]
    elapsed: Option<f64>,

    #[arg(short = 'd', long, default_value = "")]
    device: String,
    #[arg(short = 'C', long, default_value_t = 0)]
    channel: u32,
    #[arg(short = 'A', long, default_value = "")]
    antenna: String,
    #[arg(short = 'r', long, value_parser = float_with_multiplier, default_value = "10M")]
    rate: f64,
    #[arg(short = 'w', long, value_parser = float_with_multiplier, default_value = "0")]
    bandwidth: f64,
    #[arg(short = 'p', long, default_value_t = 0, allow_hyphen_values = true)]
    ppm: i32,
    /// Total gain in dB
    #[arg(short = 'g', long, default_value_t = 15.0, conflicts_with_all = ["specific_gains", "agc"])]
    gain: f64,
    /// Gains of individual amplification elements, e.g. LNA=28,VGA=12,AMP=0
    #[arg(short = 'G', long, value_parser = specific_gains, conflicts_with = "agc")]
    specific_gains: Option<BTreeMap<String, f64>>,
    /// Automatic gain control
    #[arg(short = 'a', long)]
    agc: bool,
    /// LNB LO frequency, negative for upconverters
    #[arg(long, value_parser = float_with_multiplier, default_value = "0", allow_hyphen_values = true)]
    lnb_lo: f64,
    /// Device settings, e.g. biastee=true
    #[arg(long, value_parser = device_settings)]
    device_settings: Option<BTreeMap<String, String>>,
    #[arg(long)]
    force_rate: bool,
    #[arg(long)]
    force_bandwidth: bool,
    /// Seconds to wait after retuning
    #[arg(long, default_value_t = 0.0)]
    tune_delay: f64,
    #[arg(long)]
    reset_stream: bool,

    /// Percent of overlap when frequency hopping
    #[arg(short = 'o', long, default_value_t = 0.0, conflicts_with = "crop")]
    overlap: f64,
    /// Percent of crop when frequency hopping
    #[arg(short = 'k', long)]
    crop: Option<f64>,

    #[arg(short = 's', long, default_value_t = 0)]
    buffer_size: usize,
    #[arg(short = 'S', long, default_value_t = 0, allow_hyphen_values = true)]
    max_buffer_size: i64,
    #[arg(long, default_value_t = 0)]
    max_threads: usize,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    max_queue_size: i64,

    #[arg(short = 'R', long)]
    remove_dc: bool,
    #[arg(short = 'D', long, value_enum, default_value_t = DetrendArg::Disabled)]
    detrend: DetrendArg,
    #[arg(long, value_enum, default_value_t = WindowArg::Hann)]
    fft_window: WindowArg,
    /// Shape parameter, required for kaiser and tukey windows
    #[arg(long)]
    fft_window_param: Option<f64>,
    /// Percent overlap between Welch segments
    #[arg(long, default_value_t = 50.0)]
    fft_overlap: f64,

    #[arg(short = 'q', long, conflicts_with = "debug")]
    quiet: bool,
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn window(&self) -> anyhow::Result<FftWindow> {
        let shaped = |build: fn(f64) -> FftWindow| {
            self.fft_window_param
                .map(build)
                .context("--fft-window-param is required for kaiser and tukey windows")
        };
        Ok(match self.fft_window {
            WindowArg::Boxcar => FftWindow::Boxcar,
            WindowArg::Hann => FftWindow::Hann,
            WindowArg::Hamming => FftWindow::Hamming,
            WindowArg::Blackman => FftWindow::Blackman,
            WindowArg::Bartlett => FftWindow::Bartlett,
            WindowArg::Kaiser => shaped(FftWindow::Kaiser)?,
            WindowArg::Tukey => shaped(FftWindow::Tukey)?,
        })
    }

    fn gain(&self) -> GainMode {
        if self.agc {
            GainMode::Auto
        } else if let Some(gains) = &self.specific_gains {
            GainMode::Specific(gains.clone())
        } else {
            GainMode::Total(self.gain)
        }
    }

    fn to_config(&self) -> anyhow::Result<CampaignConfig> {
        let (start_freq, end_freq) = self.freq;
        let plan = SweepPlan {
            start_freq,
            end_freq,
            bins: self.bins,
            repeats: self.repeats,
            overlap: self.crop.unwrap_or(self.overlap),
            crop: self.crop.is_some(),
            fft_window: self.window()?,
            fft_overlap: self.fft_overlap,
            remove_dc: self.remove_dc,
            detrend: match self.detrend {
                DetrendArg::Disabled => Detrend::None,
                DetrendArg::Constant => Detrend::Constant,
            },
            device: self.device.clone(),
            channel: self.channel,
            antenna: self.antenna.clone(),
            sample_rate: self.rate,
            bandwidth: self.bandwidth,
            ppm: self.ppm,
            gain: self.gain(),
            lnb_lo: self.lnb_lo,
            device_settings: self.device_settings.clone().unwrap_or_default(),
            force_rate: self.force_rate,
            force_bandwidth: self.force_bandwidth,
            tune_delay: self.tune_delay,
            reset_stream: self.reset_stream,
            buffer_size: self.buffer_size,
            max_buffer_size: self.max_buffer_size,
            max_threads: self.max_threads,
            max_queue_size: self.max_queue_size,
        };

        Ok(CampaignConfig {
            name: self.name.clone(),
            campaign_dir: self.campaign_dir.clone(),
            runs: self.runs,
            endless: self.endless,
            elapsed_secs: self.elapsed,
            poll_interval_secs: self.poll_interval,
            provider: self.provider,
            program: self.program.clone(),
            program_args: Vec::new(),
            generator: GeneratorConfig {
                seed: self.seed,
                ..Default::default()
            },
            plan,
        })
    }

    fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .format_timestamp_millis()
        .init();

    let campaign_config = if let Some(path) = &args.config {
        CampaignConfig::load(path)?
    } else {
        args.to_config()?
    };

    let runner = Runner::new(campaign_config);
    let outcome = runner.execute()?;

    let mean = outcome
        .metrics
        .mean_sweep_time()
        .map(|d| format!("{:.1}s", d.as_secs_f64()))
        .unwrap_or_else(|| "n/a".into());
    println!(
        "Campaign finished -> {:?}, sweeps {}, exit flag {}, mean sweep time {}, pause polls {}",
        outcome.reason,
        outcome.sweep_count,
        outcome.exit_flag,
        mean,
        outcome.metrics.pause_polls
    );
    Ok(())
}
