use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Interval between control-file polls while a campaign is paused.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Neutral hydrogen line, the default centre of a campaign.
pub const DEFAULT_FREQUENCY_HZ: f64 = 1_420_405_752.0;

/// Immutable controller configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub name: String,
    pub limit: RunLimit,
    pub poll_interval: Duration,
    pub plan: SweepPlan,
}

impl ControllerConfig {
    pub fn new(name: impl Into<String>, limit: RunLimit, plan: SweepPlan) -> Self {
        Self {
            name: name.into(),
            limit,
            poll_interval: DEFAULT_POLL_INTERVAL,
            plan,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// When a campaign stops on its own accord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLimit {
    /// Stop after this many completed sweeps.
    Runs(u64),
    /// Sweep until the control channel says otherwise.
    Endless,
    /// Stop after the first sweep that completes once this much time has passed.
    Elapsed(Duration),
}

impl RunLimit {
    pub fn reached(&self, sweep_count: u64, elapsed: Duration) -> bool {
        match *self {
            RunLimit::Runs(runs) => sweep_count >= runs,
            RunLimit::Endless => false,
            RunLimit::Elapsed(limit) => elapsed >= limit,
        }
    }
}

/// Welch window applied by the provider to each FFT segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FftWindow {
    Boxcar,
    Hann,
    Hamming,
    Blackman,
    Bartlett,
    Kaiser(f64),
    Tukey(f64),
}

impl FftWindow {
    pub fn name(&self) -> &'static str {
        match self {
            FftWindow::Boxcar => "boxcar",
            FftWindow::Hann => "hann",
            FftWindow::Hamming => "hamming",
            FftWindow::Blackman => "blackman",
            FftWindow::Bartlett => "bartlett",
            FftWindow::Kaiser(_) => "kaiser",
            FftWindow::Tukey(_) => "tukey",
        }
    }

    pub fn shape_parameter(&self) -> Option<f64> {
        match *self {
            FftWindow::Kaiser(beta) => Some(beta),
            FftWindow::Tukey(alpha) => Some(alpha),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detrend {
    None,
    Constant,
}

/// Receiver gain control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainMode {
    /// Total gain in dB distributed by the driver.
    Total(f64),
    /// Gain per named amplification element, e.g. `LNA=28`.
    Specific(BTreeMap<String, f64>),
    /// Automatic gain control.
    Auto,
}

/// Everything the sweep provider needs to perform one acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPlan {
    pub start_freq: f64,
    pub end_freq: f64,
    pub bins: usize,
    pub repeats: usize,
    /// Percent of overlap (or crop, when `crop` is set) between hops.
    pub overlap: f64,
    pub crop: bool,
    pub fft_window: FftWindow,
    /// Percent overlap between Welch segments.
    pub fft_overlap: f64,
    pub remove_dc: bool,
    pub detrend: Detrend,
    pub device: String,
    pub channel: u32,
    pub antenna: String,
    pub sample_rate: f64,
    pub bandwidth: f64,
    pub ppm: i32,
    pub gain: GainMode,
    pub lnb_lo: f64,
    pub device_settings: BTreeMap<String, String>,
    pub force_rate: bool,
    pub force_bandwidth: bool,
    pub tune_delay: f64,
    pub reset_stream: bool,
    pub buffer_size: usize,
    pub max_buffer_size: i64,
    pub max_threads: usize,
    pub max_queue_size: i64,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            start_freq: DEFAULT_FREQUENCY_HZ,
            end_freq: DEFAULT_FREQUENCY_HZ,
            bins: 512,
            repeats: 1,
            overlap: 0.0,
            crop: false,
            fft_window: FftWindow::Hann,
            fft_overlap: 50.0,
            remove_dc: false,
            detrend: Detrend::None,
            device: String::new(),
            channel: 0,
            antenna: String::new(),
            sample_rate: 10e6,
            bandwidth: 0.0,
            ppm: 0,
            gain: GainMode::Total(15.0),
            lnb_lo: 0.0,
            device_settings: BTreeMap::new(),
            force_rate: false,
            force_bandwidth: false,
            tune_delay: 0.0,
            reset_stream: false,
            buffer_size: 0,
            max_buffer_size: 0,
            max_threads: 0,
            max_queue_size: 0,
        }
    }
}

impl SweepPlan {
    /// Scans `[start, end]`; a single centre frequency is `[f, f]`.
    pub fn with_range(mut self, start_freq: f64, end_freq: f64) -> Self {
        self.start_freq = start_freq;
        self.end_freq = end_freq;
        self
    }

    pub fn span(&self) -> f64 {
        (self.end_freq - self.start_freq).abs()
    }
}
