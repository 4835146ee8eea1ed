use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use scancore::config::SweepPlan;
use scancore::math::{FftHelper, StatsHelper};
use scancore::provider::{ProviderError, SweepProvider};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

/// Lowest power written to a synthetic table, keeps dB values finite.
const POWER_FLOOR: f64 = 1e-30;

/// Carrier placed at a fraction of the sweep span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    /// Position within the span, 0.0 = start, 1.0 = end.
    pub offset: f64,
    pub level_db: f64,
}

/// Configuration for synthetic sweeps used in dry runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub noise_floor_db: f64,
    pub tones: Vec<Tone>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            noise_floor_db: -90.0,
            tones: vec![
                Tone {
                    offset: 0.25,
                    level_db: -40.0,
                },
                Tone {
                    offset: 0.6,
                    level_db: -55.0,
                },
            ],
        }
    }
}

/// Sweep provider that fabricates noise plus carriers and runs them through
/// a windowed FFT instead of talking to a receiver.
pub struct SyntheticProvider {
    config: GeneratorConfig,
    rng: StdRng,
    fft: Option<FftHelper>,
    sweeps: u64,
}

impl SyntheticProvider {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            fft: None,
            sweeps: 0,
        }
    }

    /// Bin-centre frequencies. A zero span is centred on the start
    /// frequency and covers the sample rate.
    pub fn frequency_axis(plan: &SweepPlan) -> Vec<f64> {
        let bins = plan.bins.max(1);
        let (low, width) = if plan.span() > 0.0 {
            (plan.start_freq.min(plan.end_freq), plan.span())
        } else {
            (plan.start_freq - plan.sample_rate / 2.0, plan.sample_rate)
        };
        (0..bins)
            .map(|i| low + width * (i as f64 + 0.5) / bins as f64)
            .collect()
    }

    /// Averaged power spectrum in dB for one sweep.
    pub fn spectrum(&mut self, plan: &SweepPlan) -> Vec<f64> {
        let bins = plan.bins.max(1);
        let repeats = plan.repeats.max(1);
        let mut fft = match self.fft.take() {
            Some(helper) if helper.size() == bins => helper,
            _ => FftHelper::new(bins),
        };

        let noise_amplitude = StatsHelper::lin10(self.config.noise_floor_db).sqrt();
        let tones: Vec<(f64, f64)> = self
            .config
            .tones
            .iter()
            .filter(|tone| (0.0..1.0).contains(&tone.offset))
            .map(|tone| {
                let bin = (tone.offset * bins as f64).floor();
                let cycles = (bin - (bins / 2) as f64) / bins as f64;
                (cycles, StatsHelper::lin10(tone.level_db).sqrt())
            })
            .collect();

        let mut average = vec![0.0; bins];
        for _ in 0..repeats {
            let samples: Vec<Complex64> = (0..bins)
                .map(|n| {
                    let noise = Complex64::new(
                        self.rng.gen_range(-1.0..1.0),
                        self.rng.gen_range(-1.0..1.0),
                    ) * noise_amplitude;
                    tones.iter().fold(noise, |acc, &(cycles, amplitude)| {
                        acc + Complex64::from_polar(amplitude, 2.0 * PI * cycles * n as f64)
                    })
                })
                .collect();
            for (slot, power) in average.iter_mut().zip(fft.power_spectrum(&samples)) {
                *slot += power / repeats as f64;
            }
        }

        self.fft = Some(fft);
        average
            .into_iter()
            .map(|power| StatsHelper::db10(power.max(POWER_FLOOR)))
            .collect()
    }
}

impl SweepProvider for SyntheticProvider {
    fn sweep(&mut self, plan: &SweepPlan, sink: &Path) -> Result<(), ProviderError> {
        self.sweeps += 1;
        let axis = Self::frequency_axis(plan);
        let magnitude = self.spectrum(plan);

        let mut table = format!("# synthetic sweep {}\n", self.sweeps);
        for (frequency, power) in axis.iter().zip(&magnitude) {
            table.push_str(&format!("{:.3} {:.6}\n", frequency, power));
        }
        std::fs::write(sink, table).map_err(|source| ProviderError::Sink {
            path: sink.to_path_buf(),
            source,
        })
    }
}
