use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner and a Hann window for reuse.
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    scratch: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let window = (0..size)
            .map(|n| {
                if size == 1 {
                    1.0
                } else {
                    0.5 - 0.5 * (2.0 * PI * n as f64 / (size - 1) as f64).cos()
                }
            })
            .collect();
        let scratch = vec![Complex64::zero(); size];
        Self {
            fft,
            window,
            scratch,
        }
    }

    pub fn size(&self) -> usize {
        self.window.len()
    }

    /// Windowed, fft-shifted power spectrum of one segment. Short input is
    /// zero padded, long input truncated.
    pub fn power_spectrum(&mut self, input: &[Complex64]) -> Vec<f64> {
        let size = self.size();
        self.scratch.fill(Complex64::zero());
        for (slot, (sample, w)) in self.scratch.iter_mut().zip(input.iter().zip(&self.window)) {
            *slot = *sample * *w;
        }
        self.fft.process(&mut self.scratch);

        let norm: f64 = self.window.iter().map(|w| w * w).sum::<f64>().max(f64::EPSILON);
        let mut power: Vec<f64> = self.scratch.iter().map(|c| c.norm_sqr() / norm).collect();
        power.rotate_left(size / 2 + size % 2);
        power
    }
}
