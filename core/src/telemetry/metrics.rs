use std::sync::Mutex;
use std::time::Duration;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Counters collected over one campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    pub sweeps: u64,
    pub failures: u64,
    pub pause_polls: u64,
    pub sweep_time: Duration,
}

impl Metrics {
    pub fn mean_sweep_time(&self) -> Option<Duration> {
        u32::try_from(self.sweeps)
            .ok()
            .filter(|&n| n > 0)
            .map(|n| self.sweep_time / n)
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_sweep(&self, elapsed: Duration) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.sweeps += 1;
            metrics.sweep_time += elapsed;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.failures += 1;
        }
    }

    pub fn record_pause_poll(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.pause_polls += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
