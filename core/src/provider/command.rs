use crate::config::{Detrend, GainMode, SweepPlan};
use crate::prelude::{ProviderError, SweepProvider};
use log::debug;
use std::path::Path;
use std::process::Command;

pub const DEFAULT_PROGRAM: &str = "soapy_power";

/// Runs an external spectrum-sweep program once per sweep.
///
/// The program receives the plan as `soapy_power`-style flags and writes
/// an `rtl_power_fftw` table to the sink.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    program: String,
    extra_args: Vec<String>,
}

impl Default for CommandProvider {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl CommandProvider {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command-line flags for one single-run sweep into `sink`.
    pub fn arguments(&self, plan: &SweepPlan, sink: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            format!("{}:{}", plan.start_freq, plan.end_freq),
            "-b".to_string(),
            plan.bins.to_string(),
            "-n".to_string(),
            plan.repeats.to_string(),
            "-u".to_string(),
            "1".to_string(),
            "-F".to_string(),
            "rtl_power_fftw".to_string(),
            "-O".to_string(),
            sink.display().to_string(),
        ];

        if plan.overlap > 0.0 {
            args.push(if plan.crop { "-k" } else { "-o" }.to_string());
            args.push(plan.overlap.to_string());
        }

        args.push("--fft-window".to_string());
        args.push(plan.fft_window.name().to_string());
        if let Some(param) = plan.fft_window.shape_parameter() {
            args.push("--fft-window-param".to_string());
            args.push(param.to_string());
        }
        args.push("--fft-overlap".to_string());
        args.push(plan.fft_overlap.to_string());
        if plan.remove_dc {
            args.push("-R".to_string());
        }
        if plan.detrend == Detrend::Constant {
            args.push("-D".to_string());
            args.push("constant".to_string());
        }

        if !plan.device.is_empty() {
            args.push("-d".to_string());
            args.push(plan.device.clone());
        }
        args.push("-C".to_string());
        args.push(plan.channel.to_string());
        if !plan.antenna.is_empty() {
            args.push("-A".to_string());
            args.push(plan.antenna.clone());
        }
        args.push("-r".to_string());
        args.push(plan.sample_rate.to_string());
        if plan.bandwidth > 0.0 {
            args.push("-w".to_string());
            args.push(plan.bandwidth.to_string());
        }
        if plan.ppm != 0 {
            args.push("-p".to_string());
            args.push(plan.ppm.to_string());
        }

        match &plan.gain {
            GainMode::Total(gain) => {
                args.push("-g".to_string());
                args.push(gain.to_string());
            }
            GainMode::Specific(gains) => {
                let joined = gains
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect::<Vec<_>>()
                    .join(",");
                args.push("-G".to_string());
                args.push(joined);
            }
            GainMode::Auto => args.push("-a".to_string()),
        }

        if plan.lnb_lo != 0.0 {
            args.push("--lnb-lo".to_string());
            args.push(plan.lnb_lo.to_string());
        }
        if !plan.device_settings.is_empty() {
            let joined = plan
                .device_settings
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(",");
            args.push("--device-settings".to_string());
            args.push(joined);
        }
        if plan.force_rate {
            args.push("--force-rate".to_string());
        }
        if plan.force_bandwidth {
            args.push("--force-bandwidth".to_string());
        }
        if plan.tune_delay > 0.0 {
            args.push("--tune-delay".to_string());
            args.push(plan.tune_delay.to_string());
        }
        if plan.reset_stream {
            args.push("--reset-stream".to_string());
        }

        for (flag, value) in [
            ("-s", plan.buffer_size as i64),
            ("-S", plan.max_buffer_size),
            ("--max-threads", plan.max_threads as i64),
            ("--max-queue-size", plan.max_queue_size),
        ] {
            if value != 0 {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl SweepProvider for CommandProvider {
    fn sweep(&mut self, plan: &SweepPlan, sink: &Path) -> Result<(), ProviderError> {
        let args = self.arguments(plan, sink);
        debug!("running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| ProviderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProviderError::Exit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
