use crate::config::SweepPlan;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// One completed sweep as read back from the provider's output table.
///
/// `frequency` and `magnitude_db` are index-aligned and always the same
/// length; the value is never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    frequency: Vec<f64>,
    magnitude_db: Vec<f64>,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}

impl SweepResult {
    pub fn new(
        frequency: Vec<f64>,
        magnitude_db: Vec<f64>,
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
    ) -> Result<Self, ProviderError> {
        if frequency.len() != magnitude_db.len() {
            return Err(ProviderError::MalformedTable {
                path: PathBuf::new(),
                reason: format!(
                    "{} frequencies but {} magnitudes",
                    frequency.len(),
                    magnitude_db.len()
                ),
            });
        }
        Ok(Self {
            frequency,
            magnitude_db,
            started_at,
            ended_at,
        })
    }

    pub fn frequency(&self) -> &[f64] {
        &self.frequency
    }

    pub fn magnitude_db(&self) -> &[f64] {
        &self.magnitude_db
    }

    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }
}

/// Failures raised by the running statistics.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AccumulatorError {
    #[error("invalid frequency axis: {0}")]
    InvalidFrequencyAxis(String),
    #[error("frequency axis of sweep {sweep} does not match the reference axis: {detail}")]
    FrequencyAxisMismatch { sweep: u64, detail: String },
    #[error("accumulator has not been initialized with a reference sweep")]
    NotInitialized,
    #[error("accumulator already holds a reference sweep")]
    AlreadyInitialized,
}

/// Failures of the external spectrum-sweep collaborator.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to access sweep output {path}: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed sweep table {path}: {reason}")]
    MalformedTable { path: PathBuf, reason: String },
    #[error("sweep provider failure: {0}")]
    Other(String),
}

/// Common error type for a campaign run. Every variant is fatal.
#[derive(thiserror::Error, Debug)]
pub enum CampaignError {
    #[error(transparent)]
    Accumulator(#[from] AccumulatorError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("persistence failure on {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CampaignError {
    pub fn persistence(path: impl AsRef<Path>, source: impl Into<std::io::Error>) -> Self {
        CampaignError::Persistence {
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        }
    }
}

pub type CampaignResult<T> = Result<T, CampaignError>;

/// Performs one acquisition over the planned range and writes a two-column
/// `frequency magnitude_dB` table to `sink`.
///
/// Implementations own all device tuning, streaming, windowing and FFT
/// averaging. The controller reads the table back once the call returns.
pub trait SweepProvider {
    fn sweep(&mut self, plan: &SweepPlan, sink: &Path) -> Result<(), ProviderError>;
}

impl<P: SweepProvider + ?Sized> SweepProvider for Box<P> {
    fn sweep(&mut self, plan: &SweepPlan, sink: &Path) -> Result<(), ProviderError> {
        (**self).sweep(plan, sink)
    }
}

impl<P: SweepProvider + ?Sized> SweepProvider for &mut P {
    fn sweep(&mut self, plan: &SweepPlan, sink: &Path) -> Result<(), ProviderError> {
        (**self).sweep(plan, sink)
    }
}
