//! Core of the long-term spectrum campaign controller.
//!
//! A campaign repeatedly asks a sweep provider for one frequency/magnitude
//! table, folds it into running max/min/mean statistics, persists the
//! results incrementally and exposes a file-based status/control protocol
//! through which a supervisor can pause, resume or stop the run.

pub mod campaign;
pub mod config;
pub mod math;
pub mod persist;
pub mod prelude;
pub mod processing;
pub mod provider;
pub mod telemetry;

pub use campaign::{CampaignController, CampaignOutcome, CampaignState};
pub use config::{ControllerConfig, RunLimit, SweepPlan};
pub use prelude::{CampaignError, CampaignResult, SweepProvider, SweepResult};
