use super::format::{flag, timestamp};
use super::write_atomic;
use crate::prelude::{CampaignError, CampaignResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `extFlag` while the campaign is still running.
pub const EXIT_FLAG_RUNNING: i64 = -1;
/// `extFlag` after a stop requested through the control channel.
pub const EXIT_FLAG_STOPPED: i64 = 0;

/// Externally observable progress of a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignStatus {
    pub name: String,
    #[serde(with = "flag")]
    pub running: bool,
    #[serde(with = "flag")]
    pub paused: bool,
    /// -1 while running, 0 when stopped externally, N after N configured runs.
    #[serde(rename = "extFlag")]
    pub exit_flag: i64,
    #[serde(rename = "Nsweep")]
    pub sweep_count: u64,
    #[serde(with = "timestamp")]
    pub start_time: NaiveDateTime,
    #[serde(rename = "curr_time", with = "timestamp")]
    pub current_time: NaiveDateTime,
}

impl CampaignStatus {
    /// Zeroed status of a campaign that has just started.
    pub fn started(name: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            running: true,
            paused: false,
            exit_flag: EXIT_FLAG_RUNNING,
            sweep_count: 0,
            start_time: now,
            current_time: now,
        }
    }
}

/// Controller-to-supervisor progress channel. Every write replaces the
/// previous status entirely.
pub trait StatusStore {
    fn write(&mut self, status: &CampaignStatus) -> CampaignResult<()>;
}

impl<S: StatusStore + ?Sized> StatusStore for &mut S {
    fn write(&mut self, status: &CampaignStatus) -> CampaignResult<()> {
        (**self).write(status)
    }
}

/// Status persisted as a JSON object in a single file.
pub struct JsonStatusFile {
    path: PathBuf,
}

impl JsonStatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> CampaignResult<CampaignStatus> {
        let contents = std::fs::read(&self.path)
            .map_err(|err| CampaignError::persistence(&self.path, err))?;
        serde_json::from_slice(&contents).map_err(|err| CampaignError::persistence(&self.path, err))
    }
}

impl StatusStore for JsonStatusFile {
    fn write(&mut self, status: &CampaignStatus) -> CampaignResult<()> {
        let encoded =
            serde_json::to_vec(status).map_err(|err| CampaignError::persistence(&self.path, err))?;
        write_atomic(&self.path, &encoded)
    }
}
