use super::format::flag;
use crate::prelude::{CampaignError, CampaignResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Supervisor request observed at each poll point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlCommand {
    #[serde(with = "flag")]
    pub run: bool,
    #[serde(with = "flag")]
    pub pause: bool,
}

impl Default for ControlCommand {
    fn default() -> Self {
        Self {
            run: true,
            pause: false,
        }
    }
}

/// Supervisor-to-controller command channel. Reads always return the most
/// recent value; writes between two polls are coalesced.
pub trait ControlChannel {
    fn read(&mut self) -> CampaignResult<ControlCommand>;
}

impl<C: ControlChannel + ?Sized> ControlChannel for &mut C {
    fn read(&mut self) -> CampaignResult<ControlCommand> {
        (**self).read()
    }
}

/// Control command read from a JSON file owned by the supervisor.
pub struct JsonControlFile {
    path: PathBuf,
}

impl JsonControlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ControlChannel for JsonControlFile {
    fn read(&mut self) -> CampaignResult<ControlCommand> {
        match std::fs::read(&self.path) {
            Ok(contents) => serde_json::from_slice(&contents)
                .map_err(|err| CampaignError::persistence(&self.path, err)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "control file {} absent, continuing with defaults",
                    self.path.display()
                );
                Ok(ControlCommand::default())
            }
            Err(err) => Err(CampaignError::persistence(&self.path, err)),
        }
    }
}
