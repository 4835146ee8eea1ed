//! File-backed persistence for a campaign working directory.
//!
//! File names match what existing supervisor tooling expects. Snapshot
//! files are replaced through a same-directory temporary file and rename,
//! append-only logs are opened in append mode per write.

pub mod control;
pub mod format;
pub mod results;
pub mod settings;
pub mod status;
pub mod table;

pub use control::{ControlChannel, ControlCommand, JsonControlFile};
pub use results::ResultStore;
pub use settings::write_settings;
pub use status::{CampaignStatus, JsonStatusFile, StatusStore};
pub use table::read_sweep_table;

use crate::prelude::{CampaignError, CampaignResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Locations of every artifact inside one campaign directory.
#[derive(Debug, Clone)]
pub struct CampaignPaths {
    pub root: PathBuf,
    pub settings: PathBuf,
    pub status: PathBuf,
    pub control: PathBuf,
    pub frequency: PathBuf,
    pub magnitude_full: PathBuf,
    pub magnitude_max: PathBuf,
    pub magnitude_mean: PathBuf,
    pub magnitude_min: PathBuf,
    pub timing: PathBuf,
    pub sweep_output: PathBuf,
}

impl CampaignPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            settings: root.join("settings.txt"),
            status: root.join("status.txt"),
            control: root.join("ctrl.txt"),
            frequency: root.join("freq.txt"),
            magnitude_full: root.join("magFull.txt"),
            magnitude_max: root.join("magMax.txt"),
            magnitude_mean: root.join("magMean.txt"),
            magnitude_min: root.join("magMin.txt"),
            timing: root.join("time.txt"),
            sweep_output: root.join("output.txt"),
            root,
        }
    }

    pub fn create_root(&self) -> CampaignResult<()> {
        fs::create_dir_all(&self.root).map_err(|err| CampaignError::persistence(&self.root, err))
    }
}

/// Replaces `path` with `contents` so that readers see either the old or
/// the new file, never a partial one.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> CampaignResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp =
        tempfile::NamedTempFile::new_in(dir).map_err(|err| CampaignError::persistence(path, err))?;
    temp.write_all(contents)
        .and_then(|_| temp.flush())
        .map_err(|err| CampaignError::persistence(path, err))?;
    temp.persist(path)
        .map_err(|err| CampaignError::persistence(path, err.error))?;
    Ok(())
}

pub(crate) fn append(path: &Path, contents: &[u8]) -> CampaignResult<()> {
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(contents))
        .map_err(|err| CampaignError::persistence(path, err))
}
