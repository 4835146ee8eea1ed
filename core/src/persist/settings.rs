use super::write_atomic;
use crate::prelude::{CampaignError, CampaignResult};
use serde::Serialize;
use std::path::Path;

/// One-time JSON dump of the resolved configuration, written before the
/// first sweep.
pub fn write_settings<T: Serialize + ?Sized>(path: &Path, settings: &T) -> CampaignResult<()> {
    let encoded =
        serde_json::to_vec_pretty(settings).map_err(|err| CampaignError::persistence(path, err))?;
    write_atomic(path, &encoded)
}
