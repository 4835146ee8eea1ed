use super::format::{format_row, format_span, FREQUENCY_PRECISION, MAGNITUDE_PRECISION};
use super::{append, write_atomic, CampaignPaths};
use crate::prelude::{CampaignError, CampaignResult};
use chrono::NaiveDateTime;
use std::fs::File;

/// Durable sweep outputs of one campaign.
///
/// `freq`, `magMax`, `magMin` and `magMean` always hold exactly one row;
/// `magFull` and `time` grow by one line per sweep. Nothing is rolled back
/// on failure, the last completed write stays valid.
pub struct ResultStore {
    paths: CampaignPaths,
}

impl ResultStore {
    pub fn new(paths: CampaignPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &CampaignPaths {
        &self.paths
    }

    /// Empties the append-only logs so the directory holds a single campaign.
    pub fn truncate_logs(&self) -> CampaignResult<()> {
        for path in [&self.paths.magnitude_full, &self.paths.timing] {
            File::create(path).map_err(|err| CampaignError::persistence(path, err))?;
        }
        Ok(())
    }

    pub fn write_reference_axis(&self, frequency: &[f64]) -> CampaignResult<()> {
        write_atomic(
            &self.paths.frequency,
            format_row(frequency, FREQUENCY_PRECISION).as_bytes(),
        )
    }

    pub fn append_full(&self, magnitude_db: &[f64]) -> CampaignResult<()> {
        append(
            &self.paths.magnitude_full,
            format_row(magnitude_db, MAGNITUDE_PRECISION).as_bytes(),
        )
    }

    pub fn write_max(&self, max_db: &[f64]) -> CampaignResult<()> {
        write_atomic(
            &self.paths.magnitude_max,
            format_row(max_db, MAGNITUDE_PRECISION).as_bytes(),
        )
    }

    pub fn write_min(&self, min_db: &[f64]) -> CampaignResult<()> {
        write_atomic(
            &self.paths.magnitude_min,
            format_row(min_db, MAGNITUDE_PRECISION).as_bytes(),
        )
    }

    pub fn write_mean(&self, mean_db: &[f64]) -> CampaignResult<()> {
        write_atomic(
            &self.paths.magnitude_mean,
            format_row(mean_db, MAGNITUDE_PRECISION).as_bytes(),
        )
    }

    pub fn append_timing(
        &self,
        started_at: &NaiveDateTime,
        ended_at: &NaiveDateTime,
    ) -> CampaignResult<()> {
        append(
            &self.paths.timing,
            format_span(started_at, ended_at).as_bytes(),
        )
    }
}
