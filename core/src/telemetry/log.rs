use log::{debug, info, warn};

/// Campaign-scoped logger that tags every record with the campaign name.
pub struct LogManager {
    campaign: String,
}

impl LogManager {
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.campaign, message);
    }

    pub fn detail(&self, message: &str) {
        debug!("[{}] {}", self.campaign, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.campaign, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("campaign")
    }
}
