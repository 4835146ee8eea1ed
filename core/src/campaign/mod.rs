pub mod controller;

pub use controller::{CampaignController, CampaignOutcome, CampaignState, StopReason};
