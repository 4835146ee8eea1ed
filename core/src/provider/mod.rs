pub mod command;

pub use crate::prelude::{ProviderError, SweepProvider};
pub use command::CommandProvider;
