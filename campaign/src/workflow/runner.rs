use crate::generator::profile::SyntheticProvider;
use crate::workflow::config::{CampaignConfig, ProviderKind};
use anyhow::Context;
use log::info;
use scancore::persist::{
    write_settings, CampaignPaths, JsonControlFile, JsonStatusFile, ResultStore,
};
use scancore::provider::{CommandProvider, SweepProvider};
use scancore::{CampaignController, CampaignOutcome};

/// Wires the configured provider and the campaign files into a controller.
#[derive(Clone)]
pub struct Runner {
    config: CampaignConfig,
}

impl Runner {
    pub fn new(config: CampaignConfig) -> Self {
        Self { config }
    }

    pub fn paths(&self) -> CampaignPaths {
        CampaignPaths::new(&self.config.campaign_dir)
    }

    fn build_provider(&self) -> Box<dyn SweepProvider> {
        match self.config.provider {
            ProviderKind::Command => Box::new(
                CommandProvider::new(self.config.program.clone())
                    .with_extra_args(self.config.program_args.iter().cloned()),
            ),
            ProviderKind::Synthetic => {
                Box::new(SyntheticProvider::new(self.config.generator.clone()))
            }
        }
    }

    pub fn execute(&self) -> anyhow::Result<CampaignOutcome> {
        let controller_config = self.config.to_controller_config()?;
        let paths = self.paths();
        paths
            .create_root()
            .context("creating campaign directory")?;
        write_settings(&paths.settings, &self.config).context("writing campaign settings")?;
        info!(
            "campaign `{}` writing to {} ({:?} provider)",
            self.config.name,
            paths.root.display(),
            self.config.provider
        );

        let mut controller = CampaignController::new(
            &controller_config,
            self.build_provider(),
            ResultStore::new(paths.clone()),
            JsonStatusFile::new(&paths.status),
            JsonControlFile::new(&paths.control),
        );
        controller
            .run()
            .with_context(|| format!("campaign `{}` aborted", self.config.name))
    }
}
