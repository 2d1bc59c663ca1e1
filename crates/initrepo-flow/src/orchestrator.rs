use tracing::Instrument;

use initrepo_core::config::Config;
use initrepo_core::error::InitRepoError;
use initrepo_core::models::creation::RepoCreation;
use initrepo_host::HostProvider;
use initrepo_scaffold::scaffold::{validate_project_name, ScaffoldReport, Scaffolder};

/// Everything a successful run produced.
#[derive(Debug)]
pub struct InitOutcome {
    pub creation: RepoCreation,
    pub scaffold: ScaffoldReport,
    pub web_url: String,
}

/// Creates the remote repository, then the local one that pushes to it.
pub struct InitFlow {
    config: Config,
    provider: Box<dyn HostProvider>,
    scaffolder: Scaffolder,
}

impl InitFlow {
    pub fn new(config: Config, provider: Box<dyn HostProvider>, scaffolder: Scaffolder) -> Self {
        Self {
            config,
            provider,
            scaffolder,
        }
    }

    /// Run the whole initialization for `name`.
    ///
    /// A remote that already exists is not an error; the local scaffold still runs.
    pub async fn run(&self, name: &str) -> Result<InitOutcome, InitRepoError> {
        let span = tracing::info_span!("init", project = name);
        self.run_inner(name).instrument(span).await
    }

    async fn run_inner(&self, name: &str) -> Result<InitOutcome, InitRepoError> {
        validate_project_name(name)?;
        tracing::info!("starting repository initialization");

        tracing::info!("creating GitHub repository {name}");
        let creation = match self.provider.create_repository(name).await {
            Ok(creation @ RepoCreation::Created(_)) => {
                tracing::info!("created GitHub repository {}", creation.full_name());
                creation
            }
            Ok(creation @ RepoCreation::AlreadyExists { .. }) => {
                tracing::warn!(
                    "repository {} already exists on GitHub, continuing with local setup",
                    creation.full_name()
                );
                creation
            }
            Err(e) => {
                tracing::error!("failed to create GitHub repository: {e}");
                return Err(e);
            }
        };

        tracing::info!(
            "setting up local repository in {}",
            self.scaffolder.root().join(name).display()
        );
        let scaffold = self.scaffolder.scaffold(name, &self.config)?;

        tracing::info!("repository {name} initialized successfully");
        let web_url = match &creation {
            RepoCreation::Created(repo) => repo.html_url.clone(),
            RepoCreation::AlreadyExists { .. } => self.config.web_url(name),
        };
        Ok(InitOutcome {
            creation,
            scaffold,
            web_url,
        })
    }
}
