pub mod github;

use async_trait::async_trait;
use initrepo_core::config::Config;
use initrepo_core::error::InitRepoError;
use initrepo_core::models::creation::RepoCreation;

/// Operations init_repo needs from a hosting provider.
#[async_trait]
pub trait HostProvider: Send + Sync {
    /// Create a repository named `name` under the authenticated account.
    ///
    /// A name that is already taken is reported as
    /// [`RepoCreation::AlreadyExists`], not as an error.
    async fn create_repository(&self, name: &str) -> Result<RepoCreation, InitRepoError>;

    /// Login of the account that owns the token.
    async fn authenticated_user(&self) -> Result<String, InitRepoError>;
}

/// Create the GitHub provider described by `config`.
pub fn create_provider(config: &Config) -> Result<Box<dyn HostProvider>, InitRepoError> {
    Ok(Box::new(github::GitHubProvider::new(
        config.api_url.clone(),
        config.github_token.clone(),
        config.github_username.clone(),
    )?))
}
