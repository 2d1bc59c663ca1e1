use serde::{Deserialize, Serialize};

/// A repository the provider just created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRepo {
    pub full_name: String,
    pub html_url: String,
}

/// Outcome of asking the provider for a new repository.
///
/// Failures are carried by the surrounding `Result`, so callers match on
/// meaning rather than on status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCreation {
    Created(CreatedRepo),
    AlreadyExists { full_name: String },
}

impl RepoCreation {
    pub fn full_name(&self) -> &str {
        match self {
            RepoCreation::Created(repo) => &repo.full_name,
            RepoCreation::AlreadyExists { full_name } => full_name,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, RepoCreation::Created(_))
    }
}
