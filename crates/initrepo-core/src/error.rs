use std::path::PathBuf;

/// Central error type for init_repo.
#[derive(Debug, thiserror::Error)]
pub enum InitRepoError {
    #[error("config file not found (searched: {})", display_paths(searched))]
    ConfigNotFound { searched: Vec<PathBuf> },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("directory already exists and is not empty: {path}")]
    DirectoryNotEmpty { path: PathBuf },

    #[error("invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("could not run {program}: {message}")]
    CommandUnavailable { program: String, message: String },

    #[error("git error: {message}")]
    Git { message: String },

    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<InitRepoError>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl InitRepoError {
    /// True for failures the operator can fix by editing the config file.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            InitRepoError::ConfigNotFound { .. } | InitRepoError::Config { .. }
        )
    }
}
