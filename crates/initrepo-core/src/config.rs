use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::InitRepoError;

/// Default config file name, looked up relative to the working directory first.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Token value written by [`Config::write_sample`].
pub const PLACEHOLDER_TOKEN: &str = "your_github_personal_access_token_here";

/// Settings for a run, read from a JSON file such as:
///
/// ```json
/// {
///   "github_token": "ghp_...",
///   "github_username": "octocat",
///   "ssh_alias": "github-personal",
///   "default_branch": "main"
/// }
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub github_token: String,

    pub github_username: String,

    /// `Host` entry in the SSH client config used for the remote URL.
    pub ssh_alias: String,

    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Base URL of the REST API.
    #[serde(default = "default_api_url")]
    pub api_url: Url,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_url() -> Url {
    Url::parse("https://api.github.com").expect("static URL is valid")
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("github_token", &"<redacted>")
            .field("github_username", &self.github_username)
            .field("ssh_alias", &self.ssh_alias)
            .field("default_branch", &self.default_branch)
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

impl Config {
    /// Locations searched for `requested`, in order.
    ///
    /// An absolute path is only looked up as given. A relative one is tried in
    /// the working directory, next to the executable, under
    /// `~/.config/init_repo/` and finally in the home directory.
    pub fn search_paths(requested: &Path) -> Vec<PathBuf> {
        if requested.is_absolute() {
            return vec![requested.to_path_buf()];
        }

        let mut paths = vec![requested.to_path_buf()];
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(exe_dir.join(requested));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("init_repo").join(requested));
            paths.push(home.join(requested));
        }
        paths
    }

    /// Find `requested` along [`Config::search_paths`] and load the first match.
    pub fn load(requested: &Path) -> Result<Self, InitRepoError> {
        let searched = Self::search_paths(requested);
        match searched.iter().find(|p| p.is_file()) {
            Some(path) => {
                tracing::info!("found config file at {}", path.display());
                Self::load_from(path)
            }
            None => {
                for path in &searched {
                    tracing::debug!("no config at {}", path.display());
                }
                Err(InitRepoError::ConfigNotFound { searched })
            }
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, InitRepoError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            InitRepoError::Config { message } => InitRepoError::Config {
                message: format!("{}: {message}", path.display()),
            },
            other => other,
        })
    }

    /// Parse and validate config JSON.
    pub fn from_json(content: &str) -> Result<Self, InitRepoError> {
        let config: Config = serde_json::from_str(content).map_err(|e| InitRepoError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Every required value must be non-empty.
    pub fn validate(&self) -> Result<(), InitRepoError> {
        let required = [
            ("github_token", &self.github_token),
            ("github_username", &self.github_username),
            ("ssh_alias", &self.ssh_alias),
            ("default_branch", &self.default_branch),
        ];
        let empty: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();

        if !empty.is_empty() {
            return Err(InitRepoError::Config {
                message: format!("empty value for required keys: {}", empty.join(", ")),
            });
        }
        Ok(())
    }

    /// Placeholder values for a fresh config file.
    pub fn sample() -> Self {
        Self {
            github_token: PLACEHOLDER_TOKEN.to_string(),
            github_username: "YourGitHubUsername".to_string(),
            ssh_alias: "github-alias".to_string(),
            default_branch: default_branch(),
            api_url: default_api_url(),
        }
    }

    /// Write [`Config::sample`] to `path`. Never overwrites an existing file.
    pub fn write_sample(path: &Path) -> Result<(), InitRepoError> {
        use std::io::Write;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&Self::sample())
            .map_err(|e| InitRepoError::Serialization(e.to_string()))?;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => InitRepoError::Config {
                    message: format!("{} already exists, not overwriting", path.display()),
                },
                _ => InitRepoError::Io(e),
            })?;
        file.write_all(content.as_bytes())?;
        file.write_all(b"\n")?;
        tracing::info!("wrote sample config to {}", path.display());
        Ok(())
    }

    pub fn has_placeholder_token(&self) -> bool {
        self.github_token == PLACEHOLDER_TOKEN
    }

    /// SSH remote through the configured host alias, e.g. `git@gh:user/demo.git`.
    pub fn remote_url(&self, name: &str) -> String {
        format!("git@{}:{}/{}.git", self.ssh_alias, self.github_username, name)
    }

    /// Browser URL of the repository on the host behind `api_url`.
    pub fn web_url(&self, name: &str) -> String {
        format!("{}/{}/{}", web_base(&self.api_url), self.github_username, name)
    }
}

/// Web origin for an API endpoint: `api.github.com` maps to `github.com`,
/// an Enterprise `https://host/api/v3` maps to `https://host`.
pub fn web_base(api_url: &Url) -> String {
    match api_url.host_str() {
        Some("api.github.com") => "https://github.com".to_string(),
        _ => api_url.origin().ascii_serialization(),
    }
}
