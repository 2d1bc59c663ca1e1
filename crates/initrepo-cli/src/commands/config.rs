use std::path::Path;
use std::process::ExitCode;

use initrepo_core::config::Config;

/// Write a sample config for the operator to fill in.
pub fn run(path: &Path) -> anyhow::Result<ExitCode> {
    match Config::write_sample(path) {
        Ok(()) => {
            println!("Wrote sample config to {}", path.display());
            println!("  Fill in github_token, github_username and ssh_alias, then run `init_repo --test`.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("{e}");
            println!("✗ {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
