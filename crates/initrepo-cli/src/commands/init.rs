use std::path::Path;
use std::process::ExitCode;

use console::style;
use initrepo_core::config::Config;
use initrepo_core::error::InitRepoError;
use initrepo_flow::{InitFlow, InitOutcome};
use initrepo_scaffold::{Scaffolder, SystemRunner};

pub async fn run(name: &str, config_path: &Path, log_file: &Path) -> anyhow::Result<ExitCode> {
    match initialize(name, config_path).await {
        Ok(outcome) => {
            println!(
                "{} Repository '{name}' created successfully!",
                style("✓").green().bold()
            );
            if !outcome.creation.is_new() {
                println!("  (the GitHub repository already existed)");
            }
            println!("  - GitHub: {}", outcome.web_url);
            println!("  - Local:  {}", outcome.scaffold.path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("initialization of '{name}' failed: {e}");
            println!("{} Failed to create repository '{name}'", style("✗").red().bold());
            println!("  {e}");
            if e.is_config() {
                println!("  Create a config with `init_repo --init-config` or check it with `init_repo --test`.");
            }
            println!("Check the log file '{}' for details", log_file.display());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn initialize(name: &str, config_path: &Path) -> Result<InitOutcome, InitRepoError> {
    let config = Config::load(config_path)?;
    let provider = initrepo_host::create_provider(&config)?;
    let scaffolder = Scaffolder::new(std::env::current_dir()?, Box::new(SystemRunner::new()));

    InitFlow::new(config, provider, scaffolder).run(name).await
}
