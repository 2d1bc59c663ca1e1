mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use initrepo_core::config::DEFAULT_CONFIG_FILE;

const EXAMPLES: &str = "\
Examples:
  init_repo my_new_project     Create repository 'my_new_project'
  init_repo --test             Check config, GitHub API, git and SSH
  init_repo --init-config      Write a sample config.json to fill in";

#[derive(Parser)]
#[command(
    name = "init_repo",
    version,
    about = "Create a GitHub repository and push a freshly scaffolded local repository to it",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Name of the repository to create
    project_name: Option<String>,

    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Run the self-test instead of creating a repository
    #[arg(long)]
    test: bool,

    /// Only log to the log file, not the console
    #[arg(short, long)]
    quiet: bool,

    /// Log file, appended to on every run
    #[arg(long, default_value = "init_repo.log")]
    log_file: PathBuf,

    /// Write a sample configuration to --config and exit
    #[arg(long, conflicts_with = "test")]
    init_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let _log = logging::init(&logging::LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        file: &cli.log_file,
    })?;

    commands::run(cli).await
}
