pub mod config;
pub mod init;
pub mod selftest;

use std::process::ExitCode;

use clap::CommandFactory;

use crate::Cli;

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.init_config {
        return config::run(&cli.config);
    }
    if cli.test {
        return selftest::run(&cli.config).await;
    }
    match cli.project_name {
        Some(name) => init::run(&name, &cli.config, &cli.log_file).await,
        None => {
            Cli::command().print_help()?;
            Ok(ExitCode::FAILURE)
        }
    }
}
