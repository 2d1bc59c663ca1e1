use std::ffi::OsString;
use std::path::PathBuf;

use initrepo_core::config::Config;
use initrepo_core::error::InitRepoError;
use initrepo_core::models::check::CheckOutcome;
use initrepo_host::HostProvider;
use initrepo_scaffold::git_ops::{self, CommandOutput, CommandRunner};

/// Outcome of one named check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct SelfTestReport {
    pub results: Vec<CheckResult>,
}

impl SelfTestReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.passed()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }

    pub fn get(&self, name: &str) -> Option<&CheckOutcome> {
        self.results
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }
}

/// Environment checks for `--test`. Read-only: nothing is created locally or remotely.
pub struct SelfTest {
    config: Result<Config, InitRepoError>,
    provider: Option<Box<dyn HostProvider>>,
    runner: Box<dyn CommandRunner>,
    search_path: Option<OsString>,
}

impl SelfTest {
    /// `config` is whatever loading produced; a load failure becomes a failed check.
    pub fn new(config: Result<Config, InitRepoError>, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            config,
            provider: None,
            runner,
            search_path: None,
        }
    }

    /// Use this provider instead of one built from the config.
    pub fn with_provider(mut self, provider: Box<dyn HostProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Look up executables in `path` instead of `$PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Run every check. A failing check never stops the ones after it.
    pub async fn run(&self) -> SelfTestReport {
        tracing::info!("running self-test");

        let mut report = SelfTestReport::default();
        report.results.push(record("configuration", self.check_config()));
        report.results.push(record("github-api", self.check_api().await));
        report.results.push(record("git", self.check_git()));
        report.results.push(record("ssh", self.check_ssh()));

        tracing::info!(
            "self-test results: {}/{} checks passed",
            report.passed(),
            report.total()
        );
        report
    }

    fn check_config(&self) -> CheckOutcome {
        match &self.config {
            Err(e) => CheckOutcome::Fail(e.to_string()),
            Ok(config) if config.has_placeholder_token() => {
                CheckOutcome::Fail("github_token is still the sample placeholder".into())
            }
            Ok(config) => CheckOutcome::Pass(format!(
                "user {}, ssh alias {}, branch {}",
                config.github_username, config.ssh_alias, config.default_branch
            )),
        }
    }

    async fn check_api(&self) -> CheckOutcome {
        let Ok(config) = &self.config else {
            return CheckOutcome::Fail("skipped: no usable configuration".into());
        };

        let built;
        let provider: &dyn HostProvider = match &self.provider {
            Some(p) => p.as_ref(),
            None => match initrepo_host::create_provider(config) {
                Ok(p) => {
                    built = p;
                    built.as_ref()
                }
                Err(e) => return CheckOutcome::Fail(e.to_string()),
            },
        };

        match provider.authenticated_user().await {
            Ok(login) if login == config.github_username => {
                CheckOutcome::Pass(format!("authenticated as {login}"))
            }
            Ok(login) => CheckOutcome::Warn(format!(
                "token belongs to '{login}' but github_username is '{}'",
                config.github_username
            )),
            Err(e) => CheckOutcome::Fail(e.to_string()),
        }
    }

    fn check_git(&self) -> CheckOutcome {
        let Some(git) = self.find_program("git") else {
            return CheckOutcome::Fail("git not found on PATH".into());
        };

        match git_ops::version(self.runner.as_ref(), &git.to_string_lossy()) {
            Ok(version) if version.to_lowercase().starts_with("git version") => {
                CheckOutcome::Pass(format!("{version} ({})", git.display()))
            }
            Ok(other) => CheckOutcome::Fail(format!("unexpected `git --version` output: {other}")),
            Err(e) => CheckOutcome::Fail(e.to_string()),
        }
    }

    fn check_ssh(&self) -> CheckOutcome {
        let Ok(config) = &self.config else {
            return CheckOutcome::Fail("skipped: no usable configuration".into());
        };
        let Some(ssh) = self.find_program("ssh") else {
            return CheckOutcome::Fail("ssh not found on PATH".into());
        };
        let ssh = ssh.to_string_lossy();
        let alias = config.ssh_alias.as_str();

        let hostname = self
            .runner
            .run(&ssh, &["-G", alias], None)
            .ok()
            .filter(|out| out.success)
            .and_then(|out| resolved_hostname(&out.stdout));

        let target = format!("git@{alias}");
        let probe = self.runner.run(
            &ssh,
            &["-T", "-o", "BatchMode=yes", "-o", "ConnectTimeout=10", &target],
            None,
        );
        match probe {
            Ok(out) => classify_ssh_probe(&out, alias, hostname.as_deref()),
            Err(e) => CheckOutcome::Fail(e.to_string()),
        }
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(name, Some(paths), cwd).ok()
            }
            None => which::which(name).ok(),
        }
    }
}

fn record(name: &'static str, outcome: CheckOutcome) -> CheckResult {
    match &outcome {
        CheckOutcome::Pass(detail) => tracing::info!("✓ {name}: {detail}"),
        CheckOutcome::Warn(detail) => tracing::warn!("? {name}: {detail}"),
        CheckOutcome::Fail(detail) => tracing::error!("✗ {name}: {detail}"),
    }
    CheckResult { name, outcome }
}

/// `hostname` line from `ssh -G` output.
fn resolved_hostname(ssh_g_output: &str) -> Option<String> {
    ssh_g_output.lines().find_map(|line| {
        let (key, value) = line.split_once(' ')?;
        (key == "hostname").then(|| value.trim().to_string())
    })
}

/// Interpret `ssh -T git@<alias>` output.
///
/// GitHub closes the session with exit status 1 even on success, so only the
/// text is looked at.
fn classify_ssh_probe(out: &CommandOutput, alias: &str, hostname: Option<&str>) -> CheckOutcome {
    let text = format!("{}\n{}", out.stdout, out.stderr).to_lowercase();
    let via = match hostname {
        Some(host) if host != alias => format!("{alias} -> {host}"),
        _ => alias.to_string(),
    };

    if text.contains("successfully authenticated") {
        CheckOutcome::Pass(format!("authenticated via {via}"))
    } else if text.contains("could not resolve hostname") {
        CheckOutcome::Fail(format!(
            "'{alias}' could not be resolved, check the Host entry in ~/.ssh/config"
        ))
    } else if text.contains("permission denied") {
        CheckOutcome::Fail(format!(
            "permission denied via {via}, check the key configured for '{alias}'"
        ))
    } else {
        let first_line = out.diagnostics().lines().next().unwrap_or("no output");
        CheckOutcome::Warn(format!("inconclusive via {via}: {first_line}"))
    }
}
