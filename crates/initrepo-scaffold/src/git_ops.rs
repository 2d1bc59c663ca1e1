use std::path::Path;
use std::process::Command;

use initrepo_core::error::InitRepoError;

/// Result of an external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Stderr if the command wrote any, otherwise stdout.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Capability to run an external program and wait for it.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, InitRepoError>;
}

/// Runs real subprocesses.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    envs: Vec<(String, String)>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable for every command this runner starts.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
    ) -> Result<CommandOutput, InitRepoError> {
        tracing::debug!("running: {program} {}", args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.envs(self.envs.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| InitRepoError::CommandUnavailable {
            program: program.to_string(),
            message: e.to_string(),
        })?;

        let out = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        };
        log_lines("stdout", &out.stdout);
        log_lines("stderr", &out.stderr);
        Ok(out)
    }
}

/// One debug event per non-blank line of captured output.
fn log_lines(stream: &str, text: &str) -> usize {
    let mut logged = 0;
    for line in text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
        tracing::debug!("{stream}: {line}");
        logged += 1;
    }
    logged
}

/// Run a git command in the given directory.
fn git(
    runner: &dyn CommandRunner,
    dir: &Path,
    args: &[&str],
) -> Result<CommandOutput, InitRepoError> {
    runner.run("git", args, Some(dir))
}

/// Run a git command in the given directory, returning an error if it fails.
fn git_ok(runner: &dyn CommandRunner, dir: &Path, args: &[&str]) -> Result<String, InitRepoError> {
    let out = git(runner, dir, args)?;
    if !out.success {
        return Err(InitRepoError::Git {
            message: format!("git {} failed: {}", args.join(" "), out.diagnostics()),
        });
    }
    Ok(out.stdout)
}

/// `<git> --version`, e.g. `git version 2.43.0`. `program` may be a resolved path.
pub fn version(runner: &dyn CommandRunner, program: &str) -> Result<String, InitRepoError> {
    let out = runner.run(program, &["--version"], None)?;
    if !out.success {
        return Err(InitRepoError::Git {
            message: format!("git --version failed: {}", out.diagnostics()),
        });
    }
    Ok(out.stdout.trim().to_string())
}

pub fn init(runner: &dyn CommandRunner, dir: &Path) -> Result<(), InitRepoError> {
    git_ok(runner, dir, &["init"])?;
    Ok(())
}

/// Stage everything in the working tree.
pub fn add_all(runner: &dyn CommandRunner, dir: &Path) -> Result<(), InitRepoError> {
    git_ok(runner, dir, &["add", "."])?;
    Ok(())
}

pub fn commit(runner: &dyn CommandRunner, dir: &Path, message: &str) -> Result<(), InitRepoError> {
    git_ok(runner, dir, &["commit", "-m", message])?;
    Ok(())
}

/// Force-rename the current branch: `git branch -M <branch>`.
pub fn rename_branch(
    runner: &dyn CommandRunner,
    dir: &Path,
    branch: &str,
) -> Result<(), InitRepoError> {
    git_ok(runner, dir, &["branch", "-M", branch])?;
    Ok(())
}

pub fn remote_add(
    runner: &dyn CommandRunner,
    dir: &Path,
    name: &str,
    url: &str,
) -> Result<(), InitRepoError> {
    git_ok(runner, dir, &["remote", "add", name, url])?;
    Ok(())
}

/// Push a branch and set it to track the remote branch.
pub fn push_upstream(
    runner: &dyn CommandRunner,
    dir: &Path,
    remote: &str,
    branch: &str,
) -> Result<(), InitRepoError> {
    git_ok(runner, dir, &["push", "-u", remote, branch])?;
    Ok(())
}

/// Number of commits reachable from `rev`.
pub fn rev_list_count(
    runner: &dyn CommandRunner,
    dir: &Path,
    rev: &str,
) -> Result<u32, InitRepoError> {
    let stdout = git_ok(runner, dir, &["rev-list", "--count", rev])?;
    stdout.trim().parse().map_err(|_| InitRepoError::Git {
        message: format!("unexpected rev-list output: {}", stdout.trim()),
    })
}

/// Get the current branch name.
pub fn current_branch(runner: &dyn CommandRunner, dir: &Path) -> Result<String, InitRepoError> {
    let stdout = git_ok(runner, dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(stdout.trim().to_string())
}

pub fn remote_get_url(
    runner: &dyn CommandRunner,
    dir: &Path,
    name: &str,
) -> Result<String, InitRepoError> {
    let stdout = git_ok(runner, dir, &["remote", "get-url", name])?;
    Ok(stdout.trim().to_string())
}
