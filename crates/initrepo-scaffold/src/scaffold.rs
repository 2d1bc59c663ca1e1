use std::path::{Path, PathBuf};

use initrepo_core::config::Config;
use initrepo_core::error::InitRepoError;

use crate::git_ops::{self, CommandRunner};
use crate::templates;

/// One stage of the local scaffold, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldStep {
    CreateDirectory,
    WriteReadme,
    WriteGitignore,
    GitInit,
    InitialCommit,
    RenameBranch,
    AddRemote,
    Push,
}

impl ScaffoldStep {
    pub const ALL: [ScaffoldStep; 8] = [
        ScaffoldStep::CreateDirectory,
        ScaffoldStep::WriteReadme,
        ScaffoldStep::WriteGitignore,
        ScaffoldStep::GitInit,
        ScaffoldStep::InitialCommit,
        ScaffoldStep::RenameBranch,
        ScaffoldStep::AddRemote,
        ScaffoldStep::Push,
    ];
}

impl std::fmt::Display for ScaffoldStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaffoldStep::CreateDirectory => write!(f, "create directory"),
            ScaffoldStep::WriteReadme => write!(f, "write README.md"),
            ScaffoldStep::WriteGitignore => write!(f, "write .gitignore"),
            ScaffoldStep::GitInit => write!(f, "git init"),
            ScaffoldStep::InitialCommit => write!(f, "initial commit"),
            ScaffoldStep::RenameBranch => write!(f, "rename branch"),
            ScaffoldStep::AddRemote => write!(f, "add remote"),
            ScaffoldStep::Push => write!(f, "push"),
        }
    }
}

/// What a completed scaffold produced.
#[derive(Debug, Clone)]
pub struct ScaffoldReport {
    pub path: PathBuf,
    pub branch: String,
    pub remote_url: String,
    pub completed: Vec<ScaffoldStep>,
}

/// Check that `name` is usable both as a directory and as a GitHub repo name.
pub fn validate_project_name(name: &str) -> Result<(), InitRepoError> {
    let invalid = |reason: &str| InitRepoError::InvalidProjectName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name cannot be '.' or '..'"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(invalid(&format!(
            "'{c}' is not allowed; use letters, digits, '-', '_' or '.'"
        )));
    }
    Ok(())
}

/// Builds a local repository for a new project and pushes it.
pub struct Scaffolder {
    root: PathBuf,
    runner: Box<dyn CommandRunner>,
}

impl Scaffolder {
    /// Projects are created as subdirectories of `root`.
    pub fn new(root: impl Into<PathBuf>, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            root: root.into(),
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scaffold `name` under the root.
    ///
    /// Flow:
    /// 1. Create the project directory (an empty existing one is reused)
    /// 2. Write README.md
    /// 3. Write .gitignore
    /// 4. git init
    /// 5. Stage everything and commit
    /// 6. Rename the branch to the configured default
    /// 7. Add `origin` through the SSH alias
    /// 8. Push with upstream tracking
    ///
    /// Stops at the first failing step. Whatever earlier steps did stays on disk.
    pub fn scaffold(&self, name: &str, config: &Config) -> Result<ScaffoldReport, InitRepoError> {
        validate_project_name(name)?;

        let path = self.root.join(name);
        let mut report = ScaffoldReport {
            path: path.clone(),
            branch: config.default_branch.clone(),
            remote_url: config.remote_url(name),
            completed: Vec::with_capacity(ScaffoldStep::ALL.len()),
        };

        for step in ScaffoldStep::ALL {
            tracing::debug!("step: {step}");
            if let Err(e) = self.run_step(step, &path, name, &report) {
                tracing::error!("{step} failed for {}: {e}", path.display());
                if step == ScaffoldStep::Push {
                    tracing::error!(
                        "push to {} failed, check the SSH configuration for '{}'",
                        report.remote_url,
                        config.ssh_alias
                    );
                }
                return Err(InitRepoError::StepFailed {
                    step: step.to_string(),
                    source: Box::new(e),
                });
            }
            report.completed.push(step);
        }

        tracing::info!("local repository ready at {}", path.display());
        Ok(report)
    }

    fn run_step(
        &self,
        step: ScaffoldStep,
        path: &Path,
        name: &str,
        report: &ScaffoldReport,
    ) -> Result<(), InitRepoError> {
        let runner = self.runner.as_ref();
        match step {
            ScaffoldStep::CreateDirectory => create_project_dir(path),
            ScaffoldStep::WriteReadme => {
                std::fs::write(path.join("README.md"), templates::readme(name))?;
                Ok(())
            }
            ScaffoldStep::WriteGitignore => {
                std::fs::write(path.join(".gitignore"), templates::GITIGNORE)?;
                Ok(())
            }
            ScaffoldStep::GitInit => git_ops::init(runner, path),
            ScaffoldStep::InitialCommit => {
                git_ops::add_all(runner, path)?;
                git_ops::commit(runner, path, templates::INITIAL_COMMIT_MESSAGE)
            }
            ScaffoldStep::RenameBranch => git_ops::rename_branch(runner, path, &report.branch),
            ScaffoldStep::AddRemote => {
                git_ops::remote_add(runner, path, "origin", &report.remote_url)
            }
            ScaffoldStep::Push => git_ops::push_upstream(runner, path, "origin", &report.branch),
        }
    }
}

/// Create `path`, accepting an existing directory only if it is empty.
fn create_project_dir(path: &Path) -> Result<(), InitRepoError> {
    if path.exists() {
        let is_empty_dir = path.is_dir() && std::fs::read_dir(path)?.next().is_none();
        if !is_empty_dir {
            return Err(InitRepoError::DirectoryNotEmpty {
                path: path.to_path_buf(),
            });
        }
        tracing::warn!("reusing existing empty directory {}", path.display());
        return Ok(());
    }
    std::fs::create_dir(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_ops::CommandOutput;
    use std::sync::{Arc, Mutex};

    /// Records every command and fails the first one whose args start with `fail_on`.
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl CommandRunner for Recorder {
        fn run(
            &self,
            program: &str,
            args: &[&str],
            _cwd: Option<&Path>,
        ) -> Result<CommandOutput, InitRepoError> {
            let line = format!("{program} {}", args.join(" "));
            self.calls.lock().unwrap().push(line.clone());
            let fail = self
                .fail_on
                .is_some_and(|prefix| line.starts_with(prefix));
            Ok(CommandOutput {
                stderr: if fail { "boom".into() } else { String::new() },
                success: !fail,
                code: Some(if fail { 1 } else { 0 }),
                ..Default::default()
            })
        }
    }

    fn config() -> Config {
        Config::from_json(
            r#"{"github_token":"t","github_username":"u","ssh_alias":"gh","default_branch":"main"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_runs_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let scaffolder = Scaffolder::new(dir.path(), Box::new(recorder.clone()));

        let report = scaffolder.scaffold("demo", &config()).unwrap();

        assert_eq!(report.completed, ScaffoldStep::ALL.to_vec());
        assert_eq!(report.remote_url, "git@gh:u/demo.git");
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec![
                "git init",
                "git add .",
                "git commit -m first commit",
                "git branch -M main",
                "git remote add origin git@gh:u/demo.git",
                "git push -u origin main",
            ]
        );

        let project = dir.path().join("demo");
        assert_eq!(
            std::fs::read_to_string(project.join("README.md")).unwrap(),
            "# demo\n"
        );
        assert!(!std::fs::read_to_string(project.join(".gitignore"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_non_empty_directory_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("demo");
        std::fs::create_dir(&project).unwrap();
        std::fs::write(project.join("notes.txt"), "keep me").unwrap();

        let recorder = Recorder::default();
        let scaffolder = Scaffolder::new(dir.path(), Box::new(recorder.clone()));
        let err = scaffolder.scaffold("demo", &config()).unwrap_err();

        match err {
            InitRepoError::StepFailed { step, source } => {
                assert_eq!(step, "create directory");
                assert!(matches!(*source, InitRepoError::DirectoryNotEmpty { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(recorder.calls.lock().unwrap().is_empty());
        assert!(!project.join("README.md").exists());
    }

    #[test]
    fn test_file_in_the_way_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo"), "").unwrap();

        let recorder = Recorder::default();
        let scaffolder = Scaffolder::new(dir.path(), Box::new(recorder.clone()));
        assert!(scaffolder.scaffold("demo", &config()).is_err());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_existing_directory_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("demo")).unwrap();

        let scaffolder = Scaffolder::new(dir.path(), Box::new(Recorder::default()));
        let report = scaffolder.scaffold("demo", &config()).unwrap();
        assert_eq!(report.completed.len(), 8);
    }

    #[test]
    fn test_failed_push_leaves_earlier_work() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder {
            fail_on: Some("git push"),
            ..Default::default()
        };
        let scaffolder = Scaffolder::new(dir.path(), Box::new(recorder.clone()));

        let err = scaffolder.scaffold("demo", &config()).unwrap_err();
        match &err {
            InitRepoError::StepFailed { step, .. } => assert_eq!(step, "push"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("boom"));
        assert!(dir.path().join("demo/README.md").exists());
    }

    #[test]
    fn test_failed_commit_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder {
            fail_on: Some("git commit"),
            ..Default::default()
        };
        let scaffolder = Scaffolder::new(dir.path(), Box::new(recorder.clone()));

        assert!(scaffolder.scaffold("demo", &config()).is_err());
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.last().map(String::as_str), Some("git commit -m first commit"));
        assert!(!calls.iter().any(|c| c.starts_with("git remote")));
    }

    #[test]
    fn test_project_name_validation() {
        assert!(validate_project_name("my-project_2.0").is_ok());
        for bad in ["", "  ", ".", "..", "a/b", "../escape", "has space", "naïve"] {
            assert!(
                matches!(
                    validate_project_name(bad),
                    Err(InitRepoError::InvalidProjectName { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
