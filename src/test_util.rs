use std::cell::RefCell;
use std::path::{Path, PathBuf};

use indoc::indoc;

use crate::bundler::{Reporter, Status};
use crate::env::{Env, EnvManager, InstallRequest, Installer, ProjectInstall};
use crate::prelude::*;
use crate::project::Project;

pub const SIMPLE_PYPROJECT: &str = indoc! {r#"
    [tool.poetry]
    name = "simple-project"
    version = "1.2.3"
    description = "Some description."
    authors = ["Sébastien Eustace <sebastien@eustace.io>"]
    license = "MIT"

    [tool.poetry.dependencies]
    python = "~2.7 || ^3.4"

    [tool.poetry.group.dev.dependencies]
    pytest = "^8.0"

    [tool.poetry.group.docs]
    optional = true

    [tool.poetry.group.docs.dependencies]
    sphinx = "^7.0"
"#};

pub fn simple_project() -> Project {
    Project::parse(Path::new("/src/simple-project"), SIMPLE_PYPROJECT).unwrap()
}

/// Collects reports as the lines a console would end up showing, if it never
/// overwrote anything.
#[derive(Default)]
pub struct RecordingReporter {
    reports: RefCell<Vec<(Status, String)>>,
}

impl RecordingReporter {
    pub fn output(&self) -> String {
        self.reports
            .borrow()
            .iter()
            .map(|(_, message)| format!("• {message}\n"))
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, status: Status, message: &str) {
        self.reports.borrow_mut().push((status, message.to_owned()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateVenv {
        path: PathBuf,
        executable: Option<PathBuf>,
        force: bool,
    },
    InstallLocked {
        /// sorted, normalized
        groups: Option<Vec<String>>,
        compile: bool,
        develop: bool,
        targeted: bool,
    },
    InstallProject,
}

#[derive(Default)]
pub struct MockBackend {
    /// Any existing environment has the wrong python, so only `force` succeeds.
    pub incompatible_env: bool,
    pub fail_create: bool,
    pub fail_install: bool,
    pub fail_project: bool,
    pub no_module: bool,
    pub calls: RefCell<Vec<BackendCall>>,
    pub seen_tags: RefCell<Option<SupportedTags>>,
}

impl MockBackend {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    /// The supported tags of the env passed to `install_locked`.
    pub fn seen_tags(&self) -> Option<SupportedTags> {
        self.seen_tags.borrow().clone()
    }
}

impl EnvManager for MockBackend {
    fn create_venv_at_path(
        &self,
        path: &Path,
        executable: Option<&Path>,
        force: bool,
    ) -> Result<Env> {
        self.calls.borrow_mut().push(BackendCall::CreateVenv {
            path: path.to_path_buf(),
            executable: executable.map(Path::to_path_buf),
            force,
        });
        if self.fail_create {
            bail!("python exploded");
        }
        if self.incompatible_env && !force {
            Err(BundleError::IncompatiblePython {
                path: path.to_path_buf(),
                found: "3.7".into(),
                expected: "3.12".into(),
            })?;
        }
        Ok(Env {
            path: path.to_path_buf(),
            python: path.join("bin").join("python"),
            interpreter: Interpreter::new("cpython", (3, 12, 3)),
            purelib: path.join("lib/python3.12/site-packages"),
            supported_tags: None,
        })
    }
}

impl Installer for MockBackend {
    fn install_locked(
        &self,
        env: &Env,
        _project: &Project,
        request: &InstallRequest,
    ) -> Result<()> {
        let groups = request.groups.map(|groups| {
            let mut names: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
            names.sort();
            names
        });
        self.calls.borrow_mut().push(BackendCall::InstallLocked {
            groups,
            compile: request.compile,
            develop: request.develop,
            targeted: env.is_targeted(),
        });
        *self.seen_tags.borrow_mut() = env.supported_tags.clone();
        if self.fail_install {
            bail!("no matching distribution found");
        }
        Ok(())
    }

    fn install_project(
        &self,
        _env: &Env,
        project: &Project,
        _request: &InstallRequest,
    ) -> Result<ProjectInstall> {
        self.calls.borrow_mut().push(BackendCall::InstallProject);
        if self.fail_project {
            bail!("build backend failed");
        }
        if self.no_module {
            return Ok(ProjectInstall::NoModule);
        }
        let wheel = format!(
            "{}-{}-py3-none-any.whl",
            project.name.normalized().replace('-', "_"),
            project.version
        );
        Ok(ProjectInstall::Installed(wheel.parse()?))
    }
}
