use std::path::PathBuf;
use std::rc::Rc;

use super::{BundleOptions, Bundler, Progress, Reporter, Status};
use crate::env::{Backend, Env, InstallRequest, ProjectInstall};
use crate::platform_tags::expand_platform_tag;
use crate::prelude::*;
use crate::project::Project;

const NO_MODULE_WARNING: &str =
    "The root package was not installed because no matching module or package was found.";

/// Bundles a project into a virtual environment: the project's locked dependencies
/// plus the project itself, built as a wheel.
pub struct VenvBundler {
    backend: Rc<dyn Backend>,
    path: PathBuf,
    executable: Option<PathBuf>,
    remove: bool,
    activated_groups: Option<HashSet<GroupName>>,
    compile: bool,
    platform: Option<String>,
}

impl VenvBundler {
    pub const NAME: &'static str = "venv";

    pub fn new(backend: Rc<dyn Backend>) -> VenvBundler {
        VenvBundler {
            backend,
            path: PathBuf::new(),
            executable: None,
            remove: false,
            activated_groups: None,
            compile: false,
            platform: None,
        }
    }

    fn create_env(&self, progress: &Progress, reporter: &dyn Reporter) -> Result<Env> {
        let message = match &self.executable {
            Some(executable) => format!(
                "Creating a virtual environment using Python {}",
                executable.display()
            ),
            None => "Creating a virtual environment using the default Python".to_owned(),
        };
        reporter.report(Status::Running, &progress.step(&message));

        let executable = self.executable.as_deref();
        match self
            .backend
            .create_venv_at_path(&self.path, executable, self.remove)
        {
            Err(err)
                if matches!(
                    err.downcast_ref::<BundleError>(),
                    Some(BundleError::IncompatiblePython { .. })
                ) =>
            {
                debug!("{err}");
                reporter.report(
                    Status::Running,
                    &progress.step(
                        "Replacing existing virtual environment due to incompatible Python version",
                    ),
                );
                self.backend.create_venv_at_path(&self.path, executable, true)
            }
            result => result,
        }
    }
}

fn report_failure(
    progress: &Progress,
    reporter: &dyn Reporter,
    step: &str,
    err: eyre::Report,
) -> bool {
    reporter.report(Status::Failed, &progress.failed(step));
    tracing::error!("{err:?}");
    false
}

impl Bundler for VenvBundler {
    fn name(&self) -> &str {
        VenvBundler::NAME
    }

    fn configure(&mut self, options: &BundleOptions) -> Result<()> {
        if let Some(platform) = &options.platform {
            // only the syntax can be checked before we know the interpreter
            expand_platform_tag(platform)?;
        }
        self.path = options.path.clone();
        self.executable = options.executable.clone();
        self.remove = options.clear;
        self.activated_groups = options.activated_groups.clone();
        self.compile = options.compile;
        self.platform = options.platform.clone();
        Ok(())
    }

    fn bundle(&self, project: &Project, reporter: &dyn Reporter) -> Result<bool> {
        context!("bundling {} into {}", project.name, self.path.display());
        let progress = Progress::new(project, &self.path);
        reporter.report(Status::Running, progress.header());

        let mut env = match self.create_env(&progress, reporter) {
            Ok(env) => env,
            Err(err) => {
                let step = "Creating a virtual environment";
                return Ok(report_failure(&progress, reporter, step, err));
            }
        };

        if let Some(platform) = &self.platform {
            env.target_platform(platform)?;
        }

        reporter.report(Status::Running, &progress.step("Installing dependencies"));
        let request = InstallRequest {
            groups: self.activated_groups.as_ref(),
            compile: self.compile,
            develop: false,
        };
        if let Err(err) = self.backend.install_locked(&env, project, &request) {
            return Ok(report_failure(&progress, reporter, "Installing dependencies", err));
        }

        let installing = format!("Installing {} ({})", project.name, project.version);
        reporter.report(Status::Running, &progress.step(&installing));
        let mut warning = None;
        match self.backend.install_project(&env, project, &request) {
            Ok(ProjectInstall::Installed(wheel)) => debug!("installed {wheel}"),
            Ok(ProjectInstall::NoModule) => warning = Some(NO_MODULE_WARNING),
            Err(err) => return Ok(report_failure(&progress, reporter, &installing, err)),
        }

        reporter.report(Status::Done, progress.done());
        if let Some(warning) = warning {
            reporter.report(Status::Warning, warning);
        }
        Ok(true)
    }
}
