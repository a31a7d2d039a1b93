//! An [`EnvManager`] and [`Installer`] that drive the `venv` and `pip` modules of
//! some python interpreter.

mod args;
mod probe;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::env::{Env, EnvManager, InstallRequest, Installer, ProjectInstall};
use crate::lock::{Lock, LockedPackage};
use crate::prelude::*;
use crate::project::Project;

// What poetry-core says when a project's package can't be found.
const NO_MODULE_MESSAGE: &str = "No file/folder found for package";

// Never removed during synchronization; the environment needs them.
const RESERVED: &[&str] = &["pip", "setuptools", "wheel"];

pub struct PipBackend {
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct InstalledDistribution {
    name: PackageName,
}

impl PipBackend {
    pub fn new(verbose: bool) -> PipBackend {
        PipBackend { verbose }
    }

    fn quiet(&self) -> bool {
        !self.verbose
    }

    fn run(&self, python: &Path, args: &[OsString]) -> Result<()> {
        debug!("running {} {:?}", python.display(), args);
        let status = Command::new(python)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .wrap_err_with(|| format!("failed to run {}", python.display()))?;
        if !status.success() {
            bail!("{} failed (exit status: {status})", describe(args));
        }
        Ok(())
    }

    fn synchronize(
        &self,
        env: &Env,
        project: &Project,
        locked: &[&LockedPackage],
    ) -> Result<()> {
        context!("removing packages that aren't in the lock file");
        let output = Command::new(&env.python)
            .args(args::list_installed())
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            bail!("pip list failed (exit status: {})", output.status);
        }
        let installed: Vec<InstalledDistribution> = serde_json::from_slice(&output.stdout)
            .wrap_err("couldn't parse the output of pip list")?;
        let installed: Vec<PackageName> = installed.into_iter().map(|d| d.name).collect();

        let remove = extraneous(&installed, locked, project)?;
        if remove.is_empty() {
            return Ok(());
        }
        debug!(
            "uninstalling {}",
            remove
                .iter()
                .map(|name| name.as_given())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.run(&env.python, &args::uninstall(&remove, self.quiet()))
    }
}

// "pip install", for error messages
fn describe(args: &[OsString]) -> String {
    args.iter()
        .skip(1)
        .take(2)
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Installed distributions that nothing asked for.
fn extraneous(
    installed: &[PackageName],
    locked: &[&LockedPackage],
    project: &Project,
) -> Result<Vec<PackageName>> {
    let mut keep: HashSet<PackageName> = locked.iter().map(|p| p.name.clone()).collect();
    keep.insert(project.name.clone());
    for reserved in RESERVED {
        keep.insert((*reserved).try_into()?);
    }
    Ok(installed
        .iter()
        .filter(|name| !keep.contains(name))
        .cloned()
        .collect())
}

fn find_wheel(dir: &Path) -> Result<PathBuf> {
    let mut wheels = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "whl") {
            wheels.push(path);
        }
    }
    match wheels.as_slice() {
        [wheel] => Ok(wheel.clone()),
        [] => bail!("build didn't produce a wheel"),
        _ => bail!("build produced {} wheels, expected one", wheels.len()),
    }
}

impl EnvManager for PipBackend {
    fn create_venv_at_path(
        &self,
        path: &Path,
        executable: Option<&Path>,
        force: bool,
    ) -> Result<Env> {
        context!("creating a virtual environment at {}", path.display());
        let base_python = executable
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(probe::DEFAULT_PYTHON));
        let base = probe::probe(&base_python)?;
        let python = probe::venv_python(path);

        if !force && probe::is_venv(path) {
            let found = match probe::probe(&python) {
                Ok(existing) if existing.is_compatible_with(&base) => {
                    debug!("reusing the environment at {}", path.display());
                    return Ok(existing.into_env(path, python));
                }
                Ok(existing) => existing.short_version(),
                Err(err) => {
                    debug!("existing environment is unusable: {err}");
                    "an unusable interpreter".to_owned()
                }
            };
            return Err(BundleError::IncompatiblePython {
                path: path.to_path_buf(),
                found,
                expected: base.short_version(),
            }
            .into());
        }

        let mut args: Vec<OsString> = vec!["-m".into(), "venv".into()];
        if force {
            args.push("--clear".into());
        }
        args.push(path.into());
        self.run(&base_python, &args)?;

        Ok(probe::probe(&python)?.into_env(path, python))
    }
}

impl Installer for PipBackend {
    fn install_locked(
        &self,
        env: &Env,
        project: &Project,
        request: &InstallRequest,
    ) -> Result<()> {
        context!("installing locked dependencies into {}", env.path.display());
        let default_groups;
        let groups = match request.groups {
            Some(groups) => groups,
            None => {
                default_groups = project.non_optional_groups();
                &default_groups
            }
        };

        let mut lock = Lock::load(&project.lock_path())?;
        lock.infer_groups(project)?;
        let packages = lock.activated(Some(groups))?;
        if packages.is_empty() {
            debug!("no locked packages to install");
        } else {
            let args =
                args::install_locked(env, project, &packages, groups, request, self.quiet())?;
            self.run(&env.python, &args)?;
        }

        if env.is_targeted() {
            // pip can't see into a --target directory
            debug!("skipping synchronization of a cross-platform environment");
        } else {
            self.synchronize(env, project, &packages)?;
        }
        Ok(())
    }

    fn install_project(
        &self,
        env: &Env,
        project: &Project,
        request: &InstallRequest,
    ) -> Result<ProjectInstall> {
        if !project.package_mode {
            debug!("package mode is disabled; nothing to build");
            return Ok(ProjectInstall::NoModule);
        }
        context!("building a wheel for {}", project.name);

        let wheel_dir = tempfile::tempdir()?;
        let output = Command::new(&env.python)
            .args(args::build_wheel(project, wheel_dir.path(), self.quiet()))
            .stdin(Stdio::null())
            .output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            if stderr.contains(NO_MODULE_MESSAGE) {
                return Ok(ProjectInstall::NoModule);
            }
            bail!(
                "Build failed (exit status: {}):\n{}",
                output.status,
                stderr.trim_end()
            );
        }
        trace!("{}", String::from_utf8_lossy(&output.stdout));

        let wheel_path = find_wheel(wheel_dir.path())?;
        let file_name = wheel_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| eyre!("weird wheel path {}", wheel_path.display()))?;
        let wheel: WheelName = file_name.try_into()?;
        if let Some(tags) = &env.supported_tags {
            if tags.max_compatibility(wheel.all_tags()).is_none() {
                bail!("built wheel {wheel} is not compatible with the target platform");
            }
        }

        self.run(
            &env.python,
            &args::install_wheel(env, &wheel_path, request, self.quiet()),
        )?;
        Ok(ProjectInstall::Installed(wheel))
    }
}
