use std::path::{Path, PathBuf};

use auto_impl::auto_impl;

use crate::platform_tags::supported_tags;
use crate::prelude::*;
use crate::project::Project;

/// A virtual environment we're bundling into.
#[derive(Debug, Clone)]
pub struct Env {
    pub path: PathBuf,
    /// The environment's own python executable
    pub python: PathBuf,
    pub interpreter: Interpreter,
    pub purelib: PathBuf,
    /// When set, only artifacts matching these tags may be installed, and they're
    /// installed for that platform rather than the one we're running on.
    pub supported_tags: Option<SupportedTags>,
}

impl Env {
    /// Restrict installs to wheels that run on `platform`. Replaces any previous
    /// restriction.
    pub fn target_platform(&mut self, platform: &str) -> Result<()> {
        let tags = supported_tags(platform, &self.interpreter)?;
        debug!(
            "{} accepts {} tags for {}",
            platform,
            tags.len(),
            self.interpreter
        );
        self.supported_tags = Some(tags);
        Ok(())
    }

    pub fn is_targeted(&self) -> bool {
        self.supported_tags.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallRequest<'a> {
    /// `None` means the project's non-optional groups.
    pub groups: Option<&'a HashSet<GroupName>>,
    pub compile: bool,
    /// Install path dependencies in editable mode. Bundlers never set this, since an
    /// editable install points back into the source tree.
    pub develop: bool,
}

#[derive(Debug, Clone)]
pub enum ProjectInstall {
    Installed(WheelName),
    /// Nothing to build: the project declares no package of its own.
    NoModule,
}

#[auto_impl(&, Box, Rc)]
pub trait EnvManager {
    /// Create a virtual environment at `path` using `executable` (or some default
    /// python), or reuse the one that's already there. `force` wipes any existing
    /// environment first. Reusing an environment whose python doesn't match fails
    /// with [`BundleError::IncompatiblePython`].
    fn create_venv_at_path(
        &self,
        path: &Path,
        executable: Option<&Path>,
        force: bool,
    ) -> Result<Env>;
}

#[auto_impl(&, Box, Rc)]
pub trait Installer {
    /// Make `env` contain exactly the locked packages for the requested groups.
    fn install_locked(
        &self,
        env: &Env,
        project: &Project,
        request: &InstallRequest,
    ) -> Result<()>;

    fn install_project(
        &self,
        env: &Env,
        project: &Project,
        request: &InstallRequest,
    ) -> Result<ProjectInstall>;
}

/// Everything a bundler needs from the outside world.
pub trait Backend: EnvManager + Installer {}

impl<T: EnvManager + Installer> Backend for T {}
