//! Bundlers package a project plus its locked dependencies into some
//! self-contained, relocatable form. Currently that's just a virtual environment.

mod manager;
mod progress;
mod venv;

use std::path::PathBuf;

use crate::prelude::*;
use crate::project::Project;

pub use manager::BundlerManager;
pub use progress::{ConsoleReporter, Progress, Reporter, Status};
pub use venv::VenvBundler;

#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    pub path: PathBuf,
    /// Python used to create the environment; `None` means the backend's default.
    pub executable: Option<PathBuf>,
    /// Throw away whatever is at `path` first.
    pub clear: bool,
    /// `None` means the project's non-optional groups.
    pub activated_groups: Option<HashSet<GroupName>>,
    pub compile: bool,
    /// Platform tag to build for, e.g. `manylinux_2_28_x86_64`. `None` means the
    /// machine we're running on.
    pub platform: Option<String>,
}

pub trait Bundler {
    fn name(&self) -> &str;

    /// Validate and store options. Fails on bad options before anything touches the
    /// filesystem.
    fn configure(&mut self, options: &BundleOptions) -> Result<()>;

    /// Returns `Ok(false)` if bundling failed in a way that's already been reported.
    fn bundle(&self, project: &Project, reporter: &dyn Reporter) -> Result<bool>;
}
