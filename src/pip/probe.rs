use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::env::Env;
use crate::prelude::*;

#[cfg(windows)]
pub const DEFAULT_PYTHON: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_PYTHON: &str = "python3";

const PROBE_SCRIPT: &str = "import json, sys, sysconfig; \
    print(json.dumps({\
    'implementation': sys.implementation.name, \
    'version': list(sys.version_info[:3]), \
    'purelib': sysconfig.get_path('purelib')}))";

/// What a python executable tells us about itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InterpreterInfo {
    pub implementation: String,
    pub version: (u32, u32, u32),
    pub purelib: PathBuf,
}

impl InterpreterInfo {
    pub fn interpreter(&self) -> Interpreter {
        Interpreter::new(&self.implementation, self.version)
    }

    /// Whether an environment made by one can be reused for the other.
    pub fn is_compatible_with(&self, other: &InterpreterInfo) -> bool {
        self.implementation == other.implementation
            && self.interpreter().python_version() == other.interpreter().python_version()
    }

    pub fn short_version(&self) -> String {
        format!("{}.{}", self.version.0, self.version.1)
    }

    pub fn into_env(self, path: &Path, python: PathBuf) -> Env {
        Env {
            path: path.to_path_buf(),
            python,
            interpreter: self.interpreter(),
            purelib: self.purelib,
            supported_tags: None,
        }
    }
}

pub fn probe(python: &Path) -> Result<InterpreterInfo> {
    context!("inspecting {}", python.display());
    let output = Command::new(python)
        .args(["-c", PROBE_SCRIPT])
        .stdin(Stdio::null())
        .output()
        .wrap_err_with(|| format!("failed to run {}", python.display()))?;
    if !output.status.success() {
        bail!(
            "{} failed (exit status: {}): {}",
            python.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let info: InterpreterInfo = serde_json::from_slice(&output.stdout)
        .wrap_err("unexpected output from interpreter probe")?;
    trace!("{} is {}", python.display(), info.interpreter());
    Ok(info)
}

pub fn venv_python(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python")
    }
}

pub fn is_venv(path: &Path) -> bool {
    path.join("pyvenv.cfg").is_file()
}
