use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Platform {platform} not supported")]
    UnsupportedPlatform { platform: String },
    #[error("Invalid platform tag: {platform}")]
    MalformedTag { platform: String },
    #[error("The bundler class \"{name}\" does not exist.")]
    UnknownBundler { name: String },
    #[error("A bundler class must have a name")]
    UnnamedBundler,
    #[error("A bundler class with the name \"{name}\" already exists.")]
    DuplicateBundler { name: String },
    #[error("Group(s) not found: {0}")]
    GroupNotFound(String),
    #[error(
        "the environment at {} uses Python {found}, but Python {expected} was requested",
        .path.display()
    )]
    IncompatiblePython {
        path: PathBuf,
        found: String,
        expected: String,
    },
}
