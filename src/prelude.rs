pub use std::collections::{HashMap, HashSet};
pub use std::convert::{TryFrom, TryInto};
pub use std::fmt::Display;

pub use derivative::Derivative;
pub use eyre::{bail, eyre, Result, WrapErr};
pub use once_cell::sync::Lazy;
pub use regex::Regex;
pub use serde::Deserialize;
pub use serde_with::{DeserializeFromStr, SerializeDisplay};
pub use tracing::{debug, trace, warn};

pub use crate::context;
pub use crate::error::BundleError;
pub use crate::platform_tags::{Interpreter, SupportedTags};
pub use crate::str_conversions;
pub use crate::vocab::*;
