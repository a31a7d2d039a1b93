use super::expand::expand_platform_tag;
use super::interpreter::{compatible_tags, cpython_tags, generic_tags, Interpreter};
use crate::prelude::*;
use indexmap::IndexSet;

/// An ordered set of compatibility tags (`{interpreter}-{abi}-{platform}`), from most
/// preferred to least preferred. An installer picks the first tag that matches an
/// available artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedTags {
    tags: IndexSet<String>,
}

impl SupportedTags {
    pub fn new<T, S>(tags: T) -> SupportedTags
    where
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SupportedTags {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tags(&self) -> indexmap::set::Iter<'_, String> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[cfg(test)]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Higher is better; `None` means incompatible.
    pub fn compatibility(&self, tag: &str) -> Option<i32> {
        self.tags.get_index_of(tag).map(|score| -(score as i32))
    }

    pub fn max_compatibility<T, S>(&self, tags: T) -> Option<i32>
    where
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter()
            .filter_map(|t| self.compatibility(t.as_ref()))
            .max()
    }

    /// The distinct platform parts of the tags, in preference order, leaving out
    /// "any".
    pub fn platforms(&self) -> IndexSet<&str> {
        self.tags
            .iter()
            .filter_map(|tag| tag.rsplit_once('-').map(|(_, platform)| platform))
            .filter(|platform| *platform != "any")
            .collect()
    }

    /// The distinct abi parts of the tags, in preference order.
    pub fn abis(&self) -> IndexSet<&str> {
        self.tags
            .iter()
            .filter_map(|tag| tag.split('-').nth(1))
            .collect()
    }
}

/// Given a platform specifier string, generate every compatibility tag a wheel could
/// carry and still be installable on that platform by `interpreter`.
///
/// Refer to:
///   https://packaging.python.org/en/latest/specifications/platform-compatibility-tags/#platform-tag
///   https://pip.pypa.io/en/stable/cli/pip_install/#cmdoption-platform
pub fn supported_tags(platform: &str, interpreter: &Interpreter) -> Result<SupportedTags> {
    let platforms = expand_platform_tag(platform)?;
    trace!(
        "{platform} expands to {} platform tags for {interpreter}",
        platforms.len()
    );

    let python_version = interpreter.python_version();
    let interpreter_tag = interpreter.interpreter_tag();

    let mut tags = if interpreter.is_cpython() {
        cpython_tags(python_version, &platforms)
    } else {
        generic_tags(&interpreter_tag, &[], &platforms)
    };
    tags.extend(compatible_tags(
        python_version,
        Some(&interpreter_tag),
        &platforms,
    ));

    Ok(SupportedTags::new(tags.iter().map(|t| t.to_string())))
}
