use super::macos::mac_platforms;
use super::platform_tag::{normalize_legacy_manylinux_alias, PlatformTag, LEGACY_MANYLINUX_ALIASES};
use crate::prelude::*;

// Given a platform tag like "manylinux_2_17_x86_64" or "macosx_11_0_arm64", returns
// a vector of platform tags that are guaranteed to be supported on any machine that
// supports the given tag. The vector is sorted so "better" tags come before "worse"
// tags.
//
// Families we don't know how to expand are an error, not a passthrough.
pub fn expand_platform_tag(tag: &str) -> Result<Vec<String>> {
    if tag.starts_with("manylinux") {
        manylinux_platforms(tag)
    } else if tag.starts_with("musllinux") {
        musllinux_platforms(tag)
    } else if tag.starts_with("macosx") {
        macosx_platforms(tag)
    } else {
        Err(BundleError::UnsupportedPlatform {
            platform: tag.into(),
        })?
    }
}

// https://peps.python.org/pep-0600/#package-installers
//
// Only glibc 2.x is supported. There's no glibc 3 yet, and no one knows whether a
// hypothetical manylinux_3_0 could load manylinux_2_x wheels.
fn manylinux_platforms(tag: &str) -> Result<Vec<String>> {
    let normalized = normalize_legacy_manylinux_alias(tag)?;
    // report problems in terms of what the user typed, not our rewrite of it
    let parsed = PlatformTag::parse_family(&normalized, "manylinux").map_err(|_| {
        BundleError::MalformedTag {
            platform: tag.into(),
        }
    })?;
    if parsed.version_major != 2 {
        debug!("refusing to expand {tag}: only glibc 2.x is understood");
        Err(BundleError::UnsupportedPlatform {
            platform: tag.into(),
        })?
    }

    let mut tags = Vec::new();
    for candidate in parsed.descending_minors() {
        let canonical = candidate.to_string();
        // Wheels are still published under the legacy names alone, so offer the alias
        // right next to the tag it's equivalent to.
        let prefix = format!("manylinux_{}_{}", candidate.version_major, candidate.version_minor);
        let alias = LEGACY_MANYLINUX_ALIASES
            .iter()
            .find(|(_, legacy_prefix)| *legacy_prefix == prefix)
            .map(|(alias, _)| format!("{}_{}", alias, candidate.arch));
        tags.push(canonical);
        tags.extend(alias);
    }
    Ok(tags)
}

// https://peps.python.org/pep-0656/
fn musllinux_platforms(tag: &str) -> Result<Vec<String>> {
    let parsed = PlatformTag::parse_family(tag, "musllinux")?;
    if parsed.version_major != 1 {
        debug!("refusing to expand {tag}: only musl 1.x is understood");
        Err(BundleError::UnsupportedPlatform {
            platform: tag.into(),
        })?
    }
    Ok(parsed.descending_minors().map(|t| t.to_string()).collect())
}

fn macosx_platforms(tag: &str) -> Result<Vec<String>> {
    let parsed = PlatformTag::parse_family(tag, "macosx")?;
    Ok(mac_platforms(
        (parsed.version_major, parsed.version_minor),
        &parsed.arch,
    ))
}
