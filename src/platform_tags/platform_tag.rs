use std::borrow::Cow;

use crate::prelude::*;

/// Historical manylinux names, and the `manylinux_${GLIBCMAJOR}_${GLIBCMINOR}`
/// prefix each of them is equivalent to.
///
/// https://peps.python.org/pep-0600/#legacy-manylinux-tags
pub static LEGACY_MANYLINUX_ALIASES: &[(&str, &str)] = &[
    ("manylinux1", "manylinux_2_5"),
    ("manylinux2010", "manylinux_2_12"),
    ("manylinux2014", "manylinux_2_17"),
];

// The arch isn't checked here; expansion decides what it can make of it.
static PLATFORM_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]+)_([0-9]+)_([0-9]+)_(.+)$").unwrap());

// Expansion enumerates every version below the requested one, so absurd versions
// would mean absurd amounts of work.
const MAX_VERSION_COMPONENT: u32 = 999;

/// A versioned platform tag like `manylinux_2_17_x86_64`, split into its pieces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct PlatformTag {
    pub platform: String,
    pub version_major: u32,
    pub version_minor: u32,
    pub arch: String,
}

impl PlatformTag {
    /// Like `PlatformTag::try_from`, but also requires that the family name is
    /// exactly `family` (so "manylinuxfoo_2_5_x86_64" isn't taken for a manylinux
    /// tag).
    pub fn parse_family(tag: &str, family: &str) -> Result<PlatformTag> {
        let parsed: PlatformTag = tag.try_into()?;
        if parsed.platform != family {
            Err(BundleError::MalformedTag {
                platform: tag.into(),
            })?
        }
        Ok(parsed)
    }

    /// The same tag, with the minor version replaced.
    pub fn with_minor(&self, version_minor: u32) -> PlatformTag {
        PlatformTag {
            version_minor,
            ..self.clone()
        }
    }

    /// This tag followed by every older minor version of it, down to and including
    /// minor version 0.
    pub fn descending_minors(&self) -> impl Iterator<Item = PlatformTag> + '_ {
        (0..=self.version_minor)
            .rev()
            .map(move |minor| self.with_minor(minor))
    }
}

impl TryFrom<&str> for PlatformTag {
    type Error = eyre::Report;

    fn try_from(tag: &str) -> Result<Self, Self::Error> {
        let malformed = || BundleError::MalformedTag {
            platform: tag.into(),
        };
        let captures = PLATFORM_TAG_RE.captures(tag).ok_or_else(malformed)?;
        // unwraps safe because: all groups are mandatory in the regex
        let platform = captures.get(1).unwrap().as_str();
        // the regex guarantees digits, but they can still overflow a u32
        let version_major = captures
            .get(2)
            .unwrap()
            .as_str()
            .parse()
            .map_err(|_| malformed())?;
        let version_minor = captures
            .get(3)
            .unwrap()
            .as_str()
            .parse()
            .map_err(|_| malformed())?;
        if version_major > MAX_VERSION_COMPONENT || version_minor > MAX_VERSION_COMPONENT {
            Err(malformed())?
        }
        let arch = captures.get(4).unwrap().as_str();
        Ok(PlatformTag {
            platform: platform.into(),
            version_major,
            version_minor,
            arch: arch.into(),
        })
    }
}

str_conversions!(PlatformTag);

impl Display for PlatformTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.platform, self.version_major, self.version_minor, self.arch
        )
    }
}

/// Rewrites the OS part of a legacy manylinux tag (everything before the first
/// `_`) into its PEP 600 spelling, e.g. `manylinux2014_x86_64` ->
/// `manylinux_2_17_x86_64`. Other tags are returned unchanged.
pub fn normalize_legacy_manylinux_alias(tag: &str) -> Result<Cow<'_, str>> {
    let os_end = tag.find('_').ok_or_else(|| BundleError::MalformedTag {
        platform: tag.into(),
    })?;
    let (os, arch_suffix) = tag.split_at(os_end);
    match LEGACY_MANYLINUX_ALIASES
        .iter()
        .find(|(alias, _)| *alias == os)
    {
        Some((_, canonical)) => Ok(Cow::Owned(format!("{canonical}{arch_suffix}"))),
        None => Ok(Cow::Borrowed(tag)),
    }
}
