use crate::prelude::*;

// https://packaging.python.org/specifications/binary-distribution-format/#file-name-convention
//
// We only ever look at wheels we just built, to check that they fit the bundle's
// target platform, so the version and build tag are kept as opaque strings.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WheelName {
    pub distribution: PackageName,
    pub version: String,
    pub build_tag: Option<String>,
    // Compressed tag sets, e.g. "manylinux_2_17_x86_64.manylinux2014_x86_64" becomes
    // two arch tags.
    pub py_tags: Vec<String>,
    pub abi_tags: Vec<String>,
    pub arch_tags: Vec<String>,
}

impl WheelName {
    pub fn all_tags(&self) -> HashSet<String> {
        let mut retval = HashSet::new();
        for py in &self.py_tags {
            for abi in &self.abi_tags {
                for arch in &self.arch_tags {
                    retval.insert(format!("{}-{}-{}", py, abi, arch));
                }
            }
        }
        retval
    }
}

impl TryFrom<&str> for WheelName {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Rules out real ridiculous stuff, like spaces or control characters.
        static VALID_CHARS: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.+!-]*$").unwrap());

        if !VALID_CHARS.is_match(value) {
            bail!("Invalid characters in wheel name {:?}", value);
        }
        let stem = value
            .strip_suffix(".whl")
            .ok_or_else(|| eyre!("expected {:?} to end in .whl", value))?;

        let mut pieces: Vec<&str> = stem.split('-').collect();
        let build_tag = match pieces.len() {
            6 => Some(pieces.remove(2).to_owned()),
            5 => None,
            _ => bail!("can't parse wheel name {:?}", value),
        };

        fn split_compressed(tag: &str) -> Vec<String> {
            tag.split('.').map(|p| p.into()).collect()
        }

        Ok(WheelName {
            distribution: pieces[0].try_into()?,
            version: pieces[1].into(),
            build_tag,
            py_tags: split_compressed(pieces[2]),
            abi_tags: split_compressed(pieces[3]),
            arch_tags: split_compressed(pieces[4]),
        })
    }
}

str_conversions!(WheelName);

impl Display for WheelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.distribution, self.version)?;
        if let Some(build_tag) = &self.build_tag {
            write!(f, "-{}", build_tag)?;
        }
        write!(
            f,
            "-{}-{}-{}.whl",
            self.py_tags.join("."),
            self.abi_tags.join("."),
            self.arch_tags.join(".")
        )
    }
}
