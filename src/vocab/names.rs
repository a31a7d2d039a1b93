use crate::prelude::*;

// https://peps.python.org/pep-0503/#normalized-names
static NAME_NORMALIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_.]+").unwrap());

fn normalize(name: &str) -> String {
    let mut normalized = NAME_NORMALIZE.replace_all(name, "-").to_string();
    normalized.make_ascii_lowercase();
    normalized
}

/// A distribution name, as it appears in pyproject.toml, poetry.lock, wheel
/// filenames, `pip list`... Compares by its normalized form.
#[derive(Debug, Clone, DeserializeFromStr, Derivative)]
#[derivative(Hash, PartialEq, Eq)]
pub struct PackageName {
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    as_given: String,
    normalized: String,
}

impl PackageName {
    pub fn as_given(&self) -> &str {
        &self.as_given
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl TryFrom<&str> for PackageName {
    type Error = eyre::Report;

    fn try_from(as_given: &str) -> Result<Self, Self::Error> {
        // https://packaging.python.org/specifications/core-metadata/#name
        static NAME_VALIDATE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i-u)^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$").unwrap()
        });

        if !NAME_VALIDATE.is_match(as_given) {
            bail!("Invalid package name {:?}", as_given);
        }
        Ok(PackageName {
            as_given: as_given.to_owned(),
            normalized: normalize(as_given),
        })
    }
}

str_conversions!(PackageName);

impl Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_given)
    }
}

// Dependency group names follow the same rules as package names, as far as poetry is
// concerned: "Dev", "dev" and "DEV" are all the same group.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Deserialize)]
pub struct GroupName(PackageName);

impl GroupName {
    pub const MAIN: &'static str = "main";

    pub fn main() -> GroupName {
        // unwrap safe because: it's a valid name
        GroupName::MAIN.try_into().unwrap()
    }

    pub fn as_given(&self) -> &str {
        self.0.as_given()
    }

    pub fn normalized(&self) -> &str {
        self.0.normalized()
    }

    /// Parse a comma-separated list like "dev, docs", as accepted by `--with` and
    /// friends. Blank entries are skipped.
    pub fn parse_list(list: &str) -> Result<Vec<GroupName>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(GroupName::try_from)
            .collect()
    }
}

impl TryFrom<&str> for GroupName {
    type Error = eyre::Report;

    fn try_from(s: &str) -> Result<Self> {
        let name: PackageName = s
            .try_into()
            .wrap_err_with(|| format!("Invalid dependency group name {:?}", s))?;
        Ok(GroupName(name))
    }
}

str_conversions!(GroupName);

impl Display for GroupName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.normalized())
    }
}
