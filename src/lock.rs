use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::IgnoredAny;

use crate::prelude::*;
use crate::project::Project;

/// Where poetry found a package, when it wasn't a plain index lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PackageSource {
    Directory {
        url: String,
    },
    File {
        url: String,
    },
    Url {
        url: String,
    },
    Git {
        url: String,
        #[serde(default)]
        reference: Option<String>,
        #[serde(default)]
        resolved_reference: Option<String>,
        #[serde(default)]
        subdirectory: Option<String>,
    },
    /// A secondary package index
    Legacy {
        url: String,
        #[serde(default)]
        reference: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Markers {
    All(String),
    /// lock format 2.1+: group name -> marker
    PerGroup(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockedPackage {
    pub name: PackageName,
    pub version: String,
    #[serde(default)]
    groups: Vec<GroupName>,
    // lock formats before 2.1 only knew "main" and "dev"
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    pub markers: Option<Markers>,
    #[serde(default)]
    pub source: Option<PackageSource>,
    /// Installed in editable mode by poetry itself. Bundles never do that.
    #[serde(default)]
    pub develop: bool,
    // only the names matter
    #[serde(default)]
    dependencies: BTreeMap<String, IgnoredAny>,
}

impl LockedPackage {
    pub fn groups(&self) -> Result<Vec<GroupName>> {
        if !self.groups.is_empty() {
            return Ok(self.groups.clone());
        }
        match &self.category {
            Some(category) => Ok(vec![category.as_str().try_into()?]),
            None => Ok(vec![GroupName::main()]),
        }
    }

    /// `None` for `activated` means "the default groups", which always includes
    /// main.
    pub fn is_activated(&self, activated: Option<&HashSet<GroupName>>) -> Result<bool> {
        let groups = self.groups()?;
        Ok(match activated {
            Some(activated) => groups.iter().any(|g| activated.contains(g)),
            None => true,
        })
    }

    /// The environment marker guarding this package, given which groups pulled it in.
    /// `None` means install unconditionally.
    pub fn markers_for(&self, activated: Option<&HashSet<GroupName>>) -> Result<Option<String>> {
        let per_group = match &self.markers {
            None => return Ok(None),
            Some(Markers::All(marker)) => return Ok(Some(marker.clone())),
            Some(Markers::PerGroup(per_group)) => per_group,
        };
        let mut by_group = HashMap::new();
        for (group, marker) in per_group {
            by_group.insert(GroupName::try_from(group.as_str())?, marker.as_str());
        }

        let mut markers = Vec::new();
        for group in self.groups()? {
            if activated.map_or(false, |a| !a.contains(&group)) {
                continue;
            }
            match by_group.get(&group) {
                Some(marker) => markers.push(*marker),
                // some group wants it no matter what
                None => return Ok(None),
            }
        }
        Ok(match markers.as_slice() {
            [] => None,
            [marker] => Some(marker.to_string()),
            markers => Some(
                markers
                    .iter()
                    .map(|m| format!("({m})"))
                    .collect::<Vec<_>>()
                    .join(" or "),
            ),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lock {
    #[serde(default, rename = "package")]
    pub packages: Vec<LockedPackage>,
}

impl Lock {
    pub fn load(path: &Path) -> Result<Lock> {
        context!("reading {}", path.display());
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("couldn't read {}", path.display()))?;
        Lock::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Lock> {
        let doc = text.parse::<toml_edit::Document>()?;
        Ok(toml_edit::de::from_item(toml_edit::Item::Table(
            doc.as_table().clone(),
        ))?)
    }

    fn has_group_data(&self) -> bool {
        self.packages
            .iter()
            .any(|p| !p.groups.is_empty() || p.category.is_some())
    }

    /// Lock files written by poetry 1.5 through 1.8 (lock-version 2.0) don't say
    /// which groups need a package; poetry works it out from pyproject.toml each
    /// time. So do we: a package belongs to every group that depends on it, directly
    /// or through other locked packages. Packages nothing depends on are left in
    /// main.
    pub fn infer_groups(&mut self, project: &Project) -> Result<()> {
        if self.has_group_data() {
            return Ok(());
        }
        let mut index = HashMap::new();
        for (i, package) in self.packages.iter().enumerate() {
            index.insert(package.name.clone(), i);
        }
        let mut edges = Vec::new();
        for package in &self.packages {
            let mut targets = Vec::new();
            for name in package.dependencies.keys() {
                let name = PackageName::try_from(name.as_str())?;
                targets.extend(index.get(&name).copied());
            }
            edges.push(targets);
        }

        let mut memberships: Vec<Vec<GroupName>> = vec![Vec::new(); self.packages.len()];
        for group in &project.groups {
            let mut seen = vec![false; self.packages.len()];
            let mut stack: Vec<usize> = group
                .dependencies
                .iter()
                .filter_map(|name| index.get(name).copied())
                .collect();
            while let Some(i) = stack.pop() {
                if seen[i] {
                    continue;
                }
                seen[i] = true;
                memberships[i].push(group.name.clone());
                stack.extend(&edges[i]);
            }
        }

        for (package, groups) in self.packages.iter_mut().zip(memberships) {
            if groups.is_empty() {
                debug!("no group depends on {}", package.name);
            }
            package.groups = groups;
        }
        Ok(())
    }

    pub fn activated<'a>(
        &'a self,
        groups: Option<&HashSet<GroupName>>,
    ) -> Result<Vec<&'a LockedPackage>> {
        let mut packages = Vec::new();
        for package in &self.packages {
            if package.is_activated(groups)? {
                packages.push(package);
            }
        }
        Ok(packages)
    }
}
