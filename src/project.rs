use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub name: GroupName,
    pub optional: bool,
    /// Direct dependencies, as declared (not including `python`).
    pub dependencies: Vec<PackageName>,
}

/// The project being bundled: whatever we need out of its pyproject.toml.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub name: PackageName,
    /// As written, e.g. "1.2.3" (not normalized, since it's only shown to people)
    pub version: String,
    /// Always starts with the implicit "main" group.
    pub groups: Vec<DependencyGroup>,
    /// False for poetry's `package-mode = false`, where there's no root package to
    /// build.
    pub package_mode: bool,
}

// Only the keys matter: which packages a table depends on, not how.
type DependencyTable = BTreeMap<String, IgnoredAny>;

/// `[tool.poetry]`
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", default)]
struct PoetryStanza {
    name: Option<String>,
    version: Option<String>,
    package_mode: Option<bool>,
    dependencies: DependencyTable,
    group: BTreeMap<String, GroupStanza>,
    // pre-1.2 spelling of the "dev" group
    dev_dependencies: Option<DependencyTable>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct GroupStanza {
    // unset when this table only spells out some other part of the group
    optional: Option<bool>,
    dependencies: DependencyTable,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ToolStanza {
    poetry: Option<PoetryStanza>,
}

/// `[project]`, see PEP 621
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ProjectStanza {
    name: Option<String>,
    version: Option<String>,
    /// PEP 508 requirement strings
    dependencies: Vec<String>,
}

static REQUIREMENT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)^\s*([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)").unwrap()
});

fn requirement_name(requirement: &str) -> Result<PackageName> {
    let captures = REQUIREMENT_NAME_RE
        .captures(requirement)
        .ok_or_else(|| eyre!("can't find a package name in requirement {requirement:?}"))?;
    // unwrap safe because: the group is mandatory in the regex
    captures.get(1).unwrap().as_str().try_into()
}

fn table_dependencies(table: &DependencyTable) -> Result<Vec<PackageName>> {
    let mut names = Vec::new();
    for key in table.keys() {
        if key != "python" {
            names.push(key.as_str().try_into()?);
        }
    }
    Ok(names)
}

impl Project {
    pub fn load(root: &Path) -> Result<Project> {
        let pyproject_path = root.join("pyproject.toml");
        context!("reading {}", pyproject_path.display());
        let text = fs::read_to_string(&pyproject_path)
            .wrap_err_with(|| format!("couldn't read {}", pyproject_path.display()))?;
        Project::parse(root, &text)
    }

    pub fn parse(root: &Path, pyproject: &str) -> Result<Project> {
        let mut doc = pyproject.parse::<toml_edit::Document>()?;
        let poetry = match doc.remove("tool") {
            Some(tool) => toml_edit::de::from_item::<ToolStanza>(tool)?
                .poetry
                .unwrap_or_default(),
            None => Default::default(),
        };
        let project: ProjectStanza = match doc.remove("project") {
            Some(table) => toml_edit::de::from_item(table)?,
            None => Default::default(),
        };

        let name = poetry
            .name
            .or(project.name)
            .ok_or_else(|| eyre!("pyproject.toml doesn't declare a project name"))?;
        let version = poetry
            .version
            .or(project.version)
            .ok_or_else(|| eyre!("pyproject.toml doesn't declare a project version"))?;

        let mut main_dependencies = table_dependencies(&poetry.dependencies)?;
        for requirement in &project.dependencies {
            main_dependencies.push(requirement_name(requirement)?);
        }
        let mut groups = vec![DependencyGroup {
            name: GroupName::main(),
            optional: false,
            dependencies: main_dependencies,
        }];
        if let Some(dev_dependencies) = &poetry.dev_dependencies {
            groups.push(DependencyGroup {
                name: "dev".try_into()?,
                optional: false,
                dependencies: table_dependencies(dev_dependencies)?,
            });
        }
        for (name, stanza) in poetry.group {
            let name: GroupName = name.try_into()?;
            let dependencies = table_dependencies(&stanza.dependencies)?;
            if let Some(existing) = groups.iter_mut().find(|g| g.name == name) {
                if let Some(optional) = stanza.optional {
                    existing.optional = optional;
                }
                existing.dependencies.extend(dependencies);
            } else {
                groups.push(DependencyGroup {
                    name,
                    optional: stanza.optional.unwrap_or(false),
                    dependencies,
                });
            }
        }

        Ok(Project {
            root: root.to_path_buf(),
            name: name.as_str().try_into()?,
            version,
            groups,
            package_mode: poetry.package_mode.unwrap_or(true),
        })
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("poetry.lock")
    }

    pub fn has_group(&self, name: &GroupName) -> bool {
        self.groups.iter().any(|g| &g.name == name)
    }

    pub fn non_optional_groups(&self) -> HashSet<GroupName> {
        self.groups
            .iter()
            .filter(|g| !g.optional)
            .map(|g| g.name.clone())
            .collect()
    }
}
