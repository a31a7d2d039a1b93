use std::collections::{BTreeMap, BTreeSet};

use clap::Args;

use crate::prelude::*;
use crate::project::Project;

#[derive(Args, Debug, Default, Clone)]
pub struct GroupArgs {
    /// The optional dependency groups to include
    #[arg(long = "with", value_name = "GROUPS")]
    with: Vec<String>,
    /// The dependency groups to ignore
    #[arg(long, value_name = "GROUPS")]
    without: Vec<String>,
    /// The only dependency groups to include
    #[arg(long, value_name = "GROUPS")]
    only: Vec<String>,
}

fn parse_all(values: &[String]) -> Result<HashSet<GroupName>> {
    let mut groups = HashSet::new();
    for value in values {
        groups.extend(GroupName::parse_list(value)?);
    }
    Ok(groups)
}

impl GroupArgs {
    #[cfg(test)]
    pub fn new(with: &[&str], without: &[&str], only: &[&str]) -> GroupArgs {
        let owned =
            |values: &[&str]| -> Vec<String> { values.iter().map(|v| v.to_string()).collect() };
        GroupArgs {
            with: owned(with),
            without: owned(without),
            only: owned(only),
        }
    }

    /// Which of the project's groups get installed into the bundle.
    pub fn activated_groups(&self, project: &Project) -> Result<HashSet<GroupName>> {
        let with = parse_all(&self.with)?;
        let without = parse_all(&self.without)?;
        let only = parse_all(&self.only)?;

        let mut missing: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (option, groups) in [("--with", &with), ("--without", &without), ("--only", &only)] {
            for group in groups {
                if !project.has_group(group) {
                    missing.entry(group.normalized()).or_default().insert(option);
                }
            }
        }
        if !missing.is_empty() {
            let described: Vec<String> = missing
                .iter()
                .map(|(group, options)| {
                    let options: Vec<&str> = options.iter().copied().collect();
                    format!("{group} (via {})", options.join(", "))
                })
                .collect();
            Err(BundleError::GroupNotFound(described.join(", ")))?;
        }

        if !only.is_empty() {
            if !with.is_empty() || !without.is_empty() {
                warn!(
                    "The `--with` and `--without` options are ignored when used along with \
                     the `--only` option."
                );
            }
            return Ok(only);
        }

        let mut groups = project.non_optional_groups();
        groups.extend(with);
        groups.retain(|g| !without.contains(g));
        debug!(
            "activated groups: {:?}",
            groups.iter().map(|g| g.normalized()).collect::<BTreeSet<_>>()
        );
        Ok(groups)
    }
}
