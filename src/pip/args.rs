//! Command lines for `python -m pip ...`. Kept free of side effects so they can be
//! checked without a python around.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::env::{Env, InstallRequest};
use crate::lock::{LockedPackage, PackageSource};
use crate::prelude::*;
use crate::project::Project;

fn pip(subcommand: &str, quiet: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-m".into(), "pip".into(), subcommand.into()];
    args.push("--disable-pip-version-check".into());
    if quiet {
        args.push("--quiet".into());
    }
    args
}

fn compile_flag(request: &InstallRequest) -> OsString {
    if request.compile {
        "--compile".into()
    } else {
        "--no-compile".into()
    }
}

/// Installing into an environment for some other machine: pip can't run anything
/// it installs, so binaries only, straight into site-packages.
fn target_args(env: &Env, tags: &SupportedTags) -> Vec<OsString> {
    let (major, minor) = env.interpreter.python_version();
    let mut args: Vec<OsString> = vec![
        "--only-binary=:all:".into(),
        "--upgrade".into(),
        "--target".into(),
        env.purelib.clone().into(),
        "--implementation".into(),
        env.interpreter.short_name().into(),
        "--python-version".into(),
        format!("{major}.{minor}").into(),
    ];
    for platform in tags.platforms() {
        args.push("--platform".into());
        args.push(platform.into());
    }
    for abi in tags.abis() {
        args.push("--abi".into());
        args.push(abi.into());
    }
    args
}

/// Where a `directory` or `file` source lives. Relative paths in the lock file are
/// relative to the project root.
fn local_path(root: &Path, url: &str) -> Result<PathBuf> {
    let path = root.join(url);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

// e.g. file:///src/vendor/thing or file:///C:/src/vendor/thing
fn file_url(path: &Path) -> String {
    let path = path.display().to_string().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

/// How to ask pip for one locked package.
pub fn requirement(
    package: &LockedPackage,
    root: &Path,
    groups: &HashSet<GroupName>,
) -> Result<String> {
    let name = package.name.as_given();
    let spec = match &package.source {
        Some(PackageSource::Directory { url }) | Some(PackageSource::File { url }) => {
            format!("{name} @ {}", file_url(&local_path(root, url)?))
        }
        Some(PackageSource::Url { url }) => format!("{name} @ {url}"),
        Some(PackageSource::Git {
            url,
            reference,
            resolved_reference,
            subdirectory,
        }) => {
            let mut spec = format!("{name} @ git+{url}");
            if let Some(rev) = resolved_reference.as_ref().or(reference.as_ref()) {
                spec.push('@');
                spec.push_str(rev);
            }
            if let Some(subdirectory) = subdirectory {
                spec.push_str("#subdirectory=");
                spec.push_str(subdirectory);
            }
            spec
        }
        Some(PackageSource::Legacy { .. }) | Some(PackageSource::Other) | None => {
            format!("{name}=={}", package.version)
        }
    };
    Ok(match package.markers_for(Some(groups))? {
        Some(markers) => format!("{spec} ; {markers}"),
        None => spec,
    })
}

pub fn install_locked(
    env: &Env,
    project: &Project,
    packages: &[&LockedPackage],
    groups: &HashSet<GroupName>,
    request: &InstallRequest,
    quiet: bool,
) -> Result<Vec<OsString>> {
    let mut args = pip("install", quiet);
    args.push("--no-deps".into());
    args.push(compile_flag(request));
    if let Some(tags) = &env.supported_tags {
        args.extend(target_args(env, tags));
    }

    let indexes: IndexSet<&str> = packages
        .iter()
        .filter_map(|package| match &package.source {
            Some(PackageSource::Legacy { url, .. }) => Some(url.as_str()),
            _ => None,
        })
        .collect();
    for index in indexes {
        args.push("--extra-index-url".into());
        args.push(index.into());
    }

    for package in packages {
        if request.develop && package.develop {
            // pip only takes a bare path for editable installs, so no markers
            if let Some(PackageSource::Directory { url }) = &package.source {
                args.push("--editable".into());
                args.push(local_path(&project.root, url)?.into());
                continue;
            }
        }
        args.push(requirement(package, &project.root, groups)?.into());
    }
    Ok(args)
}

pub fn build_wheel(project: &Project, wheel_dir: &Path, quiet: bool) -> Vec<OsString> {
    let mut args = pip("wheel", quiet);
    args.extend([
        "--no-deps".into(),
        "--wheel-dir".into(),
        wheel_dir.into(),
        project.root.clone().into(),
    ]);
    args
}

pub fn install_wheel(
    env: &Env,
    wheel: &Path,
    request: &InstallRequest,
    quiet: bool,
) -> Vec<OsString> {
    let mut args = pip("install", quiet);
    args.push("--no-deps".into());
    args.push(compile_flag(request));
    if let Some(tags) = &env.supported_tags {
        args.extend(target_args(env, tags));
    } else {
        // the version often hasn't changed since the last bundle
        args.push("--force-reinstall".into());
    }
    args.push(wheel.into());
    args
}

pub fn list_installed() -> Vec<OsString> {
    let mut args = pip("list", false);
    args.push("--format=json".into());
    args
}

pub fn uninstall(names: &[PackageName], quiet: bool) -> Vec<OsString> {
    let mut args = pip("uninstall", quiet);
    args.push("--yes".into());
    args.extend(names.iter().map(|name| name.as_given().into()));
    args
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lock::Lock;
    use crate::test_util::simple_project;
    use indoc::indoc;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn env() -> Env {
        Env {
            path: "/bundle".into(),
            python: "/bundle/bin/python".into(),
            interpreter: Interpreter::new("cpython", (3, 12, 1)),
            purelib: "/bundle/lib/python3.12/site-packages".into(),
            supported_tags: None,
        }
    }

    fn main_only() -> HashSet<GroupName> {
        HashSet::from([GroupName::main()])
    }

    const LOCK: &str = indoc! {r#"
        [[package]]
        name = "Django"
        version = "5.0.3"
        groups = ["main"]

        [[package]]
        name = "tzdata"
        version = "2024.1"
        groups = ["main"]
        markers = "sys_platform == \"win32\""

        [[package]]
        name = "internal-lib"
        version = "0.3.0"
        groups = ["main"]

        [package.source]
        type = "legacy"
        url = "https://pypi.example.com/simple"
        reference = "internal"

        [[package]]
        name = "vendored"
        version = "1.0.0"
        groups = ["main"]
        develop = true

        [package.source]
        type = "directory"
        url = "vendor/vendored"

        [[package]]
        name = "requests"
        version = "2.31.0"
        groups = ["main"]

        [package.source]
        type = "git"
        url = "https://github.com/psf/requests.git"
        reference = "main"
        resolved_reference = "147c8511ddbfa5e8f71bbf5c18ede0c4ceb3bba4"

        [[package]]
        name = "wheelie"
        version = "0.1"
        groups = ["main"]

        [package.source]
        type = "url"
        url = "https://example.com/wheelie-0.1-py3-none-any.whl"
    "#};

    #[test]
    fn test_install_locked_args() {
        let lock = Lock::parse(LOCK).unwrap();
        let packages: Vec<&LockedPackage> = lock.packages.iter().collect();
        let request = InstallRequest {
            groups: None,
            compile: false,
            develop: false,
        };
        let args = install_locked(
            &env(),
            &simple_project(),
            &packages,
            &main_only(),
            &request,
            true,
        )
        .unwrap();
        insta::assert_ron_snapshot!(strings(args), @r###"
        [
          "-m",
          "pip",
          "install",
          "--disable-pip-version-check",
          "--quiet",
          "--no-deps",
          "--no-compile",
          "--extra-index-url",
          "https://pypi.example.com/simple",
          "Django==5.0.3",
          "tzdata==2024.1 ; sys_platform == \"win32\"",
          "internal-lib==0.3.0",
          "vendored @ file:///src/simple-project/vendor/vendored",
          "requests @ git+https://github.com/psf/requests.git@147c8511ddbfa5e8f71bbf5c18ede0c4ceb3bba4",
          "wheelie @ https://example.com/wheelie-0.1-py3-none-any.whl",
        ]
        "###);
    }

    #[test]
    fn test_install_locked_develop() {
        let lock = Lock::parse(LOCK).unwrap();
        let packages: Vec<&LockedPackage> = lock.packages.iter().collect();
        let request = InstallRequest {
            groups: None,
            compile: true,
            develop: true,
        };
        let args = strings(
            install_locked(
                &env(),
                &simple_project(),
                &packages,
                &main_only(),
                &request,
                false,
            )
            .unwrap(),
        );
        assert!(args.contains(&"--compile".to_string()));
        assert!(!args.contains(&"--quiet".to_string()));
        let editable = args.iter().position(|a| a == "--editable").unwrap();
        assert_eq!(args[editable + 1], "/src/simple-project/vendor/vendored");
        assert_eq!(args.iter().filter(|a| *a == "--editable").count(), 1);
    }

    #[test]
    fn test_target_args() {
        let mut env = env();
        env.target_platform("manylinux_2_5_x86_64").unwrap();
        let wheel = Path::new("/tmp/simple_project-1.2.3-py3-none-any.whl");
        let request = InstallRequest::default();
        insta::assert_ron_snapshot!(strings(install_wheel(&env, wheel, &request, true)), @r###"
        [
          "-m",
          "pip",
          "install",
          "--disable-pip-version-check",
          "--quiet",
          "--no-deps",
          "--no-compile",
          "--only-binary=:all:",
          "--upgrade",
          "--target",
          "/bundle/lib/python3.12/site-packages",
          "--implementation",
          "cp",
          "--python-version",
          "3.12",
          "--platform",
          "manylinux_2_5_x86_64",
          "--platform",
          "manylinux1_x86_64",
          "--platform",
          "manylinux_2_4_x86_64",
          "--platform",
          "manylinux_2_3_x86_64",
          "--platform",
          "manylinux_2_2_x86_64",
          "--platform",
          "manylinux_2_1_x86_64",
          "--platform",
          "manylinux_2_0_x86_64",
          "--abi",
          "cp312",
          "--abi",
          "abi3",
          "--abi",
          "none",
          "/tmp/simple_project-1.2.3-py3-none-any.whl",
        ]
        "###);
    }

    #[test]
    fn test_requirement_markers_follow_groups() {
        let lock = Lock::parse(indoc! {r#"
            [[package]]
            name = "colorama"
            version = "0.4.6"
            groups = ["main", "dev"]
            markers = {main = "platform_system == \"Windows\"", dev = "sys_platform == \"win32\""}
        "#})
        .unwrap();
        let dev = HashSet::from(["dev".parse::<GroupName>().unwrap()]);
        assert_eq!(
            requirement(&lock.packages[0], Path::new("."), &dev).unwrap(),
            r#"colorama==0.4.6 ; sys_platform == "win32""#
        );
    }

    #[test]
    fn test_local_requirements_keep_markers() {
        let lock = Lock::parse(indoc! {r#"
            [[package]]
            name = "winonly"
            version = "0.1.0"
            groups = ["main"]
            markers = "sys_platform == \"win32\""

            [package.source]
            type = "directory"
            url = "vendor/winonly"

            [[package]]
            name = "archive"
            version = "2.0"
            groups = ["main"]

            [package.source]
            type = "file"
            url = "/srv/dist/archive-2.0.tar.gz"
        "#})
        .unwrap();
        let root = Path::new("/src/p");
        assert_eq!(
            requirement(&lock.packages[0], root, &main_only()).unwrap(),
            r#"winonly @ file:///src/p/vendor/winonly ; sys_platform == "win32""#
        );
        assert_eq!(
            requirement(&lock.packages[1], root, &main_only()).unwrap(),
            "archive @ file:///srv/dist/archive-2.0.tar.gz"
        );
    }

    #[test]
    fn test_other_commands() {
        let project = simple_project();
        assert_eq!(
            strings(build_wheel(&project, Path::new("/tmp/wheels"), false)),
            [
                "-m",
                "pip",
                "wheel",
                "--disable-pip-version-check",
                "--no-deps",
                "--wheel-dir",
                "/tmp/wheels",
                "/src/simple-project",
            ]
        );
        let names = ["Six".parse().unwrap(), "attrs".parse().unwrap()];
        assert_eq!(
            strings(uninstall(&names, true)),
            [
                "-m",
                "pip",
                "uninstall",
                "--disable-pip-version-check",
                "--quiet",
                "--yes",
                "Six",
                "attrs",
            ]
        );
        assert_eq!(
            strings(install_wheel(
                &env(),
                Path::new("/tmp/x-1-py3-none-any.whl"),
                &InstallRequest::default(),
                false
            ))[4..],
            [
                "--no-deps",
                "--no-compile",
                "--force-reinstall",
                "/tmp/x-1-py3-none-any.whl"
            ]
        );
    }
}
