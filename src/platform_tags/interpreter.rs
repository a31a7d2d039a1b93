//! Interpreter/ABI tag enumeration, following the platform compatibility tags spec:
//!
//!   https://packaging.python.org/en/latest/specifications/platform-compatibility-tags/
//!
//! Everything here is parameterized by an explicit target interpreter, never the one
//! we happen to be running next to.

use crate::prelude::*;

/// The interpreter a bundle is being built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// `sys.implementation.name`, lowercased (e.g. "cpython", "pypy")
    pub implementation: String,
    pub version: (u32, u32, u32),
}

impl Interpreter {
    pub fn new(implementation: &str, version: (u32, u32, u32)) -> Interpreter {
        Interpreter {
            implementation: implementation.to_ascii_lowercase(),
            version,
        }
    }

    /// The abbreviation used in tags, e.g. "cp" for CPython. Implementations without
    /// a registered abbreviation use their full name.
    pub fn short_name(&self) -> &str {
        match self.implementation.as_str() {
            "python" => "py",
            "cpython" => "cp",
            "pypy" => "pp",
            "ironpython" => "ip",
            "jython" => "jy",
            other => other,
        }
    }

    pub fn is_cpython(&self) -> bool {
        self.short_name() == "cp"
    }

    pub fn python_version(&self) -> (u32, u32) {
        (self.version.0, self.version.1)
    }

    /// e.g. "cp312"
    pub fn interpreter_tag(&self) -> String {
        let (major, minor) = self.python_version();
        format!("{}{}{}", self.short_name(), major, minor)
    }
}

impl Display for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (major, minor, patch) = self.version;
        write!(f, "{} {}.{}.{}", self.implementation, major, minor, patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub interpreter: String,
    pub abi: String,
    pub platform: String,
}

impl Tag {
    fn new(interpreter: &str, abi: &str, platform: &str) -> Tag {
        Tag {
            interpreter: interpreter.into(),
            abi: abi.into(),
            platform: platform.into(),
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

// We can't ask the target interpreter about its build flags, so assume the stock
// configuration: pymalloc before 3.8 (where the "m" suffix went away), and wide
// unicode before 3.3 (where PEP 393 made the "u" suffix meaningless).
fn cpython_abis((major, minor): (u32, u32)) -> Vec<String> {
    if (major, minor) < (3, 3) {
        vec![format!("cp{major}{minor}mu")]
    } else if (major, minor) < (3, 8) {
        vec![format!("cp{major}{minor}m")]
    } else {
        vec![format!("cp{major}{minor}")]
    }
}

/// Tags for CPython, most specific first: the exact ABI, then the stable ABI, then no
/// ABI at all, then the stable ABI of every older 3.x release that had one.
pub fn cpython_tags(python_version: (u32, u32), platforms: &[String]) -> Vec<Tag> {
    let (major, minor) = python_version;
    let interpreter = format!("cp{major}{minor}");
    let mut tags = Vec::new();

    for abi in cpython_abis(python_version) {
        for platform in platforms {
            tags.push(Tag::new(&interpreter, &abi, platform));
        }
    }
    let use_abi3 = python_version >= (3, 2);
    if use_abi3 {
        for platform in platforms {
            tags.push(Tag::new(&interpreter, "abi3", platform));
        }
    }
    for platform in platforms {
        tags.push(Tag::new(&interpreter, "none", platform));
    }
    if use_abi3 {
        for older_minor in (2..minor).rev() {
            let interpreter = format!("cp{major}{older_minor}");
            for platform in platforms {
                tags.push(Tag::new(&interpreter, "abi3", platform));
            }
        }
    }
    tags
}

/// Tags for any interpreter that doesn't get special treatment. "none" is always
/// included as the last abi.
pub fn generic_tags(interpreter: &str, abis: &[&str], platforms: &[String]) -> Vec<Tag> {
    let mut abis = abis.to_vec();
    if !abis.contains(&"none") {
        abis.push("none");
    }
    let mut tags = Vec::new();
    for abi in abis {
        for platform in platforms {
            tags.push(Tag::new(interpreter, abi, platform));
        }
    }
    tags
}

// py312, py3, py311, py310, ..., py30
fn py_interpreter_range((major, minor): (u32, u32)) -> Vec<String> {
    let mut versions = vec![format!("py{major}{minor}"), format!("py{major}")];
    versions.extend((0..minor).rev().map(|older| format!("py{major}{older}")));
    versions
}

/// The interpreter-independent fallbacks: pure-python-but-platform-specific tags,
/// then the interpreter's own "none-any", then universal pure-python tags.
pub fn compatible_tags(
    python_version: (u32, u32),
    interpreter: Option<&str>,
    platforms: &[String],
) -> Vec<Tag> {
    let versions = py_interpreter_range(python_version);
    let mut tags = Vec::new();
    for version in &versions {
        for platform in platforms {
            tags.push(Tag::new(version, "none", platform));
        }
    }
    if let Some(interpreter) = interpreter {
        tags.push(Tag::new(interpreter, "none", "any"));
    }
    for version in &versions {
        tags.push(Tag::new(version, "none", "any"));
    }
    tags
}

#[cfg(test)]
mod test {
    use super::*;

    fn strings(tags: Vec<Tag>) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_interpreter_names() {
        let cp = Interpreter::new("CPython", (3, 12, 1));
        assert_eq!(cp.implementation, "cpython");
        assert_eq!(cp.short_name(), "cp");
        assert!(cp.is_cpython());
        assert_eq!(cp.interpreter_tag(), "cp312");
        assert_eq!(cp.to_string(), "cpython 3.12.1");

        let pp = Interpreter::new("pypy", (3, 10, 14));
        assert_eq!(pp.interpreter_tag(), "pp310");
        assert!(!pp.is_cpython());

        let graal = Interpreter::new("graalpy", (3, 11, 0));
        assert_eq!(graal.interpreter_tag(), "graalpy311");
    }

    #[test]
    fn test_cpython_tags() {
        let platforms = vec!["plat1".to_string(), "plat2".to_string()];
        insta::assert_ron_snapshot!(strings(cpython_tags((3, 4), &platforms)), @r###"
        [
          "cp34-cp34m-plat1",
          "cp34-cp34m-plat2",
          "cp34-abi3-plat1",
          "cp34-abi3-plat2",
          "cp34-none-plat1",
          "cp34-none-plat2",
          "cp33-abi3-plat1",
          "cp33-abi3-plat2",
          "cp32-abi3-plat1",
          "cp32-abi3-plat2",
        ]
        "###);
    }

    #[test]
    fn test_cpython_abis() {
        assert_eq!(cpython_abis((2, 7)), vec!["cp27mu"]);
        assert_eq!(cpython_abis((3, 7)), vec!["cp37m"]);
        assert_eq!(cpython_abis((3, 13)), vec!["cp313"]);
    }

    #[test]
    fn test_no_abi3_before_3_2() {
        let tags = strings(cpython_tags((2, 7), &["linux".to_string()]));
        assert_eq!(tags, vec!["cp27-cp27mu-linux", "cp27-none-linux"]);
    }

    #[test]
    fn test_generic_tags() {
        let platforms = vec!["plat".to_string()];
        assert_eq!(
            strings(generic_tags("pp310", &[], &platforms)),
            vec!["pp310-none-plat"]
        );
        assert_eq!(
            strings(generic_tags("pp310", &["pypy310_pp73"], &platforms)),
            vec!["pp310-pypy310_pp73-plat", "pp310-none-plat"]
        );
        assert_eq!(
            strings(generic_tags("pp310", &["none", "x"], &platforms)),
            vec!["pp310-none-plat", "pp310-x-plat"]
        );
    }

    #[test]
    fn test_compatible_tags() {
        let platforms = vec!["plat".to_string()];
        insta::assert_ron_snapshot!(strings(compatible_tags((3, 2), Some("cp32"), &platforms)), @r###"
        [
          "py32-none-plat",
          "py3-none-plat",
          "py31-none-plat",
          "py30-none-plat",
          "cp32-none-any",
          "py32-none-any",
          "py3-none-any",
          "py31-none-any",
          "py30-none-any",
        ]
        "###);

        assert!(!strings(compatible_tags((3, 2), None, &platforms))
            .contains(&"cp32-none-any".to_string()));
    }
}
