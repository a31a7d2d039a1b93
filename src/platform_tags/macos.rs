// Which macOS platform tags can run on a machine with the given OS version and
// architecture.
//
// There are two eras. Up through 10.15, every yearly release bumped the minor version
// and the major stayed at 10. Starting with 11, the yearly release bumps the major and
// the minor is for midyear updates, which never change the ABI -- so wheels are only
// ever tagged as X_0. (10.16 is what 11.0 reports itself as to old binaries.)
//
// Within a version, the "binary format" decides which fat/universal binaries contain
// a slice we can load:
// https://docs.python.org/3/distutils/apiref.html#distutils.util.get_platform

fn binary_formats(version: (u32, u32), arch: &str) -> Vec<&str> {
    let mut formats = vec![arch];
    match arch {
        "x86_64" => {
            if version < (10, 4) {
                return vec![];
            }
            formats.extend(["intel", "fat64", "fat32"]);
        }
        "i386" => {
            if version < (10, 4) {
                return vec![];
            }
            formats.extend(["intel", "fat32", "fat"]);
        }
        "ppc64" => {
            if version > (10, 5) || version < (10, 4) {
                return vec![];
            }
            formats.push("fat64");
        }
        "ppc" => {
            if version > (10, 6) {
                return vec![];
            }
            formats.extend(["fat32", "fat"]);
        }
        _ => (),
    }

    if matches!(arch, "arm64" | "x86_64") {
        formats.push("universal2");
    }
    if matches!(arch, "x86_64" | "i386" | "ppc64" | "ppc" | "intel") {
        formats.push("universal");
    }
    formats
}

fn push_formats(tags: &mut Vec<String>, (major, minor): (u32, u32), arch: &str) {
    for format in binary_formats((major, minor), arch) {
        tags.push(format!("macosx_{major}_{minor}_{format}"));
    }
}

/// All platform tags for binaries that can run on macOS `version` with CPU `arch`,
/// newest first. `arch` isn't validated; unknown values just match themselves.
pub fn mac_platforms(version: (u32, u32), arch: &str) -> Vec<String> {
    let mut tags = Vec::new();

    if (10, 0) <= version && version < (11, 0) {
        for minor in (0..=version.1).rev() {
            push_formats(&mut tags, (10, minor), arch);
        }
    }

    if version >= (11, 0) {
        for major in (11..=version.0).rev() {
            push_formats(&mut tags, (major, 0), arch);
        }

        // x86-64 on 11+ can still run everything built for earlier releases. arm64
        // didn't exist before 11.0, but a universal2 binary can claim an older
        // version when its x86-64 half supports it.
        for minor in (4..=16).rev() {
            if arch == "x86_64" {
                push_formats(&mut tags, (10, minor), arch);
            } else {
                tags.push(format!("macosx_10_{minor}_universal2"));
            }
        }
    }

    tags
}
