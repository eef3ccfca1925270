//! Layout of the distribution tree.
//!
//! ```text
//! <output>/
//! ├── index.html                         # browsable root page
//! ├── firmware/
//! │   ├── index.json                     # release-wide index
//! │   └── <chip>/<channel>/
//! │       ├── <chip>-<version>.bin
//! │       └── manifest.json
//! └── releases/
//!     └── <chip>-<version>.zip           # optional flashing bundle
//! ```

use otapack_schema::MANIFEST_FILE;
use std::path::{Component, Path, PathBuf};

/// Default location of compiled per-environment builds.
pub const DEFAULT_BUILD_ROOT: &str = ".pio/build";

/// Default destination root.
pub const DEFAULT_OUTPUT: &str = "dist";

/// File name of a compiled binary inside `<build-root>/<env>/`.
pub const FIRMWARE_BIN: &str = "firmware.bin";

/// Compiled binary for a build environment: `<build-root>/<env>/firmware.bin`
pub fn source_binary(build_root: &Path, env: &str) -> PathBuf {
    build_root.join(env).join(FIRMWARE_BIN)
}

/// Pre-built flashing archive for a build environment: `<dir>/<env>.zip`
pub fn source_archive(archive_dir: &Path, env: &str) -> PathBuf {
    archive_dir.join(format!("{env}.zip"))
}

/// Firmware tree: `<output>/firmware`
pub fn firmware_dir(output: &Path) -> PathBuf {
    output.join("firmware")
}

/// Channel directory: `<output>/firmware/<chip>/<channel>`
pub fn channel_dir(output: &Path, chip: &str, channel: &str) -> PathBuf {
    firmware_dir(output).join(chip).join(channel)
}

/// Manifest path inside a channel directory.
pub fn manifest_path(output: &Path, chip: &str, channel: &str) -> PathBuf {
    channel_dir(output, chip, channel).join(MANIFEST_FILE)
}

/// Archive directory: `<output>/releases`
pub fn releases_dir(output: &Path) -> PathBuf {
    output.join("releases")
}

/// Release index: `<output>/firmware/index.json`
pub fn index_path(output: &Path) -> PathBuf {
    firmware_dir(output).join("index.json")
}

/// Root page: `<output>/index.html`
pub fn root_index_path(output: &Path) -> PathBuf {
    output.join("index.html")
}

/// Published binary name. Same chip and version always map to the same name.
pub fn binary_name(chip: &str, version: &str) -> String {
    format!("{chip}-{version}.bin")
}

/// Published archive name.
pub fn archive_name(chip: &str, version: &str) -> String {
    format!("{chip}-{version}.zip")
}

/// Express `path` relative to `root` with `/` separators.
///
/// Falls back to the full path (still `/`-joined) when `path` is not under
/// `root`.
pub fn relative_posix(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_layout() {
        let out = Path::new("dist");
        assert_eq!(
            manifest_path(out, "esp32s2", "beta"),
            Path::new("dist/firmware/esp32s2/beta/manifest.json")
        );
        assert_eq!(
            source_binary(Path::new(".pio/build"), "esp32"),
            Path::new(".pio/build/esp32/firmware.bin")
        );
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("dist");
        let path = channel_dir(root, "esp32", "stable").join(binary_name("esp32", "v1.0"));
        assert_eq!(
            relative_posix(root, &path),
            "firmware/esp32/stable/esp32-v1.0.bin"
        );
    }
}
