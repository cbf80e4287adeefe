//! Naming conventions used to identify package boundaries.
//!
//! Installed packages are recognized purely by directory and file names:
//!
//! - A top-level directory ending in [`METADATA_SUFFIX`] is a package's
//!   metadata directory; its name is the package id.
//! - The manifest inside it is always named [`MANIFEST_NAME`].
//! - The "base name" of a wheel file or metadata directory is everything
//!   before the first `-`. A name without any `-` is its own base name, and
//!   names with several dashes are cut at the first one only, so
//!   `foo-1.0-py3-none-any.whl` has the base name `foo`.
//! - Some wheels ship native libraries in `<base>.libs` without listing them
//!   in the manifest; [`libs_dir_name`] derives that name.

/// Suffix marking a package metadata directory (`*.dist-info`, `*.egg-info`).
pub const METADATA_SUFFIX: &str = "-info";

/// File name of the installed-file manifest inside a metadata directory.
pub const MANIFEST_NAME: &str = "RECORD";

/// Suffix of the auxiliary native-library directory some wheels install.
pub const LIBS_SUFFIX: &str = ".libs";

/// Returns the portion of `name` before its first `-`.
///
/// ```
/// use wheel_sync::naming::base_name;
///
/// assert_eq!(base_name("numpy-1.26.4-cp311-cp311-linux_x86_64.whl"), "numpy");
/// assert_eq!(base_name("numpy-1.26.4.dist-info"), "numpy");
/// assert_eq!(base_name("nodash.whl"), "nodash.whl");
/// ```
pub fn base_name(name: &str) -> &str {
    match name.split_once('-') {
        Some((head, _)) => head,
        None => name,
    }
}

/// Returns the text between the first and second `-` of `name`, if any.
///
/// For wheel file names this is the version field.
pub fn version_field(name: &str) -> Option<&str> {
    name.split('-').nth(1)
}

/// Whether a top-level entry name denotes a package metadata directory.
pub fn is_metadata_dir(name: &str) -> bool {
    name.ends_with(METADATA_SUFFIX)
}

/// Whether `name` is the manifest file name, ignoring ASCII case.
pub fn is_manifest_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(MANIFEST_NAME)
}

/// Name of the unlisted native-library directory for a metadata directory.
///
/// ```
/// use wheel_sync::naming::libs_dir_name;
///
/// assert_eq!(libs_dir_name("Pillow-10.0.0.dist-info"), "Pillow.libs");
/// ```
pub fn libs_dir_name(metadata_dir: &str) -> String {
    format!("{}{}", base_name(metadata_dir), LIBS_SUFFIX)
}

/// Splits a stored path into its meaningful segments.
///
/// Both `/` and `\` are treated as separators; empty and `.` segments are
/// dropped. `..` segments are kept so callers can decide how to treat them.
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}
