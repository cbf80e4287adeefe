//! Selection of one archive per package base name.
//!
//! Deduplication only looks at file names: `pip-24.0-py3-none-any.whl` and
//! `pip-22.1-py2-none-any.whl` share the base name `pip`, so the older one is
//! skipped. Two archives with different base names that extract the same
//! files are not detected here.

use crate::naming::base_name;
use crate::types::{ArchiveSource, SkipSet};
use crate::version::WheelVersion;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Orders two archives sharing a base name; `Less` means `a` is preferred.
///
/// The higher version wins. On equal versions the smaller file name wins,
/// and the same file name at two locations falls back to the smaller path,
/// which keeps the choice reproducible.
pub fn preference(a: &Path, b: &Path) -> Ordering {
    let name_a = file_name_of(a);
    let name_b = file_name_of(b);
    let key_a = (Reverse(WheelVersion::from_filename(&name_a)), &name_a, a);
    let key_b = (Reverse(WheelVersion::from_filename(&name_b)), &name_b, b);
    key_a.cmp(&key_b)
}

/// Returns every archive path that loses to another archive with the same
/// base name.
///
/// The same path listed by several sources counts once.
pub fn deduplicate_as_skip_set(sources: &[ArchiveSource]) -> SkipSet {
    let all: BTreeSet<&Path> = sources
        .iter()
        .flat_map(|source| source.archives.iter().map(PathBuf::as_path))
        .collect();

    let mut groups: BTreeMap<String, Vec<&Path>> = BTreeMap::new();
    for path in all {
        let name = file_name_of(path);
        groups.entry(base_name(&name).to_string()).or_default().push(path);
    }

    let mut skip = SkipSet::new();
    for (base, mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| preference(a, b));
        debug!(
            "Keeping {} for {}, skipping {} other archive(s)",
            members[0].display(),
            base,
            members.len() - 1
        );
        skip.extend(members[1..].iter().map(|p| p.to_path_buf()));
    }
    skip
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(key: &str, paths: &[&str]) -> ArchiveSource {
        ArchiveSource::new(key, paths.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn test_newer_version_wins() {
        let sources = vec![source(
            "a",
            &["/w/pkg-2.0-x.whl", "/w/pkg-1.5-x.whl"],
        )];
        let skip = deduplicate_as_skip_set(&sources);
        assert_eq!(skip, SkipSet::from([PathBuf::from("/w/pkg-1.5-x.whl")]));
    }

    #[test]
    fn test_equal_version_prefers_smaller_filename() {
        let sources = vec![
            source("a", &["/w/pkg-1.0-b.whl"]),
            source("b", &["/w/pkg-1.0-a.whl"]),
        ];
        let skip = deduplicate_as_skip_set(&sources);
        assert_eq!(skip, SkipSet::from([PathBuf::from("/w/pkg-1.0-b.whl")]));
    }

    #[test]
    fn test_same_filename_two_locations_prefers_smaller_path() {
        let sources = vec![
            source("z", &["/z/pkg-1.0-py3-none-any.whl"]),
            source("a", &["/a/pkg-1.0-py3-none-any.whl"]),
        ];
        let skip = deduplicate_as_skip_set(&sources);
        assert_eq!(
            skip,
            SkipSet::from([PathBuf::from("/z/pkg-1.0-py3-none-any.whl")])
        );
    }

    #[test]
    fn test_duplicate_path_is_not_skipped() {
        let sources = vec![
            source("a", &["/w/pkg-1.0-x.whl"]),
            source("b", &["/w/pkg-1.0-x.whl"]),
        ];
        assert!(deduplicate_as_skip_set(&sources).is_empty());
    }

    #[test]
    fn test_distinct_base_names_untouched() {
        let sources = vec![source(
            "a",
            &["/w/alpha-1.0-x.whl", "/w/beta-0.1-x.whl", "/w/nodash.whl"],
        )];
        assert!(deduplicate_as_skip_set(&sources).is_empty());
    }

    #[test]
    fn test_three_way_group() {
        let sources = vec![source(
            "a",
            &[
                "/w/lib-1.9.9-x.whl",
                "/w/lib-1.10.0-x.whl",
                "/w/lib-1.2-x.whl",
            ],
        )];
        let skip = deduplicate_as_skip_set(&sources);
        assert_eq!(
            skip,
            SkipSet::from([
                PathBuf::from("/w/lib-1.9.9-x.whl"),
                PathBuf::from("/w/lib-1.2-x.whl"),
            ])
        );
    }

    #[test]
    fn test_preference_ordering() {
        assert_eq!(
            preference(Path::new("/a/p-2.0-x.whl"), Path::new("/a/p-1.0-x.whl")),
            Ordering::Less
        );
        assert_eq!(
            preference(Path::new("/a/p-1.0-x.whl"), Path::new("/a/p-1.0-x.whl")),
            Ordering::Equal
        );
    }
}
