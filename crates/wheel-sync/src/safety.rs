//! Containment checks for removal and extraction.
//!
//! Every path the engine deletes or writes is first checked against a
//! containment boundary (the managed directory). The checks are lexical:
//! paths are compared component by component without touching the
//! filesystem, so they can run before any mutation happens.
//!
//! [`escaping_symlink`] is the one check that does look at the disk. It
//! catches symlinks below the boundary that lead out of it.

use crate::error::{SyncError, SyncResult};
use crate::naming::path_segments;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Verifies that `path` lies within `boundary`.
///
/// The path must start with every component of `boundary` and must not
/// contain `..` components after it. Violations are internal defects and
/// produce [`SyncError::Containment`].
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use wheel_sync::safety::ensure_contained;
///
/// let boundary = Path::new("/home/user/.local");
/// assert!(ensure_contained(Path::new("/home/user/.local/lib/numpy"), boundary).is_ok());
/// assert!(ensure_contained(Path::new("/home/user/.localx"), boundary).is_err());
/// assert!(ensure_contained(Path::new("/home/user/.local/../.ssh"), boundary).is_err());
/// ```
pub fn ensure_contained(path: &Path, boundary: &Path) -> SyncResult<()> {
    let escapes = match path.strip_prefix(boundary) {
        Ok(rest) => rest
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir)),
        Err(_) => true,
    };

    if escapes {
        return Err(SyncError::Containment {
            path: path.to_path_buf(),
            boundary: boundary.to_path_buf(),
        });
    }
    Ok(())
}

/// Verifies that `path` lies within `boundary` and is not the boundary itself.
pub fn ensure_strict_descendant(path: &Path, boundary: &Path) -> SyncResult<()> {
    ensure_contained(path, boundary)?;
    let is_boundary = path
        .strip_prefix(boundary)
        .map(|rest| rest.components().all(|c| c == Component::CurDir))
        .unwrap_or(false);
    if is_boundary {
        return Err(SyncError::Containment {
            path: path.to_path_buf(),
            boundary: boundary.to_path_buf(),
        });
    }
    Ok(())
}

/// Finds an existing symlink between `boundary` and `path` that leads
/// outside `boundary`.
///
/// Every component below `boundary` is inspected, `path` itself included.
/// A dangling symlink counts as escaping. Returns the first such symlink,
/// or `None` when writing to `path` stays inside.
pub fn escaping_symlink(path: &Path, boundary: &Path) -> Option<PathBuf> {
    let rest = path.strip_prefix(boundary).ok()?;
    let mut root: Option<PathBuf> = None;
    let mut current = boundary.to_path_buf();

    for component in rest.components() {
        current.push(component);
        let Ok(meta) = fs::symlink_metadata(&current) else {
            // Nothing below a missing component can exist yet
            return None;
        };
        if !meta.file_type().is_symlink() {
            continue;
        }

        if root.is_none() {
            root = fs::canonicalize(boundary).ok();
        }
        let inside = match (fs::canonicalize(&current), &root) {
            (Ok(target), Some(root)) => target.starts_with(root),
            _ => false,
        };
        if !inside {
            return Some(current);
        }
    }
    None
}

/// Returns the segments of `target` relative to `boundary`.
///
/// Fails with [`SyncError::Containment`] unless `target` is a strict
/// descendant of `boundary`.
pub fn relative_segments(target: &Path, boundary: &Path) -> SyncResult<Vec<String>> {
    ensure_strict_descendant(target, boundary)?;
    let rest = target
        .strip_prefix(boundary)
        .map_err(|_| SyncError::Containment {
            path: target.to_path_buf(),
            boundary: boundary.to_path_buf(),
        })?;
    Ok(rest
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect())
}

/// Resolves an archive member name against an install prefix.
///
/// `prefix` holds the segments of the install directory relative to the
/// containment boundary. The member's segments are appended and `..`
/// segments are folded lexically. Returns the resulting path relative to the
/// boundary, or `None` when the result would climb above the boundary or is
/// empty.
///
/// A member may use `..` to reach a sibling of the install directory; only
/// the final normalized position decides whether it is accepted.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use wheel_sync::safety::resolve_member;
///
/// let prefix = vec!["lib".to_string(), "site-packages".to_string()];
/// assert_eq!(
///     resolve_member(&prefix, "../sibling/data.txt"),
///     Some(PathBuf::from("lib/sibling/data.txt")),
/// );
/// assert_eq!(resolve_member(&prefix, "../../../etc/evil"), None);
/// ```
pub fn resolve_member(prefix: &[String], member_name: &str) -> Option<PathBuf> {
    let mut stack: Vec<&str> = Vec::with_capacity(prefix.len() + 4);

    let segments = prefix
        .iter()
        .map(String::as_str)
        .chain(path_segments(member_name));

    for segment in segments {
        if segment == ".." {
            stack.pop()?;
        } else {
            stack.push(segment);
        }
    }

    if stack.is_empty() {
        return None;
    }
    Some(stack.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix() -> Vec<String> {
        vec!["lib".into(), "python3.11".into(), "site-packages".into()]
    }

    #[test]
    fn test_ensure_contained_accepts_descendants() {
        let boundary = Path::new("/data/local");
        assert!(ensure_contained(Path::new("/data/local"), boundary).is_ok());
        assert!(ensure_contained(Path::new("/data/local/a/b"), boundary).is_ok());
        assert!(ensure_contained(Path::new("/data/local/./a"), boundary).is_ok());
    }

    #[test]
    fn test_ensure_contained_rejects_escapes() {
        let boundary = Path::new("/data/local");
        assert!(matches!(
            ensure_contained(Path::new("/data/other"), boundary),
            Err(SyncError::Containment { .. })
        ));
        // Prefix match on the string but not on components
        assert!(ensure_contained(Path::new("/data/localized"), boundary).is_err());
        assert!(ensure_contained(Path::new("/data/local/a/../../x"), boundary).is_err());
    }

    #[test]
    fn test_ensure_strict_descendant() {
        let boundary = Path::new("/data/local");
        assert!(ensure_strict_descendant(Path::new("/data/local/site"), boundary).is_ok());
        assert!(ensure_strict_descendant(Path::new("/data/local"), boundary).is_err());
        assert!(ensure_strict_descendant(Path::new("/data"), boundary).is_err());
    }

    #[test]
    fn test_relative_segments() {
        let segments = relative_segments(
            Path::new("/data/local/lib/site-packages"),
            Path::new("/data/local"),
        )
        .unwrap();
        assert_eq!(segments, vec!["lib", "site-packages"]);

        assert!(relative_segments(Path::new("/elsewhere"), Path::new("/data/local")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_escaping_symlink_detection() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::TempDir::new().unwrap();
        let local = temp.path().join("local");
        let site = local.join("site");
        let outside = temp.path().join("outside");
        fs::create_dir_all(site.join("real")).unwrap();
        fs::create_dir_all(&outside).unwrap();
        symlink(&outside, site.join("out")).unwrap();
        symlink(site.join("real"), site.join("alias")).unwrap();
        symlink(temp.path().join("missing"), site.join("dangling")).unwrap();

        assert_eq!(
            escaping_symlink(&site.join("out/evil.py"), &local),
            Some(site.join("out"))
        );
        assert_eq!(
            escaping_symlink(&site.join("dangling"), &local),
            Some(site.join("dangling"))
        );
        assert_eq!(escaping_symlink(&site.join("alias/ok.py"), &local), None);
        assert_eq!(escaping_symlink(&site.join("new/dir/file.py"), &local), None);
        assert_eq!(escaping_symlink(&temp.path().join("elsewhere"), &local), None);
    }

    #[test]
    fn test_resolve_member_plain() {
        assert_eq!(
            resolve_member(&prefix(), "numpy/__init__.py"),
            Some(PathBuf::from("lib/python3.11/site-packages/numpy/__init__.py"))
        );
        assert_eq!(
            resolve_member(&prefix(), "./numpy//core/"),
            Some(PathBuf::from("lib/python3.11/site-packages/numpy/core"))
        );
    }

    #[test]
    fn test_resolve_member_parent_within_boundary() {
        assert_eq!(
            resolve_member(&prefix(), "../../../bin/tool"),
            Some(PathBuf::from("bin/tool"))
        );
        assert_eq!(
            resolve_member(&prefix(), "pkg/../other.py"),
            Some(PathBuf::from("lib/python3.11/site-packages/other.py"))
        );
    }

    #[test]
    fn test_resolve_member_escape_variants() {
        assert_eq!(resolve_member(&prefix(), "../../../../etc/passwd"), None);
        assert_eq!(resolve_member(&prefix(), "../../../.."), None);
        assert_eq!(resolve_member(&prefix(), "..\\..\\..\\..\\evil.dll"), None);
        // Folding back to the boundary itself leaves nothing to write
        assert_eq!(resolve_member(&prefix(), "../../../"), None);
    }

    #[test]
    fn test_resolve_member_absolute_name_stays_inside() {
        assert_eq!(
            resolve_member(&prefix(), "/etc/passwd"),
            Some(PathBuf::from("lib/python3.11/site-packages/etc/passwd"))
        );
    }

    #[test]
    fn test_resolve_member_unicode() {
        assert_eq!(
            resolve_member(&prefix(), "日本語/ファイル.py"),
            Some(PathBuf::from("lib/python3.11/site-packages/日本語/ファイル.py"))
        );
    }
}
