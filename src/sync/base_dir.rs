//! Base directory resolution.
//!
//! Every entry path is expressed relative to a single base directory. The
//! base is either given explicitly (resolved against the project root) or
//! inferred as the deepest directory shared by all tracked files.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve the base directory for a set of tracked files.
///
/// With an explicit base, the base is `project_root.join(explicit)` and is
/// only checked for existence. Without one, at least two distinct files are
/// required and the base is their deepest common ancestor. The result is
/// absolute as long as `project_root` and `files` are.
///
/// # Errors
///
/// - [`Error::AmbiguousBaseDirectory`] when inference has fewer than two files
/// - [`Error::BaseDirectoryNotFound`] when the resolved directory is missing
pub fn resolve_base_dir(
    project_root: &Path,
    explicit: Option<&Path>,
    files: &[PathBuf],
) -> Result<PathBuf> {
    let base = match explicit {
        Some(explicit) => project_root.join(explicit),
        None => infer_common_base(files)?,
    };

    ensure_exists(project_root, &base)?;
    Ok(base)
}

/// Deepest common ancestor of `files`, compared component by component.
///
/// # Errors
///
/// Returns [`Error::AmbiguousBaseDirectory`] if fewer than two distinct
/// paths are given.
pub fn infer_common_base(files: &[PathBuf]) -> Result<PathBuf> {
    let distinct: BTreeSet<&PathBuf> = files.iter().collect();
    if distinct.len() < 2 {
        return Err(Error::AmbiguousBaseDirectory {
            count: distinct.len(),
        });
    }

    let split: Vec<Vec<Component<'_>>> = distinct.iter().map(|p| p.components().collect()).collect();
    let shortest = split.iter().map(Vec::len).min().unwrap_or(0);

    let mut common = PathBuf::new();
    for i in 0..shortest {
        let segment = split[0][i];
        if split.iter().any(|parts| parts[i] != segment) {
            break;
        }
        common.push(segment.as_os_str());
    }

    Ok(common)
}

/// Express `path` relative to `base` with `/` separators.
///
/// # Errors
///
/// Returns [`Error::PathOutsideBase`] if `path` is not under `base`.
pub fn entry_path(path: &Path, base: &Path) -> Result<String> {
    let outside = || Error::PathOutsideBase {
        path: path.to_path_buf(),
        base: base.to_path_buf(),
    };
    let relative = path.strip_prefix(base).map_err(|_| outside())?;
    if relative.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(outside());
    }
    Ok(to_slash(relative))
}

/// Join a path's normal components with `/`, whatever the platform separator.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Path of `file` relative to the project root, `/`-separated.
///
/// Files outside the project root keep their full path.
#[must_use]
pub fn canonical_path(project_root: &Path, file: &Path) -> String {
    match file.strip_prefix(project_root) {
        Ok(relative) => to_slash(relative),
        Err(_) => file.to_string_lossy().replace('\\', "/"),
    }
}

fn ensure_exists(project_root: &Path, base: &Path) -> Result<()> {
    if base.is_dir() {
        return Ok(());
    }

    Err(Error::BaseDirectoryNotFound {
        path: base.to_path_buf(),
        suggestion: relative_reading(project_root, base),
    })
}

/// If `base` looks like a relative path written with a leading separator and
/// that relative reading exists under the project root, return it.
fn relative_reading(project_root: &Path, base: &Path) -> Option<PathBuf> {
    if !base.has_root() {
        return None;
    }
    let stripped: PathBuf = base
        .components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::CurDir | Component::ParentDir))
        .collect();
    if stripped.as_os_str().is_empty() {
        return None;
    }

    let candidate = project_root.join(stripped);
    (candidate != base && candidate.is_dir()).then_some(candidate)
}
