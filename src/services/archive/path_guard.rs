use std::path::{Component, Path, PathBuf};

/// Joins `relative` onto `root` if the result stays strictly inside `root`.
///
/// Returns `None` for absolute paths, drive prefixes, and any `..` sequence
/// that climbs above `root` at some point. Paths that resolve to `root`
/// itself are rejected as well.
pub fn resolve_inside(root: &Path, relative: &Path) -> Option<PathBuf> {
    let mut depth: usize = 0;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => depth = depth.checked_sub(1)?,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if depth == 0 {
        return None;
    }

    Some(root.join(relative))
}
