//! Project root resolution
//!
//! Walks upward from a file's directory to the nearest directory holding the
//! project marker (`go.mod`), never leaving the workspace boundary.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::lint::error::ResolutionError;

/// Absolute directory that owns a project marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRoot(PathBuf);

impl ProjectRoot {
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Resolves a path reported relative to this root.
    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        normalize_path(&self.0.join(path))
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Finds the nearest ancestor-or-self of `dir` that contains `marker`.
///
/// The workspace boundary is inclusive. A `dir` that is not inside the
/// workspace fails with [`ResolutionError::OutOfBounds`] before any
/// filesystem access happens.
pub fn find_project_root(
    dir: &Path,
    workspace: &Path,
    marker: &str,
) -> Result<ProjectRoot, ResolutionError> {
    let dir = absolute(dir)?;
    let workspace = absolute(workspace)?;

    if !dir.starts_with(&workspace) {
        return Err(ResolutionError::OutOfBounds { dir, workspace });
    }

    for ancestor in dir.ancestors() {
        if ancestor.join(marker).is_file() {
            debug!("Resolved project root {:?} for {:?}", ancestor, dir);
            return Ok(ProjectRoot(ancestor.to_path_buf()));
        }
        if ancestor == workspace {
            break;
        }
    }

    Err(ResolutionError::NotFound {
        dir,
        workspace,
        marker: marker.to_string(),
    })
}

fn absolute(path: &Path) -> Result<PathBuf, ResolutionError> {
    std::path::absolute(path)
        .map(|p| normalize_path(&p))
        .map_err(|source| ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Lexically removes `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for c in path.components() {
        match c {
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    /// workspace/
    /// ├── noconfig/go.mod
    /// ├── monorepo/{foo,bar}/go.mod
    /// ├── monorepo/foo/pkg/inner
    /// └── orphan/deep
    fn workspace() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in [
            "noconfig",
            "monorepo/foo/pkg/inner",
            "monorepo/bar",
            "orphan/deep",
        ] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        for marker in ["noconfig/go.mod", "monorepo/foo/go.mod", "monorepo/bar/go.mod"] {
            fs::write(root.join(marker), "module example.com/test\n").unwrap();
        }
        temp
    }

    #[rstest]
    #[case("noconfig", "", "noconfig")]
    #[case("monorepo/foo", "monorepo", "monorepo/foo")]
    #[case("monorepo/foo/pkg/inner", "monorepo", "monorepo/foo")]
    #[case("monorepo/bar", "", "monorepo/bar")]
    fn finds_nearest_marker(#[case] dir: &str, #[case] boundary: &str, #[case] expected: &str) {
        let temp = workspace();
        let base = temp.path();

        let root = find_project_root(&base.join(dir), &base.join(boundary), "go.mod").unwrap();

        assert_eq!(root.path(), normalize_path(&base.join(expected)));
    }

    #[test]
    fn marker_at_workspace_boundary_is_accepted() {
        let temp = workspace();
        let boundary = temp.path().join("noconfig");

        let root = find_project_root(&boundary, &boundary, "go.mod").unwrap();

        assert_eq!(root.path(), normalize_path(&boundary));
    }

    #[test]
    fn resolving_twice_returns_same_root() {
        let temp = workspace();
        let dir = temp.path().join("monorepo/foo/pkg/inner");

        let first = find_project_root(&dir, temp.path(), "go.mod").unwrap();
        let second = find_project_root(&dir, temp.path(), "go.mod").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn returns_not_found_when_no_marker_up_to_boundary() {
        let temp = workspace();
        // A go.mod above the boundary must not be used.
        fs::write(temp.path().join("go.mod"), "module outer\n").unwrap();
        let boundary = temp.path().join("orphan");

        let err = find_project_root(&boundary.join("deep"), &boundary, "go.mod").unwrap_err();

        assert!(matches!(err, ResolutionError::NotFound { .. }));
    }

    #[test]
    fn returns_out_of_bounds_when_dir_is_outside_workspace() {
        let temp = workspace();

        let err = find_project_root(
            temp.path(),
            &temp.path().join("noconfig"),
            "go.mod",
        )
        .unwrap_err();

        assert!(matches!(err, ResolutionError::OutOfBounds { .. }));
    }

    #[test]
    fn sibling_with_shared_prefix_is_out_of_bounds() {
        let temp = workspace();
        fs::create_dir_all(temp.path().join("noconfig2")).unwrap();
        fs::write(temp.path().join("noconfig2/go.mod"), "module x\n").unwrap();

        let err = find_project_root(
            &temp.path().join("noconfig2"),
            &temp.path().join("noconfig"),
            "go.mod",
        )
        .unwrap_err();

        assert!(matches!(err, ResolutionError::OutOfBounds { .. }));
    }

    #[rstest]
    #[case("/a/b/../c", "/a/c")]
    #[case("/a/./b", "/a/b")]
    #[case("/../a", "/a")]
    fn normalize_path_removes_dot_components(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_path(Path::new(input)), PathBuf::from(expected));
    }
}
