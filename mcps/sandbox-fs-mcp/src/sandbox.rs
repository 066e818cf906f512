//! Sandbox path validation
//!
//! All containment decisions are lexical: `.` and `..` are collapsed on the
//! path text and the filesystem is never consulted. A symlink inside an
//! allowed directory that points elsewhere is therefore followed by later
//! file operations; this is a known limitation of the sandbox.

use std::ops::Deref;
use std::path::{Component, Path, PathBuf};

use crate::types::{Config, FsError, FsResult};

/// An absolute, normalized path that lies within (or equals) an allowed root.
///
/// Only produced by [`validate`]. The caller's original string travels with
/// it so later errors can name the path the way the caller wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    requested: String,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// The path exactly as the caller supplied it.
    pub fn requested(&self) -> &str {
        &self.requested
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl Deref for ResolvedPath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// The process root and the ordered, de-duplicated set of allowed directories.
#[derive(Debug, Clone)]
pub struct AllowedRoots {
    root: PathBuf,
    dirs: Vec<PathBuf>,
}

impl AllowedRoots {
    /// Build from an absolute root and directory entries resolved against it.
    ///
    /// Entries that resolve outside the root are rejected.
    pub fn new<I, S>(root: impl AsRef<Path>, dirs: I) -> FsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = root.as_ref();
        if !root.is_absolute() {
            return Err(FsError::Config(format!(
                "root must be absolute: {}",
                root.display()
            )));
        }
        let root = normalize(root);

        let mut resolved: Vec<PathBuf> = Vec::new();
        for entry in dirs {
            let entry = entry.as_ref();
            if entry.trim().is_empty() {
                return Err(FsError::Config("empty allowed directory entry".to_string()));
            }
            let dir = resolve_lexically(&root, entry);
            if !is_inside(&root, &dir) {
                return Err(FsError::Config(format!(
                    "allowed directory {} is outside the root",
                    entry
                )));
            }
            if !resolved.contains(&dir) {
                resolved.push(dir);
            }
        }

        if resolved.is_empty() {
            return Err(FsError::Config(
                "at least one allowed directory is required".to_string(),
            ));
        }

        Ok(Self {
            root,
            dirs: resolved,
        })
    }

    /// Build from configuration; a relative root is taken from the current
    /// working directory.
    pub fn from_config(config: &Config) -> FsResult<Self> {
        let root = if config.root.is_absolute() {
            config.root.clone()
        } else {
            let cwd = std::env::current_dir().map_err(|e| {
                FsError::Config(format!("cannot determine working directory: {}", e))
            })?;
            cwd.join(&config.root)
        };
        Self::new(root, &config.allowed_directories)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Allowed directories relative to the root; the root itself is `.`.
    pub fn display_relative(&self) -> Vec<String> {
        self.dirs
            .iter()
            .map(|dir| {
                let rel = relative_path(&self.root, dir);
                if rel.as_os_str().is_empty() {
                    ".".to_string()
                } else {
                    rel.display().to_string()
                }
            })
            .collect()
    }
}

/// Path validator owning the allowed roots for the life of the process.
#[derive(Debug, Clone)]
pub struct Sandbox {
    roots: AllowedRoots,
}

impl Sandbox {
    pub fn new(roots: AllowedRoots) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &AllowedRoots {
        &self.roots
    }

    pub fn validate(&self, user_path: &str) -> FsResult<ResolvedPath> {
        validate(user_path, &self.roots.root, &self.roots.dirs)
    }

    /// Same contract as [`Sandbox::validate`]; used for the source side of a
    /// two-path operation.
    pub fn validate_source(&self, user_path: &str) -> FsResult<ResolvedPath> {
        self.validate(user_path)
    }

    /// Whether an already absolute path lies inside any allowed directory.
    pub fn contains(&self, candidate: &Path) -> bool {
        let candidate = normalize(candidate);
        self.roots.dirs.iter().any(|dir| is_inside(dir, &candidate))
    }
}

/// Resolve `user_path` against `root` and check it against `allowed_dirs`.
///
/// Fails with `InvalidPath` for blank input and `AccessDenied` when the
/// resolved path is outside every allowed directory. Error messages contain
/// `user_path` only.
pub fn validate(user_path: &str, root: &Path, allowed_dirs: &[PathBuf]) -> FsResult<ResolvedPath> {
    if user_path.trim().is_empty() {
        return Err(FsError::InvalidPath("path must not be empty".to_string()));
    }
    if user_path.contains('\0') {
        return Err(FsError::InvalidPath("path contains null byte".to_string()));
    }

    let candidate = resolve_lexically(root, user_path);

    if allowed_dirs.iter().any(|dir| is_inside(dir, &candidate)) {
        Ok(ResolvedPath {
            path: candidate,
            requested: user_path.to_string(),
        })
    } else {
        Err(FsError::AccessDenied(user_path.to_string()))
    }
}

/// Join `user_path` onto `base` (an absolute `user_path` replaces it) and
/// collapse `.`/`..` without touching the filesystem.
pub fn resolve_lexically(base: &Path, user_path: impl AsRef<Path>) -> PathBuf {
    normalize(&base.join(user_path))
}

/// Collapse `.` and `..` components lexically.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // pop() refuses to go above the root, so `/..` stays `/`
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Lexical relative path from `from` to `to`, both absolute and normalized.
///
/// When the two paths do not share a prefix (different drives on Windows)
/// there is no relative form and `to` is returned unchanged.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    if from.first() != to_parts.first() {
        return to.to_path_buf();
    }

    let common = from
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// `candidate` equals `dir` or descends from it.
fn is_inside(dir: &Path, candidate: &Path) -> bool {
    let rel = relative_path(dir, candidate);
    if rel.as_os_str().is_empty() {
        return true;
    }
    !matches!(rel.components().next(), Some(Component::ParentDir)) && !rel.is_absolute()
}
