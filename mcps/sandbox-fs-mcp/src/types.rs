//! Configuration and error types for the sandboxed filesystem server

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration Types
// ============================================================================

/// Process-wide configuration, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base that caller-supplied relative paths resolve against
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Directories (relative to `root`, or absolute beneath it) that operations may touch
    #[serde(default = "default_allowed_directories")]
    pub allowed_directories: Vec<String>,
    #[serde(default)]
    pub limits: Limits,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_allowed_directories() -> Vec<String> {
    vec![".".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            allowed_directories: default_allowed_directories(),
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Apply `FS_SANDBOX_ROOT` / `FS_SANDBOX_ALLOWED` style overrides.
    ///
    /// `allowed` is a comma-separated list; blank entries are dropped.
    pub fn with_overrides(mut self, root: Option<String>, allowed: Option<String>) -> Self {
        if let Some(root) = root.filter(|r| !r.trim().is_empty()) {
            self.root = PathBuf::from(root);
        }
        if let Some(allowed) = allowed {
            let dirs: Vec<String> = allowed
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
            if !dirs.is_empty() {
                self.allowed_directories = dirs;
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum file size in bytes for read, write and edit
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Maximum number of paths returned by search_files
    #[serde(default = "default_max_search_results")]
    pub max_search_results: usize,
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

fn default_max_search_results() -> usize {
    1000
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_search_results: default_max_search_results(),
        }
    }
}

/// Accept `true`, `false`, `"true"`, `"false"` (any case), `"1"`, `"0"` and null.
///
/// Agents frequently send booleans as strings.
pub fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Bool(bool),
        Text(String),
        Null(()),
    }

    match Lenient::deserialize(deserializer)? {
        Lenient::Bool(b) => Ok(b),
        Lenient::Null(()) => Ok(false),
        Lenient::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got \"{}\"",
                other
            ))),
        },
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Every failure the sandbox, the edit engine and storage can report.
///
/// Messages carry the caller-supplied path string only, never the resolved
/// absolute path.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Access denied - path outside allowed directories: {0}")]
    AccessDenied(String),

    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: usize },

    /// Any other storage failure. The io error is kept as the source for
    /// operator logs and left out of the caller-facing message.
    #[error("Failed to {action} {path}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),
}

impl FsError {
    /// Classify an io error raised while performing `action` on `path`.
    pub fn from_io(source: std::io::Error, action: &'static str, path: &str) -> Self {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => FsError::NotFound(path.to_string()),
            ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_string()),
            ErrorKind::NotADirectory => FsError::NotADirectory(path.to_string()),
            _ => FsError::Io {
                action,
                path: path.to_string(),
                source,
            },
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;
