//! Filesystem operation handlers
//!
//! Every handler validates its path arguments through the sandbox before
//! touching storage and returns the caller-facing text, or an [`FsError`]
//! that the server turns into a failure result.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::fs;

use crate::edit::{edit_content, EditSessionResult};
use crate::params::*;
use crate::sandbox::{normalize, relative_path, ResolvedPath, Sandbox};
use crate::storage::{ContentStore, DiskStore};
use crate::types::{Config, FsError, FsResult};

// ============================================================================
// Helper Functions
// ============================================================================

/// Whether anything (including a dangling symlink) exists at `path`.
async fn exists(path: &ResolvedPath) -> FsResult<bool> {
    match fs::symlink_metadata(path.as_path()).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FsError::from_io(e, "inspect", path.requested())),
    }
}

/// The directory that must hold `requested` exists and is a directory.
async fn require_dir_at(dir: &Path, requested: &str) -> FsResult<()> {
    match fs::metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(FsError::NotADirectory(requested.to_string())),
        Err(e) => Err(FsError::from_io(e, "inspect", requested)),
    }
}

async fn require_dir(path: &ResolvedPath, action: &'static str) -> FsResult<()> {
    let metadata = fs::metadata(path.as_path())
        .await
        .map_err(|e| FsError::from_io(e, action, path.requested()))?;
    if !metadata.is_dir() {
        return Err(FsError::NotADirectory(path.requested().to_string()));
    }
    Ok(())
}

/// `create_dir_all` that reports a file blocking the chain as `NotADirectory`.
///
/// EEXIST from `create_dir_all` means some component is a non-directory, not
/// that the requested path itself exists.
async fn create_dirs(dir: &Path, action: &'static str, requested: &str) -> FsResult<()> {
    fs::create_dir_all(dir).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists | std::io::ErrorKind::NotADirectory => {
            FsError::NotADirectory(requested.to_string())
        }
        _ => FsError::from_io(e, action, requested),
    })
}

fn timestamp(time: std::io::Result<SystemTime>) -> String {
    time.map(|t| DateTime::<Utc>::from(t).to_rfc3339())
        .unwrap_or_else(|_| "unavailable".to_string())
}

#[cfg(unix)]
fn permissions(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions(metadata: &std::fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "readonly".to_string()
    } else {
        "readwrite".to_string()
    }
}

/// Per-edit outcome lines followed by the preview or a confirmation.
pub fn render_edit_report(session: &EditSessionResult, requested: &str) -> String {
    let mut lines: Vec<String> = session
        .edits
        .iter()
        .enumerate()
        .map(|(i, record)| format!("Edit {}: {} - {}", i + 1, record.outcome, record.description))
        .collect();

    lines.push(String::new());
    if session.dry_run {
        lines.push("Dry run preview:".to_string());
        lines.push(session.content.clone());
    } else if session.changed {
        lines.push(format!("Successfully applied edits to {}", requested));
    } else {
        lines.push(format!("No changes made to {}", requested));
    }

    lines.join("\n")
}

// ============================================================================
// Handler Functions
// ============================================================================

pub async fn read_file(
    sandbox: &Sandbox,
    store: &DiskStore,
    params: ReadFileParams,
) -> FsResult<String> {
    let path = sandbox.validate(&params.path)?;
    store.read(&path).await
}

/// Read every path concurrently; one failure never aborts the others and the
/// output keeps the order of `params.paths`.
pub async fn read_multiple_files(
    sandbox: &Arc<Sandbox>,
    store: &DiskStore,
    params: ReadMultipleFilesParams,
) -> FsResult<String> {
    if params.paths.is_empty() {
        return Err(FsError::InvalidPath("no paths given".to_string()));
    }

    let tasks: Vec<_> = params
        .paths
        .iter()
        .cloned()
        .map(|requested| {
            let sandbox = Arc::clone(sandbox);
            let store = store.clone();
            tokio::spawn(async move {
                let path = sandbox.validate(&requested)?;
                store.read(&path).await
            })
        })
        .collect();

    let blocks: Vec<String> = params
        .paths
        .iter()
        .zip(join_all(tasks).await)
        .map(|(requested, joined)| match joined {
            Ok(Ok(content)) => format!("{}:\n{}\n", requested, content),
            Ok(Err(e)) => format!("{}: Error - {}", requested, e),
            Err(e) => format!("{}: Error - read task failed: {}", requested, e),
        })
        .collect();

    Ok(blocks.join("\n---\n"))
}

pub async fn write_file(
    sandbox: &Sandbox,
    store: &DiskStore,
    params: WriteFileParams,
) -> FsResult<String> {
    let path = sandbox.validate(&params.path)?;
    store.check_size(params.content.len() as u64)?;

    if let Some(parent) = path.parent() {
        create_dirs(parent, "create parent directories of", &params.path).await?;
    }
    store.write(&path, &params.content).await?;

    Ok(format!("Successfully wrote to {}", params.path))
}

pub async fn edit_file(
    sandbox: &Sandbox,
    store: &DiskStore,
    params: EditFileParams,
) -> FsResult<String> {
    let path = sandbox.validate(&params.path)?;
    let edits = params.edits.into_iter().map(Into::into).collect();

    let session = edit_content(store, &path, edits, params.dry_run).await?;

    Ok(render_edit_report(&session, &params.path))
}

pub async fn create_directory(sandbox: &Sandbox, params: CreateDirParams) -> FsResult<String> {
    let path = sandbox.validate(&params.path)?;

    if let Ok(metadata) = fs::metadata(path.as_path()).await {
        if !metadata.is_dir() {
            return Err(FsError::AlreadyExists(params.path));
        }
    }
    create_dirs(path.as_path(), "create directory", &params.path).await?;

    Ok(format!("Successfully created directory {}", params.path))
}

pub async fn list_directory(sandbox: &Sandbox, params: ListDirParams) -> FsResult<String> {
    let path = sandbox.validate(&params.path)?;
    require_dir(&path, "list").await?;

    let mut read_dir = fs::read_dir(path.as_path())
        .await
        .map_err(|e| FsError::from_io(e, "list", &params.path))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| FsError::from_io(e, "list", &params.path))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }

    if entries.is_empty() {
        return Ok("Directory is empty".to_string());
    }

    entries.sort();
    Ok(entries
        .into_iter()
        .map(|(name, is_dir)| {
            if is_dir {
                format!("[DIR] {}", name)
            } else {
                format!("[FILE] {}", name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Rename `source` to `destination`, refusing to overwrite.
///
/// The existence checks and the rename are separate steps; a destination
/// created in between is overwritten or rejected according to the platform's
/// rename semantics.
pub async fn move_file(sandbox: &Sandbox, params: MoveFileParams) -> FsResult<String> {
    let source = sandbox.validate_source(&params.source)?;
    let destination = sandbox.validate(&params.destination)?;

    if !exists(&source).await? {
        return Err(FsError::NotFound(params.source));
    }
    if exists(&destination).await? {
        return Err(FsError::AlreadyExists(params.destination));
    }
    if let Some(parent) = destination.parent() {
        require_dir_at(parent, &params.destination).await?;
    }

    // Both ends were checked above; whatever still fails is reported as a
    // failed move rather than blamed on either path.
    fs::rename(source.as_path(), destination.as_path())
        .await
        .map_err(|e| FsError::Io {
            action: "move",
            path: params.source.clone(),
            source: e,
        })?;

    Ok(format!(
        "Successfully moved {} to {}",
        params.source, params.destination
    ))
}

pub async fn search_files(
    sandbox: &Arc<Sandbox>,
    config: &Config,
    params: SearchFilesParams,
) -> FsResult<String> {
    let base = sandbox.validate(&params.path)?;
    require_dir(&base, "search").await?;

    let options = glob::MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let excludes = params
        .exclude_patterns
        .iter()
        .map(String::as_str)
        .map(glob::Pattern::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FsError::InvalidPattern(e.to_string()))?;

    let base_dir = base.into_path_buf();
    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&base_dir.to_string_lossy()),
        params.pattern
    );
    let paths = glob::glob_with(&full_pattern, options)
        .map_err(|e| FsError::InvalidPattern(e.to_string()))?;

    let sandbox = Arc::clone(sandbox);
    let limit = config.limits.max_search_results;
    let relative_matches = tokio::task::spawn_blocking(move || {
        let mut matches: Vec<PathBuf> = Vec::new();
        for path in paths.flatten() {
            if matches.len() >= limit {
                break;
            }
            if !sandbox.contains(&path) {
                continue;
            }
            let rel = relative_path(&base_dir, &normalize(&path));
            let excluded = excludes.iter().any(|pattern| {
                pattern.matches_path_with(&rel, options)
                    || (!pattern.as_str().contains('/')
                        && rel
                            .file_name()
                            .is_some_and(|name| pattern.matches_with(&name.to_string_lossy(), options)))
            });
            if !excluded {
                matches.push(rel);
            }
        }
        matches
    })
    .await
    .map_err(|e| FsError::Io {
        action: "search",
        path: params.path.clone(),
        source: std::io::Error::other(e),
    })?;

    if relative_matches.is_empty() {
        return Ok("No matches found".to_string());
    }

    Ok(relative_matches
        .iter()
        .map(|rel| Path::new(&params.path).join(rel).display().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn get_file_info(sandbox: &Sandbox, params: FileInfoParams) -> FsResult<String> {
    let path = sandbox.validate(&params.path)?;

    let metadata = fs::symlink_metadata(path.as_path())
        .await
        .map_err(|e| FsError::from_io(e, "stat", &params.path))?;

    let file_type = metadata.file_type();
    let kind = if file_type.is_symlink() {
        "symlink"
    } else if file_type.is_dir() {
        "directory"
    } else if file_type.is_file() {
        "file"
    } else {
        "other"
    };

    Ok([
        format!("type: {}", kind),
        format!("size: {}", metadata.len()),
        format!("created: {}", timestamp(metadata.created())),
        format!("modified: {}", timestamp(metadata.modified())),
        format!("accessed: {}", timestamp(metadata.accessed())),
        format!("permissions: {}", permissions(&metadata)),
    ]
    .join("\n"))
}

pub fn list_allowed_directories(sandbox: &Sandbox) -> String {
    let mut text = String::from("Allowed directories:");
    for dir in sandbox.roots().display_relative() {
        text.push('\n');
        text.push_str(&dir);
    }
    text
}
