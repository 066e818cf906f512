//! Sandboxed Filesystem MCP Library
//!
//! Filesystem tools for an automated agent, confined to a fixed set of
//! allowed directories under one configured root.
//!
//! The two pieces that carry the design are usable without the MCP layer:
//!
//! - [`sandbox`]: lexical path validation against the allowed directories
//! - [`edit`]: ordered multi-edit find/replace with dry-run and per-edit outcomes
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use sandbox_fs_mcp::{Config, SandboxFsServer};
//!
//! let server = SandboxFsServer::with_config(Config {
//!     root: "/srv/agent".into(),
//!     allowed_directories: vec!["workspace".into()],
//!     ..Default::default()
//! })?;
//! ```

pub mod edit;
pub mod handlers;
pub mod params;
pub mod resources;
pub mod sandbox;
pub mod server;
pub mod storage;
pub mod types;

pub use edit::{apply_edits, edit_content, EditOperation, EditOutcome, EditSessionResult};
pub use sandbox::{AllowedRoots, ResolvedPath, Sandbox};
pub use server::SandboxFsServer;
pub use storage::{ContentStore, DiskStore};
pub use types::{Config, FsError, FsResult, Limits};

// Re-export parameter types for direct API usage
pub use params::*;
