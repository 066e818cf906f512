//! MCP Server implementation for sandboxed filesystem operations
//!
//! Tools delegate to the handlers module. This is the single place where an
//! [`FsError`] becomes a caller-visible failure, and where it is logged.

use std::path::PathBuf;
use std::sync::Arc;

use mcp_common::{
    async_trait, failure_text, resource_not_found, text_success, CallToolResult, EmbeddableError,
    EmbeddableMcp, EmbeddableResult, McpError,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        ListResourcesResult, PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult,
        ResourceContents, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, RoleServer,
};
use serde_json::Value;

use crate::handlers;
use crate::params::*;
use crate::resources;
use crate::sandbox::{AllowedRoots, Sandbox};
use crate::storage::DiskStore;
use crate::types::{Config, FsError, FsResult};

/// The sandboxed filesystem MCP server
#[derive(Clone)]
pub struct SandboxFsServer {
    sandbox: Arc<Sandbox>,
    store: DiskStore,
    config: Config,
    tool_router: ToolRouter<Self>,
}

/// Convert a handler outcome into a tool result, logging failures.
fn respond(tool: &str, result: FsResult<String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => Ok(text_success(text)),
        Err(err) => {
            match &err {
                FsError::Io { source, .. } => {
                    tracing::error!(tool, error = %err, cause = %source, "Tool failed");
                }
                _ => tracing::warn!(tool, error = %err, "Tool rejected"),
            }
            Ok(failure_text(&err))
        }
    }
}

/// Create every allowed directory; failures are logged and otherwise ignored.
fn prepare_allowed_directories(roots: &AllowedRoots) {
    for dir in roots.dirs() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("Could not create allowed directory {}: {}", dir.display(), e);
        }
    }
}

// ============================================================================
// Configuration Discovery
// ============================================================================

/// Build the configuration from files and environment, read through `var`.
///
/// Config is searched in order:
/// 1. `FS_SANDBOX_CONFIG` env var
/// 2. `./sandbox-fs-mcp.toml`
/// 3. `$XDG_CONFIG_HOME/sandbox-fs-mcp/config.toml`
/// 4. `~/.sandbox-fs-mcp.toml`
/// 5. Default config (current directory as the only allowed root)
///
/// `FS_SANDBOX_ROOT` and `FS_SANDBOX_ALLOWED` override the loaded values.
fn resolve_config(var: impl Fn(&str) -> Option<String>) -> Config {
    let mut config_paths = Vec::new();

    if let Some(env_path) = var("FS_SANDBOX_CONFIG") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            config_paths.push(path);
        } else {
            tracing::warn!("FS_SANDBOX_CONFIG={} does not exist", env_path);
        }
    }

    config_paths.push(PathBuf::from("sandbox-fs-mcp.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        config_paths.push(config_dir.join("sandbox-fs-mcp").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        config_paths.push(home.join(".sandbox-fs-mcp.toml"));
    }

    load_config(&config_paths)
        .with_overrides(var("FS_SANDBOX_ROOT"), var("FS_SANDBOX_ALLOWED"))
}

/// First readable, parseable config among `config_paths`, else the default.
fn load_config(config_paths: &[PathBuf]) -> Config {
    for path in config_paths {
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
            }
        }
    }

    tracing::info!("Using default configuration");
    Config::default()
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl SandboxFsServer {
    /// Create a server from discovered configuration
    ///
    /// Reads `FS_SANDBOX_CONFIG`, the standard config file locations and the
    /// `FS_SANDBOX_ROOT` / `FS_SANDBOX_ALLOWED` overrides.
    pub fn from_env() -> FsResult<Self> {
        Self::with_config(resolve_config(|key| std::env::var(key).ok()))
    }

    /// Create a server with explicit config
    pub fn with_config(config: Config) -> FsResult<Self> {
        let roots = AllowedRoots::from_config(&config)?;
        prepare_allowed_directories(&roots);

        tracing::info!(
            root = %roots.root().display(),
            allowed = ?roots.display_relative(),
            "Sandbox configured"
        );

        Ok(Self {
            sandbox: Arc::new(Sandbox::new(roots)),
            store: DiskStore::new(config.limits.max_file_size),
            config,
            tool_router: Self::tool_router(),
        })
    }

    #[tool(description = "Read the complete contents of a file as text.")]
    async fn read_file(
        &self,
        Parameters(params): Parameters<ReadFileParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "read_file",
            handlers::read_file(&self.sandbox, &self.store, params).await,
        )
    }

    #[tool(
        description = "Read several files at once. Each file is read independently; a failure for one path is reported inline and does not affect the others. Results keep the requested order."
    )]
    async fn read_multiple_files(
        &self,
        Parameters(params): Parameters<ReadMultipleFilesParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "read_multiple_files",
            handlers::read_multiple_files(&self.sandbox, &self.store, params).await,
        )
    }

    #[tool(
        description = "Create or overwrite a file with the given content. Parent directories are created as needed."
    )]
    async fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "write_file",
            handlers::write_file(&self.sandbox, &self.store, params).await,
        )
    }

    #[tool(
        description = "Apply an ordered list of find/replace edits to a text file. Each edit replaces every occurrence of old_text in the content produced by the previous edits. Reports applied / not found / superseded by prior edit per edit. With dry_run=true the result is previewed and nothing is written."
    )]
    async fn edit_file(
        &self,
        Parameters(params): Parameters<EditFileParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "edit_file",
            handlers::edit_file(&self.sandbox, &self.store, params).await,
        )
    }

    #[tool(
        description = "Create a directory, including missing parents. Succeeds if it already exists."
    )]
    async fn create_directory(
        &self,
        Parameters(params): Parameters<CreateDirParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "create_directory",
            handlers::create_directory(&self.sandbox, params).await,
        )
    }

    #[tool(description = "List a directory as [DIR] and [FILE] entries.")]
    async fn list_directory(
        &self,
        Parameters(params): Parameters<ListDirParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "list_directory",
            handlers::list_directory(&self.sandbox, params).await,
        )
    }

    #[tool(
        description = "Move or rename a file or directory. Fails if the destination already exists."
    )]
    async fn move_file(
        &self,
        Parameters(params): Parameters<MoveFileParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("move_file", handlers::move_file(&self.sandbox, params).await)
    }

    #[tool(
        description = "Find paths under a directory matching a glob pattern (case-insensitive, dotfiles included), minus any exclude patterns."
    )]
    async fn search_files(
        &self,
        Parameters(params): Parameters<SearchFilesParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "search_files",
            handlers::search_files(&self.sandbox, &self.config, params).await,
        )
    }

    #[tool(
        description = "Get type, size, creation/modification/access times and permissions of a file or directory."
    )]
    async fn get_file_info(
        &self,
        Parameters(params): Parameters<FileInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "get_file_info",
            handlers::get_file_info(&self.sandbox, params).await,
        )
    }

    #[tool(description = "List the directories this server is allowed to access.")]
    async fn list_allowed_directories(&self) -> Result<CallToolResult, McpError> {
        respond(
            "list_allowed_directories",
            Ok(handlers::list_allowed_directories(&self.sandbox)),
        )
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for SandboxFsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Sandboxed filesystem MCP server. \
                 Operations are restricted to the configured allowed directories. \
                 Use list_allowed_directories to see what paths are accessible."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(resources::list()))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = resources::read(&request.uri, &self.sandbox)
            .ok_or_else(|| resource_not_found(&request.uri))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for SandboxFsServer {
    fn server_name(&self) -> &str {
        "sandbox-fs"
    }

    fn server_description(&self) -> Option<&str> {
        Some(resources::INTERFACE_DESCRIPTION)
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "read_file" => {
                let params: ReadFileParams = serde_json::from_value(params)?;
                self.read_file(Parameters(params)).await.map_err(Into::into)
            }

            "read_multiple_files" => {
                let params: ReadMultipleFilesParams = serde_json::from_value(params)?;
                self.read_multiple_files(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "write_file" => {
                let params: WriteFileParams = serde_json::from_value(params)?;
                self.write_file(Parameters(params)).await.map_err(Into::into)
            }

            "edit_file" => {
                let params: EditFileParams = serde_json::from_value(params)?;
                self.edit_file(Parameters(params)).await.map_err(Into::into)
            }

            "create_directory" => {
                let params: CreateDirParams = serde_json::from_value(params)?;
                self.create_directory(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "list_directory" => {
                let params: ListDirParams = serde_json::from_value(params)?;
                self.list_directory(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "move_file" => {
                let params: MoveFileParams = serde_json::from_value(params)?;
                self.move_file(Parameters(params)).await.map_err(Into::into)
            }

            "search_files" => {
                let params: SearchFilesParams = serde_json::from_value(params)?;
                self.search_files(Parameters(params)).await.map_err(Into::into)
            }

            "get_file_info" => {
                let params: FileInfoParams = serde_json::from_value(params)?;
                self.get_file_info(Parameters(params)).await.map_err(Into::into)
            }

            "list_allowed_directories" => {
                self.list_allowed_directories().await.map_err(Into::into)
            }

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}
