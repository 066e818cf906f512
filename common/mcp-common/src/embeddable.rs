//! In-process execution of MCP servers
//!
//! [`EmbeddableMcp`] lets a host (or a test) call a server's tools directly,
//! skipping the stdio transport. Arguments are the same JSON objects a remote
//! client would send.
//!
//! ```rust,ignore
//! use mcp_common::EmbeddableMcp;
//!
//! let server = SandboxFsServer::with_config(config)?;
//! let result = server
//!     .call_tool("read_file", serde_json::json!({ "path": "notes.txt" }))
//!     .await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

/// Error type for embeddable MCP operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),

    #[error("mcp error: {0}")]
    McpError(String),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err.message.to_string())
    }
}

pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// An MCP server that can be driven without a transport.
///
/// Tool failures still come back as `Ok(CallToolResult)` with `is_error`
/// set; `Err` is reserved for unknown tools and undecodable arguments.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Server name as used in MCP configuration files.
    fn server_name(&self) -> &str;

    /// All tools with their input schemas.
    fn list_tools(&self) -> Vec<Tool>;

    /// Execute a tool by name.
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    fn server_description(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::text_success;

    struct EchoServer;

    #[async_trait]
    impl EmbeddableMcp for EchoServer {
        fn server_name(&self) -> &str {
            "echo"
        }

        fn list_tools(&self) -> Vec<Tool> {
            vec![]
        }

        async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
            match name {
                "echo" => {
                    let text: String = serde_json::from_value(params)?;
                    Ok(text_success(text))
                }
                _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_call_known_tool() {
        let result = EchoServer
            .call_tool("echo", serde_json::json!("hi"))
            .await
            .unwrap();
        assert_eq!(crate::result::result_text(&result), "hi");
    }

    #[tokio::test]
    async fn test_bad_params() {
        let result = EchoServer.call_tool("echo", serde_json::json!(7)).await;
        assert!(matches!(result, Err(EmbeddableError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let result = EchoServer.call_tool("unknown", serde_json::json!({})).await;
        assert!(matches!(result, Err(EmbeddableError::ToolNotFound(_))));
        assert!(EchoServer.server_description().is_none());
    }
}
