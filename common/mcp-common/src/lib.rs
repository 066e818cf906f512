//! MCP Common - Shared plumbing for MCP servers
//!
//! - **Initialization**: [`init_tracing`] and the `serve_stdio!` entry point
//! - **Results**: builders for successful and failed `CallToolResult`s
//! - **Errors**: protocol error helpers
//! - **Embeddable**: [`EmbeddableMcp`] for driving a server in-process
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_common::{serve_stdio, text_success};
//!
//! // main.rs
//! serve_stdio!(MyServer::from_env(), "my_mcp");
//!
//! // inside a tool
//! Ok(text_success("done"))
//! ```

pub mod embeddable;
pub mod error;
pub mod init;
pub mod result;

// Re-export commonly used items at crate root
pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use error::resource_not_found;
pub use init::init_tracing;
pub use result::{failure_text, result_text, text_success};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

// Re-export async_trait for implementing EmbeddableMcp
pub use async_trait::async_trait;
