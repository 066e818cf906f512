//! Protocol-level error helpers
//!
//! Tool failures are reported inside a `CallToolResult` (see
//! [`crate::failure_text`]); the helpers here are for errors that belong to
//! the protocol itself, such as an unknown resource URI.

use rmcp::ErrorData as McpError;

/// A resource URI the server does not advertise.
pub fn resource_not_found(uri: &str) -> McpError {
    McpError::resource_not_found(format!("Unknown resource: {}", uri), None)
}
