//! Sandboxed Filesystem MCP - filesystem tools confined to allowed directories

use sandbox_fs_mcp::SandboxFsServer;

mcp_common::serve_stdio!(SandboxFsServer::from_env(), "sandbox_fs_mcp");
