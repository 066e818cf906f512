//! Server initialization utilities
//!
//! Tracing setup plus the `serve_stdio!` macro that every server's `main.rs`
//! expands into.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for an MCP server.
///
/// Logs go to stderr because stdout carries the MCP protocol. The filter is
/// taken from `RUST_LOG` with `<crate_name>=info` added on top. Setting
/// `LOG_FORMAT=json` switches to one JSON object per line.
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

/// Generate a `#[tokio::main]` entry point serving a server over stdio.
///
/// `$constructor` is any expression yielding `Result<Server, E>` where `E`
/// converts into `anyhow::Error`; startup fails loudly instead of panicking
/// when configuration is unusable.
///
/// ```rust,ignore
/// mcp_common::serve_stdio!(SandboxFsServer::from_env(), "sandbox_fs_mcp");
/// ```
#[macro_export]
macro_rules! serve_stdio {
    ($constructor:expr, $crate_name:expr) => {
        #[tokio::main]
        async fn main() -> anyhow::Result<()> {
            use rmcp::ServiceExt;

            $crate::init_tracing($crate_name)?;

            tracing::info!(concat!("Starting ", $crate_name, " MCP Server"));

            let server = $constructor?;
            let service = server.serve(rmcp::transport::stdio()).await?;

            tracing::info!("Server running, waiting for requests...");

            service.waiting().await?;

            tracing::info!("Server shutting down");
            Ok(())
        }
    };
}
