use crate::commands::Out;
use crate::mcp::Io;
use crate::{mcp, Config, Mode, Result};
use tracing::info;

/// Runs `budget mcp`: serves the budget tools over stdin/stdout until the client disconnects. MCP
/// clients launch this as a subprocess, so nothing but protocol traffic may go to stdout.
pub async fn mcp(config: Config, mode: Mode) -> Result<Out<()>> {
    let kind = config.source_kind();
    info!("Serving the {kind} budget in {} over MCP", config.root().display());
    mcp::run_server(config, mode, Io::Stdio).await?;
    Ok(format!("The MCP client for the {kind} budget disconnected").into())
}
