//! MCP (Model Context Protocol) server implementation.
//!
//! This module provides an MCP server that exposes the budget commands as tools for AI agent
//! integration. The server communicates via JSON-RPC over stdio.

/// Checks if the server has been initialized and returns an error if not.
macro_rules! require_init {
    ($self:expr) => {
        if !$self.check_initialized().await {
            return Self::uninitialized();
        }
    };
}

mod mcp_utils;
mod tools;

use crate::error::{ErrorType, IntoResult};
use crate::{Budget, Config, Mode};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::model::{
    CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::transport::stdio;
use rmcp::ErrorData as McpError;
use rmcp::{tool_handler, ServerHandler, ServiceExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// The budget MCP server.
///
/// Every tool call goes through the one shared `Budget`, so concurrent tool calls that write the
/// same table are serialized.
#[derive(Debug, Clone)]
pub struct BudgetServer {
    initialized: Arc<Mutex<bool>>,
    budget: Arc<Budget>,
    tool_router: ToolRouter<BudgetServer>,
}

impl BudgetServer {
    /// Creates a new BudgetServer around an open `Budget`.
    pub fn new(budget: Budget) -> Self {
        Self {
            initialized: Arc::new(Mutex::new(false)),
            budget: Arc::new(budget),
            tool_router: Self::tool_router(),
        }
    }

    async fn check_initialized(&self) -> bool {
        *self.initialized.lock().await
    }

    fn uninitialized() -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::error(vec![rmcp::model::Content::text(
            "You have not yet initialized the service. Please call initialize_service first.",
        )]))
    }
}

#[tool_handler]
impl ServerHandler for BudgetServer {
    /// Returns server information sent to the MCP client during initialization.
    ///
    /// Agents tend to treat `instructions` as optional reading, so the tools also refuse to run
    /// until `initialize_service` has been called, which returns the full usage instructions.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "budgeteer".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(include_str!("docs/INTRO.md").into()),
        }
    }
}

/// Transport type for the MCP server.
#[derive(Debug, Default)]
pub(crate) enum Io {
    #[default]
    Stdio,
    /// Mock transport for testing - holds one end of a duplex channel.
    #[cfg(test)]
    Mock(tokio::io::DuplexStream),
}

/// Runs the MCP server with stdio transport or mock transport. This function opens the data
/// source, starts the MCP server and blocks until the client disconnects or an error occurs.
///
/// # Arguments
/// - `config`: The `Config` object
/// - `mode`: Whether we are using the configured data source or the in-memory test sheet
/// - `io`: Whether we are using stdio as the transport or using mock io for testing
///
pub(crate) async fn run_server(config: Config, mode: Mode, io: Io) -> crate::Result<()> {
    let budget = Budget::open(config, mode).await?;
    info!("Starting MCP server for {}", budget.describe().await);
    let server = BudgetServer::new(budget);

    let service = match io {
        Io::Stdio => server
            .serve(stdio())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))
            .pub_result(ErrorType::Service)?,
        #[cfg(test)]
        Io::Mock(stream) => server
            .serve(stream)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))
            .pub_result(ErrorType::Service)?,
    };

    info!("MCP server running, waiting for requests...");

    service
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))
        .pub_result(ErrorType::Service)?;

    info!("MCP server shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GOALS;
    use crate::test::TestEnv;
    use rmcp::model::CallToolRequestParam;
    use rmcp::service::{RoleClient, RunningService};
    use serde_json::{json, Map, Value};
    use tokio::io::duplex;

    fn arguments(value: Value) -> Option<Map<String, Value>> {
        value.as_object().cloned()
    }

    async fn call(
        client: &RunningService<RoleClient, ()>,
        name: &'static str,
        args: Option<Map<String, Value>>,
    ) -> CallToolResult {
        client
            .call_tool(CallToolRequestParam {
                name: name.into(),
                arguments: args,
            })
            .await
            .unwrap_or_else(|e| panic!("{name} call failed: {e}"))
    }

    fn text_of(result: &CallToolResult) -> String {
        serde_json::to_string(&result.content).unwrap()
    }

    fn assert_success(name: &str, result: &CallToolResult) {
        assert!(
            !result.is_error.unwrap_or(false),
            "{name} returned error: {:?}",
            result.content
        );
    }

    /// Integration test for the MCP server using an in-memory transport.
    #[tokio::test]
    async fn test_mcp_server_integration() {
        let (client_io, server_io) = duplex(4096);
        let env = TestEnv::new().await;
        let config = env.config();

        let server_handle =
            tokio::spawn(
                async move { run_server(config, Mode::Testing, Io::Mock(server_io)).await },
            );

        let client = ().serve(client_io).await.expect("Failed to create client");

        // Tools refuse to run before initialize_service.
        let early = call(&client, "list_goals", None).await;
        assert!(early.is_error.unwrap_or(false));
        assert!(text_of(&early).contains("initialize_service"));

        let init = call(&client, "initialize_service", None).await;
        assert_success("initialize_service", &init);

        let summary = call(
            &client,
            "summary",
            arguments(json!({"month": "2025-10", "matching": "exact"})),
        )
        .await;
        assert_success("summary", &summary);
        assert!(text_of(&summary).contains("Over budget: Gas & Fuel, Utilities"));

        let set = call(
            &client,
            "set_goal",
            arguments(json!({"category": "Entertainment", "amount": "25"})),
        )
        .await;
        assert_success("set_goal", &set);

        let add = call(
            &client,
            "add_transaction",
            arguments(json!({
                "date": "2025-10-22",
                "category": "Coffee Shops",
                "amount": "4.50",
                "note": "Corner cafe"
            })),
        )
        .await;
        assert_success("add_transaction", &add);

        let listed = call(
            &client,
            "list_transactions",
            arguments(json!({"month": "2025-10"})),
        )
        .await;
        assert_success("list_transactions", &listed);
        assert!(text_of(&listed).contains("Corner cafe"));

        let deleted = call(
            &client,
            "delete_transaction",
            arguments(json!({"last": true})),
        )
        .await;
        assert_success("delete_transaction", &deleted);
        assert!(text_of(&deleted).contains("Coffee Shops"));

        let missing = call(
            &client,
            "delete_goal",
            arguments(json!({"category": "Travel"})),
        )
        .await;
        assert!(missing.is_error.unwrap_or(false));
        assert!(text_of(&missing).contains("request"));

        drop(client);

        let server_result = tokio::time::timeout(std::time::Duration::from_secs(5), server_handle)
            .await
            .expect("Server timed out")
            .expect("Server task panicked");
        assert!(
            server_result.is_ok(),
            "Server returned error: {:?}",
            server_result
        );

        let goals = env.get_state().remove(GOALS).unwrap();
        assert_eq!(goals.last().unwrap(), &vec!["Entertainment", "25"]);
    }

    #[tokio::test]
    async fn test_list_tools() {
        let (client_io, server_io) = duplex(4096);
        let env = TestEnv::new().await;
        let config = env.config();
        let _server_handle =
            tokio::spawn(
                async move { run_server(config, Mode::Testing, Io::Mock(server_io)).await },
            );
        let client = ().serve(client_io).await.expect("Failed to create client");

        let tools = client
            .list_tools(Default::default())
            .await
            .expect("Failed to list tools");
        let mut names: Vec<String> = tools.tools.iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "add_transaction",
                "delete_goal",
                "delete_transaction",
                "initialize_service",
                "list_goals",
                "list_transactions",
                "set_goal",
                "summary",
                "verify_source",
            ]
        );
        assert!(tools.tools.iter().all(|t| t.description.is_some()));
    }
}
