//! MCP-backed platform adapter.
//!
//! [`McpPlatformAdapter::connect`] spawns the platform's server, performs
//! the handshake and checks the search tool is offered. The resulting
//! [`McpConnection`] runs searches through the platform's
//! [`PlatformHandler`].
//!
//! Handshake time is bounded by the caller (the connection manager applies
//! the platform's init timeout). Dropping a connect future drops the client,
//! which kills the server process.

use crate::mcp::client::{McpClient, ServerCommand};
use crate::mcp::error::McpError;
use crate::platforms::{PlatformHandler, handler_for, handler_or_generic};
use async_trait::async_trait;
use scout_application::ports::platform_adapter::{
    AdapterError, PlatformAdapter, PlatformConnection,
};
use scout_domain::{PlatformName, PlatformSpec, ResearchPayload};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

impl From<McpError> for AdapterError {
    fn from(error: McpError) -> Self {
        match error {
            McpError::Cancelled | McpError::TransportClosed | McpError::Io(_) => {
                AdapterError::Closed
            }
            other => AdapterError::Protocol(other.to_string()),
        }
    }
}

impl ServerCommand {
    pub fn from_spec(spec: &PlatformSpec) -> Self {
        ServerCommand::new(&spec.command)
            .with_args(spec.args.iter().cloned())
            .with_env(spec.env.clone())
    }
}

/// Adapter for one platform served over MCP.
pub struct McpPlatformAdapter {
    platform: PlatformName,
    handler: Arc<dyn PlatformHandler>,
}

impl McpPlatformAdapter {
    pub fn new(platform: PlatformName, handler: Arc<dyn PlatformHandler>) -> Self {
        Self { platform, handler }
    }

    /// Adapter using the built-in handler for `platform`, if there is one.
    pub fn builtin(platform: PlatformName) -> Option<Self> {
        let handler = handler_for(platform.as_str())?;
        Some(Self::new(platform, handler))
    }

    /// Adapter for any configured platform; unknown names use the generic
    /// handler.
    pub fn for_platform(platform: PlatformName) -> Self {
        let handler = handler_or_generic(platform.as_str());
        Self::new(platform, handler)
    }
}

#[async_trait]
impl PlatformAdapter for McpPlatformAdapter {
    fn platform(&self) -> &PlatformName {
        &self.platform
    }

    async fn connect(
        &self,
        spec: &PlatformSpec,
    ) -> Result<Arc<dyn PlatformConnection>, AdapterError> {
        let command = ServerCommand::from_spec(spec);
        let client = McpClient::spawn(self.platform.as_str(), &command)
            .map_err(|e| AdapterError::Spawn(format!("{}: {}", command.program, e)))?;

        if let Err(e) = client.initialize().await {
            discard(&client).await;
            return Err(AdapterError::Handshake(e.to_string()));
        }

        let tool = spec
            .tool
            .clone()
            .unwrap_or_else(|| self.handler.default_tool().to_string());
        if !client.has_tool(&tool) {
            let available = client.tools().join(", ");
            discard(&client).await;
            return Err(AdapterError::Handshake(format!(
                "server does not offer tool '{}' (available: {})",
                tool, available
            )));
        }

        Ok(Arc::new(McpConnection {
            platform: self.platform.clone(),
            client,
            handler: Arc::clone(&self.handler),
            tool,
        }))
    }
}

async fn discard(client: &McpClient) {
    if let Err(e) = client.shutdown().await {
        debug!("Discarding MCP server '{}': {}", client.name(), e);
    }
}

/// A ready MCP session for one platform.
pub struct McpConnection {
    platform: PlatformName,
    client: McpClient,
    handler: Arc<dyn PlatformHandler>,
    tool: String,
}

#[async_trait]
impl PlatformConnection for McpConnection {
    fn platform(&self) -> &PlatformName {
        &self.platform
    }

    async fn search(
        &self,
        keyword: &str,
        deadline: Instant,
    ) -> Result<ResearchPayload, AdapterError> {
        let arguments = self.handler.arguments(keyword);
        debug!("{}: {} {}", self.platform, self.tool, arguments);

        let call = self.client.call_tool(&self.tool, arguments);
        let result = match tokio::time::timeout_at(deadline.into(), call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AdapterError::Timeout(format!(
                    "{} did not answer before the deadline",
                    self.tool
                )));
            }
        };

        self.handler.normalize(keyword, &result).map_err(|e| {
            warn!("{}: unusable result for '{}': {}", self.platform, keyword, e);
            AdapterError::Protocol(e.to_string())
        })
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.client
            .shutdown()
            .await
            .map_err(|e| AdapterError::Protocol(format!("shutdown failed: {}", e)))
    }
}
