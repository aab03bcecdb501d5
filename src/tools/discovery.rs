//! Tool discovery port
//!
//! The orchestrator asks discovery which tools an agent can use in a given
//! domain and workspace. The static implementation serves a configured list.

use crate::errors::Result;
use crate::tools::types::ToolDescriptor;
use async_trait::async_trait;

/// Source of the tools reachable by an agent
#[async_trait]
pub trait ToolDiscovery: Send + Sync {
    /// Tools available to `agent` for `domain` inside `workspace_id`
    async fn get_tools_for_agent(
        &self,
        agent: &str,
        domain: &str,
        workspace_id: &str,
    ) -> Result<Vec<ToolDescriptor>>;
}

/// Discovery backed by a fixed, configured tool list
#[derive(Debug, Clone, Default)]
pub struct StaticToolDiscovery {
    tools: Vec<ToolDescriptor>,
}

impl StaticToolDiscovery {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl ToolDiscovery for StaticToolDiscovery {
    async fn get_tools_for_agent(
        &self,
        _agent: &str,
        _domain: &str,
        _workspace_id: &str,
    ) -> Result<Vec<ToolDescriptor>> {
        Ok(self.tools.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_discovery_returns_configured_tools() {
        let discovery = StaticToolDiscovery::new(vec![
            ToolDescriptor::fallback("web_search", &["web_search"]),
            ToolDescriptor::mcp("crm_lookup", &["crm"]),
        ]);

        let tools = discovery
            .get_tools_for_agent("researcher", "sales", "ws-1")
            .await
            .unwrap();

        assert_eq!(tools.len(), 2);
        assert_eq!(tools[1].name, "crm_lookup");
    }
}
