//! Tool inventory types
//!
//! Describes the tools an agent can actually reach. Fallback tools satisfy
//! the tool contract but cannot collect real external data, so capability
//! queries distinguish them from real (MCP-backed) tools.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability that marks a tool as able to collect live external data
pub const WEB_SEARCH_CAPABILITY: &str = "web_search";

/// How a tool is backed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    /// Real tool served over MCP
    Mcp,

    /// Stub that honours the interface but simulates results
    Fallback,
}

impl ToolType {
    /// Parse a tool type label, case-insensitively
    pub fn parse(label: &str) -> Option<ToolType> {
        match label.trim().to_ascii_lowercase().as_str() {
            "mcp" => Some(ToolType::Mcp),
            "fallback" => Some(ToolType::Fallback),
            _ => None,
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolType::Mcp => write!(f, "mcp"),
            ToolType::Fallback => write!(f, "fallback"),
        }
    }
}

/// One tool as reported by tool discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name
    pub name: String,

    /// Backing kind
    pub tool_type: ToolType,

    /// Capability tags (e.g. "web_search")
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl ToolDescriptor {
    /// Create a real MCP tool descriptor
    pub fn mcp(name: impl Into<String>, capabilities: &[&str]) -> Self {
        Self {
            name: name.into(),
            tool_type: ToolType::Mcp,
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Create a fallback tool descriptor
    pub fn fallback(name: impl Into<String>, capabilities: &[&str]) -> Self {
        Self {
            name: name.into(),
            tool_type: ToolType::Fallback,
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Parse the CLI form `name:type:cap1,cap2`
    pub fn parse_spec(spec: &str) -> Option<ToolDescriptor> {
        let mut parts = spec.splitn(3, ':');
        let name = parts.next()?.trim();
        if name.is_empty() {
            return None;
        }
        let tool_type = ToolType::parse(parts.next()?)?;
        let capabilities = parts
            .next()
            .map(|caps| {
                caps.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(ToolDescriptor {
            name: name.to_string(),
            tool_type,
            capabilities,
        })
    }

    /// Whether this tool is real (not a fallback stub)
    pub fn is_real(&self) -> bool {
        self.tool_type == ToolType::Mcp
    }

    /// Whether the tool advertises a capability (case-insensitive)
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(capability))
    }
}

/// The set of tools available to one classification request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInventory {
    tools: Vec<ToolDescriptor>,
}

impl ToolInventory {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Whether a real (non-fallback) tool offers the capability
    pub fn has_real_capability(&self, capability: &str) -> bool {
        self.tools
            .iter()
            .any(|t| t.is_real() && t.has_capability(capability))
    }

    /// Whether real external data collection is possible at all
    pub fn can_collect_data(&self) -> bool {
        self.has_real_capability(WEB_SEARCH_CAPABILITY)
    }

    /// Names of real tools offering the capability
    pub fn real_tools_with(&self, capability: &str) -> Vec<String> {
        self.tools
            .iter()
            .filter(|t| t.is_real() && t.has_capability(capability))
            .map(|t| t.name.clone())
            .collect()
    }

    /// One line per tool, for prompts
    pub fn describe(&self) -> String {
        if self.tools.is_empty() {
            return "(no tools available)".to_string();
        }
        self.tools
            .iter()
            .map(|t| {
                format!(
                    "- {} [{}] capabilities: {}",
                    t.name,
                    t.tool_type,
                    if t.capabilities.is_empty() {
                        "none".to_string()
                    } else {
                        t.capabilities.join(", ")
                    }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<ToolDescriptor>> for ToolInventory {
    fn from(tools: Vec<ToolDescriptor>) -> Self {
        Self::new(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_search_is_not_real_capability() {
        let inventory = ToolInventory::new(vec![ToolDescriptor::fallback(
            "web_search",
            &["web_search"],
        )]);
        assert!(!inventory.can_collect_data());
        assert!(inventory.contains("web_search"));
    }

    #[test]
    fn test_mcp_search_is_real_capability() {
        let inventory = ToolInventory::new(vec![
            ToolDescriptor::fallback("file_search", &["file_search"]),
            ToolDescriptor::mcp("brave_search", &["WEB_SEARCH"]),
        ]);
        assert!(inventory.can_collect_data());
        assert_eq!(inventory.real_tools_with("web_search"), vec!["brave_search"]);
    }

    #[test]
    fn test_parse_spec() {
        let tool = ToolDescriptor::parse_spec("brave:mcp:web_search,news").unwrap();
        assert_eq!(tool.name, "brave");
        assert_eq!(tool.tool_type, ToolType::Mcp);
        assert_eq!(tool.capabilities, vec!["web_search", "news"]);

        let bare = ToolDescriptor::parse_spec("notes:fallback").unwrap();
        assert!(bare.capabilities.is_empty());

        assert!(ToolDescriptor::parse_spec("broken").is_none());
        assert!(ToolDescriptor::parse_spec("x:unknown:cap").is_none());
    }

    #[test]
    fn test_tool_type_serde() {
        let json = serde_json::to_string(&ToolType::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
        let parsed: ToolDescriptor =
            serde_json::from_str(r#"{"name":"t","tool_type":"mcp"}"#).unwrap();
        assert!(parsed.is_real());
        assert!(parsed.capabilities.is_empty());
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(ToolInventory::default().describe(), "(no tools available)");
    }
}
