//! Tool inventory and discovery
//!
//! Tells the classifier which tools are real and which are fallback stubs.

pub mod discovery;
pub mod types;

pub use discovery::{StaticToolDiscovery, ToolDiscovery};
pub use types::{ToolDescriptor, ToolInventory, ToolType, WEB_SEARCH_CAPABILITY};
