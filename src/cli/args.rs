//! Command-line argument parsing for TaskGuard
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::tools::ToolDescriptor;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TaskGuard - failure recovery, execution classification and quality gates for agent orchestration
#[derive(Parser, Debug)]
#[command(name = "taskguard")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Decision layer for AI agent orchestration", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise the log level: -v (debug), -vv (trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Analyze a task failure and print the recovery decision
    Analyze {
        #[arg(long)]
        task_id: String,

        #[arg(long)]
        workspace_id: String,

        /// Error message reported by the failed task
        #[arg(long = "error")]
        error_message: String,

        #[arg(long, default_value = "")]
        error_type: String,

        /// Retries already spent on this task
        #[arg(long, default_value_t = 0)]
        retry_count: u32,

        #[arg(long)]
        agent_id: Option<String>,
    },

    /// Classify how a task must be executed
    Classify {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "cli")]
        workspace_id: String,

        /// Available tool as name:type:cap1,cap2 (repeatable); defaults to configured tools
        #[arg(long = "tool", value_parser = parse_tool)]
        tools: Vec<ToolDescriptor>,
    },

    /// Validate an operation against the quality gates
    Validate {
        #[arg(long)]
        workspace_id: String,

        /// JSON file holding {"operation_type": ..., "operation_data": {...}}
        #[arg(long)]
        file: PathBuf,
    },

    /// Display current configuration
    Config,
}

fn parse_tool(spec: &str) -> Result<ToolDescriptor, String> {
    ToolDescriptor::parse_spec(spec).ok_or_else(|| {
        format!(
            "invalid tool '{}': expected name:type:cap1,cap2 with type mcp or fallback",
            spec
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolType;

    #[test]
    fn test_parse_analyze() {
        let args = Args::parse_from([
            "taskguard",
            "analyze",
            "--task-id",
            "t-1",
            "--workspace-id",
            "ws-1",
            "--error",
            "Connection timeout after 30s",
            "--retry-count",
            "1",
        ]);
        match args.command {
            Commands::Analyze {
                error_message,
                retry_count,
                ..
            } => {
                assert_eq!(error_message, "Connection timeout after 30s");
                assert_eq!(retry_count, 1);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_classify_tools() {
        let args = Args::parse_from([
            "taskguard",
            "-v",
            "classify",
            "--name",
            "Leads",
            "--tool",
            "brave:mcp:web_search",
            "--tool",
            "web_search:fallback:web_search",
        ]);
        assert_eq!(args.verbose, 1);
        match args.command {
            Commands::Classify { tools, .. } => {
                assert_eq!(tools.len(), 2);
                assert_eq!(tools[0].tool_type, ToolType::Mcp);
                assert_eq!(tools[1].tool_type, ToolType::Fallback);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_tool_spec_rejected() {
        let result = Args::try_parse_from(["taskguard", "classify", "--name", "x", "--tool", "brave:magic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args = Args::parse_from(["taskguard", "config", "--config", "/tmp/tg.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/tg.toml")));
    }
}
