//! TaskGuard - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use taskguard::{
    classifier::WorkspaceContext,
    cli::{Args, Commands},
    config::Config,
    logging,
    quality::Operation,
    recovery::RecoveryRequest,
    server::{self, AppState},
    tools::{ToolDescriptor, ToolInventory},
};

/// Exit status when quality gates block an operation
const EXIT_BLOCKED: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    logging::init(&config.logging, args.verbose);

    match args.command {
        Commands::Serve { host, port } => run_server(config, host, port).await?,
        Commands::Analyze {
            task_id,
            workspace_id,
            error_message,
            error_type,
            retry_count,
            agent_id,
        } => {
            let mut request = RecoveryRequest::new(task_id, workspace_id, error_message, retry_count)
                .with_error_type(error_type);
            request.agent_id = agent_id;
            run_analyze(&config, &request).await?;
        }
        Commands::Classify {
            name,
            description,
            workspace_id,
            tools,
        } => run_classify(&config, &name, &description, &workspace_id, tools).await?,
        Commands::Validate { workspace_id, file } => {
            let can_proceed = run_validate(&config, &workspace_id, &file)?;
            if !can_proceed {
                std::process::exit(EXIT_BLOCKED);
            }
        }
        Commands::Config => show_config(&config, args.config.as_deref())?,
    }

    Ok(())
}

async fn run_server(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::from_config(&config)?;
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    server::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
    })
    .await?;

    Ok(())
}

async fn run_analyze(config: &Config, request: &RecoveryRequest) -> Result<()> {
    let state = AppState::from_config(config)?;
    let analysis = state.recovery.analyze(request).await?;

    let decision = analysis.recovery_decision.to_string();
    let decision = if analysis.should_retry() {
        decision.green()
    } else {
        decision.yellow()
    };
    eprintln!(
        "{} {} ({}, confidence {:.2}, delay {}s)",
        "Decision:".bold(),
        decision.bold(),
        analysis.recovery_strategy,
        analysis.confidence_score,
        analysis.recommended_delay_seconds
    );

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn run_classify(
    config: &Config,
    name: &str,
    description: &str,
    workspace_id: &str,
    tools: Vec<ToolDescriptor>,
) -> Result<()> {
    let state = AppState::from_config(config)?;
    let tools = if tools.is_empty() {
        config.tools.available.clone()
    } else {
        tools
    };

    let classification = state
        .classifier
        .classify(
            name,
            description,
            &ToolInventory::new(tools),
            &WorkspaceContext::new(workspace_id),
        )
        .await;

    eprintln!(
        "{} {} / {:?}{}",
        "Execution:".bold(),
        classification.execution_type.to_string().cyan().bold(),
        classification.output_specificity,
        if classification.fallback_used {
            " (keyword fallback)".dimmed().to_string()
        } else {
            String::new()
        }
    );

    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}

/// Returns whether the operation may proceed
fn run_validate(config: &Config, workspace_id: &str, file: &Path) -> Result<bool> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let operation_type = document
        .get("operation_type")
        .and_then(|v| v.as_str())
        .context("operation file needs a string \"operation_type\"")?;
    let operation_data = document
        .get("operation_data")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));

    let operation = Operation::from_parts(operation_type, operation_data)?;
    let state = AppState::from_config(config)?;
    let (can_proceed, report) = state.quality.validate(&operation, workspace_id);

    for entry in &report.checks_passed {
        eprintln!("  {} {}: {}", "✓".green(), entry.check, entry.message);
    }
    for entry in &report.checks_failed {
        eprintln!("  {} {}: {}", "✗".red(), entry.check, entry.message);
    }
    let verdict = if can_proceed {
        "PROCEED".green().bold()
    } else {
        "BLOCKED".red().bold()
    };
    eprintln!(
        "{} {} (compliance {}%)",
        "Quality gates:".bold(),
        verdict,
        report.compliance_score
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(can_proceed)
}

fn show_config(config: &Config, path: Option<&Path>) -> Result<()> {
    let source = match path {
        Some(p) => p.display().to_string(),
        None => match Config::default_path() {
            Some(p) if p.exists() => p.display().to_string(),
            _ => "built-in defaults".to_string(),
        },
    };
    eprintln!("{} {}", "Configuration:".bold(), source);
    println!("{}", config.to_toml()?);
    Ok(())
}
