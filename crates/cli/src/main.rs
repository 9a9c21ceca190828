//! Ferrocode CLI entry point.
//!
//! One binary, two modes:
//! - default: an interactive session that keeps one conversation going
//! - `-m/--message`: run a single message through the agent and exit

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ferrocode_agent::{AgentLoop, ContextStore, RunOutcome};
use ferrocode_config::AppConfig;
use ferrocode_core::turn::Turn;
use ferrocode_providers::AnthropicProvider;
use ferrocode_security::{AuditLog, Sandbox};
use ferrocode_tools::{Dispatcher, default_registry};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "ferrocode",
    about = "Ferrocode — a sandboxed coding agent for the terminal",
    version,
    author
)]
struct Cli {
    /// Path to the config file (default: ~/.ferrocode/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Workspace root directory the agent is sandboxed to
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Model to use (overrides the config)
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Send a single message instead of entering interactive mode
    #[arg(short, long)]
    message: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    run(cli).await
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config =
                AppConfig::load_from(path).map_err(|e| format!("Failed to load config: {e}"))?;
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?,
    };

    if let Some(root) = cli.root {
        config.workspace_root = root;
    }
    if let Some(model) = cli.model {
        config.model = model;
    }
    tracing::debug!(?config, "Configuration loaded");

    // A missing API key is an unrecoverable startup error
    let Some(api_key) = config.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export FERROCODE_API_KEY='sk-ant-...'");
        eprintln!("    export ANTHROPIC_API_KEY='sk-ant-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!(
            "    {}",
            AppConfig::config_dir().join("config.toml").display()
        );
        eprintln!();
        eprintln!("  Get an Anthropic key at: https://console.anthropic.com/settings/keys");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    // Build the sandboxed tool pipeline
    std::fs::create_dir_all(&config.workspace_root).map_err(|e| {
        format!(
            "Failed to create workspace root {}: {e}",
            config.workspace_root.display()
        )
    })?;
    let sandbox = Sandbox::new(&config.workspace_root)?;
    let audit = AuditLog::open(&config.audit_log)?;
    let registry = default_registry(sandbox.root())?;
    let tool_names = registry.names().join(", ");
    let dispatcher = Arc::new(Dispatcher::new(registry, sandbox, audit));

    // Build the provider and the agent loop
    let provider = Arc::new(AnthropicProvider::new(api_key));
    let agent = AgentLoop::new(provider, config.model.clone(), Arc::clone(&dispatcher))
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
        .with_max_iterations(config.max_iterations as u32)
        .with_token_budget(config.token_budget);

    let mut context = ContextStore::new();
    context.append(Turn::system(config.effective_system_prompt()))?;

    if let Some(message) = cli.message {
        // Single-message mode
        eprint!("  Thinking...");
        let outcome = agent.run(&mut context, &message).await;
        eprint!("\r              \r");
        match outcome {
            Ok(RunOutcome::Final(text)) => println!("{text}"),
            Ok(RunOutcome::Truncated { iterations }) => {
                println!("[truncated: iteration limit reached after {iterations} iterations]");
            }
            Err(e) => println!("[error] {e}"),
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║      Ferrocode Agent — Interactive Mode      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Workspace: {}", dispatcher.sandbox().root().display());
    println!("  Tools:     {tool_names}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    use std::io::Write;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if matches!(input, "exit" | "quit" | "q") {
            break;
        }
        if input.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }

        eprint!("  ...");
        match agent.run(&mut context, input).await {
            Ok(RunOutcome::Final(text)) => {
                eprint!("\r     \r");
                println!();
                for line in text.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Ok(RunOutcome::Truncated { iterations }) => {
                eprint!("\r     \r");
                println!();
                println!("  [truncated: iteration limit reached after {iterations} iterations]");
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [error] {e}");
                println!();
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
