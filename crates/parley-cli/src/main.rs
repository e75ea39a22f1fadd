use anyhow::Result;
use clap::Parser;
use futures_util::{pin_mut, StreamExt};
use log::LevelFilter;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use parley_core::tools::RMCPClient;
use parley_core::{
    AppConfig, AzureOpenAIClient, ConversationSession, MCPGateway, Orchestrator,
    OrchestratorConfig, ToolFactory,
};

#[derive(Parser, Debug)]
#[clap(
    name = "Parley",
    version = "0.1.0",
    about = "Streaming tool-calling chat front-end"
)]
struct Cli {
    #[clap(long, short, default_value = "info")]
    log_level: String,

    #[clap(long, help = "Execute a single prompt and exit")]
    task: Option<String>,

    #[clap(
        long = "mcp",
        value_name = "NAME=COMMAND [ARGS]...",
        help = "Attach an MCP tool server under a connection name (repeatable)"
    )]
    mcp: Vec<String>,

    #[clap(long, help = "Sampling temperature")]
    temperature: Option<f32>,

    #[clap(long, help = "System prompt override")]
    system_prompt: Option<String>,

    #[clap(long, help = "Maximum number of tool-call turns per user message")]
    max_tool_turns: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let mut config = AppConfig::from_env()?;
    if let Some(temperature) = cli.temperature {
        config.temperature = temperature;
    }
    if let Some(system_prompt) = cli.system_prompt.clone() {
        config.system_prompt = system_prompt;
    }
    if let Some(max_tool_turns) = cli.max_tool_turns {
        config.max_tool_turns = Some(max_tool_turns);
    }

    let llm = Arc::new(AzureOpenAIClient::from_config(&config));
    let registry = ToolFactory::create_default_registry();

    let mut gateway = MCPGateway::new();
    for spec in &cli.mcp {
        let (name, command, args) = parse_mcp_spec(spec)?;
        match RMCPClient::new(&command, &args).await {
            Ok(client) => {
                if let Err(e) = gateway.register(name.clone(), Arc::new(client)).await {
                    log::warn!("Failed to list tools for MCP connection '{}': {}", name, e);
                }
            }
            Err(e) => {
                log::warn!("Failed to start MCP connection '{}': {}", name, e);
            }
        }
    }

    let orchestrator = Orchestrator::new(
        llm,
        registry,
        gateway,
        OrchestratorConfig {
            system_prompt: Some(config.system_prompt.clone()),
            max_tool_turns: config.max_tool_turns,
        },
    );

    // Ctrl-C cancels the in-flight generation at its next suspension point.
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut session = ConversationSession::new();

    if let Some(task) = cli.task {
        run_turn(&orchestrator, &mut session, task).await;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        run_turn(&orchestrator, &mut session, input.to_string()).await;

        if orchestrator.cancellation_token().is_cancelled() {
            break;
        }
    }

    Ok(())
}

async fn run_turn(orchestrator: &Orchestrator, session: &mut ConversationSession, input: String) {
    let tools = orchestrator.available_tools();
    let response = orchestrator.generate_response(session, input, tools);
    pin_mut!(response);

    while let Some(fragment) = response.next().await {
        match fragment {
            Ok(text) => {
                print!("{}", text);
                std::io::stdout().flush().ok();
            }
            Err(e) => {
                log::error!("Generation failed: {}", e);
                break;
            }
        }
    }
    println!();
}

/// Parses an `--mcp` connection spec of the form `NAME=COMMAND [ARGS]...`.
fn parse_mcp_spec(spec: &str) -> Result<(String, String, Vec<String>)> {
    let (name, command_line) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid --mcp spec '{}': expected NAME=COMMAND", spec))?;

    let mut parts = command_line.split_whitespace();
    let command = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Invalid --mcp spec '{}': missing command", spec))?;
    let args: Vec<String> = parts.map(|s| s.to_string()).collect();

    if name.is_empty() {
        anyhow::bail!("Invalid --mcp spec '{}': empty connection name", spec);
    }

    Ok((name.to_string(), command.to_string(), args))
}
