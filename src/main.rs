use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};

use mcp_agents::config::{self, ClientConfig, Overrides};
use mcp_agents::dispatch::DispatchLoop;
use mcp_agents::llm::GeminiClient;
use mcp_agents::mcp::{McpServer, ServerSpec, ToolHost};
use mcp_agents::storage::{self, Storage};
use mcp_agents::toolset::ToolsetKind;
use mcp_agents::{logging, repl};

#[derive(Parser, Debug)]
#[command(name = "mcp-agent")]
#[command(about = "Chat with an MCP tool server through Gemini")]
struct Args {
    /// Tool server to launch (`.py` runs under python3, `.js` under node)
    server: PathBuf,

    /// Extra arguments passed to the server, after `--`
    #[arg(last = true)]
    server_args: Vec<String>,

    /// Prompt set to use; `auto` picks one from the advertised tools
    #[arg(long, value_enum, default_value_t = ToolsetKind::Auto)]
    toolset: ToolsetKind,

    /// Gemini model name
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the Gemini API
    #[arg(long)]
    api_url: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn print_connection_help(server: &Path, error: &anyhow::Error) {
    eprintln!("❌ Failed to connect to {}: {error:#}", server.display());
    eprintln!("\n🔧 Troubleshooting:");
    eprintln!("  • Check that the server path is correct and executable");
    eprintln!("  • Python servers need python3 on PATH, JavaScript servers need node");
    eprintln!("  • Run the server by hand to see whether it starts");
    eprintln!("  • Re-run with -v for protocol logs");
}

async fn run(args: Args) -> Result<ExitCode> {
    config::load_dotenv();

    let settings = match storage::get_storage().load_settings().await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "ignoring unreadable settings file");
            None
        }
    };
    let overrides = Overrides {
        model: args.model.clone(),
        api_url: args.api_url.clone(),
    };
    let config = ClientConfig::resolve(settings.as_ref(), &overrides)?;

    let spec = ServerSpec::for_path(&args.server, args.server_args.clone());
    let server = match McpServer::spawn(spec, config.startup_timeout).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            print_connection_help(&args.server, &e);
            return Ok(ExitCode::FAILURE);
        }
    };
    info!(name = %server.info.name, version = %server.info.version, "connected");

    let tools = match server.list_tools().await {
        Ok(t) => t,
        Err(e) => {
            print_connection_help(&args.server, &e);
            let _ = server.shutdown().await;
            return Ok(ExitCode::FAILURE);
        }
    };
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    println!("✅ Connected to server with tools: {}", names.join(", "));

    let toolset = args.toolset.build(&tools);
    info!(toolset = toolset.name(), model = %config.model, "starting chat");
    let oracle = Arc::new(GeminiClient::new(config.api_url, config.api_key, config.model));
    let dispatch = DispatchLoop::new(server.clone(), oracle, toolset);

    let mut stdout = std::io::stdout();
    repl::print_banner(&dispatch, &mut stdout)?;
    let outcome = repl::run(&dispatch, BufReader::new(tokio::io::stdin()), &mut stdout).await;

    server.shutdown().await.context("shutting down tool server")?;
    outcome?;
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}
