use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use mcp_agents::logging;
use mcp_agents::mcp::McpService;
use mcp_agents::tools::weather::NWS_API_BASE;
use mcp_agents::tools::{Domain, ServerOptions};

#[derive(Parser, Debug)]
#[command(name = "mcp-tool-server")]
#[command(about = "Serve one tool domain over MCP on stdin/stdout")]
struct Args {
    /// Which tools to serve
    #[arg(value_enum)]
    domain: Domain,

    /// National Weather Service API base URL
    #[arg(long, default_value = NWS_API_BASE)]
    weather_api_url: String,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let options = ServerOptions {
        weather_api_url: args.weather_api_url,
    };
    let registry = args.domain.build_registry(&options)?;
    debug!(domain = ?args.domain, weather_api_url = %options.weather_api_url, "registry built");

    McpService::new(args.domain.server_name(), env!("CARGO_PKG_VERSION"), Arc::new(registry))
        .with_instructions(args.domain.instructions())
        .serve(tokio::io::stdin(), tokio::io::stdout())
        .await
}
