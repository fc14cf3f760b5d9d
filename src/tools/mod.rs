//! Tool collections served by `mcp-tool-server`.
//!
//! Every domain exposes a `register` function that adds its fixed list of
//! tools to a [`ToolRegistry`]; nothing is discovered at runtime.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use tokio::process::Command;
use tracing::debug;

use crate::registry::ToolRegistry;

pub mod calculator;
pub mod linux;
pub mod weather;

/// A backing service a tool depends on cannot be reached or set up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{service} is unavailable: {reason}")]
pub struct Unavailable {
    pub service: String,
    pub reason: String,
}

impl Unavailable {
    pub fn new(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// Locates `name` on `PATH`.
pub fn require_binary(name: &str) -> Result<PathBuf, Unavailable> {
    let path = std::env::var_os("PATH").unwrap_or_default();
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Unavailable::new(name, "command not found on PATH"))
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a command to completion and captures its output. The binary is
/// checked for first so a missing tool reads as [`Unavailable`].
pub async fn run(program: &str, args: &[&str]) -> Result<CommandOutput> {
    let bin = require_binary(program)?;
    debug!(program, ?args, "running command");
    let out = Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;
    Ok(CommandOutput {
        success: out.status.success(),
        code: out.status.code(),
        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Domain {
    Calculator,
    Linux,
    Weather,
}

/// Settings the domains need at startup.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub weather_api_url: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            weather_api_url: weather::NWS_API_BASE.to_string(),
        }
    }
}

impl Domain {
    pub fn server_name(&self) -> &'static str {
        match self {
            Domain::Calculator => "Scientific Calculator",
            Domain::Linux => "Linux Debug Agent",
            Domain::Weather => "weather",
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            Domain::Calculator => "A scientific calculator providing mathematical operations",
            Domain::Linux => "Linux system monitoring and administration tools",
            Domain::Weather => "US weather alerts and forecasts from the National Weather Service",
        }
    }

    pub fn build_registry(&self, options: &ServerOptions) -> Result<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        match self {
            Domain::Calculator => calculator::register(&mut registry)?,
            Domain::Linux => linux::register(&mut registry)?,
            Domain::Weather => {
                let service = Arc::new(weather::WeatherService::new(&options.weather_api_url));
                weather::register(&mut registry, service)?
            }
        }
        Ok(registry)
    }
}
