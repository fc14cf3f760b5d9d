//! Linux system administration tools, backed by `/proc`, `/etc` and the
//! usual command-line utilities.

use anyhow::{Result, bail};
use serde_json::json;

use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
use crate::registry::{Arguments, RegistryError, ToolRegistry};

mod files;
mod firewall;
mod logs;
mod monitoring;
mod network;
mod processes;
mod services;
mod users;

const HELP: &str = "🐧 LINUX DEBUG AGENT HELP GUIDE

🔍 AVAILABLE TOOLS:

💻 System Monitoring:
• \"Check CPU usage\", \"Get memory usage\", \"Show disk usage\", \"Get network statistics\"
• \"Show system information\"

📊 Process Management:
• \"List running processes\", \"Show top processes by CPU usage\", \"Kill process with PID 1234\"

🔒 Users:
• \"Show active users\", \"List users\", \"Add user <name>\", \"Delete user <name>\"

🌐 Network Monitoring:
• \"Show open ports\", \"Ping google.com\"

📋 Log Analysis:
• \"Show recent system logs\", \"Get error logs from system\"

⚙️ Service Management:
• \"Restart nginx service\", \"Check status of apache2 service\"

📁 File System:
• \"View file /etc/hosts\"

🔥 Firewall Management:
• \"Get firewall status\", \"Allow port 80\", \"Deny port 22\"

🎯 EXAMPLE QUERIES:
• \"What's using the most CPU and memory?\"
• \"Show me all open ports and their processes\"
• \"Add a new user named 'testuser'\"
• \"Show me the firewall status\"

💡 TIP: Ask questions in natural language about your Linux system!";

pub(crate) fn no_params(name: &str, description: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, description)
}

pub(crate) fn lines_param(default: i64) -> ParamSpec {
    ParamSpec::optional("lines", ParamType::Integer, json!(default))
}

/// Names passed to commands as positional arguments must not look like
/// options.
pub(crate) fn safe_name<'a>(kind: &str, value: &'a str) -> Result<&'a str> {
    let ok = !value.is_empty()
        && !value.starts_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | ':'));
    if !ok {
        bail!("invalid {kind}: '{value}'");
    }
    Ok(value)
}

/// Non-negative count argument, as a usize.
pub(crate) fn count(args: &Arguments, name: &str) -> Result<usize> {
    let n = args.integer(name)?;
    if n < 0 {
        bail!("'{name}' must not be negative");
    }
    Ok(n as usize)
}

/// Last `n` items of a slice.
pub(crate) fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    monitoring::register(registry)?;
    processes::register(registry)?;
    logs::register(registry)?;
    services::register(registry)?;
    users::register(registry)?;
    firewall::register(registry)?;
    network::register(registry)?;
    files::register(registry)?;
    registry.register(
        no_params("get_help", "Get help information about available Linux debugging tools"),
        |_args: Arguments| async move { anyhow::Ok(json!(HELP)) },
    )?;
    Ok(())
}
