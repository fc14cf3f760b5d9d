use anyhow::{Result, bail};
use serde_json::{Value, json};

use super::{no_params, safe_name};
use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
use crate::registry::{Arguments, RegistryError, ToolRegistry};
use crate::tools::run;

/// Listening sockets from `ss -H -tlnp`.
pub fn parse_ss(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter_map(|line| {
            let f: Vec<&str> = line.split_whitespace().collect();
            if f.len() < 4 {
                return None;
            }
            let (address, port) = f[3].rsplit_once(':')?;
            let port: u16 = port.parse().ok()?;
            let process = f.get(5).and_then(|p| process_of(p));
            Some(json!({
                "address": address.trim_start_matches('[').trim_end_matches(']'),
                "port": port,
                "pid": process.as_ref().map(|(_, pid)| *pid),
                "process": process.map(|(name, _)| name).unwrap_or_else(|| "Unknown".into()),
            }))
        })
        .collect()
}

/// First `("name",pid=N` pair of an ss `users:` column.
fn process_of(users: &str) -> Option<(String, u32)> {
    let start = users.find("((\"")? + 3;
    let rest = &users[start..];
    let name_end = rest.find('"')?;
    let pid_start = rest.find("pid=")? + 4;
    let pid: String = rest[pid_start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    Some((rest[..name_end].to_string(), pid.parse().ok()?))
}

pub(super) fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        ToolDescriptor::new("ping_host", "Ping a host to check connectivity")
            .param(ParamSpec::required("hostname", ParamType::String))
            .param(ParamSpec::optional("count", ParamType::Integer, json!(4))),
        |args: Arguments| async move {
            let host = safe_name("hostname", args.string("hostname")?)?;
            let count = args.integer("count")?;
            if !(1..=20).contains(&count) {
                bail!("count must be between 1 and 20");
            }
            let out = run("ping", &["-c", &count.to_string(), host]).await?;
            anyhow::Ok(json!({
                "hostname": host,
                "success": out.success,
                "output": out.stdout,
                "error": (!out.success).then_some(out.stderr),
            }))
        },
    )?;
    registry.register(
        no_params("get_open_ports", "Get list of open ports and listening services"),
        |_args: Arguments| async move {
            let out = run("ss", &["-H", "-tlnp"]).await?;
            if !out.success {
                bail!("ss failed: {}", out.stderr);
            }
            anyhow::Ok(json!({ "open_ports": parse_ss(&out.stdout) }))
        },
    )?;
    Ok(())
}
