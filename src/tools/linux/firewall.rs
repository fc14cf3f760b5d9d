use anyhow::{Result, bail};
use serde_json::{Value, json};

use super::no_params;
use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
use crate::registry::{Arguments, RegistryError, ToolRegistry};
use crate::tools::run;

/// `ufw` rule spec such as `80/tcp`.
pub fn port_rule(port: i64, protocol: &str) -> Result<String> {
    if !(1..=65535).contains(&port) {
        bail!("port must be between 1 and 65535, got {port}");
    }
    let protocol = protocol.to_lowercase();
    if !matches!(protocol.as_str(), "tcp" | "udp") {
        bail!("protocol must be 'tcp' or 'udp', got '{protocol}'");
    }
    Ok(format!("{port}/{protocol}"))
}

async fn ufw_rule(action: &'static str, args: Arguments) -> Result<Value> {
    let rule = port_rule(args.integer("port")?, args.string("protocol")?)?;
    let out = run("ufw", &[action, &rule]).await?;
    if !out.success {
        bail!("ufw {action} {rule} failed: {}", out.stderr);
    }
    Ok(json!({ "status": out.stdout.trim() }))
}

fn port_tool(name: &str, description: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, description)
        .param(ParamSpec::required("port", ParamType::Integer))
        .param(ParamSpec::optional("protocol", ParamType::String, json!("tcp")))
}

pub(super) fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        no_params("get_firewall_status", "Get the status of the UFW firewall"),
        |_args: Arguments| async move {
            let out = run("ufw", &["status"]).await?;
            if !out.success {
                bail!("ufw status failed: {}", out.stderr);
            }
            anyhow::Ok(json!({ "status": out.stdout.trim() }))
        },
    )?;
    registry.register(
        port_tool("allow_port", "Allow traffic on a specific port"),
        |args: Arguments| ufw_rule("allow", args),
    )?;
    registry.register(
        port_tool("deny_port", "Deny traffic on a specific port"),
        |args: Arguments| ufw_rule("deny", args),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_validated() {
        assert_eq!(port_rule(80, "tcp").unwrap(), "80/tcp");
        assert_eq!(port_rule(53, "UDP").unwrap(), "53/udp");
        assert!(port_rule(0, "tcp").is_err());
        assert!(port_rule(70000, "tcp").is_err());
        assert!(port_rule(22, "icmp").is_err());
    }
}
