use anyhow::{Result, bail};
use serde_json::json;

use super::safe_name;
use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
use crate::registry::{Arguments, RegistryError, ToolRegistry};
use crate::tools::run;

/// State word from the `Active:` line of `systemctl status`.
pub fn active_state(status: &str) -> Option<&str> {
    status
        .lines()
        .find_map(|l| l.trim_start().strip_prefix("Active:"))
        .and_then(|rest| rest.split_whitespace().next())
}

fn service_param() -> ParamSpec {
    ParamSpec::required("service_name", ParamType::String).describe("Unit name, e.g. nginx")
}

pub(super) fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        ToolDescriptor::new("restart_service", "Restart a system service (e.g., nginx, apache2)")
            .param(service_param()),
        |args: Arguments| async move {
            let name = safe_name("service name", args.string("service_name")?)?;
            let out = run("systemctl", &["restart", name]).await?;
            if !out.success {
                bail!("Failed to restart service '{name}': {}", out.stderr);
            }
            anyhow::Ok(json!({ "status": format!("Service '{name}' restarted successfully.") }))
        },
    )?;
    registry.register(
        ToolDescriptor::new("get_service_status", "Get the status of a system service")
            .param(service_param()),
        |args: Arguments| async move {
            let name = safe_name("service name", args.string("service_name")?)?;
            // non-zero exit just means "not running"
            let out = run("systemctl", &["status", "--no-pager", name]).await?;
            let state = active_state(&out.stdout);
            anyhow::Ok(json!({
                "service": name,
                "status_output": out.stdout,
                "active_state": state,
                "is_active": state == Some("active"),
                "return_code": out.code,
            }))
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_is_not_active() {
        let running = "● nginx.service - nginx\n     Loaded: loaded\n     Active: active (running) since Mon\n";
        let stopped = "○ nginx.service - nginx\n     Active: inactive (dead)\n";
        assert_eq!(active_state(running), Some("active"));
        assert_eq!(active_state(stopped), Some("inactive"));
        assert_eq!(active_state("Unit foo.service could not be found."), None);
    }
}
