use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use super::{no_params, safe_name};
use crate::mcp::{ParamSpec, ParamType};
use crate::registry::{Arguments, RegistryError, ToolRegistry};
use crate::tools::run;

pub fn parse_passwd(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split(':').next())
        .map(String::from)
        .collect()
}

/// `who` rows: user, terminal, then the login time.
pub fn parse_who(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            Some(json!({
                "user": parts[0],
                "terminal": parts[1],
                "login_time": parts[2..].join(" "),
            }))
        })
        .collect()
}

fn username() -> ParamSpec {
    ParamSpec::required("username", ParamType::String)
}

pub(super) fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        no_params("list_users", "List all local users on the system"),
        |_args: Arguments| async move {
            let passwd = tokio::fs::read_to_string("/etc/passwd")
                .await
                .context("reading /etc/passwd")?;
            anyhow::Ok(json!({ "users": parse_passwd(&passwd) }))
        },
    )?;
    registry.register(
        no_params("get_active_users", "Get currently logged in users"),
        |_args: Arguments| async move {
            let out = run("who", &[]).await?;
            let users = if out.success { parse_who(&out.stdout) } else { Vec::new() };
            anyhow::Ok(json!({ "active_users": users }))
        },
    )?;
    registry.register(
        no_params("add_user", "Add a new system user with a home directory").param(username()),
        |args: Arguments| async move {
            let name = safe_name("username", args.string("username")?)?;
            let out = run("useradd", &["-m", name]).await?;
            if !out.success {
                bail!("Failed to add user '{name}': {}", out.stderr);
            }
            anyhow::Ok(json!({ "status": format!("User '{name}' added successfully.") }))
        },
    )?;
    registry.register(
        no_params("delete_user", "Delete a system user and their home directory").param(username()),
        |args: Arguments| async move {
            let name = safe_name("username", args.string("username")?)?;
            let out = run("userdel", &["-r", name]).await?;
            if !out.success {
                bail!("Failed to delete user '{name}': {}", out.stderr);
            }
            anyhow::Ok(json!({ "status": format!("User '{name}' deleted successfully.") }))
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwd_names() {
        let users = parse_passwd("root:x:0:0:root:/root:/bin/bash\n# comment\nalice:x:1000:1000::/home/alice:/bin/sh\n");
        assert_eq!(users, vec!["root", "alice"]);
    }

    #[test]
    fn who_rows() {
        let rows = parse_who("alice    pts/0        2025-01-02 10:11 (10.0.0.5)\nbogus\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["terminal"], "pts/0");
        assert_eq!(rows[0]["login_time"], "2025-01-02 10:11 (10.0.0.5)");
    }
}
