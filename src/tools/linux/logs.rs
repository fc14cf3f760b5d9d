use anyhow::Result;
use serde_json::{Value, json};
use tracing::debug;

use super::{count, lines_param, no_params, tail};
use crate::registry::{Arguments, RegistryError, ToolRegistry};
use crate::tools::run;

const SYSTEM_LOGS: &[&str] = &["/var/log/syslog", "/var/log/messages", "/var/log/system.log"];

/// Last `n` lines of the first readable file in `paths`.
async fn tail_first_readable(paths: &[&str], n: usize) -> Option<Vec<String>> {
    for path in paths {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let all: Vec<String> = text.lines().map(String::from).collect();
                return Some(tail(&all, n));
            }
            Err(e) => debug!(path, error = %e, "log file not readable"),
        }
    }
    None
}

async fn journal(n: usize, errors_only: bool) -> Option<Vec<String>> {
    let n = n.to_string();
    let mut args = vec!["-n", n.as_str(), "--no-pager"];
    if errors_only {
        args.extend(["-p", "err"]);
    }
    match run("journalctl", &args).await {
        Ok(out) if out.success => Some(out.stdout.lines().map(String::from).collect()),
        Ok(out) => {
            debug!(stderr = %out.stderr, "journalctl failed");
            None
        }
        Err(e) => {
            debug!(error = %e, "journalctl unavailable");
            None
        }
    }
}

/// Lines mentioning "error", case-insensitively.
pub fn error_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|l| l.to_lowercase().contains("error"))
        .map(String::from)
        .collect()
}

async fn system_logs(n: usize) -> Value {
    let entries = match tail_first_readable(SYSTEM_LOGS, n).await {
        Some(lines) if !lines.is_empty() => lines,
        _ => journal(n, false).await.unwrap_or_default(),
    };
    let entries = if entries.is_empty() {
        vec!["No log entries available".to_string()]
    } else {
        tail(&entries, n)
    };
    json!({ "log_entries": entries })
}

async fn error_logs(n: usize) -> Value {
    if let Some(lines) = journal(n, true).await {
        return json!({ "error_logs": lines });
    }
    for path in &SYSTEM_LOGS[..2] {
        if let Ok(text) = tokio::fs::read_to_string(path).await {
            let errors = error_lines(&text);
            if !errors.is_empty() {
                return json!({ "error_logs": tail(&errors, n) });
            }
        }
    }
    json!({ "error_logs": ["No error logs found"] })
}

pub(super) fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        no_params("get_system_logs", "Get recent system log entries").param(lines_param(50)),
        |args: Arguments| async move { anyhow::Ok(system_logs(count(&args, "lines")?).await) },
    )?;
    registry.register(
        no_params("get_error_logs", "Get recent error log entries").param(lines_param(20)),
        |args: Arguments| async move { anyhow::Ok(error_logs(count(&args, "lines")?).await) },
    )?;
    Ok(())
}
