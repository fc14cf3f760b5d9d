use std::path::Path;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::json;
use tokio::time::{Instant, sleep};
use tracing::info;

use super::count;
use crate::mcp::{ParamSpec, ParamType, ToolDescriptor};
use crate::registry::{Arguments, RegistryError, ToolRegistry};
use crate::tools::run;

const PS_FORMAT: &str = "pid,user,pcpu,pmem,stat,comm";
const TERM_GRACE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub username: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub status: String,
}

/// Parses `ps -eo pid,user,pcpu,pmem,stat,comm` output, header included.
pub fn parse_ps(output: &str) -> Vec<ProcessInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let f: Vec<&str> = line.split_whitespace().collect();
            if f.len() < 6 {
                return None;
            }
            Some(ProcessInfo {
                pid: f[0].parse().ok()?,
                username: f[1].to_string(),
                cpu_percent: f[2].parse().unwrap_or(0.0),
                memory_percent: f[3].parse().unwrap_or(0.0),
                status: f[4].to_string(),
                name: f[5..].join(" "),
            })
        })
        .collect()
}

async fn snapshot() -> Result<Vec<ProcessInfo>> {
    let out = run("ps", &["-eo", PS_FORMAT]).await?;
    if !out.success {
        bail!("ps failed: {}", out.stderr);
    }
    Ok(parse_ps(&out.stdout))
}

fn by_cpu(mut procs: Vec<ProcessInfo>, limit: usize) -> Vec<ProcessInfo> {
    procs.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    procs.truncate(limit);
    procs
}

fn by_load(mut procs: Vec<ProcessInfo>, limit: usize) -> Vec<ProcessInfo> {
    let load = |p: &ProcessInfo| p.cpu_percent + p.memory_percent;
    procs.sort_by(|a, b| load(b).total_cmp(&load(a)));
    procs.truncate(limit);
    procs
}

fn is_running(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

async fn kill_process(pid: u32) -> Result<serde_json::Value> {
    let name = match tokio::fs::read_to_string(format!("/proc/{pid}/comm")).await {
        Ok(s) => s.trim().to_string(),
        Err(_) => bail!("Process with PID {pid} not found."),
    };
    let pid_arg = pid.to_string();

    let term = run("kill", &["-TERM", &pid_arg]).await?;
    if !term.success {
        if term.stderr.contains("not permitted") {
            bail!("Permission denied to kill process {pid}.");
        }
        bail!("Failed to kill process {pid}: {}", term.stderr);
    }

    let deadline = Instant::now() + TERM_GRACE;
    while Instant::now() < deadline {
        if !is_running(pid) {
            info!(pid, %name, "process terminated");
            return Ok(json!({ "status": format!("Process {pid} ({name}) terminated.") }));
        }
        sleep(Duration::from_millis(100)).await;
    }

    let kill = run("kill", &["-KILL", &pid_arg]).await?;
    if !kill.success && is_running(pid) {
        bail!("Failed to kill process {pid}: {}", kill.stderr);
    }
    info!(pid, %name, "process killed");
    Ok(json!({ "status": format!("Process {pid} ({name}) forcefully killed.") }))
}

pub(super) fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        ToolDescriptor::new("list_processes", "List running processes with details, busiest first")
            .param(ParamSpec::optional("limit", ParamType::Integer, json!(20))),
        |args: Arguments| async move {
            let limit = count(&args, "limit")?;
            anyhow::Ok(json!({ "processes": by_cpu(snapshot().await?, limit) }))
        },
    )?;
    registry.register(
        ToolDescriptor::new("get_top_processes", "Get top processes by combined CPU and memory usage")
            .param(ParamSpec::optional("limit", ParamType::Integer, json!(10))),
        |args: Arguments| async move {
            let limit = count(&args, "limit")?;
            anyhow::Ok(json!({ "top_processes": by_load(snapshot().await?, limit) }))
        },
    )?;
    registry.register(
        ToolDescriptor::new(
            "kill_process",
            "Kill a process by its PID (SIGTERM, then SIGKILL after 3 seconds)",
        )
        .param(ParamSpec::required("pid", ParamType::Integer)),
        |args: Arguments| async move {
            let pid = u32::try_from(args.integer("pid")?)?;
            kill_process(pid).await
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PS: &str = "    PID USER     %CPU %MEM STAT COMMAND
      1 root      0.0  0.1 Ss   systemd
    812 www-data 12.5  1.0 S    nginx
    950 alice     3.0 20.0 Sl   Web Content
";

    #[test]
    fn ps_rows_are_parsed() {
        let procs = parse_ps(PS);
        assert_eq!(procs.len(), 3);
        assert_eq!(procs[1].pid, 812);
        assert_eq!(procs[1].username, "www-data");
        assert_eq!(procs[2].name, "Web Content");
    }

    #[test]
    fn sort_orders_differ_by_metric() {
        let procs = parse_ps(PS);
        assert_eq!(by_cpu(procs.clone(), 1)[0].name, "nginx");
        assert_eq!(by_load(procs, 1)[0].name, "Web Content");
    }

    #[tokio::test]
    async fn killing_a_missing_pid_fails_cleanly() {
        let err = kill_process(u32::MAX - 1).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
