use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tokio::fs;

use super::no_params;
use crate::registry::{Arguments, RegistryError, ToolRegistry};
use crate::tools::run;

/// Aggregate jiffies from the first line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

impl CpuTimes {
    pub fn parse(stat: &str) -> Option<Self> {
        let line = stat.lines().find(|l| l.starts_with("cpu "))?;
        let fields: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .filter_map(|f| f.parse().ok())
            .collect();
        if fields.len() < 4 {
            return None;
        }
        // idle + iowait
        let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
        Some(Self {
            idle,
            total: fields.iter().sum(),
        })
    }

    /// Busy percentage between two samples.
    pub fn busy_percent(&self, later: &CpuTimes) -> f64 {
        let total = later.total.saturating_sub(self.total);
        if total == 0 {
            return 0.0;
        }
        let idle = later.idle.saturating_sub(self.idle);
        let busy = 100.0 * (total - idle.min(total)) as f64 / total as f64;
        (busy * 10.0).round() / 10.0
    }
}

/// Byte values from `/proc/meminfo` (reported there in kB).
pub fn parse_meminfo(contents: &str) -> Value {
    let field = |key: &str| -> u64 {
        contents
            .lines()
            .find_map(|l| l.strip_prefix(key)?.strip_prefix(':'))
            .and_then(|rest| rest.split_whitespace().next()?.parse::<u64>().ok())
            .map(|kb| kb * 1024)
            .unwrap_or(0)
    };
    let percent = |part: u64, whole: u64| -> f64 {
        if whole == 0 {
            0.0
        } else {
            (1000.0 * part as f64 / whole as f64).round() / 10.0
        }
    };
    let total = field("MemTotal");
    let free = field("MemFree");
    let available = match field("MemAvailable") {
        0 => free + field("Buffers") + field("Cached"),
        a => a,
    };
    let used = total.saturating_sub(available);
    let swap_total = field("SwapTotal");
    let swap_free = field("SwapFree");
    let swap_used = swap_total.saturating_sub(swap_free);
    json!({
        "memory": {
            "total": total,
            "available": available,
            "used": used,
            "percent": percent(used, total),
            "free": free,
        },
        "swap": {
            "total": swap_total,
            "used": swap_used,
            "free": swap_free,
            "percent": percent(swap_used, swap_total),
        }
    })
}

/// Per-interface counters from `/proc/net/dev`.
pub fn parse_net_dev(contents: &str) -> Vec<Value> {
    contents
        .lines()
        .skip(2)
        .filter_map(|line| {
            let (iface, rest) = line.split_once(':')?;
            let n: Vec<u64> = rest
                .split_whitespace()
                .filter_map(|f| f.parse().ok())
                .collect();
            if n.len() < 16 {
                return None;
            }
            Some(json!({
                "interface": iface.trim(),
                "bytes_recv": n[0],
                "packets_recv": n[1],
                "errors_in": n[2],
                "drops_in": n[3],
                "bytes_sent": n[8],
                "packets_sent": n[9],
                "errors_out": n[10],
                "drops_out": n[11],
            }))
        })
        .collect()
}

/// `df -PT -B1` rows.
pub fn parse_df(output: &str) -> Vec<Value> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let f: Vec<&str> = line.split_whitespace().collect();
            if f.len() < 7 {
                return None;
            }
            let total: u64 = f[2].parse().ok()?;
            let used: u64 = f[3].parse().ok()?;
            let free: u64 = f[4].parse().ok()?;
            Some(json!({
                "device": f[0],
                "fstype": f[1],
                "total": total,
                "used": used,
                "free": free,
                "percent": f[5].trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
                "mountpoint": f[6..].join(" "),
            }))
        })
        .collect()
}

fn cpu_frequency(cpuinfo: &str) -> Value {
    let mhz: Vec<f64> = cpuinfo
        .lines()
        .filter(|l| l.starts_with("cpu MHz"))
        .filter_map(|l| l.split(':').nth(1)?.trim().parse().ok())
        .collect();
    if mhz.is_empty() {
        return json!({ "current": "N/A", "min": "N/A", "max": "N/A" });
    }
    let avg = mhz.iter().sum::<f64>() / mhz.len() as f64;
    json!({
        "current": (avg * 10.0).round() / 10.0,
        "min": mhz.iter().cloned().fold(f64::INFINITY, f64::min),
        "max": mhz.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    })
}

async fn read(path: &str) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {path}"))
}

async fn cpu_usage() -> Result<Value> {
    let before = CpuTimes::parse(&read("/proc/stat").await?).ok_or_else(|| anyhow!("unexpected /proc/stat format"))?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    let after = CpuTimes::parse(&read("/proc/stat").await?).ok_or_else(|| anyhow!("unexpected /proc/stat format"))?;

    let cpuinfo = read("/proc/cpuinfo").await.unwrap_or_default();
    let cores = match cpuinfo.matches("processor\t:").count() {
        0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        n => n,
    };
    let load: Vec<f64> = read("/proc/loadavg")
        .await?
        .split_whitespace()
        .take(3)
        .filter_map(|v| v.parse().ok())
        .collect();

    Ok(json!({
        "cpu_percent": before.busy_percent(&after),
        "cpu_cores": cores,
        "cpu_frequency": cpu_frequency(&cpuinfo),
        "load_average": load,
    }))
}

async fn disk_usage() -> Result<Value> {
    let out = run(
        "df",
        &["-PT", "-B1", "-x", "tmpfs", "-x", "devtmpfs", "-x", "squashfs", "-x", "overlay"],
    )
    .await?;
    // df exits non-zero when a single mount is unreadable, but still prints the rest
    let disks = parse_df(&out.stdout);
    if disks.is_empty() && !out.success {
        return Err(anyhow!("df failed: {}", out.stderr));
    }
    Ok(json!({ "disk_usage": disks }))
}

fn os_release_name(contents: &str) -> Option<String> {
    contents
        .lines()
        .find_map(|l| l.strip_prefix("PRETTY_NAME="))
        .map(|v| v.trim_matches('"').to_string())
}

async fn system_info() -> Result<Value> {
    let kernel = |name: &'static str| async move {
        read(&format!("/proc/sys/kernel/{name}"))
            .await
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let uptime: f64 = read("/proc/uptime")
        .await?
        .split_whitespace()
        .next()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| anyhow!("unexpected /proc/uptime format"))?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs_f64();
    let distribution = read("/etc/os-release")
        .await
        .ok()
        .and_then(|s| os_release_name(&s));

    Ok(json!({
        "hostname": kernel("hostname").await,
        "system": kernel("ostype").await,
        "release": kernel("osrelease").await,
        "version": kernel("version").await,
        "machine": std::env::consts::ARCH,
        "distribution": distribution,
        "boot_time_unix": (now - uptime).round() as u64,
        "uptime_seconds": uptime,
    }))
}

pub(super) fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(
        no_params("get_cpu_usage", "Get current CPU usage statistics"),
        |_args: Arguments| async move { cpu_usage().await },
    )?;
    registry.register(
        no_params("get_memory_usage", "Get current memory usage statistics"),
        |_args: Arguments| async move { anyhow::Ok(parse_meminfo(&read("/proc/meminfo").await?)) },
    )?;
    registry.register(
        no_params("get_disk_usage", "Get disk usage information for all mounted filesystems"),
        |_args: Arguments| async move { disk_usage().await },
    )?;
    registry.register(
        no_params("get_network_stats", "Get network interface statistics"),
        |_args: Arguments| async move {
            anyhow::Ok(json!({ "network_stats": parse_net_dev(&read("/proc/net/dev").await?) }))
        },
    )?;
    registry.register(
        no_params("get_system_info", "Get comprehensive system information"),
        |_args: Arguments| async move { system_info().await },
    )?;
    Ok(())
}
