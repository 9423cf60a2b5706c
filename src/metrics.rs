//! Metric samplers and the per-request aggregator.
//!
//! Every figure here is computed from a fresh sampling pass; nothing is cached
//! across requests. Samplers degrade to zero/empty output instead of erroring,
//! so `/metrics` itself never fails.

use std::collections::HashSet;
use std::time::Duration;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tokio::time::sleep;

use crate::config::Config;
use crate::procfs::{self, CpuCounters, MountEntry};
use crate::types::{CpuReport, DiskUsage, MemReport, MetricsDocument};

/// Delay between the two counter snapshots the CPU figure is derived from.
/// Awaited, so it suspends only the requesting task.
const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

const MIB: u64 = 1024 * 1024;

/// One pass over the configured metric names, in configured order. Names that
/// match no sampler are skipped; a future configuration can list them without
/// breaking an older agent.
pub async fn collect_metrics(config: &Config) -> MetricsDocument {
    let mut doc = MetricsDocument {
        timestamp: chrono::Utc::now().timestamp(),
        cpu: None,
        memory: None,
        disk: None,
    };
    for name in &config.metrics {
        match name.as_str() {
            "cpu" => doc.cpu = Some(sample_cpu().await),
            "memory" => doc.memory = Some(sample_memory()),
            "disk" => doc.disk = Some(sample_disks()),
            _ => {}
        }
    }
    doc
}

/// Instantaneous utilization from two /proc/stat snapshots 100ms apart.
pub async fn sample_cpu() -> CpuReport {
    let first = procfs::read_cpu_counters();
    sleep(CPU_SAMPLE_INTERVAL).await;
    let second = procfs::read_cpu_counters();
    cpu_report(first, second)
}

fn cpu_report(first: CpuCounters, second: CpuCounters) -> CpuReport {
    let idle_delta = second.idle.saturating_sub(first.idle);
    let total_delta = second.total.saturating_sub(first.total);
    if total_delta == 0 {
        // Counters unavailable, or no tick advanced over the interval. Report
        // a fully idle CPU instead of dividing by zero.
        return CpuReport {
            used_percent: 0.0,
            free_percent: 100.0,
        };
    }
    let used = 100.0 * (1.0 - idle_delta as f64 / total_delta as f64);
    CpuReport {
        used_percent: trunc2(used),
        free_percent: trunc2(100.0 - used),
    }
}

/// Two decimals, truncated toward zero. Clients compare against historical
/// output that truncates, so half-up rounding would be a visible change.
fn trunc2(v: f64) -> f64 {
    (v * 100.0).trunc() / 100.0
}

/// RAM first, then swap.
pub fn sample_memory() -> [MemReport; 2] {
    let sys = System::new_with_specifics(
        RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
    );
    mem_reports(
        sys.total_memory(),
        sys.free_memory(),
        sys.total_swap(),
        sys.free_swap(),
    )
}

fn mem_reports(total_ram: u64, free_ram: u64, total_swap: u64, free_swap: u64) -> [MemReport; 2] {
    [
        mem_report("ram", total_ram, free_ram),
        mem_report("swap", total_swap, free_swap),
    ]
}

/// Bytes to MiB with each operand truncated independently before the
/// subtraction; `used_mb` must come from the truncated values. Saturating so a
/// bad platform read (free > total) reports zero used instead of panicking.
fn mem_report(kind: &'static str, total_bytes: u64, free_bytes: u64) -> MemReport {
    let total_mb = total_bytes / MIB;
    let free_mb = free_bytes / MIB;
    MemReport {
        kind,
        total_mb,
        used_mb: total_mb.saturating_sub(free_mb),
        free_mb,
    }
}

/// Per-filesystem usage in mount-table order. Mounts whose statfs query fails
/// are dropped without affecting the rest.
pub fn sample_disks() -> Vec<DiskUsage> {
    let mounts = procfs::read_mounts();
    select_mounts(&mounts)
        .into_iter()
        .filter_map(|entry| {
            let st = procfs::fs_stats(&entry.mount_point)?;
            let total_gb = to_gib(st.total_blocks, st.block_size);
            let free_gb = to_gib(st.free_blocks, st.block_size);
            Some(DiskUsage {
                mount: entry.mount_point.clone(),
                total_gb,
                used_gb: total_gb.saturating_sub(free_gb),
                free_gb,
            })
        })
        .collect()
}

/// Local block devices only: `/dev/`-prefixed, no network-filesystem marker in
/// device or mount path, one entry per device. First occurrence wins; mount
/// table order is authoritative.
fn select_mounts(entries: &[MountEntry]) -> Vec<&MountEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    entries
        .iter()
        .filter(|e| {
            e.device.starts_with("/dev/")
                && !e.device.contains("nfs")
                && !e.mount_point.contains("nfs")
                && seen.insert(e.device.as_str())
        })
        .collect()
}

/// Three successive integer divisions, not one combined divide; the
/// intermediate truncation is part of the observable output.
fn to_gib(blocks: u64, block_size: u64) -> u64 {
    blocks.saturating_mul(block_size) / 1024 / 1024 / 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(idle: u64, total: u64) -> CpuCounters {
        CpuCounters { idle, total }
    }

    #[test]
    fn cpu_used_and_free_sum_to_hundred() {
        let r = cpu_report(counters(100, 1000), counters(130, 1100));
        // idle_delta=30, total_delta=100 -> used 70.00
        assert_eq!(r.used_percent, 70.0);
        assert_eq!(r.free_percent, 30.0);
        assert!((r.used_percent + r.free_percent - 100.0).abs() <= 0.01);
    }

    #[test]
    fn cpu_truncates_rather_than_rounds() {
        // idle_delta=1, total_delta=3 -> used = 66.666.. -> 66.66, free 33.33
        let r = cpu_report(counters(0, 0), counters(1, 3));
        assert_eq!(r.used_percent, 66.66);
        assert_eq!(r.free_percent, 33.33);
    }

    #[test]
    fn cpu_zero_total_delta_reports_idle() {
        let r = cpu_report(counters(5, 50), counters(5, 50));
        assert_eq!(r.used_percent, 0.0);
        assert_eq!(r.free_percent, 100.0);

        // Zero snapshots (counter source unavailable) hit the same path.
        let r = cpu_report(CpuCounters::default(), CpuCounters::default());
        assert_eq!(r.used_percent, 0.0);
        assert_eq!(r.free_percent, 100.0);
    }

    #[test]
    fn memory_truncates_each_operand_before_subtracting() {
        let [ram, swap] = mem_reports(8192 * MIB, 2048 * MIB, 1024 * MIB, 1024 * MIB);
        assert_eq!(ram.kind, "ram");
        assert_eq!(ram.total_mb, 8192);
        assert_eq!(ram.used_mb, 6144);
        assert_eq!(ram.free_mb, 2048);
        assert_eq!(swap.kind, "swap");
        assert_eq!(swap.used_mb, 0);

        // Sub-MiB remainders truncate per operand: total ~10.4 MiB, free ~0.9
        // MiB gives used 10 - 0 = 10; truncating the byte difference instead
        // would report 9.
        let r = mem_report("ram", 10 * MIB + 400 * 1024, 900 * 1024);
        assert_eq!(r.total_mb, 10);
        assert_eq!(r.free_mb, 0);
        assert_eq!(r.used_mb, 10);
    }

    #[test]
    fn memory_tolerates_free_exceeding_total() {
        let r = mem_report("swap", 0, 5 * MIB);
        assert_eq!(r.used_mb, 0);
    }

    fn entry(device: &str, mount: &str) -> MountEntry {
        MountEntry {
            device: device.to_string(),
            mount_point: mount.to_string(),
        }
    }

    #[test]
    fn mounts_filter_dedupes_by_device_and_drops_network() {
        let entries = vec![
            entry("/dev/sda1", "/"),
            entry("/dev/sda1", "/boot"),
            entry("/dev/net0", "/mnt/nfs"),
            entry("nfs-server:/share", "/mnt/data"),
            entry("proc", "/proc"),
            entry("/dev/sdb1", "/srv"),
        ];
        let kept = select_mounts(&entries);
        let mounts: Vec<&str> = kept.iter().map(|e| e.mount_point.as_str()).collect();
        assert_eq!(mounts, vec!["/", "/srv"]);
    }

    #[test]
    fn gib_conversion_divides_successively() {
        // 1_000_000 * 4096 = 4_096_000_000 bytes -> /1024 /1024 /1024 = 3
        assert_eq!(to_gib(1_000_000, 4096), 3);
        assert_eq!(to_gib(0, 4096), 0);
        // One combined division by 1024^3 would also give 3 here; the
        // successive form is pinned because it truncates intermediates.
        assert_eq!(to_gib(1, 1 << 30), 1);
    }
}
