//! Raw kernel counter reads: /proc/stat, /proc/mounts, statfs(2).
//!
//! This layer does I/O and positional parsing only; interpretation belongs to
//! the samplers in `metrics.rs`. Every reader degrades to a zero or empty
//! value on failure so a missing or unreadable interface never takes a
//! request down with it.

use std::fs;
use tracing::debug;

const STAT_PATH: &str = "/proc/stat";
const MOUNTS_PATH: &str = "/proc/mounts";

/// Column of the idle counter within the aggregate cpu line, 0-indexed after
/// the "cpu" label: user, nice, system, idle, iowait, irq, softirq, steal.
/// Kernel field order, not alphabetical; pinned by a test below.
const IDLE_FIELD: usize = 3;

/// Cumulative tick counts since boot. Only deltas between two snapshots taken
/// from the same source in temporal order are meaningful. An all-zero value
/// means "no data", not an idle machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub idle: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
}

#[derive(Debug, Clone, Copy)]
pub struct FsStats {
    pub block_size: u64,
    pub total_blocks: u64,
    pub free_blocks: u64,
}

pub fn read_cpu_counters() -> CpuCounters {
    match fs::read_to_string(STAT_PATH) {
        Ok(raw) => parse_cpu_counters(&raw),
        Err(e) => {
            debug!("cpu counters unavailable: {e}");
            CpuCounters::default()
        }
    }
}

/// Aggregate line only (first field exactly `cpu`, never `cpuN`). `total` sums
/// every numeric column present so the figure stays correct when newer kernels
/// append categories.
fn parse_cpu_counters(raw: &str) -> CpuCounters {
    for line in raw.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("cpu") {
            continue;
        }
        let mut counters = CpuCounters::default();
        for (i, tok) in fields.enumerate() {
            let Ok(v) = tok.parse::<u64>() else { continue };
            counters.total = counters.total.saturating_add(v);
            if i == IDLE_FIELD {
                counters.idle = v;
            }
        }
        return counters;
    }
    CpuCounters::default()
}

pub fn read_mounts() -> Vec<MountEntry> {
    match fs::read_to_string(MOUNTS_PATH) {
        Ok(raw) => parse_mounts(&raw),
        Err(e) => {
            debug!("mount table unavailable: {e}");
            Vec::new()
        }
    }
}

fn parse_mounts(raw: &str) -> Vec<MountEntry> {
    raw.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            Some(MountEntry {
                device: device.to_string(),
                mount_point: mount_point.to_string(),
            })
        })
        .collect()
}

/// Filesystem statistics at `path`; `None` when the query fails, so a single
/// stale mount point cannot abort a disk report.
pub fn fs_stats(path: &str) -> Option<FsStats> {
    match nix::sys::statfs::statfs(std::path::Path::new(path)) {
        Ok(st) => Some(FsStats {
            block_size: st.block_size() as u64,
            total_blocks: st.blocks() as u64,
            free_blocks: st.blocks_free() as u64,
        }),
        Err(e) => {
            debug!("statfs {path} failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT_SAMPLE: &str = "\
cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0
intr 1462898
ctxt 10003217
btime 1739999999
";

    #[test]
    fn aggregate_line_idle_is_fourth_column() {
        let c = parse_cpu_counters(STAT_SAMPLE);
        assert_eq!(c.idle, 46828483);
        assert_eq!(
            c.total,
            10132153 + 290696 + 3084719 + 46828483 + 16683 + 25195 + 175628
        );
    }

    #[test]
    fn per_core_lines_are_skipped() {
        // Only "cpu0" present: no aggregate line means no data.
        let c = parse_cpu_counters("cpu0 1 2 3 4 5 6 7 8 9 10\n");
        assert_eq!(c, CpuCounters::default());
    }

    #[test]
    fn malformed_stat_yields_zero_snapshot() {
        assert_eq!(parse_cpu_counters(""), CpuCounters::default());
        assert_eq!(parse_cpu_counters("garbage\n"), CpuCounters::default());
        // Non-numeric columns are skipped, not fatal.
        let c = parse_cpu_counters("cpu 100 x 200 300\n");
        assert_eq!(c.total, 600);
        assert_eq!(c.idle, 300);
    }

    #[test]
    fn mounts_take_first_two_fields() {
        let raw = "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw 0 0
short
";
        let mounts = parse_mounts(raw);
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[0].device, "/dev/sda1");
        assert_eq!(mounts[0].mount_point, "/");
        assert_eq!(mounts[1].device, "proc");
    }
}
