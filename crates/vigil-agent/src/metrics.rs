//! Host metrics collection

use std::net::IpAddr;

use sysinfo::{Disks, Networks, System};
use tokio::sync::Mutex;

use vigil_protocol::{CpuInfo, CpuSample, DiskUsage, HostSnapshot, MemorySnapshot};

/// Collects host metrics for `info` frames.
///
/// One `System` is kept alive for the process so successive CPU refreshes
/// measure usage over the time between calls.
pub struct MetricsProvider {
    sys: Mutex<System>,
}

impl MetricsProvider {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        Self {
            sys: Mutex::new(sys),
        }
    }

    /// Full snapshot with the CPU inventory, for controller `info` requests.
    pub async fn inventory_snapshot(&self) -> HostSnapshot {
        let mut sys = self.sys.lock().await;
        sys.refresh_memory();

        let logic_count = sys.cpus().len() as u32;
        let count = sys.physical_core_count().unwrap_or(logic_count as usize) as u32;
        let cpu = sys
            .cpus()
            .iter()
            .enumerate()
            .map(|(id, cpu)| CpuInfo {
                id: id as u32,
                name: cpu.brand().to_string(),
                logic_count,
                count,
            })
            .collect();

        HostSnapshot {
            cpu: CpuSample::Inventory(cpu),
            memory: MemorySnapshot {
                total: sys.total_memory(),
            },
            disk: disk_usage(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Usage-only snapshot for the periodic reporter.
    pub async fn usage_snapshot(&self) -> HostSnapshot {
        let mut sys = self.sys.lock().await;
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let usage = sys.cpus().iter().map(|cpu| cpu.cpu_usage()).collect();

        HostSnapshot {
            cpu: CpuSample::Usage(usage),
            memory: MemorySnapshot {
                total: sys.total_memory(),
            },
            disk: disk_usage(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Best-effort local IPv4 address, for startup logging.
    pub fn local_ipv4(&self) -> Option<IpAddr> {
        let networks = Networks::new_with_refreshed_list();
        for (_name, data) in networks.list() {
            for ip in data.ip_networks() {
                match ip.addr {
                    IpAddr::V4(v4) if !v4.is_loopback() => return Some(IpAddr::V4(v4)),
                    _ => {}
                }
            }
        }
        None
    }
}

fn disk_usage() -> Vec<DiskUsage> {
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let free = disk.available_space();
            let used = total.saturating_sub(free);
            let used_percent = if total == 0 {
                0.0
            } else {
                used as f64 / total as f64 * 100.0
            };
            DiskUsage {
                path: disk.mount_point().display().to_string(),
                total,
                free,
                used,
                used_percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_usage_snapshot_shape() {
        let provider = MetricsProvider::new();
        let snapshot = provider.usage_snapshot().await;

        assert!(matches!(snapshot.cpu, CpuSample::Usage(_)));
        assert_eq!(snapshot.os, std::env::consts::OS);
        assert_eq!(snapshot.arch, std::env::consts::ARCH);
        assert!(snapshot.memory.total > 0);
    }

    #[tokio::test]
    async fn test_inventory_snapshot_lists_cpus() {
        let provider = MetricsProvider::new();
        let snapshot = provider.inventory_snapshot().await;

        match snapshot.cpu {
            CpuSample::Inventory(cpus) => {
                assert!(!cpus.is_empty());
                assert!(cpus[0].logic_count >= cpus[0].count);
            }
            CpuSample::Usage(_) => panic!("inventory snapshot should carry CpuInfo entries"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_inventory_snapshot_replies_without_waiting() {
        let provider = MetricsProvider::new();

        let start = tokio::time::Instant::now();
        provider.inventory_snapshot().await;

        // Any sleep on this path would show up as auto-advanced time.
        assert_eq!(start.elapsed(), std::time::Duration::ZERO);
    }

    #[test]
    fn test_disk_usage_is_bounded() {
        for disk in disk_usage() {
            assert!(disk.used <= disk.total);
            assert!((0.0..=100.0).contains(&disk.used_percent));
        }
    }
}
