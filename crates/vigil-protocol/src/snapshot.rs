//! Host metric payloads carried by `info` frames.

use serde::{Deserialize, Serialize};

/// Point-in-time description of the host, sent as the `data` of an `info`
/// frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSnapshot {
    pub cpu: CpuSample,
    pub memory: MemorySnapshot,
    pub disk: Vec<DiskUsage>,
    /// Operating system family, e.g. `linux`.
    pub os: String,
    /// Processor architecture, e.g. `x86_64`.
    pub arch: String,
}

/// CPU section of a snapshot.
///
/// Controller-requested snapshots carry the full inventory; the report timer
/// only sends per-core usage percentages. The two shapes share the `cpu` key,
/// distinguished by their element type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CpuSample {
    Inventory(Vec<CpuInfo>),
    Usage(Vec<f32>),
}

/// One logical processor in an inventory sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CpuInfo {
    pub id: u32,
    pub name: String,
    /// Logical processor count of the whole host.
    pub logic_count: u32,
    /// Physical core count of the whole host.
    pub count: u32,
}

/// Memory totals in bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemorySnapshot {
    pub total: u64,
}

/// Usage of one mounted volume, sizes in bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskUsage {
    pub path: String,
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub used_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_and_usage_share_the_cpu_slot() {
        let inventory: CpuSample = serde_json::from_str(
            r#"[{"id":0,"name":"Example CPU","logic_count":8,"count":4}]"#,
        )
        .unwrap();
        assert!(matches!(inventory, CpuSample::Inventory(ref cpus) if cpus.len() == 1));

        let usage: CpuSample = serde_json::from_str("[1.5,99.0]").unwrap();
        assert!(matches!(usage, CpuSample::Usage(ref v) if v.len() == 2));
    }

    #[test]
    fn test_inventory_entry_serializes_exactly_four_fields() {
        let info = CpuInfo {
            id: 0,
            name: "Example CPU".to_string(),
            logic_count: 8,
            count: 4,
        };
        let value = serde_json::to_value(&info).unwrap();
        let fields = value.as_object().unwrap();
        assert_eq!(fields.len(), 4);
        for key in ["id", "name", "logic_count", "count"] {
            assert!(fields.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_disk_numbers_survive_a_round_trip() {
        let disk = DiskUsage {
            path: "/var".to_string(),
            total: 512_000_000_000,
            free: 128_000_000_000,
            used: 384_000_000_000,
            used_percent: 75.0,
        };
        let json = serde_json::to_string(&disk).unwrap();
        assert!(json.contains(r#""used_percent":75.0"#));

        let back: DiskUsage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, disk);
    }

    #[test]
    fn test_snapshot_round_trips() {
        let snapshot = HostSnapshot {
            cpu: CpuSample::Inventory(vec![CpuInfo {
                id: 0,
                name: "Example CPU".to_string(),
                logic_count: 8,
                count: 4,
            }]),
            memory: MemorySnapshot {
                total: 16_000_000_000,
            },
            disk: vec![DiskUsage {
                path: "/".to_string(),
                total: 1000,
                free: 400,
                used: 600,
                used_percent: 60.0,
            }],
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: HostSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
