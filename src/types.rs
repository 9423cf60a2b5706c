//! JSON types served to clients. This is the wire format; keep it stable.

use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct CpuReport {
    pub used_percent: f64,
    pub free_percent: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct MemReport {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub total_mb: u64,
    pub used_mb: u64,
    pub free_mb: u64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DiskUsage {
    pub mount: String,
    pub total_gb: u64,
    pub used_gb: u64,
    pub free_gb: u64,
}

/// One sampling pass. A field is absent when the matching metric name is not
/// enabled in the agent's configuration; absence never means zero.
#[derive(Debug, Serialize, Clone)]
pub struct MetricsDocument {
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<[MemReport; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<Vec<DiskUsage>>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: i64,
}
