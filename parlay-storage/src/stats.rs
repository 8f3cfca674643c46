//! Storage statistics and reports.

use std::fmt;

use serde::Serialize;

/// Per-namespace snapshot of both tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Local keys in the namespace, expired ones included.
    pub local_count: usize,
    /// Rows in the namespace's remote table; 0 when the circuit is open or
    /// the listing failed.
    pub remote_count: usize,
    pub remote_connected: bool,
    /// Sum of the stored entry string lengths.
    pub local_byte_size: usize,
}

impl StorageStats {
    /// Approximate size in kilobytes, for display.
    pub fn local_kib(&self) -> f64 {
        self.local_byte_size as f64 / 1024.0
    }
}

/// Which tier the service is currently serving from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierStatus {
    CloudConnected,
    LocalOnly,
}

impl TierStatus {
    pub fn from_remote_active(active: bool) -> Self {
        if active {
            TierStatus::CloudConnected
        } else {
            TierStatus::LocalOnly
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TierStatus::CloudConnected => "Cloud Connected",
            TierStatus::LocalOnly => "Local Storage Mode",
        }
    }
}

impl fmt::Display for TierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a local sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub expired: usize,
    pub corrupt: usize,
}

impl PruneReport {
    pub fn total(&self) -> usize {
        self.expired + self.corrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(TierStatus::from_remote_active(true).label(), "Cloud Connected");
        assert_eq!(TierStatus::from_remote_active(false).to_string(), "Local Storage Mode");
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = StorageStats {
            local_count: 2,
            remote_count: 3,
            remote_connected: true,
            local_byte_size: 2048,
        };
        let json = serde_json::to_value(&stats).expect("serialize should succeed");
        assert_eq!(json["localCount"], 2);
        assert_eq!(json["localByteSize"], 2048);
        assert!((stats.local_kib() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prune_total() {
        let report = PruneReport {
            expired: 2,
            corrupt: 1,
        };
        assert_eq!(report.total(), 3);
    }
}
