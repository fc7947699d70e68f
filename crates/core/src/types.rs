//! Wire types for the telemetry backend's JSON contract.
//!
//! All structs deserialize directly from backend responses. Optional
//! fields stay `Option<T>` rather than defaulting, so "absent" remains
//! distinguishable from "present but empty" where the UI cares (e.g.
//! incident analysis pending state).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// A monitored container as reported by `/containers`.
///
/// The id is opaque and unique; the dashboard only reads and reselects
/// among containers, never creates or deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    /// Unix timestamp (seconds) of the last observed event.
    pub last_seen: f64,
    /// Current event rate over the backend's trailing window (ev/s).
    pub event_rate: f64,
}

impl ContainerSummary {
    /// `last_seen` as a UTC timestamp, if it is representable.
    pub fn last_seen_utc(&self) -> Option<DateTime<Utc>> {
        let secs = self.last_seen.trunc() as i64;
        let nanos = (self.last_seen.fract() * 1e9) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// A single security alert attributed to a container.
///
/// Immutable once fetched. No field is individually unique, so list
/// rendering identity is the composite [`AlertRecord::row_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub container_id: String,
    /// ISO-8601 timestamp string as sent by the backend.
    pub timestamp: String,
    pub category: String,
    pub reason: String,
    pub evt_type: String,
    pub proc_name: String,
    pub fd_name: String,
    pub output: String,
}

impl AlertRecord {
    /// Composite identity for list rendering.
    pub fn row_key(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.container_id, self.timestamp, self.evt_type, self.proc_name, self.fd_name
        )
    }

    /// Parse the wire timestamp, if well-formed.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Response envelope of `/containers/{id}/alerts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerAlerts {
    pub container_id: String,
    #[serde(default)]
    pub alerts: Vec<AlertRecord>,
}

// ---------------------------------------------------------------------------
// Incidents
// ---------------------------------------------------------------------------

/// A derived security incident from `/incidents`.
///
/// Everything beyond container, timestamp and score is optional: the
/// clustering attributes arrive with the incident, while `analysis` is
/// filled in later by the analyzer service. A missing or empty analysis
/// is a *pending* state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub container_id: String,
    pub timestamp: String,
    pub threat_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_window: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Incident {
    /// True while the analyzer has not produced an analysis yet.
    pub fn is_pending(&self) -> bool {
        match &self.analysis {
            None => true,
            Some(text) => text.trim().is_empty(),
        }
    }

    /// Composite identity for list rendering.
    pub fn row_key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.container_id,
            self.timestamp,
            self.event_type.as_deref().unwrap_or("")
        )
    }
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// Severity of a raw security log event.
///
/// Unrecognized wire strings map to [`LogPriority::Unknown`] instead of
/// failing the whole response decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogPriority {
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
    Unknown,
}

impl LogPriority {
    /// Canonical display name (matches the backend's wire strings).
    pub fn as_str(&self) -> &'static str {
        match self {
            LogPriority::Critical => "Critical",
            LogPriority::Error => "Error",
            LogPriority::Warning => "Warning",
            LogPriority::Notice => "Notice",
            LogPriority::Info => "Info",
            LogPriority::Debug => "Debug",
            LogPriority::Unknown => "Unknown",
        }
    }

    /// Ordering rank for severity sorting (0 = most severe).
    pub fn rank(&self) -> u8 {
        match self {
            LogPriority::Critical => 0,
            LogPriority::Error => 1,
            LogPriority::Warning => 2,
            LogPriority::Notice => 3,
            LogPriority::Info => 4,
            LogPriority::Debug => 5,
            LogPriority::Unknown => 6,
        }
    }
}

impl From<String> for LogPriority {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Critical" => LogPriority::Critical,
            "Error" => LogPriority::Error,
            "Warning" => LogPriority::Warning,
            "Notice" => LogPriority::Notice,
            "Info" => LogPriority::Info,
            "Debug" => LogPriority::Debug,
            _ => LogPriority::Unknown,
        }
    }
}

impl From<LogPriority> for String {
    fn from(value: LogPriority) -> Self {
        value.as_str().to_string()
    }
}

/// A raw security log event from `/containers/{id}/logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: String,
    pub rule: String,
    pub priority: LogPriority,
    pub output: String,
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl LogEvent {
    /// Parse the wire timestamp, if well-formed.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Response envelope of `/containers/{id}/logs`.
///
/// `warning` carries backend advisories (e.g. log storage degraded) that
/// the UI surfaces as an informational banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerLogs {
    pub container_id: String,
    #[serde(default)]
    pub logs: Vec<LogEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// ---------------------------------------------------------------------------
// Hierarchical behavior tree
// ---------------------------------------------------------------------------

/// One node of a container's hierarchical behavior tree.
///
/// `events_count` is the count of events attributed *directly* to this
/// node. The backend does not guarantee that a parent's count is the sum
/// of its descendants, so consumers must not aggregate client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HbtNode {
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub events_count: u64,
    #[serde(default)]
    pub children: Vec<HbtNode>,
}

impl HbtNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Response envelope of `/hbt/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HbtSnapshot {
    pub container_id: String,
    pub hbt_structure: HbtNode,
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

/// Event rate attributed to one log priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRate {
    pub priority: String,
    pub value: f64,
}

/// Event rate attributed to one rule category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRate {
    pub category: String,
    pub value: f64,
}

/// Pipeline stage totals (logs → alerts → incidents) for the overview
/// funnel. The backend may omit this object entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelStats {
    #[serde(default)]
    pub logs: u64,
    #[serde(default)]
    pub alerts: u64,
    #[serde(default)]
    pub incidents: u64,
}

/// Aggregate snapshot from `/overview`.
///
/// Read whole on every refresh tick and fully replaced, never merged
/// with a previous snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewMetrics {
    pub total_events_rate: f64,
    #[serde(default)]
    pub priority_distribution: Vec<PriorityRate>,
    #[serde(default)]
    pub category_distribution: Vec<CategoryRate>,
    pub active_containers_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funnel_stats: Option<FunnelStats>,
}

// ---------------------------------------------------------------------------
// Analyzer configuration
// ---------------------------------------------------------------------------

/// LLM analyzer configuration, read and written via `/config/llm`.
///
/// All three fields are required; a save with any of them empty must be
/// rejected as a whole (no partial save).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

impl LlmConfig {
    /// Names of required fields that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.endpoint.trim().is_empty() {
            missing.push("endpoint");
        }
        if self.model.trim().is_empty() {
            missing.push("model");
        }
        if self.api_key.trim().is_empty() {
            missing.push("api_key");
        }
        missing
    }

    /// True when every required field is present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_decodes_with_all_optional_fields_absent() {
        let json = r#"{
            "container_id": "web-1",
            "timestamp": "2024-05-01T12:00:00Z",
            "threat_score": 0.87
        }"#;

        let incident: Incident = serde_json::from_str(json).expect("minimal incident decodes");
        assert!(incident.is_pending());
        assert_eq!(incident.cluster_id, None);
        assert_eq!(incident.row_key(), "web-1-2024-05-01T12:00:00Z-");
    }

    #[test]
    fn incident_with_empty_analysis_is_still_pending() {
        let json = r#"{
            "container_id": "web-1",
            "timestamp": "2024-05-01T12:00:00Z",
            "threat_score": 0.5,
            "analysis": "  "
        }"#;

        let incident: Incident = serde_json::from_str(json).expect("incident decodes");
        assert!(incident.is_pending());
    }

    #[test]
    fn incident_with_analysis_is_not_pending() {
        let json = r#"{
            "container_id": "web-1",
            "timestamp": "2024-05-01T12:00:00Z",
            "threat_score": 0.5,
            "analysis": "Likely crypto-miner activity."
        }"#;

        let incident: Incident = serde_json::from_str(json).expect("incident decodes");
        assert!(!incident.is_pending());
    }

    #[test]
    fn log_priority_unknown_string_does_not_fail_decode() {
        let json = r#"{
            "timestamp": "2024-05-01T12:00:00Z",
            "rule": "Terminal shell in container",
            "priority": "EMERGENCY",
            "output": "...",
            "source": "syscall",
            "tags": ["shell", "container"]
        }"#;

        let event: LogEvent = serde_json::from_str(json).expect("log event decodes");
        assert_eq!(event.priority, LogPriority::Unknown);
        assert_eq!(event.tags.len(), 2);
    }

    #[test]
    fn log_priority_round_trips_known_values() {
        for name in ["Critical", "Error", "Warning", "Notice", "Info", "Debug"] {
            let priority = LogPriority::from(name.to_string());
            assert_eq!(priority.as_str(), name);
        }
        assert!(LogPriority::Critical.rank() < LogPriority::Debug.rank());
    }

    #[test]
    fn hbt_node_defaults_missing_count_and_children() {
        let json = r#"{"name": "root"}"#;
        let node: HbtNode = serde_json::from_str(json).expect("bare node decodes");
        assert_eq!(node.events_count, 0);
        assert!(node.is_leaf());
        assert_eq!(node.node_type, "");
    }

    #[test]
    fn hbt_node_type_uses_wire_name() {
        let json = r#"{
            "name": "proc:bash",
            "type": "process",
            "events_count": 7,
            "children": []
        }"#;
        let node: HbtNode = serde_json::from_str(json).expect("node decodes");
        assert_eq!(node.node_type, "process");
        assert_eq!(node.events_count, 7);
    }

    #[test]
    fn overview_tolerates_missing_funnel_stats() {
        let json = r#"{
            "total_events_rate": 12.5,
            "priority_distribution": [{"priority": "Warning", "value": 3.0}],
            "category_distribution": [],
            "active_containers_count": 4
        }"#;
        let overview: OverviewMetrics = serde_json::from_str(json).expect("overview decodes");
        assert!(overview.funnel_stats.is_none());
        assert_eq!(overview.active_containers_count, 4);
    }

    #[test]
    fn alert_row_key_is_composite() {
        let alert = AlertRecord {
            container_id: "c1".into(),
            timestamp: "2024-05-01T12:00:00Z".into(),
            category: "filesystem".into(),
            reason: "write below etc".into(),
            evt_type: "openat".into(),
            proc_name: "bash".into(),
            fd_name: "/etc/passwd".into(),
            output: "...".into(),
        };
        assert_eq!(
            alert.row_key(),
            "c1-2024-05-01T12:00:00Z-openat-bash-/etc/passwd"
        );
    }

    #[test]
    fn llm_config_reports_missing_required_fields() {
        let config = LlmConfig {
            endpoint: "https://api.example.com".into(),
            model: "".into(),
            api_key: "  ".into(),
        };
        assert!(!config.is_complete());
        assert_eq!(config.missing_fields(), vec!["model", "api_key"]);
    }

    #[test]
    fn container_last_seen_converts_to_utc() {
        let container = ContainerSummary {
            id: "c1".into(),
            name: "web".into(),
            last_seen: 1_714_567_890.0,
            event_rate: 1.5,
        };
        let ts = container.last_seen_utc().expect("timestamp in range");
        assert_eq!(ts.timestamp(), 1_714_567_890);
    }
}
