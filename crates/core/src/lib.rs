//! Domain types shared across the vigil dashboard.
//!
//! Everything here mirrors the telemetry backend's JSON wire contract:
//! container summaries, alert records, security log events, derived
//! incidents, hierarchical behavior tree (HBT) snapshots, overview
//! metrics, and the LLM analyzer configuration.

pub mod types;
pub mod window;

pub use types::{
    AlertRecord, CategoryRate, ContainerAlerts, ContainerLogs, ContainerSummary,
    FunnelStats, HbtNode, HbtSnapshot, Incident, LlmConfig, LogEvent, LogPriority,
    OverviewMetrics, PriorityRate,
};
pub use window::TimeWindow;
