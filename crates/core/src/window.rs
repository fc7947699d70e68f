//! Trailing time windows for alert and incident queries.

use serde::{Deserialize, Serialize};

/// A trailing time span, in seconds, used to filter alerts/incidents.
///
/// Zero is the backend's sentinel for "all time" (no time filter), which
/// is distinct from omitting the parameter entirely: callers must send
/// `window_seconds=0` verbatim when this is [`TimeWindow::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeWindow(u32);

impl TimeWindow {
    /// The unbounded "all time" window.
    pub const ALL: TimeWindow = TimeWindow(0);

    /// The windows offered by the dashboard's filter bars.
    pub const PRESETS: [TimeWindow; 4] = [
        TimeWindow::minutes(5),
        TimeWindow::minutes(15),
        TimeWindow::minutes(30),
        TimeWindow::ALL,
    ];

    pub const fn seconds(secs: u32) -> Self {
        TimeWindow(secs)
    }

    pub const fn minutes(mins: u32) -> Self {
        TimeWindow(mins * 60)
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    pub fn is_all_time(&self) -> bool {
        self.0 == 0
    }

    /// Short display label, e.g. `5m` or `All Time`.
    pub fn label(&self) -> String {
        if self.is_all_time() {
            "All Time".to_string()
        } else if self.0 % 3600 == 0 {
            format!("{}h", self.0 / 3600)
        } else if self.0 % 60 == 0 {
            format!("{}m", self.0 / 60)
        } else {
            format!("{}s", self.0)
        }
    }
}

impl Default for TimeWindow {
    /// The dashboard's default filter window (5 minutes).
    fn default() -> Self {
        TimeWindow::minutes(5)
    }
}
