use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution semantics an order runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Fully simulated fills against live quotes
    Paper,
    /// Real orders through the order gateway
    Live,
    /// Priced on live data, never executed
    Shadow,
}

impl ExecutionMode {
    /// Shadow orders risk no capital and bypass the kill switch
    pub fn is_kill_switch_exempt(&self) -> bool {
        matches!(self, ExecutionMode::Shadow)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionMode::Paper => "PAPER",
            ExecutionMode::Live => "LIVE",
            ExecutionMode::Shadow => "SHADOW",
        };
        write!(f, "{}", s)
    }
}
