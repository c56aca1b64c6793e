use serde::{Deserialize, Serialize};
use std::fmt;

/// Order lifecycle status
///
/// ```text
/// PENDING ──► OPEN ──► { FILLED | PARTIALLY_FILLED | CANCELLED | FAILED | EXPIRED }
///    └──────────────► { FILLED | PARTIALLY_FILLED | CANCELLED | FAILED | EXPIRED }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Recorded but not yet acknowledged (live orders awaiting the gateway)
    Pending,
    /// Resting, no fill yet
    Open,
    /// Completely filled
    Filled,
    /// Some size filled, remainder still working
    PartiallyFilled,
    /// Cancelled by the user
    Cancelled,
    /// Rejected or failed upstream
    Failed,
    /// Expired (GTD)
    Expired,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Failed
                | OrderStatus::Expired
        )
    }

    /// Returns true if the order is still working
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Open | OrderStatus::PartiallyFilled
        )
    }

    /// Cancellation is only legal before any fill
    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Open)
    }

    /// Monotonic lifecycle: no transition ever leads back to PENDING or OPEN
    /// from a later state
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            Pending => !matches!(next, Pending),
            Open => !matches!(next, Pending | Open),
            PartiallyFilled => matches!(next, Filled | PartiallyFilled | Expired),
            Filled | Cancelled | Failed | Expired => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Open => "OPEN",
            OrderStatus::Filled => "FILLED",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Expired => "EXPIRED",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [
            OrderStatus::Filled,
            OrderStatus::Cancelled,
            OrderStatus::Failed,
            OrderStatus::Expired,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(OrderStatus::Open));
            assert!(!terminal.can_transition_to(OrderStatus::Filled));
        }
    }

    #[test]
    fn test_no_transition_back_to_open() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Open));
        assert!(!OrderStatus::Open.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::PartiallyFilled.can_transition_to(OrderStatus::Open));
        assert!(!OrderStatus::Filled.can_transition_to(OrderStatus::Open));
    }

    #[test]
    fn test_partial_fill_can_complete() {
        assert!(OrderStatus::PartiallyFilled.can_transition_to(OrderStatus::Filled));
        assert!(!OrderStatus::PartiallyFilled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_cancellable_states() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Open.is_cancellable());
        assert!(!OrderStatus::PartiallyFilled.is_cancellable());
        assert!(!OrderStatus::Filled.is_cancellable());
    }
}
