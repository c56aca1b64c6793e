use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Daily window must cover at least one day")]
    EmptyWindow,

    #[error("Daily window of {days} days exceeds the maximum of {max}")]
    WindowTooLarge { days: u32, max: u32 },
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
