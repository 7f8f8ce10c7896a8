use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Trailing recency window applied both when ingesting and when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffWindow {
    length: Duration,
}

impl CutoffWindow {
    /// Negative lengths are treated as an empty window.
    pub fn new(length: Duration) -> Self {
        Self {
            length: length.max(Duration::zero()),
        }
    }

    pub fn days(days: i64) -> Self {
        Self::new(Duration::try_days(days).unwrap_or(Duration::MAX))
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    /// Earliest admitted instant for a run evaluated at `now`.
    ///
    /// Truncated to microseconds, the precision timestamps are stored at.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.length)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
            .trunc_subsecs(6)
    }

    /// Inclusive of the boundary.
    pub fn admits(published_at: DateTime<Utc>, window_start: DateTime<Utc>) -> bool {
        published_at >= window_start
    }
}

impl Default for CutoffWindow {
    fn default() -> Self {
        Self::days(60)
    }
}
