use chrono::{DateTime, Utc};

use crate::errors::{Result, SliError};

/// The evaluation window of a get-sli request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Parse both bounds; either one failing fails the window.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_timestamp(start)?;
        let end = parse_timestamp(end)?;
        Ok(Self { start, end })
    }

    /// Window length in whole seconds, rounded up
    pub fn duration_seconds(&self) -> i64 {
        let delta = self.end - self.start;
        let secs = delta.num_seconds();
        // subsec_nanos carries the sign of the delta
        if delta.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// PromQL range selector duration, e.g. `300s`
    pub fn duration_string(&self) -> String {
        format!("{}s", self.duration_seconds())
    }

    /// Evaluation timestamp for the instant query
    pub fn end_unix(&self) -> i64 {
        self.end.timestamp()
    }
}

/// Accepts RFC3339 or base-10 Unix epoch seconds.
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let secs: i64 = timestamp
        .parse()
        .map_err(|_| SliError::TimeParse(timestamp.to_string()))?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| SliError::TimeParse(timestamp.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_epoch() {
        let a = parse_timestamp("2019-10-21T09:11:24Z").unwrap();
        let b = parse_timestamp("1571649084").unwrap();
        assert_eq!(a, b);

        let offset = parse_timestamp("2019-10-21T11:11:24+02:00").unwrap();
        assert_eq!(offset, a);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, SliError::TimeParse(ref s) if s == "yesterday"));
    }

    #[test]
    fn end_is_parsed_independently() {
        assert!(TimeWindow::parse("1571649084", "not-a-time").is_err());
        assert!(TimeWindow::parse("not-a-time", "1571649085").is_err());
    }

    #[test]
    fn duration_rounds_up() {
        let w = TimeWindow::parse("1571649084", "1571649085").unwrap();
        assert_eq!(w.duration_string(), "1s");

        let w = TimeWindow::parse("2019-10-21T09:11:24Z", "2019-10-21T09:11:25.200Z").unwrap();
        assert_eq!(w.duration_seconds(), 2);

        let w = TimeWindow::parse("2019-10-21T09:00:00Z", "2019-10-21T09:30:00Z").unwrap();
        assert_eq!(w.duration_string(), "1800s");
        assert_eq!(w.end_unix(), 1571650200);
    }
}
