use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("regex compilation failed: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// One parsed chat entry. Timestamp precision is one minute; seconds are
/// discarded at parse time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRecord {
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub message: String,
}

/// Result of one parse pass over raw log text.
#[derive(Debug, Default)]
pub struct Parsed {
    /// Records in order of appearance, which is chronological by
    /// construction of the log format.
    pub records: Vec<ChatRecord>,
    /// Matched lines whose timestamp failed to parse.
    pub malformed: usize,
}

// Log line shape:
// [06-01-24 09:15:00.000][info] Got message:ChatMessage{chat=General, author='Ann', text='hi'}.
const LINE_PATTERN: &str = r"\[(\d{2}-\d{2}-\d{2}) (\d{2}:\d{2}):\d{2}\.\d{3}\]\[info\] Got message:ChatMessage\{chat=[^,]+, author='([^']+)', text='([^']+)'\}\.";

const TIMESTAMP_FORMAT: &str = "%m-%d-%y %H:%M";

pub struct RecordParser {
    pattern: Regex,
}

impl RecordParser {
    pub fn new() -> Result<Self, PatternError> {
        Ok(Self {
            pattern: Regex::new(LINE_PATTERN)?,
        })
    }

    /// Extract chat records from raw log text.
    ///
    /// Lines that do not match the grammar are skipped silently; logs
    /// interleave unrelated entries. A matched line whose timestamp does not
    /// parse is counted and logged, never fatal. Pure with respect to any
    /// delivery state.
    pub fn parse(&self, text: &str) -> Parsed {
        let mut parsed = Parsed::default();

        for caps in self.pattern.captures_iter(text) {
            let raw_timestamp = format!("{} {}", &caps[1], &caps[2]);

            match NaiveDateTime::parse_from_str(&raw_timestamp, TIMESTAMP_FORMAT) {
                Ok(naive) => parsed.records.push(ChatRecord {
                    timestamp: Utc.from_utc_datetime(&naive),
                    author: caps[3].to_string(),
                    message: caps[4].to_string(),
                }),
                Err(e) => {
                    parsed.malformed += 1;
                    warn!(
                        timestamp = %raw_timestamp,
                        error = %e,
                        "Dropping matched line with unparsable timestamp"
                    );
                }
            }
        }

        parsed
    }
}
