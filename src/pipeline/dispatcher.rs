use crate::sink::traits::Sink;
use crate::source::record::ChatRecord;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, warn};

/// One payload-sized batch of rendered record lines.
#[derive(Debug, Clone)]
pub struct DeliveryUnit {
    pub text: String,
    pub lines: usize,
}

/// Outcome of one delivery pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeliveryReport {
    pub units_sent: usize,
    pub units_failed: usize,
    pub records_delivered: usize,
    pub truncated_lines: usize,
    pub error: Option<String>,
}

/// Formats accepted records into size-bounded delivery units and sends them
/// in order, paced to respect the sink's rate limits.
pub struct Dispatcher {
    unit_limit: usize,
    pacing: Duration,
}

impl Dispatcher {
    pub fn new(unit_limit: usize, pacing: Duration) -> Self {
        Self { unit_limit, pacing }
    }

    /// Render one record as a chat line.
    pub fn render_line(record: &ChatRecord, markup: bool) -> String {
        let time = record.timestamp.format("%H:%M");
        if markup {
            format!("{} - **{}**: {}", time, record.author, record.message)
        } else {
            format!("{} - {}: {}", time, record.author, record.message)
        }
    }

    /// Pack rendered lines greedily into units no longer than the limit,
    /// counted in characters. A single line longer than the limit alone is
    /// truncated to fit, never dropped.
    pub fn pack(&self, lines: Vec<String>) -> (Vec<DeliveryUnit>, usize) {
        let mut units = Vec::new();
        let mut truncated = 0;

        let mut current = String::new();
        let mut current_chars = 0usize;
        let mut current_lines = 0usize;

        for line in lines {
            let mut line = line;
            let mut line_chars = line.chars().count();

            if line_chars > self.unit_limit {
                line = line.chars().take(self.unit_limit).collect();
                line_chars = self.unit_limit;
                truncated += 1;
                warn!(limit = self.unit_limit, "Truncated overlong record line");
            }

            if current_lines == 0 {
                current = line;
                current_chars = line_chars;
                current_lines = 1;
            } else if current_chars + 1 + line_chars <= self.unit_limit {
                current.push('\n');
                current.push_str(&line);
                current_chars += 1 + line_chars;
                current_lines += 1;
            } else {
                units.push(DeliveryUnit {
                    text: current,
                    lines: current_lines,
                });
                current = line;
                current_chars = line_chars;
                current_lines = 1;
            }
        }

        if current_lines > 0 {
            units.push(DeliveryUnit {
                text: current,
                lines: current_lines,
            });
        }

        (units, truncated)
    }

    /// Send the rendered records to the sink, one unit at a time, strictly
    /// in order. The first failed send drops the remainder of the batch so
    /// the visible log never reorders; nothing is retried.
    pub async fn deliver(&self, sink: &dyn Sink, records: &[ChatRecord]) -> DeliveryReport {
        let markup = sink.supports_markup();
        let lines: Vec<String> = records
            .iter()
            .map(|r| Self::render_line(r, markup))
            .collect();

        let (units, truncated) = self.pack(lines);
        let total = units.len();

        let mut report = DeliveryReport {
            truncated_lines: truncated,
            ..Default::default()
        };

        for (index, unit) in units.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }

            match sink.send(&unit.text).await {
                Ok(()) => {
                    debug!(unit = index + 1, total, lines = unit.lines, "Sent delivery unit");
                    report.units_sent += 1;
                    report.records_delivered += unit.lines;
                }
                Err(e) => {
                    report.units_failed = total - index;
                    report.error = Some(e.to_string());
                    error!(
                        unit = index + 1,
                        total,
                        error = %e,
                        "Send failed, dropping remainder of batch"
                    );
                    break;
                }
            }
        }

        report
    }
}
