use serde::Serialize;
use tracing::warn;

use super::{DisplayEvent, DisplayEventKind, OutputSink};
use crate::stats::Summary;

/// One JSON object per line: a record per statement, then the summary.
pub struct JsonSink {
    summary_only: bool,
}

#[derive(Serialize)]
struct StatementRecord<'a> {
    time: String,
    source: &'a str,
    line: u64,
    statement_type: &'static str,
    fingerprint: &'a str,
}

impl JsonSink {
    pub fn new(summary_only: bool) -> Self {
        Self { summary_only }
    }
}

impl OutputSink for JsonSink {
    fn handle_event(&mut self, event: &DisplayEvent) {
        match &event.kind {
            DisplayEventKind::Statement { pos, fingerprint } if !self.summary_only => {
                let record = StatementRecord {
                    time: event.wall_time.to_rfc3339(),
                    source: &pos.source,
                    line: pos.line,
                    statement_type: fingerprint.statement_type.as_str(),
                    fingerprint: &fingerprint.fingerprint,
                };
                emit(&record);
            }
            DisplayEventKind::Warning(msg) => warn!("{msg}"),
            _ => {}
        }
    }

    fn shutdown(&mut self, summary: &Summary) {
        emit(summary);
    }
}

fn emit<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!("Failed to encode record: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfinger::{generate_fingerprint, Charset};

    #[test]
    fn test_statement_record_shape() {
        let fp = generate_fingerprint("SELECT * FROM t WHERE id IN (1,2,3)", Charset::Utf8);
        let record = StatementRecord {
            time: "2024-01-01T00:00:00+00:00".to_string(),
            source: "q.log",
            line: 4,
            statement_type: fp.statement_type.as_str(),
            fingerprint: &fp.fingerprint,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source"], "q.log");
        assert_eq!(json["line"], 4);
        assert_eq!(json["statement_type"], "SQLCOM_SELECT");
        assert_eq!(json["fingerprint"], "SELECT * FROM t WHERE id IN(1)");
    }
}
