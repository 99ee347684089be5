use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use sqlfinger::{FingerPrint, Normalizer, StatementType};

use crate::ingest::IngestMessage;
use crate::output::{DisplayEvent, DisplayEventKind};

const SAMPLE_LEN: usize = 120;

pub struct StatsCollector {
    normalizer: Arc<dyn Normalizer>,
    sources: HashMap<u64, SourceState>,
    pub fingerprints: HashMap<String, QueryAggregates>,
    pub by_type: BTreeMap<StatementType, u64>,
    pub total_statements: u64,
    pub first_statement_at: Option<Instant>,
    pub last_statement_at: Option<Instant>,
}

struct SourceState {
    name: String,
    statements: u64,
}

/// Where a statement came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourcePos {
    pub source: String,
    pub line: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct QueryAggregates {
    pub fingerprint: String,
    pub statement_type: StatementType,
    pub count: u64,
    /// First raw statement seen with this fingerprint, truncated.
    pub sample: String,
    pub first_seen: SourcePos,
    pub last_seen: SourcePos,
}

#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub total_statements: u64,
    pub distinct_fingerprints: usize,
    pub statements_per_sec: Option<f64>,
    pub by_type: BTreeMap<String, u64>,
    pub top: Vec<QueryAggregates>,
}

impl StatsCollector {
    pub fn new(normalizer: Arc<dyn Normalizer>) -> Self {
        Self {
            normalizer,
            sources: HashMap::new(),
            fingerprints: HashMap::new(),
            by_type: BTreeMap::new(),
            total_statements: 0,
            first_statement_at: None,
            last_statement_at: None,
        }
    }

    pub fn process_message(&mut self, msg: IngestMessage) -> Option<DisplayEvent> {
        let wall_time = chrono::Local::now();

        match msg {
            IngestMessage::SourceOpened { source_id, name } => {
                self.sources.insert(
                    source_id,
                    SourceState {
                        name: name.clone(),
                        statements: 0,
                    },
                );
                Some(DisplayEvent {
                    wall_time,
                    source_id,
                    kind: DisplayEventKind::SourceOpened { name },
                })
            }

            IngestMessage::Statement { source_id, line, sql } => {
                let now = Instant::now();
                let source = self.ensure_source(source_id);
                source.statements += 1;
                let pos = SourcePos {
                    source: source.name.clone(),
                    line,
                };

                let fp = self.normalizer.normalize(&sql);
                self.total_statements += 1;
                if self.first_statement_at.is_none() {
                    self.first_statement_at = Some(now);
                }
                self.last_statement_at = Some(now);
                *self.by_type.entry(fp.statement_type).or_insert(0) += 1;
                self.record_fingerprint(&fp, &sql, &pos);

                // U+FFFD means bytes outside literals were not UTF-8.
                let kind = if fp.fingerprint.contains('\u{FFFD}') {
                    DisplayEventKind::Warning(format!(
                        "{}:{}: non-UTF-8 bytes outside literals, check --charset",
                        pos.source, pos.line
                    ))
                } else {
                    DisplayEventKind::Statement { pos, fingerprint: fp }
                };
                Some(DisplayEvent {
                    wall_time,
                    source_id,
                    kind,
                })
            }

            IngestMessage::SourceClosed { source_id } => {
                let source = self.sources.remove(&source_id)?;
                Some(DisplayEvent {
                    wall_time,
                    source_id,
                    kind: DisplayEventKind::SourceClosed {
                        name: source.name,
                        statements: source.statements,
                    },
                })
            }
        }
    }

    fn ensure_source(&mut self, source_id: u64) -> &mut SourceState {
        self.sources.entry(source_id).or_insert_with(|| SourceState {
            name: format!("source-{source_id}"),
            statements: 0,
        })
    }

    fn record_fingerprint(&mut self, fp: &FingerPrint, sql: &[u8], pos: &SourcePos) {
        let agg = self
            .fingerprints
            .entry(fp.fingerprint.clone())
            .or_insert_with(|| QueryAggregates {
                fingerprint: fp.fingerprint.clone(),
                statement_type: fp.statement_type,
                count: 0,
                sample: truncate(&String::from_utf8_lossy(sql), SAMPLE_LEN),
                first_seen: pos.clone(),
                last_seen: pos.clone(),
            });
        agg.count += 1;
        agg.last_seen = pos.clone();
    }

    /// Statements per second between the first and last statement.
    pub fn rate(&self) -> Option<f64> {
        let (first, last) = (self.first_statement_at?, self.last_statement_at?);
        let elapsed = last.duration_since(first);
        if elapsed < Duration::from_millis(1) {
            return None;
        }
        Some(self.total_statements as f64 / elapsed.as_secs_f64())
    }

    /// Most frequent fingerprints first; ties broken by fingerprint text.
    pub fn top_queries(&self, n: usize) -> Vec<QueryAggregates> {
        let mut queries: Vec<_> = self.fingerprints.values().cloned().collect();
        queries.sort_unstable_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
        queries.truncate(n);
        queries
    }

    pub fn summary(&self, top: usize) -> Summary {
        Summary {
            total_statements: self.total_statements,
            distinct_fingerprints: self.fingerprints.len(),
            statements_per_sec: self.rate(),
            by_type: self
                .by_type
                .iter()
                .map(|(tag, count)| (tag.to_string(), *count))
                .collect(),
            top: self.top_queries(top),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfinger::{Charset, Classifier, Strategy};

    fn collector() -> StatsCollector {
        let normalizer = Strategy::Precise.build(Charset::Utf8, Arc::new(Classifier::mysql()));
        StatsCollector::new(Arc::from(normalizer))
    }

    fn statement(source_id: u64, line: u64, sql: &str) -> IngestMessage {
        IngestMessage::Statement {
            source_id,
            line,
            sql: sql.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_groups_by_fingerprint() {
        let mut stats = collector();
        stats.process_message(IngestMessage::SourceOpened {
            source_id: 1,
            name: "q.log".to_string(),
        });
        stats.process_message(statement(1, 1, "SELECT * FROM t WHERE id = 1"));
        stats.process_message(statement(1, 2, "SELECT * FROM t WHERE id = 99"));
        stats.process_message(statement(1, 3, "INSERT INTO t VALUES (1,2),(3,4)"));

        assert_eq!(stats.total_statements, 3);
        assert_eq!(stats.fingerprints.len(), 2);

        let top = stats.top_queries(10);
        assert_eq!(top[0].fingerprint, "SELECT * FROM t WHERE id = 1");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[0].sample, "SELECT * FROM t WHERE id = 1");
        assert_eq!(top[0].first_seen, SourcePos { source: "q.log".to_string(), line: 1 });
        assert_eq!(top[0].last_seen.line, 2);
        assert_eq!(stats.by_type[&StatementType::Select], 2);
        assert_eq!(stats.by_type[&StatementType::Insert], 1);
    }

    #[test]
    fn test_statement_event_carries_fingerprint() {
        let mut stats = collector();
        let event = stats.process_message(statement(7, 3, "SHOW PROCESSLIST")).unwrap();
        match event.kind {
            DisplayEventKind::Statement { pos, fingerprint } => {
                assert_eq!(pos.source, "source-7");
                assert_eq!(fingerprint.statement_type, StatementType::ShowProcesslist);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_non_utf8_outside_literals_warns() {
        let mut stats = collector();
        let event = stats
            .process_message(IngestMessage::Statement {
                source_id: 1,
                line: 1,
                sql: b"SELECT \xff FROM t".to_vec(),
            })
            .unwrap();
        assert!(matches!(event.kind, DisplayEventKind::Warning(_)));
        assert_eq!(stats.total_statements, 1);
    }

    #[test]
    fn test_source_closed_reports_count() {
        let mut stats = collector();
        stats.process_message(IngestMessage::SourceOpened {
            source_id: 2,
            name: "a.sql".to_string(),
        });
        stats.process_message(statement(2, 1, "BEGIN"));
        let event = stats
            .process_message(IngestMessage::SourceClosed { source_id: 2 })
            .unwrap();
        match event.kind {
            DisplayEventKind::SourceClosed { name, statements } => {
                assert_eq!(name, "a.sql");
                assert_eq!(statements, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(stats
            .process_message(IngestMessage::SourceClosed { source_id: 2 })
            .is_none());
    }

    #[test]
    fn test_summary_orders_and_limits() {
        let mut stats = collector();
        for line in 0..3 {
            stats.process_message(statement(1, line, "UPDATE t SET a = 5"));
        }
        stats.process_message(statement(1, 9, "DELETE FROM t"));

        let summary = stats.summary(1);
        assert_eq!(summary.total_statements, 4);
        assert_eq!(summary.distinct_fingerprints, 2);
        assert_eq!(summary.top.len(), 1);
        assert_eq!(summary.top[0].fingerprint, "UPDATE t SET a = 1");
        assert_eq!(summary.by_type["SQLCOM_UPDATE"], 3);
        assert_eq!(summary.by_type["SQLCOM_DELETE"], 1);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo", 2), "h...");
    }
}
