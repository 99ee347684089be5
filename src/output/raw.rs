use std::fmt::Write as _;

use tracing::warn;

use super::{DisplayEvent, DisplayEventKind, OutputSink};
use crate::stats::Summary;

/// Simple stdout line-by-line output, pipe-friendly.
pub struct RawSink {
    summary_only: bool,
}

impl RawSink {
    pub fn new(summary_only: bool) -> Self {
        Self { summary_only }
    }
}

impl OutputSink for RawSink {
    fn handle_event(&mut self, event: &DisplayEvent) {
        if let Some(line) = format_event(event, self.summary_only) {
            println!("{line}");
        }
    }

    fn shutdown(&mut self, summary: &Summary) {
        print!("{}", format_summary(summary));
    }
}

fn format_event(event: &DisplayEvent, summary_only: bool) -> Option<String> {
    let time = event.wall_time.format("%H:%M:%S%.3f");
    let src = event.source_id;

    match &event.kind {
        DisplayEventKind::Statement { pos, fingerprint } => {
            if summary_only {
                return None;
            }
            Some(format!(
                "{time} [src:{src}] {:>5} {:<24} {}",
                pos.line, fingerprint.statement_type, fingerprint.fingerprint
            ))
        }
        DisplayEventKind::SourceOpened { name } => {
            Some(format!("{time} [src:{src}]       ++ {name}"))
        }
        DisplayEventKind::SourceClosed { name, statements } => {
            Some(format!("{time} [src:{src}]       -- {name} ({statements} statements)"))
        }
        DisplayEventKind::Warning(msg) => {
            warn!("{msg}");
            None
        }
    }
}

fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let rate = summary
        .statements_per_sec
        .map(|r| format!(", {r:.1}/s"))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "\n{} statements, {} fingerprints{rate}",
        summary.total_statements, summary.distinct_fingerprints
    );

    if !summary.by_type.is_empty() {
        let _ = writeln!(out, "\nBy type:");
        for (tag, count) in &summary.by_type {
            let _ = writeln!(out, "  {tag:<28} {count:>8}");
        }
    }

    if !summary.top.is_empty() {
        let _ = writeln!(out, "\nTop fingerprints:");
        for q in &summary.top {
            let _ = writeln!(
                out,
                "  {:>8}  {:<24} {}",
                q.count, q.statement_type, q.fingerprint
            );
        }
    }
    out
}
