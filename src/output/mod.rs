pub mod json;
pub mod raw;

use sqlfinger::FingerPrint;

use crate::stats::{SourcePos, Summary};

/// Event after normalization, ready for display.
#[derive(Clone, Debug)]
pub struct DisplayEvent {
    pub wall_time: chrono::DateTime<chrono::Local>,
    pub source_id: u64,
    pub kind: DisplayEventKind,
}

#[derive(Clone, Debug)]
pub enum DisplayEventKind {
    Statement {
        pos: SourcePos,
        fingerprint: FingerPrint,
    },
    SourceOpened {
        name: String,
    },
    SourceClosed {
        name: String,
        statements: u64,
    },
    Warning(String),
}

/// Processes display events.
pub trait OutputSink: Send + 'static {
    fn handle_event(&mut self, event: &DisplayEvent);
    fn shutdown(&mut self, summary: &Summary);
}
