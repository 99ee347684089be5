use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One statement per line; raw bytes so GBK or Latin1 input survives.
pub enum IngestMessage {
    SourceOpened {
        source_id: u64,
        name: String,
    },
    Statement {
        source_id: u64,
        line: u64,
        sql: Vec<u8>,
    },
    SourceClosed {
        source_id: u64,
    },
}

static SOURCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Read every path in order, or stdin when `paths` is empty.
pub async fn read_sources(paths: Vec<PathBuf>, tx: mpsc::Sender<IngestMessage>) -> anyhow::Result<()> {
    if paths.is_empty() {
        return read_source("<stdin>".to_string(), tokio::io::stdin(), &tx).await;
    }

    for path in paths {
        let file = File::open(&path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        read_source(path.display().to_string(), file, &tx).await?;
    }
    Ok(())
}

async fn read_source<R>(name: String, reader: R, tx: &mpsc::Sender<IngestMessage>) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
{
    let source_id = SOURCE_COUNTER.fetch_add(1, Ordering::Relaxed);
    debug!("Source {source_id} opened: {name}");
    if tx
        .send(IngestMessage::SourceOpened {
            source_id,
            name: name.clone(),
        })
        .await
        .is_err()
    {
        return Ok(());
    }

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(4096);
    let mut line = 0u64;
    let mut sent = 0u64;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .with_context(|| format!("failed to read {name}"))?;
        if n == 0 {
            break;
        }
        line += 1;

        let sql = trim_line(&buf);
        if sql.is_empty() {
            continue;
        }

        let msg = IngestMessage::Statement {
            source_id,
            line,
            sql: sql.to_vec(),
        };
        if tx.send(msg).await.is_err() {
            // Receiver gone, nothing left to do.
            return Ok(());
        }
        sent += 1;
    }

    info!("{name}: {sent} statements in {line} lines");
    let _ = tx.send(IngestMessage::SourceClosed { source_id }).await;
    Ok(())
}

/// Strip the line terminator and any blank padding around the statement.
fn trim_line(line: &[u8]) -> &[u8] {
    let start = line.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let end = line.len() - line[start..].iter().rev().take_while(|b| b.is_ascii_whitespace()).count();
    &line[start..end]
}
