mod ingest;
mod output;
mod stats;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use sqlfinger::{Charset, Classifier, Normalizer, Strategy};
use tokio::sync::mpsc;
use tracing::info;

use ingest::IngestMessage;
use output::json::JsonSink;
use output::raw::RawSink;
use output::OutputSink;
use stats::StatsCollector;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CharsetArg {
    Latin1,
    Utf8,
    Gbk,
    /// Treat input as UTF-8 when it decodes, GBK otherwise
    Auto,
}

impl From<CharsetArg> for Charset {
    fn from(arg: CharsetArg) -> Self {
        match arg {
            CharsetArg::Latin1 => Charset::Latin1,
            CharsetArg::Utf8 => Charset::Utf8,
            CharsetArg::Gbk => Charset::Gbk,
            CharsetArg::Auto => Charset::Unspecified,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Precise,
    Fast,
}

impl From<ModeArg> for Strategy {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Precise => Strategy::Precise,
            ModeArg::Fast => Strategy::Fast,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Raw,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sqlfinger", about = "Fingerprint and classify MySQL statements, one per line")]
struct Cli {
    /// Files to read; stdin when none are given
    files: Vec<PathBuf>,

    /// Client charset of the input
    #[arg(short = 'c', long = "charset", value_enum, default_value = "auto")]
    charset: CharsetArg,

    /// Normalizer: precise byte scanner or regex fast path
    #[arg(short = 'm', long = "mode", value_enum, default_value = "precise")]
    mode: ModeArg,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "raw")]
    format: Format,

    /// Number of fingerprints in the summary
    #[arg(short = 't', long = "top", default_value = "10")]
    top: usize,

    /// Only print the summary
    #[arg(short = 's', long = "summary-only")]
    summary_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the fingerprints, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sqlfinger=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let charset = Charset::from(cli.charset);
    let strategy = Strategy::from(cli.mode);
    info!(
        "sqlfinger starting: {} source(s), {strategy} mode, charset {charset}",
        cli.files.len().max(1)
    );

    let normalizer: Arc<dyn Normalizer> =
        Arc::from(strategy.build(charset, Arc::new(Classifier::mysql())));
    let sink: Box<dyn OutputSink> = match cli.format {
        Format::Raw => Box::new(RawSink::new(cli.summary_only)),
        Format::Json => Box::new(JsonSink::new(cli.summary_only)),
    };

    let (tx, rx) = mpsc::channel::<IngestMessage>(1024);

    let reader_handle = tokio::spawn(ingest::read_sources(cli.files, tx));
    let mut pipeline_handle = tokio::spawn(run_pipeline(rx, normalizer, sink, cli.top));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
            reader_handle.abort();
            // Dropping the sender lets the pipeline drain and print its summary.
            pipeline_handle.await?;
        }
        result = &mut pipeline_handle => {
            result?;
            reader_handle.await??;
        }
    }

    Ok(())
}

async fn run_pipeline(
    mut rx: mpsc::Receiver<IngestMessage>,
    normalizer: Arc<dyn Normalizer>,
    mut sink: Box<dyn OutputSink>,
    top: usize,
) {
    let mut stats = StatsCollector::new(normalizer);

    while let Some(msg) = rx.recv().await {
        if let Some(event) = stats.process_message(msg) {
            sink.handle_event(&event);
        }
    }

    sink.shutdown(&stats.summary(top));
}
