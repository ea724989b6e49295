//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `kinesis_producer` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Reading newline-delimited records from a file or stdin
//! - Closing the producer at end of input or on Ctrl-C
//!
//! All batching, retry and dead-letter logic lives in the library crate.

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};

use kinesis_producer::initialization::init_logger_with;
use kinesis_producer::{Cli, DryRunClient, FlushEvent, Producer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    match run(cli).await {
        Ok((records, dead_lettered)) => {
            println!(
                "✅ Put {} record{} ({} dead-lettered)",
                records,
                if records == 1 { "" } else { "s" },
                dead_lettered
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("kinesis_producer error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<(usize, usize)> {
    let mut builder = Producer::builder(cli.producer_config()).on_flush(|event: FlushEvent| {
        log::info!(
            "Flushed {} records at {} (last partition key {})",
            event.count,
            event.timestamp.to_rfc3339(),
            event.partition_key
        );
    });
    if cli.dry_run {
        builder = builder.client(Arc::new(DryRunClient::new()));
    }
    let producer: Producer = builder.build().await.context("Failed to start producer")?;

    let input: Box<dyn AsyncRead + Unpin + Send> = if cli.reads_stdin() {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(
            tokio::fs::File::open(&cli.file)
                .await
                .with_context(|| format!("Failed to open {}", cli.file.display()))?,
        )
    };
    let mut lines = BufReader::new(input).lines();

    // Ctrl-C stops reading; whatever is queued is still flushed by close()
    let read_result = tokio::select! {
        result = put_lines(&producer, &mut lines, cli.partition_key.as_deref()) => result,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted, flushing queued records before exit");
            Ok(())
        }
    };

    let close_result = producer.close().await;
    let stats = producer.stats();
    log::debug!(
        "Producer statistics: {}",
        serde_json::to_string(&stats).unwrap_or_default()
    );

    read_result?;
    close_result.context("Failed to flush queued records")?;
    Ok((stats.records_enqueued, stats.records_dead_lettered))
}

async fn put_lines<R>(
    producer: &Producer,
    lines: &mut Lines<R>,
    partition_key: Option<&str>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.is_empty() {
            continue;
        }
        producer.put(line, None, partition_key)?;
    }
    Ok(())
}
