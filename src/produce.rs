//! `produce` command: stdin lines to Kafka.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use kafkacat_shim_kafka::{Writer, WriterConfig};
use processing_shim::{CallContext, TracingSink};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::line::parse_line;
use crate::ShimOpts;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Arguments for the `produce` command
#[derive(Debug, Clone)]
pub struct ProduceArgs {
    pub broker: String,
    pub topic: String,
    pub partition: i32,
    pub key_delim: String,
    pub shim: ShimOpts,
}

/// Produce every non-empty stdin line until EOF or cancellation.
pub async fn run_producer(args: ProduceArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let config = WriterConfig {
        brokers: vec![args.broker.clone()],
        topic: args.topic.clone(),
        enable_processing: args.shim.enable_processor,
        processor: Some(args.shim.processor_config()?),
        ..Default::default()
    };

    let mut writer = Writer::new(config).context("Failed to create writer")?;
    writer.set_error_logger(Arc::new(TracingSink));

    tracing::info!(
        "Created writer, topic {} [partition {}]",
        args.topic,
        args.partition
    );
    args.shim.log_runtime_config();

    let stdin = BufReader::new(tokio::io::stdin());
    let produced = produce_lines(&writer, &args, stdin, &cancel).await?;

    tracing::info!("Closing after {produced} message(s)");
    writer
        .flush(FLUSH_TIMEOUT)
        .context("Failed to flush producer")?;

    Ok(())
}

/// Write each line of `input` as a message. Produce errors are logged and the
/// loop moves on; cancellation or EOF end it.
pub async fn produce_lines<R>(
    writer: &Writer,
    args: &ProduceArgs,
    input: R,
    cancel: &CancellationToken,
) -> anyhow::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut produced = 0u64;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read input")?,
        };

        let Some(line) = line else {
            break;
        };

        let Some(message) = parse_line(&line, &args.topic, args.partition, &args.key_delim) else {
            continue;
        };

        let ctx = args
            .shim
            .inject(CallContext::with_cancellation(cancel.clone()));

        match writer.write_messages(&ctx, vec![message]).await {
            Ok(()) => produced += 1,
            Err(e) if e.is_cancelled() => break,
            Err(e) => tracing::error!("Produce error: {e}"),
        }
    }

    Ok(produced)
}
