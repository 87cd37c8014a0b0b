//! `consume` command: Kafka to stdout.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use kafkacat_shim_kafka::{Reader, ReaderConfig};
use processing_shim::{CallContext, TracingSink};
use tokio_util::sync::CancellationToken;

use crate::line::format_message;
use crate::ShimOpts;

/// Arguments for the `consume` command
#[derive(Debug, Clone)]
pub struct ConsumeArgs {
    pub broker: String,
    pub group: String,
    pub topics: Vec<String>,
    pub key_delim: String,
    pub shim: ShimOpts,
}

/// Print every consumed message until cancellation. Fetch errors are logged
/// and the loop continues.
pub async fn run_consumer(args: ConsumeArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let config = ReaderConfig {
        brokers: vec![args.broker.clone()],
        group_id: args.group.clone(),
        topics: args.topics.clone(),
        auto_offset_reset: "latest".to_string(),
        enable_processing: args.shim.enable_processor,
        processor: Some(args.shim.processor_config()?),
        ..Default::default()
    };

    let mut reader = Reader::new(config).context("Failed to create reader")?;
    reader.set_error_logger(Arc::new(TracingSink));

    tracing::info!(
        "Created reader for topic(s) {:?}, using last-offset",
        args.topics
    );
    args.shim.log_runtime_config();

    let ctx = args
        .shim
        .inject(CallContext::with_cancellation(cancel.clone()));

    loop {
        match reader.read_message(&ctx).await {
            Ok(message) => {
                let mut out = std::io::stdout().lock();
                out.write_all(&format_message(&message, &args.key_delim))
                    .and_then(|_| out.write_all(b"\n"))
                    .context("Failed to write to stdout")?;
            }
            Err(e) if e.is_cancelled() => {
                tracing::info!("Detected interrupt, exiting consumer");
                break;
            }
            Err(e) => tracing::error!("Fetch error: {e}"),
        }
    }

    tracing::info!("Closing consumer");
    Ok(())
}
