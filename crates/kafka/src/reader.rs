use std::sync::Arc;

use processing_shim::{CallContext, DiagnosticSink, Message, OperationType, Processor};
use rdkafka::consumer::{Consumer as RdkafkaConsumer, StreamConsumer as RdkafkaStreamConsumer};
use rdkafka::message::Message as RdkafkaMessage;

use crate::config::{build_processor, client_config, ReaderConfig};
use crate::error::{Error, Result};

/// Kafka consumer that runs each fetched message through the processing shim.
///
/// Offsets are committed automatically by the underlying consumer.
pub struct Reader {
    consumer: RdkafkaStreamConsumer,
    processor: Option<Arc<dyn Processor>>,
    logger: Option<Arc<dyn DiagnosticSink>>,
    error_logger: Option<Arc<dyn DiagnosticSink>>,
    config: ReaderConfig,
}

impl Reader {
    /// Create a reader and subscribe it to `config.topics`.
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let processor = build_processor(config.enable_processing, config.processor.as_ref())?;
        Self::build(config, processor)
    }

    /// Create a reader that uses `processor` regardless of
    /// `config.enable_processing`.
    pub fn with_processor(config: ReaderConfig, processor: Arc<dyn Processor>) -> Result<Self> {
        Self::build(config, Some(processor))
    }

    fn build(config: ReaderConfig, processor: Option<Arc<dyn Processor>>) -> Result<Self> {
        if config.topics.is_empty() {
            return Err(Error::InvalidConfig("at least one topic is required".to_string()));
        }

        let consumer: RdkafkaStreamConsumer = client_config(&config.brokers)?
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("session.timeout.ms", &config.session_timeout_ms)
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| Error::Consumer(format!("Failed to create consumer: {e}")))?;

        let topics: Vec<&str> = config.topics.iter().map(String::as_str).collect();
        consumer
            .subscribe(&topics)
            .map_err(|e| Error::Consumer(format!("Failed to subscribe to topics: {e}")))?;

        tracing::info!(
            "Created reader for topic(s) {:?} in group '{}' (processing {})",
            config.topics,
            config.group_id,
            if processor.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            consumer,
            processor,
            logger: None,
            error_logger: None,
            config,
        })
    }

    /// Sink for informational diagnostics from the shim.
    pub fn set_logger(&mut self, logger: Arc<dyn DiagnosticSink>) {
        self.logger = Some(logger);
    }

    /// Sink for processor error diagnostics.
    pub fn set_error_logger(&mut self, error_logger: Arc<dyn DiagnosticSink>) {
        self.error_logger = Some(error_logger);
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Fetch the next message and run it through the shim.
    ///
    /// Blocks until a message arrives or `ctx` is cancelled.
    pub async fn read_message(&self, ctx: &CallContext) -> Result<Message> {
        let message = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(Error::Cancelled),
            received = self.consumer.recv() => {
                let borrowed = received
                    .map_err(|e| Error::Consumer(format!("Error receiving message: {e}")))?;
                to_message(&borrowed)
            }
        };

        tracing::debug!(
            topic = %message.topic,
            partition = ?message.partition,
            offset = ?message.offset,
            "Fetched message"
        );

        let sinks = [self.logger.as_deref(), self.error_logger.as_deref()];
        let message = processing_shim::process(
            ctx,
            self.processor.as_deref(),
            OperationType::Consumer,
            message,
            &sinks,
        )
        .await?;

        Ok(message)
    }

    /// Get the underlying consumer (for advanced use cases)
    pub fn inner(&self) -> &RdkafkaStreamConsumer {
        &self.consumer
    }
}

/// Copy a fetched Kafka message into a shim [`Message`]. A missing payload
/// becomes an empty value.
fn to_message<M: RdkafkaMessage>(msg: &M) -> Message {
    Message {
        topic: msg.topic().to_string(),
        partition: Some(msg.partition()),
        offset: Some(msg.offset()),
        key: msg.key().map(|k| k.to_vec()),
        value: msg.payload().map(|p| p.to_vec()).unwrap_or_default(),
        timestamp: msg.timestamp().to_millis(),
    }
}
