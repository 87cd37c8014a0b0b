use std::sync::Arc;
use std::time::Duration;

use processing_shim::{CallContext, DiagnosticSink, Message, OperationType, Processor};
use rdkafka::producer::{FutureProducer, FutureRecord};

use crate::config::{build_processor, client_config, WriterConfig};
use crate::error::{Error, Result};

const QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka producer that runs each message through the processing shim before
/// sending it.
pub struct Writer {
    producer: FutureProducer,
    processor: Option<Arc<dyn Processor>>,
    logger: Option<Arc<dyn DiagnosticSink>>,
    error_logger: Option<Arc<dyn DiagnosticSink>>,
    config: WriterConfig,
}

impl Writer {
    /// Create a writer. When processing is enabled the processor client is
    /// built from `config.processor`, or from the environment.
    pub fn new(config: WriterConfig) -> Result<Self> {
        let processor = build_processor(config.enable_processing, config.processor.as_ref())?;
        Self::build(config, processor)
    }

    /// Create a writer that uses `processor` regardless of
    /// `config.enable_processing`.
    pub fn with_processor(config: WriterConfig, processor: Arc<dyn Processor>) -> Result<Self> {
        Self::build(config, Some(processor))
    }

    fn build(config: WriterConfig, processor: Option<Arc<dyn Processor>>) -> Result<Self> {
        let producer: FutureProducer = client_config(&config.brokers)?
            .set("message.timeout.ms", &config.message_timeout_ms)
            .create()?;

        tracing::info!(
            "Created writer for {} (processing {})",
            config.brokers.join(","),
            if processor.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            producer,
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

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Process and send `messages`.
    ///
    /// All messages are processed before any is sent, so a strict processor
    /// error aborts the whole call without writing anything.
    pub async fn write_messages(&self, ctx: &CallContext, messages: Vec<Message>) -> Result<()> {
        let sinks = [self.logger.as_deref(), self.error_logger.as_deref()];

        let mut processed = Vec::with_capacity(messages.len());
        for mut message in messages {
            if message.topic.is_empty() {
                message.topic = self.config.topic.clone();
            }

            let message = processing_shim::process(
                ctx,
                self.processor.as_deref(),
                OperationType::Producer,
                message,
                &sinks,
            )
            .await?;
            processed.push(message);
        }

        for message in &processed {
            self.send(ctx, message).await?;
        }

        Ok(())
    }

    async fn send(&self, ctx: &CallContext, message: &Message) -> Result<()> {
        if message.topic.is_empty() {
            return Err(Error::InvalidConfig("message has no topic".to_string()));
        }

        let mut record = FutureRecord::<[u8], [u8]>::to(&message.topic).payload(&message.value[..]);
        if let Some(key) = &message.key {
            record = record.key(&key[..]);
        }
        if let Some(partition) = message.partition {
            record = record.partition(partition);
        }

        // Once enqueued the record is delivered regardless of cancellation,
        // so the context is only checked before handing it to the producer.
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let (partition, offset) = self
            .producer
            .send(record, QUEUE_TIMEOUT)
            .await
            .map_err(|(err, _)| Error::Kafka(err))?;
        tracing::debug!(
            topic = %message.topic,
            partition,
            offset,
            "Message delivered"
        );

        Ok(())
    }

    /// Wait for in-flight messages to be delivered.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        use rdkafka::producer::Producer;

        self.producer.flush(timeout)?;
        Ok(())
    }
}
