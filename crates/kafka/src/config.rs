use std::sync::Arc;

use processing_shim::{HttpProcessor, Processor, ProcessorConfig};
use rdkafka::config::ClientConfig;

use crate::error::{Error, Result};

/// Configuration for [`crate::Writer`]
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Kafka brokers
    pub brokers: Vec<String>,
    /// Topic used for messages that do not name one
    pub topic: String,
    /// Local delivery timeout in milliseconds
    pub message_timeout_ms: String,
    /// Run every message through the processor before sending
    pub enable_processing: bool,
    /// Processor settings; read from the environment when `None`
    pub processor: Option<ProcessorConfig>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            topic: "".to_string(),
            message_timeout_ms: "5000".to_string(),
            enable_processing: false,
            processor: None,
        }
    }
}

/// Configuration for [`crate::Reader`]
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Kafka brokers
    pub brokers: Vec<String>,
    /// Consumer group ID
    pub group_id: String,
    /// Topics to subscribe to
    pub topics: Vec<String>,
    /// Auto offset reset strategy ("earliest" or "latest")
    ///
    /// Only applies when the group has no committed offsets.
    pub auto_offset_reset: String,
    /// Session timeout in milliseconds
    pub session_timeout_ms: String,
    /// Run every fetched message through the processor
    pub enable_processing: bool,
    /// Processor settings; read from the environment when `None`
    pub processor: Option<ProcessorConfig>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            group_id: "kafkacat-shim".to_string(),
            topics: Vec::new(),
            auto_offset_reset: "latest".to_string(),
            session_timeout_ms: "6000".to_string(),
            enable_processing: false,
            processor: None,
        }
    }
}

pub(crate) fn client_config(brokers: &[String]) -> Result<ClientConfig> {
    if brokers.is_empty() {
        return Err(Error::InvalidConfig("at least one broker is required".to_string()));
    }

    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", brokers.join(","));
    Ok(config)
}

/// Build the processor handle for a client, or `None` when processing is off.
pub(crate) fn build_processor(
    enable_processing: bool,
    config: Option<&ProcessorConfig>,
) -> Result<Option<Arc<dyn Processor>>> {
    if !enable_processing {
        return Ok(None);
    }

    let processor = match config {
        Some(config) => HttpProcessor::new(config),
        None => HttpProcessor::from_env(),
    }
    .map_err(|e| Error::InvalidConfig(format!("unable to create processor client: {e}")))?;

    Ok(Some(Arc::new(processor)))
}
