//! Processing shim for Kafka produce/consume paths.
//!
//! Wraps each message handled by a Kafka client with an optional call to an
//! external processor that may inspect and rewrite the payload.
//!
//! Features:
//!
//! - Audience resolution: derive the (component, operation) identity presented
//!   to the processor from defaults, the message topic, and per-call overrides
//! - Runtime config: optional per-call overrides carried in a [`CallContext`]
//!   next to the cancellation token
//! - Reconciliation: map the processor response back onto the message, or onto
//!   an error when strict errors are enabled
//! - Diagnostic sinks: fire-and-forget line writers for processor failures

/// Audience identity presented to the processor
pub mod audience;
pub mod error;
pub mod http;
pub mod message;

/// The shim entry point called once per message by the client wrapper
pub mod process;
pub mod processor;

/// Per-call overrides and the call context that carries them
pub mod runtime_config;
pub mod sink;

#[cfg(test)]
mod tests;

pub use audience::{
    generate_audience, Audience, AudienceDefaults, AudienceOverride, OperationType,
    DEFAULT_COMPONENT_NAME, DEFAULT_OPERATION_NAME,
};
pub use error::{Error, Result};
pub use http::{HttpProcessor, ProcessorConfig};
pub use message::Message;
pub use process::{process, process_with_defaults};
pub use processor::{ProcessRequest, ProcessResponse, Processor};
pub use runtime_config::{extract, inject, inject_with_defaults, CallContext, RuntimeConfig};
pub use sink::{DiagnosticSink, TracingSink, WriterSink};
