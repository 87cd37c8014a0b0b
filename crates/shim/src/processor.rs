//! Contract between the shim and the external processor.

use crate::audience::OperationType;

/// One payload submitted to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    pub component_name: String,
    pub operation_type: OperationType,
    pub operation_name: String,
    pub data: Vec<u8>,
}

/// Outcome of a processor call.
///
/// Both success variants carry the payload to use from now on; it may be
/// byte-identical to the submitted one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResponse {
    /// Processed, no rule rewrote the payload
    Unchanged { data: Vec<u8> },
    /// Processed, payload rewritten
    Transformed { data: Vec<u8> },
    /// The processor could not process the payload
    Error { message: Option<String> },
}

impl ProcessResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: Some(message.into()),
        }
    }
}

/// External service or library that inspects and optionally rewrites payloads.
///
/// Implementations report every failure, transport included, as
/// [`ProcessResponse::Error`]. The call may block on network I/O; the shim
/// races it against cancellation of the call context.
#[async_trait::async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, request: ProcessRequest) -> ProcessResponse;
}
