use crate::audience::{AudienceDefaults, OperationType};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::processor::{ProcessRequest, ProcessResponse, Processor};
use crate::runtime_config::{extract, CallContext};
use crate::sink::{self, DiagnosticSink};

/// Run `message` through the processor, using the built-in audience defaults.
///
/// See [`process_with_defaults`].
pub async fn process(
    ctx: &CallContext,
    processor: Option<&dyn Processor>,
    operation_type: OperationType,
    message: Message,
    sinks: &[Option<&dyn DiagnosticSink>],
) -> Result<Message> {
    process_with_defaults(
        ctx,
        processor,
        &AudienceDefaults::default(),
        operation_type,
        message,
        sinks,
    )
    .await
}

/// Run `message` through the processor.
///
/// - No processor: the message is returned untouched.
/// - Processor succeeded: the message value is replaced with the returned payload.
/// - Processor failed: a diagnostic is written to every sink; with strict errors
///   the message is dropped and an error returned, otherwise the original
///   message is returned.
/// - Context cancelled before or during the call: `Error::Cancelled`, no
///   diagnostics.
///
/// The processor is called at most once; nothing is retried.
pub async fn process_with_defaults(
    ctx: &CallContext,
    processor: Option<&dyn Processor>,
    defaults: &AudienceDefaults,
    operation_type: OperationType,
    mut message: Message,
    sinks: &[Option<&dyn DiagnosticSink>],
) -> Result<Message> {
    let Some(processor) = processor else {
        return Ok(message);
    };

    let runtime_config = extract(ctx);
    let audience = defaults.resolve(operation_type, &message.topic, runtime_config);

    if ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tracing::debug!(
        audience = %audience,
        bytes = message.value.len(),
        "Submitting message to processor"
    );

    let request = ProcessRequest {
        component_name: audience.component_name().to_string(),
        operation_type,
        operation_name: audience.operation_name().to_string(),
        data: message.value.clone(),
    };

    let response = tokio::select! {
        biased;
        _ = ctx.cancelled() => return Err(Error::Cancelled),
        response = processor.process(request) => response,
    };

    match response {
        ProcessResponse::Unchanged { data } | ProcessResponse::Transformed { data } => {
            message.value = data;
            Ok(message)
        }
        ProcessResponse::Error { message: status } => {
            let status = status.unwrap_or_default();
            let line = format!("processor error: {status}");
            sink::write_all(sinks, &line);

            if runtime_config.is_some_and(|rc| rc.strict_errors) {
                return Err(Error::Process { message: status });
            }

            tracing::debug!(audience = %audience, "Passing original message through after processor error");
            Ok(message)
        }
    }
}
