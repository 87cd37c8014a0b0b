//! Unit tests for the processing shim.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    inject, process, process_with_defaults, AudienceDefaults, CallContext, DiagnosticSink,
    Error, Message, OperationType, ProcessRequest, ProcessResponse, Processor,
};

/// Processor double that returns a canned response and records requests.
struct FakeProcessor {
    response: ProcessResponse,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProcessRequest>>,
}

impl FakeProcessor {
    fn new(response: ProcessResponse) -> Self {
        Self {
            response,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn slow(response: ProcessResponse, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(response)
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> ProcessRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl Processor for FakeProcessor {
    async fn process(&self, request: ProcessRequest) -> ProcessResponse {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    lines: Mutex<Vec<String>>,
    writes: AtomicUsize,
}

impl RecordingSink {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

struct FailingSink;

impl DiagnosticSink for FailingSink {
    fn write_line(&self, _line: &str) -> std::io::Result<()> {
        Err(std::io::Error::other("sink unavailable"))
    }
}

fn message() -> Message {
    Message::new("orders", b"original".to_vec()).with_key(b"k".to_vec())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("processing_shim=debug")
        .try_init()
        .ok();
}

fn processing_error() -> ProcessResponse {
    ProcessResponse::error("schema validation failed")
}

// ============================================================================
// Disabled processor
// ============================================================================

#[tokio::test]
async fn test_no_processor_returns_message_untouched() {
    let sink = RecordingSink::default();
    let ctx = inject(CallContext::background(), "c", "o", true);

    let out = process(
        &ctx,
        None,
        OperationType::Producer,
        message(),
        &[Some(&sink)],
    )
    .await
    .unwrap();

    assert_eq!(out, message());
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_no_processor_ignores_cancelled_context() {
    let token = CancellationToken::new();
    token.cancel();
    let ctx = CallContext::with_cancellation(token);

    let out = process(&ctx, None, OperationType::Consumer, message(), &[])
        .await
        .unwrap();
    assert_eq!(out.value, b"original");
}

// ============================================================================
// Successful processing
// ============================================================================

#[tokio::test]
async fn test_transformed_payload_replaces_value() {
    let processor = FakeProcessor::new(ProcessResponse::Transformed {
        data: b"{\"masked\":true}".to_vec(),
    });

    let out = process(
        &CallContext::background(),
        Some(&processor),
        OperationType::Consumer,
        message(),
        &[],
    )
    .await
    .unwrap();

    assert_eq!(out.value, b"{\"masked\":true}");
    assert_eq!(out.key.as_deref(), Some(&b"k"[..]));
    assert_eq!(out.topic, "orders");
    assert_eq!(processor.calls(), 1);
}

#[tokio::test]
async fn test_unchanged_response_still_replaces_value() {
    let processor = FakeProcessor::new(ProcessResponse::Unchanged {
        data: b"original".to_vec(),
    });

    let out = process(
        &CallContext::background(),
        Some(&processor),
        OperationType::Producer,
        message(),
        &[],
    )
    .await
    .unwrap();

    assert_eq!(out.value, b"original");
}

#[tokio::test]
async fn test_transformed_to_empty_payload() {
    let processor = FakeProcessor::new(ProcessResponse::Transformed { data: Vec::new() });

    let out = process(
        &CallContext::background(),
        Some(&processor),
        OperationType::Producer,
        message(),
        &[],
    )
    .await
    .unwrap();

    assert!(out.value.is_empty());
}

#[tokio::test]
async fn test_request_carries_resolved_audience_and_payload() {
    let processor = FakeProcessor::new(ProcessResponse::Unchanged {
        data: b"original".to_vec(),
    });
    let ctx = inject(CallContext::background(), "payments", "", false);

    process(
        &ctx,
        Some(&processor),
        OperationType::Producer,
        message(),
        &[],
    )
    .await
    .unwrap();

    let request = processor.last_request();
    assert_eq!(request.component_name, "payments");
    assert_eq!(request.operation_name, "orders");
    assert_eq!(request.operation_type, OperationType::Producer);
    assert_eq!(request.data, b"original");
}

#[tokio::test]
async fn test_explicit_defaults_are_used_for_empty_topic() {
    let processor = FakeProcessor::new(ProcessResponse::Unchanged { data: Vec::new() });
    let defaults = AudienceDefaults {
        component_name: "broker".to_string(),
        operation_name: "fallback".to_string(),
    };

    process_with_defaults(
        &CallContext::background(),
        Some(&processor),
        &defaults,
        OperationType::Consumer,
        Message::new("", b"x".to_vec()),
        &[],
    )
    .await
    .unwrap();

    let request = processor.last_request();
    assert_eq!(request.component_name, "broker");
    assert_eq!(request.operation_name, "fallback");
}

// ============================================================================
// Processor errors
// ============================================================================

#[tokio::test]
async fn test_error_without_strict_passes_original_through() {
    init_tracing();
    let processor = FakeProcessor::new(processing_error());
    let sink = RecordingSink::default();

    let out = process(
        &CallContext::background(),
        Some(&processor),
        OperationType::Consumer,
        message(),
        &[Some(&sink)],
    )
    .await
    .unwrap();

    assert_eq!(out, message());
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("schema validation failed"));
}

#[tokio::test]
async fn test_error_with_strict_drops_message() {
    init_tracing();
    let processor = FakeProcessor::new(processing_error());
    let sink = RecordingSink::default();
    let ctx = inject(CallContext::background(), "", "", true);

    let err = process(
        &ctx,
        Some(&processor),
        OperationType::Producer,
        message(),
        &[Some(&sink)],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Process { .. }));
    assert!(err.to_string().contains("schema validation failed"));
    assert_eq!(sink.lines().len(), 1);
}

#[tokio::test]
async fn test_error_without_status_message() {
    let processor = FakeProcessor::new(ProcessResponse::Error { message: None });
    let sink = RecordingSink::default();

    let out = process(
        &CallContext::background(),
        Some(&processor),
        OperationType::Consumer,
        message(),
        &[Some(&sink)],
    )
    .await
    .unwrap();

    assert_eq!(out.value, b"original");
    assert_eq!(sink.lines(), vec!["processor error: ".to_string()]);
}

#[tokio::test]
async fn test_error_reaches_every_sink_past_failures_and_gaps() {
    let processor = FakeProcessor::new(processing_error());
    let first = RecordingSink::default();
    let second = RecordingSink::default();
    let sinks: [Option<&dyn DiagnosticSink>; 4] =
        [Some(&first), Some(&FailingSink), None, Some(&second)];

    process(
        &CallContext::background(),
        Some(&processor),
        OperationType::Consumer,
        message(),
        &sinks,
    )
    .await
    .unwrap();

    assert_eq!(first.writes.load(Ordering::SeqCst), 1);
    assert_eq!(second.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_error_with_no_sinks() {
    let processor = FakeProcessor::new(processing_error());

    let out = process(
        &CallContext::background(),
        Some(&processor),
        OperationType::Consumer,
        message(),
        &[],
    )
    .await
    .unwrap();

    assert_eq!(out.value, b"original");
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_call_skips_processor_and_sinks() {
    let processor = FakeProcessor::new(processing_error());
    let sink = RecordingSink::default();
    let token = CancellationToken::new();
    token.cancel();
    let ctx = CallContext::with_cancellation(token);

    let err = process(
        &ctx,
        Some(&processor),
        OperationType::Consumer,
        message(),
        &[Some(&sink)],
    )
    .await
    .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(processor.calls(), 0);
    assert!(sink.lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_during_call_returns_promptly() {
    let processor = FakeProcessor::slow(
        ProcessResponse::Transformed {
            data: b"late".to_vec(),
        },
        Duration::from_secs(60),
    );
    let sink = RecordingSink::default();
    let token = CancellationToken::new();
    let ctx = CallContext::with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    let err = process(
        &ctx,
        Some(&processor),
        OperationType::Producer,
        message(),
        &[Some(&sink)],
    )
    .await
    .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(processor.calls(), 1);
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_concurrent_calls_share_context() {
    let processor = std::sync::Arc::new(FakeProcessor::new(ProcessResponse::Transformed {
        data: b"done".to_vec(),
    }));
    let ctx = inject(CallContext::background(), "shared", "", true);

    let mut handles = Vec::new();
    for i in 0..8 {
        let processor = std::sync::Arc::clone(&processor);
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            let msg = Message::new(format!("topic-{i}"), vec![i as u8]);
            process(&ctx, Some(processor.as_ref()), OperationType::Producer, msg, &[]).await
        }));
    }

    for handle in handles {
        let out = handle.await.unwrap().unwrap();
        assert_eq!(out.value, b"done");
    }
    assert_eq!(processor.calls(), 8);
}
