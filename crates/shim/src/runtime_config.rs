use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::audience::{AudienceDefaults, AudienceOverride};

/// Optional per-call overrides for the shim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Return an error instead of the original message when the processor fails
    pub strict_errors: bool,
    /// Audience override; only non-empty fields replace the resolved values
    pub audience: Option<AudienceOverride>,
}

impl RuntimeConfig {
    /// Build a runtime config from CLI-style inputs.
    ///
    /// Names that are empty or equal to the built-in defaults (`kafka`,
    /// `unknown`) count as unset. Returns `None` when nothing is set.
    pub fn from_parts(component_name: &str, operation_name: &str, strict_errors: bool) -> Option<Self> {
        Self::from_parts_with_defaults(
            &AudienceDefaults::default(),
            component_name,
            operation_name,
            strict_errors,
        )
    }

    /// Like [`RuntimeConfig::from_parts`], with names compared against
    /// `defaults` instead of the built-in ones.
    pub fn from_parts_with_defaults(
        defaults: &AudienceDefaults,
        component_name: &str,
        operation_name: &str,
        strict_errors: bool,
    ) -> Option<Self> {
        let component_name = unset_if_default(component_name, &defaults.component_name);
        let operation_name = unset_if_default(operation_name, &defaults.operation_name);

        if component_name.is_empty() && operation_name.is_empty() && !strict_errors {
            return None;
        }

        let audience = AudienceOverride::new(component_name, operation_name);
        Some(Self {
            strict_errors,
            audience: (!audience.is_empty()).then_some(audience),
        })
    }
}

fn unset_if_default<'a>(value: &'a str, default: &str) -> &'a str {
    if value == default {
        ""
    } else {
        value
    }
}

/// Context passed alongside every shim call.
///
/// Carries the cancellation token for the call and, optionally, a
/// [`RuntimeConfig`]. Cloning is cheap; the runtime config is shared.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    runtime_config: Option<Arc<RuntimeConfig>>,
}

impl CallContext {
    /// A context that is never cancelled and carries no runtime config.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            runtime_config: None,
        }
    }

    /// Attach a runtime config, replacing any previous one.
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = Some(Arc::new(runtime_config));
        self
    }

    pub fn runtime_config(&self) -> Option<&RuntimeConfig> {
        self.runtime_config.as_deref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// Attach a runtime config built from the given inputs.
///
/// When every input is unset the context is returned as-is. Otherwise the new
/// config replaces whatever was attached before; configs are never merged.
/// Names are compared against the built-in defaults; use
/// [`inject_with_defaults`] when calling
/// [`process_with_defaults`](crate::process_with_defaults) with custom ones.
pub fn inject(
    ctx: CallContext,
    component_name: &str,
    operation_name: &str,
    strict_errors: bool,
) -> CallContext {
    inject_with_defaults(
        ctx,
        &AudienceDefaults::default(),
        component_name,
        operation_name,
        strict_errors,
    )
}

pub fn inject_with_defaults(
    ctx: CallContext,
    defaults: &AudienceDefaults,
    component_name: &str,
    operation_name: &str,
    strict_errors: bool,
) -> CallContext {
    match RuntimeConfig::from_parts_with_defaults(
        defaults,
        component_name,
        operation_name,
        strict_errors,
    ) {
        Some(rc) => ctx.with_runtime_config(rc),
        None => ctx,
    }
}

/// The runtime config attached to `ctx`, if any.
pub fn extract(ctx: &CallContext) -> Option<&RuntimeConfig> {
    ctx.runtime_config()
}
