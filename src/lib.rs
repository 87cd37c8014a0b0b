//! kafkacat-shim library
//!
//! A minimal kafkacat-style client whose producer and consumer run every
//! message through the processing shim.
//!
//! # CLI Usage
//!
//! ```bash
//! # Produce stdin lines, splitting "key:value"
//! kafkacat-shim --broker localhost:9092 --key-delim : produce --topic events
//!
//! # Consume with an audience override and strict errors
//! kafkacat-shim --broker localhost:9092 \
//!   --component-name billing --strict-errors \
//!   consume --group readers events
//! ```

use clap::{ArgAction, Parser};
use processing_shim::{
    CallContext, ProcessorConfig, RuntimeConfig, DEFAULT_COMPONENT_NAME, DEFAULT_OPERATION_NAME,
};

pub mod config;
pub mod consume;
pub mod line;
pub mod produce;
pub mod signal;

/// Processing shim options shared by `produce` and `consume`
#[derive(Parser, Clone, Debug)]
pub struct ShimOpts {
    /// Component name presented to the processor
    #[arg(long, default_value = DEFAULT_COMPONENT_NAME)]
    pub component_name: String,

    /// Operation name presented to the processor (defaults to the topic)
    #[arg(long, default_value = DEFAULT_OPERATION_NAME)]
    pub operation_name: String,

    /// Fail the message instead of passing it through when the processor errors
    #[arg(long)]
    pub strict_errors: bool,

    /// Run messages through the processor
    #[arg(
        long,
        env = "PROCESSOR_ENABLED",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub enable_processor: bool,

    /// Processor request timeout (e.g. "500ms", "5s")
    #[arg(long, default_value = "5s")]
    pub processor_timeout: String,

    /// Processor connection options
    #[command(flatten)]
    pub processor: ProcessorConfig,
}

impl ShimOpts {
    /// The runtime config these options describe, or `None` when every
    /// option is at its default.
    pub fn runtime_config(&self) -> Option<RuntimeConfig> {
        RuntimeConfig::from_parts(
            &self.component_name,
            &self.operation_name,
            self.strict_errors,
        )
    }

    /// Attach the runtime config to `ctx` when any option is set.
    pub fn inject(&self, ctx: CallContext) -> CallContext {
        processing_shim::inject(
            ctx,
            &self.component_name,
            &self.operation_name,
            self.strict_errors,
        )
    }

    /// Processor settings with the parsed request timeout applied.
    pub fn processor_config(&self) -> anyhow::Result<ProcessorConfig> {
        let timeout = config::parse_duration(&self.processor_timeout).map_err(|e| {
            anyhow::anyhow!("Invalid processor timeout '{}': {e}", self.processor_timeout)
        })?;
        Ok(self.processor.clone().with_timeout(timeout))
    }

    pub fn log_runtime_config(&self) {
        if self.runtime_config().is_some() {
            tracing::info!(
                "Runtime config enabled: component={}, operation={}, strict-errors={}",
                self.component_name,
                self.operation_name,
                self.strict_errors
            );
        }
    }
}
