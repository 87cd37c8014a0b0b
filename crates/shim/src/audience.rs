use serde::{Deserialize, Serialize};

use crate::runtime_config::RuntimeConfig;

pub const DEFAULT_COMPONENT_NAME: &str = "kafka";
pub const DEFAULT_OPERATION_NAME: &str = "unknown";

/// Which side of the client the message is flowing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Message was fetched from a topic
    Consumer,
    /// Message is about to be written to a topic
    Producer,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consumer => write!(f, "consumer"),
            Self::Producer => write!(f, "producer"),
        }
    }
}

/// Identity presented to the processor so it can select applicable rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audience {
    operation_type: OperationType,
    operation_name: String,
    component_name: String,
}

impl Audience {
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.component_name, self.operation_type, self.operation_name
        )
    }
}

/// Partial audience supplied by the caller. Only `Some` fields take effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudienceOverride {
    pub component_name: Option<String>,
    pub operation_name: Option<String>,
}

impl AudienceOverride {
    /// Build an override, treating empty strings as unset.
    pub fn new(component_name: impl Into<String>, operation_name: impl Into<String>) -> Self {
        Self {
            component_name: non_empty(component_name.into()),
            operation_name: non_empty(operation_name.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.component_name.is_none() && self.operation_name.is_none()
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Fallback names used when neither the topic nor an override supplies one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudienceDefaults {
    pub component_name: String,
    pub operation_name: String,
}

impl Default for AudienceDefaults {
    fn default() -> Self {
        Self {
            component_name: DEFAULT_COMPONENT_NAME.to_string(),
            operation_name: DEFAULT_OPERATION_NAME.to_string(),
        }
    }
}

impl AudienceDefaults {
    /// Resolve the audience for one call.
    ///
    /// Precedence, highest first: override, topic (operation name only), default.
    pub fn resolve(
        &self,
        operation_type: OperationType,
        topic: &str,
        runtime_config: Option<&RuntimeConfig>,
    ) -> Audience {
        let mut component_name = self.component_name.as_str();
        let mut operation_name = self.operation_name.as_str();

        if !topic.is_empty() {
            operation_name = topic;
        }

        if let Some(aud) = runtime_config.and_then(|rc| rc.audience.as_ref()) {
            if let Some(name) = aud.operation_name.as_deref().filter(|n| !n.is_empty()) {
                operation_name = name;
            }
            if let Some(name) = aud.component_name.as_deref().filter(|n| !n.is_empty()) {
                component_name = name;
            }
        }

        Audience {
            operation_type,
            operation_name: operation_name.to_string(),
            component_name: component_name.to_string(),
        }
    }
}

/// Resolve an audience using the built-in defaults.
pub fn generate_audience(
    operation_type: OperationType,
    topic: &str,
    runtime_config: Option<&RuntimeConfig>,
) -> Audience {
    AudienceDefaults::default().resolve(operation_type, topic, runtime_config)
}
