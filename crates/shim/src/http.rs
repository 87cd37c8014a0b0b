//! HTTP client for a remote processor.
//!
//! Each payload is POSTed as JSON to `{address}/v1/process`; payload bytes are
//! base64 encoded in both directions.

use std::time::Duration;

use base64::Engine;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::audience::OperationType;
use crate::error::{Error, Result};
use crate::processor::{ProcessRequest, ProcessResponse, Processor};

pub const ENV_ADDRESS: &str = "PROCESSOR_ADDRESS";
pub const ENV_AUTH_TOKEN: &str = "PROCESSOR_AUTH_TOKEN";
pub const ENV_SERVICE_NAME: &str = "PROCESSOR_SERVICE_NAME";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the remote processor.
#[derive(Debug, Clone, Args)]
pub struct ProcessorConfig {
    /// Processor base URL
    #[arg(long = "processor-address", env = ENV_ADDRESS)]
    pub address: Option<String>,
    /// Bearer token sent with every request
    #[arg(long = "processor-auth-token", env = ENV_AUTH_TOKEN, hide_env_values = true)]
    pub auth_token: Option<String>,
    /// Name this client reports to the processor
    #[arg(long = "processor-service-name", env = ENV_SERVICE_NAME)]
    pub service_name: Option<String>,
    /// Per-request timeout
    #[arg(skip = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            address: None,
            auth_token: None,
            service_name: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProcessorConfig {
    /// Read the processor settings from the environment.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            address: std::env::var(ENV_ADDRESS).ok(),
            auth_token: std::env::var(ENV_AUTH_TOKEN).ok(),
            service_name: std::env::var(ENV_SERVICE_NAME).ok(),
            timeout: DEFAULT_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that every required setting is present and non-empty.
    pub fn validate(&self) -> Result<()> {
        required(&self.address, ENV_ADDRESS)?;
        required(&self.auth_token, ENV_AUTH_TOKEN)?;
        required(&self.service_name, ENV_SERVICE_NAME)?;
        Ok(())
    }
}

fn required<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::InvalidConfig(format!("{var} env var is not set"))),
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    component_name: &'a str,
    operation_type: OperationType,
    operation_name: &'a str,
    data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireStatus {
    True,
    False,
    Error,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    status: WireStatus,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

fn encode_request(request: &ProcessRequest) -> WireRequest<'_> {
    WireRequest {
        component_name: &request.component_name,
        operation_type: request.operation_type,
        operation_name: &request.operation_name,
        data: base64::engine::general_purpose::STANDARD.encode(&request.data),
    }
}

fn decode_response(wire: WireResponse) -> ProcessResponse {
    let data = match wire.status {
        WireStatus::Error => {
            return ProcessResponse::Error {
                message: wire.status_message,
            }
        }
        _ => match wire.data.as_deref() {
            None => return ProcessResponse::error("processor response missing data"),
            Some(encoded) => match base64::engine::general_purpose::STANDARD.decode(encoded) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return ProcessResponse::error(format!(
                        "processor returned invalid base64 payload: {e}"
                    ))
                }
            },
        },
    };

    if wire.status == WireStatus::True {
        ProcessResponse::Transformed { data }
    } else {
        ProcessResponse::Unchanged { data }
    }
}

/// [`Processor`] backed by a remote HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpProcessor {
    client: reqwest::Client,
    url: String,
    auth_token: String,
    service_name: String,
}

impl HttpProcessor {
    pub fn new(config: &ProcessorConfig) -> Result<Self> {
        let address = required(&config.address, ENV_ADDRESS)?;
        let auth_token = required(&config.auth_token, ENV_AUTH_TOKEN)?;
        let service_name = required(&config.service_name, ENV_SERVICE_NAME)?;

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        tracing::info!("Processor client configured for {address} as '{service_name}'");

        Ok(Self {
            client,
            url: format!("{}/v1/process", address.trim_end_matches('/')),
            auth_token: auth_token.to_string(),
            service_name: service_name.to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(&ProcessorConfig::from_env()?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Processor for HttpProcessor {
    async fn process(&self, request: ProcessRequest) -> ProcessResponse {
        let body = encode_request(&request);

        let response = match self
            .client
            .post(&self.url)
            .bearer_auth(&self.auth_token)
            .header("X-Service-Name", &self.service_name)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ProcessResponse::error(format!("request to {} failed: {e}", self.url)),
        };

        let status = response.status();
        if !status.is_success() {
            return ProcessResponse::error(format!("processor returned status {status}"));
        }

        match response.json::<WireResponse>().await {
            Ok(wire) => decode_response(wire),
            Err(e) => ProcessResponse::error(format!("failed to decode processor response: {e}")),
        }
    }
}
