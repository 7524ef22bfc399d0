//! Registration requests against the matching service.

use async_trait::async_trait;
use roulette_common::{SessionError, UserName};
use tracing::{debug, info};

use super::types::MatchingConfig;
use crate::protocol::{RegisterRequest, RegisterResponse};

/// Puts a user into the matching queue.
///
/// Registering an already-queued user re-enqueues it.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, name: &UserName) -> Result<RegisterResponse, SessionError>;
}

/// `POST /registerForMatching` over HTTP.
pub struct HttpRegistrar {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRegistrar {
    pub fn new(config: &MatchingConfig) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SessionError::RegistrationFailed(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.register_url(),
        })
    }
}

#[async_trait]
impl Registrar for HttpRegistrar {
    async fn register(&self, name: &UserName) -> Result<RegisterResponse, SessionError> {
        debug!(user = %name, endpoint = %self.endpoint, "Registering for matching");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&RegisterRequest { name: name.clone() })
            .send()
            .await
            .map_err(|e| SessionError::RegistrationFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SessionError::RegistrationFailed(format!("HTTP {status}")));
        }

        let body: RegisterResponse = resp
            .json()
            .await
            .map_err(|e| SessionError::RegistrationFailed(format!("invalid response: {e}")))?;

        info!(
            user = %name,
            status = body.status.as_deref().unwrap_or("-"),
            message = body.message.as_deref().unwrap_or("-"),
            "Registered for matching"
        );
        Ok(body)
    }
}
