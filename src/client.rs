use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::errors::{ProofError, Result};
use crate::resources::{Proofs, Sessions, VerificationRequests, Verifications, WebhookDeliveries};
use crate::transport::Transport;

pub const DEFAULT_BASE_URL: &str = "https://api.proof.holdings";
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_ENV: &str = "PROOF_API_KEY";

/// Builder for constructing a [`Client`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use proof_sdk::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> proof_sdk::Result<()> {
/// let client = ClientBuilder::new()
///     .api_key("pk_live_abc123")
///     .base_url("https://sandbox.proof.holdings")
///     .max_retries(5)
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: String,
    max_retries: u32,
    timeout: Duration,
}

impl ClientBuilder {
    /// Start from the production base URL, 2 retries and a 30 second timeout.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Key sent as the `Authorization: Bearer` credential.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the base URL (defaults to `https://api.proof.holdings`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Retries allowed after the first attempt (defaults to 2).
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Per-request timeout (defaults to 30 seconds).
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Build the [`Client`].
    ///
    /// If no API key was set via [`api_key`](Self::api_key), the builder
    /// reads the `PROOF_API_KEY` environment variable.
    ///
    /// Returns [`ProofError::Config`] if no non-empty key is available.
    pub fn build(self) -> Result<Client> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                ProofError::Config(format!(
                    "API key is required. Pass it to ClientBuilder::api_key() \
                     or set the {API_KEY_ENV} environment variable."
                ))
            })?;

        let transport = Transport::new(&api_key, &self.base_url, self.timeout, self.max_retries)?;
        debug!(
            base_url = transport.base_url(),
            max_retries = self.max_retries,
            "client configured"
        );

        Ok(Client {
            transport: Arc::new(transport),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The proof.holdings API client.
///
/// Cloning is cheap; clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use proof_sdk::{CancelToken, Client};
///
/// # async fn example() -> proof_sdk::Result<()> {
/// let client = Client::new("pk_live_abc123")?;
/// let cancel = CancelToken::new();
///
/// let verification = client.verifications().retrieve(&cancel, "ver_123").await?;
/// println!("{:?}", verification.get("status"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<Transport>,
}

impl Client {
    /// Shorthand for `ClientBuilder::new().api_key(key).build()`.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().api_key(api_key).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The shared transport, for endpoints without a dedicated wrapper.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn verifications(&self) -> Verifications<'_> {
        Verifications {
            transport: &self.transport,
        }
    }

    pub fn verification_requests(&self) -> VerificationRequests<'_> {
        VerificationRequests {
            transport: &self.transport,
        }
    }

    pub fn proofs(&self) -> Proofs<'_> {
        Proofs {
            transport: &self.transport,
        }
    }

    pub fn sessions(&self) -> Sessions<'_> {
        Sessions {
            transport: &self.transport,
        }
    }

    pub fn webhook_deliveries(&self) -> WebhookDeliveries<'_> {
        WebhookDeliveries {
            transport: &self.transport,
        }
    }
}
