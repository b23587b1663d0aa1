// Client configuration
//
// Everything is passed in at construction; nothing is read from files or the
// environment. Unset URLs fall back to the vendor's production hosts.

use crate::transport::TransportConfig;

/// OAuth token endpoint for the public API.
pub const DEFAULT_AUTH_URL: &str = "https://auth.nello.io/oauth/token/";

/// REST base of the public API.
pub const DEFAULT_PUBLIC_API_URL: &str = "https://public-api.nello.io/v1/";

/// Base of the private (app) API.
pub const DEFAULT_PRIVATE_API_URL: &str = "https://api.nello.io/";

/// Optional overrides shared by both client variants.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// REST base URL. Defaults to the variant's production host.
    pub api_url: Option<String>,
    /// OAuth token endpoint. Only used by the public client.
    pub auth_url: Option<String>,
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}
