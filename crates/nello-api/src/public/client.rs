// Public API HTTP client
//
// Wraps `reqwest::Client` with bearer-token injection, envelope parsing, and
// the single re-authentication retry. Endpoint methods live in
// `locations.rs`; the OAuth token exchange lives in `auth.rs`.

use std::time::Duration;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{Credentials, SessionSlot};
use crate::config::{ClientConfig, DEFAULT_AUTH_URL, DEFAULT_PUBLIC_API_URL};
use crate::error::{Error, preview};
use crate::models::PublicEnvelope;
use crate::transport::{endpoint_url, normalize_base_url};

/// Async client for the Nello public API.
///
/// Authenticates lazily with the OAuth password grant on first use and
/// sends the bearer token on every request. A rejected token is refreshed
/// once per call; see [`PublicClient::ensure_token`].
pub struct PublicClient {
    http: reqwest::Client,
    api_url: Url,
    auth_url: Url,
    credentials: Credentials,
    login_retry_backoff: Duration,
    session: SessionSlot<SecretString>,
}

impl PublicClient {
    /// Build a client. No network traffic happens here.
    ///
    /// Fails with [`Error::Config`] if username, password, or `client_id`
    /// is missing.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, Error> {
        credentials.validate_oauth()?;

        let api_url =
            normalize_base_url(config.api_url.as_deref().unwrap_or(DEFAULT_PUBLIC_API_URL))?;
        let auth_url = Url::parse(config.auth_url.as_deref().unwrap_or(DEFAULT_AUTH_URL))?;
        let http = config.transport.build_client()?;

        Ok(Self {
            http,
            api_url,
            auth_url,
            credentials,
            login_retry_backoff: config.transport.login_retry_backoff,
            session: SessionSlot::new(),
        })
    }

    /// The REST base URL (always ends with `/`).
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The OAuth token endpoint.
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn login_retry_backoff(&self) -> Duration {
        self.login_retry_backoff
    }

    pub(crate) fn session(&self) -> &SessionSlot<SecretString> {
        &self.session
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build `{api_url}/seg/.../` with each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        endpoint_url(&self.api_url, segments, true)
    }

    /// Send a request with the current token and parse the envelope,
    /// re-authenticating once if the token is rejected.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<PublicEnvelope<T>, Error> {
        self.session
            .run(
                || self.fetch_token(),
                move |token| self.send(token, method.clone(), url.clone(), body),
            )
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        token: SecretString,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<PublicEnvelope<T>, Error> {
        debug!("{method} {url}");

        let mut builder = self
            .http
            .request(method, url)
            .bearer_auth(token.expose_secret());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;

        Self::parse_envelope(resp).await
    }

    /// Map an HTTP response onto the `{ result, data }` envelope.
    ///
    /// 401 means the bearer token is no longer accepted. Other non-2xx
    /// statuses become [`Error::Api`] with the vendor's message when the
    /// body carries one.
    async fn parse_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<PublicEnvelope<T>, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<PublicEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.result)
                .and_then(|result| result.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_owned()
                });
            return Err(Error::Api {
                status: status.as_u16(),
                message,
                body,
            });
        }

        trace!(body = preview(&body), "response body");

        let raw = if body.trim().is_empty() { "{}" } else { &body };
        let mut envelope: PublicEnvelope<T> =
            serde_json::from_str(raw).map_err(|e| Error::deserialization(&e, &body))?;

        if let Some(result) = envelope.result.as_ref().filter(|r| !r.success) {
            warn!(
                status = ?result.status,
                message = ?result.message,
                "API call was unsuccessful"
            );
        }

        envelope.raw = body;
        envelope.http_status = status.as_u16();
        Ok(envelope)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_client_id_fails_fast() {
        let result = PublicClient::new(Credentials::new("user", "pw"), ClientConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn default_urls_point_at_vendor() {
        let client = PublicClient::new(
            Credentials::new("user", "pw").with_client_id("app"),
            ClientConfig::default(),
        )
        .unwrap();
        assert_eq!(client.api_url().as_str(), DEFAULT_PUBLIC_API_URL);
        assert_eq!(client.auth_url().as_str(), DEFAULT_AUTH_URL);
    }

    #[test]
    fn endpoint_escapes_ids() {
        let client = PublicClient::new(
            Credentials::new("user", "pw").with_client_id("app"),
            ClientConfig::default(),
        )
        .unwrap();
        let url = client.endpoint(&["locations", "a/b?c#d", "open"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://public-api.nello.io/v1/locations/a%2Fb%3Fc%23d/open/"
        );
    }

    #[test]
    fn api_url_override_is_normalized() {
        let client = PublicClient::new(
            Credentials::new("user", "pw").with_client_id("app"),
            ClientConfig::default().with_api_url("http://localhost:8080/v1"),
        )
        .unwrap();
        assert_eq!(client.api_url().as_str(), "http://localhost:8080/v1/");
    }
}
