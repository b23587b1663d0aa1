// Private API HTTP client
//
// Wraps `reqwest::Client` with a cookie jar, envelope unwrapping, and the
// single re-authentication retry. Endpoint modules are implemented as
// inherent methods in separate files to keep this one focused on transport
// mechanics.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::cookie::{CookieStore, Jar};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{Credentials, SessionSlot};
use crate::config::{ClientConfig, DEFAULT_PRIVATE_API_URL};
use crate::error::{Error, preview};
use crate::models::PrivateResult;
use crate::transport::{endpoint_url, normalize_base_url};

/// What a successful private-API login leaves behind besides the cookie.
#[derive(Debug, Clone)]
pub(crate) struct LegacySession {
    pub user_id: String,
}

/// Parsed private-API response: the `result` block plus the full payload.
#[derive(Debug)]
pub(crate) struct LegacyReply {
    pub http_status: u16,
    pub result: PrivateResult,
    pub payload: serde_json::Value,
}

impl LegacyReply {
    pub(crate) fn is_success(&self) -> bool {
        self.result.is_success()
    }

    /// Deserialize one top-level field of a successful reply.
    ///
    /// An unsuccessful `result` becomes [`Error::Api`]; a missing or
    /// malformed field becomes [`Error::Deserialization`].
    pub(crate) fn into_field<T: DeserializeOwned>(self, field: &str) -> Result<T, Error> {
        if !self.result.is_success() {
            let status = self
                .result
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(self.http_status);
            return Err(Error::Api {
                status,
                message: self
                    .result
                    .message
                    .unwrap_or_else(|| "request was not successful".into()),
                body: self.payload.to_string(),
            });
        }

        let serde_json::Value::Object(mut map) = self.payload else {
            return Err(Error::Deserialization {
                message: "response is not a JSON object".into(),
                body: self.payload.to_string(),
            });
        };
        let Some(value) = map.remove(field) else {
            return Err(Error::Deserialization {
                message: format!("response is missing `{field}`"),
                body: serde_json::Value::Object(map).to_string(),
            });
        };
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: format!("invalid `{field}`: {e}"),
            body: value.to_string(),
        })
    }
}

/// Async client for the Nello private (app) API.
///
/// Logs in lazily with username and hashed password; the server keeps the
/// session in a cookie stored in this client's jar. An expired session is
/// refreshed once per call.
pub struct LegacyClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    login_retry_backoff: Duration,
    session: SessionSlot<LegacySession>,
    cookie_jar: Option<Arc<Jar>>,
}

impl LegacyClient {
    /// Build a client. No network traffic happens here.
    ///
    /// If the transport config doesn't already include a cookie jar, one is
    /// created (session auth requires cookies). Fails with [`Error::Config`]
    /// if username or password is missing.
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, Error> {
        credentials.validate()?;

        let base_url =
            normalize_base_url(config.api_url.as_deref().unwrap_or(DEFAULT_PRIVATE_API_URL))?;
        let transport = if config.transport.cookie_jar.is_some() {
            config.transport
        } else {
            config.transport.with_cookie_jar()
        };
        let http = transport.build_client()?;

        Ok(Self {
            http,
            base_url,
            credentials,
            login_retry_backoff: transport.login_retry_backoff,
            session: SessionSlot::new(),
            cookie_jar: transport.cookie_jar,
        })
    }

    /// The API base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The `Cookie` header value currently held for the API host, if any.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.cookie_jar.as_ref()?;
        let cookies = jar.cookies(&self.base_url)?;
        cookies.to_str().ok().map(String::from)
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

    pub(crate) fn session(&self) -> &SessionSlot<LegacySession> {
        &self.session
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build `{base_url}/seg/...` with each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str], trailing_slash: bool) -> Result<Url, Error> {
        endpoint_url(&self.base_url, segments, trailing_slash)
    }

    /// Send a request within the current session, logging in again once if
    /// the session has expired.
    ///
    /// `url` receives the live session because some routes embed the
    /// user id.
    pub(crate) async fn request<U>(
        &self,
        method: Method,
        url: U,
        body: Option<&serde_json::Value>,
    ) -> Result<LegacyReply, Error>
    where
        U: Fn(&LegacySession) -> Result<Url, Error>,
    {
        let url = &url;
        self.session
            .run(
                || self.login(),
                move |session| {
                    let route = url(&session);
                    let method = method.clone();
                    async move { self.send(method, route?, body).await }
                },
            )
            .await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<LegacyReply, Error> {
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;

        Self::parse_reply(resp).await
    }

    /// Parse the `{ result: { status, message }, ... }` envelope.
    ///
    /// HTTP 401 and a `result.status` of `"400"` both mean the session
    /// cookie is no longer valid.
    async fn parse_reply(resp: reqwest::Response) -> Result<LegacyReply, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("result")?.get("message")?.as_str().map(String::from))
                .unwrap_or_else(|| format!("HTTP {status}: {}", preview(&body)));
            return Err(Error::Api {
                status: status.as_u16(),
                message,
                body,
            });
        }

        trace!(body = preview(&body), "response body");

        let raw = if body.trim().is_empty() { "{}" } else { &body };
        let payload: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| Error::deserialization(&e, &body))?;
        let result: PrivateResult = payload
            .get("result")
            .map(|r| serde_json::from_value(r.clone()))
            .transpose()
            .map_err(|e| Error::deserialization(&e, &body))?
            .unwrap_or_default();

        if !result.is_success() {
            warn!(
                status = ?result.status,
                message = ?result.message,
                "API call was unsuccessful"
            );
            if result.is_session_expired() {
                return Err(Error::SessionExpired);
            }
        }

        Ok(LegacyReply {
            http_status: status.as_u16(),
            result,
            payload,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reply(payload: serde_json::Value) -> LegacyReply {
        let result = serde_json::from_value(payload["result"].clone()).unwrap_or_default();
        LegacyReply {
            http_status: 200,
            result,
            payload,
        }
    }

    #[test]
    fn into_field_extracts_payload() {
        let ids: Vec<String> = reply(json!({
            "result": { "status": "200" },
            "ids": ["a", "b"]
        }))
        .into_field("ids")
        .unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn into_field_reports_vendor_status() {
        let err = reply(json!({
            "result": { "status": "404", "message": "location not found" }
        }))
        .into_field::<Vec<String>>("ids")
        .unwrap_err();
        assert!(matches!(err, Error::Api { status: 404, .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn into_field_rejects_missing_field() {
        let err = reply(json!({ "result": { "status": "200" } }))
            .into_field::<Vec<String>>("ids")
            .unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn missing_password_fails_fast() {
        let result = LegacyClient::new(Credentials::new("user", ""), ClientConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn client_always_has_cookie_jar() {
        let client =
            LegacyClient::new(Credentials::new("user", "pw"), ClientConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_PRIVATE_API_URL);
        assert!(client.cookie_jar.is_some());
        assert!(client.cookie_header().is_none());
    }
}
