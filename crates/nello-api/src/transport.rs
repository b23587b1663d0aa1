// Shared transport configuration for building reqwest::Client instances.
//
// Both the public and the private client share TLS, timeout, cookie, and
// login-retry settings through this module.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use tracing::warn;

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the bundled/system certificate store.
    #[default]
    System,
    /// Trust an additional CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for local test doubles only).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub user_agent: String,
    pub cookie_jar: Option<Arc<Jar>>,
    /// Delay before the single retry of a login that failed at the network level.
    pub login_retry_backoff: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            user_agent: concat!("nello-api/", env!("CARGO_PKG_VERSION")).to_owned(),
            cookie_jar: None,
            login_retry_backoff: Duration::from_millis(500),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the login retry backoff.
    pub fn with_login_retry_backoff(mut self, backoff: Duration) -> Self {
        self.login_retry_backoff = backoff;
        self
    }
}

/// Send a request, retrying exactly once after `backoff` if the first
/// attempt failed before any HTTP response arrived (timeout or connect error).
///
/// `build` is called once per attempt because a `RequestBuilder` is consumed
/// by `send()`. HTTP error statuses are returned as-is and never retried.
pub(crate) async fn send_retrying_once<F>(
    build: F,
    backoff: Duration,
) -> Result<reqwest::Response, Error>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    match build().send().await {
        Ok(resp) => Ok(resp),
        Err(e) if e.is_timeout() || e.is_connect() => {
            warn!(error = %e, ?backoff, "login request failed, retrying once");
            tokio::time::sleep(backoff).await;
            build().send().await.map_err(Error::Transport)
        }
        Err(e) => Err(Error::Transport(e)),
    }
}

/// Normalize a base URL so relative paths join beneath it.
///
/// `https://host/v1` and `https://host/v1/` both become `https://host/v1/`.
pub(crate) fn normalize_base_url(raw: &str) -> Result<url::Url, Error> {
    let mut url = url::Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

/// Append path segments to `base`, percent-encoding each one.
///
/// Segments are caller-supplied ids, so `/`, `?`, `#` and `%` are escaped and
/// empty or dot segments are refused rather than resolved.
pub(crate) fn endpoint_url(
    base: &url::Url,
    segments: &[&str],
    trailing_slash: bool,
) -> Result<url::Url, Error> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| Error::Config(format!("{base} cannot be used as a base URL")))?;
        path.pop_if_empty();
        for segment in segments {
            if matches!(*segment, "" | "." | "..") {
                return Err(Error::Config(format!("invalid path segment {segment:?}")));
            }
            path.push(segment);
        }
        if trailing_slash {
            path.push("");
        }
    }
    Ok(url)
}
