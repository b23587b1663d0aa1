// Public API authentication
//
// OAuth 2 resource-owner password grant against the vendor's token endpoint.
// The bearer token is cached in the client's session slot and only
// re-fetched when missing or rejected; there is no proactive refresh.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::error::{Error, preview};
use crate::models::{TokenError, TokenResponse};
use crate::public::client::PublicClient;
use crate::transport::send_retrying_once;

impl PublicClient {
    /// Make sure a bearer token is cached, fetching one if there is none.
    ///
    /// A no-op while a token is cached. Credential rejections surface as
    /// [`Error::Authentication`] and are not retried; a network failure of
    /// the token request is retried once after the configured backoff.
    pub async fn ensure_token(&self) -> Result<(), Error> {
        self.session()
            .get_or_login(|| self.fetch_token())
            .await
            .map(|_| ())
    }

    /// Whether a bearer token is currently cached.
    pub async fn has_token(&self) -> bool {
        self.session().is_active().await
    }

    /// Forget the cached bearer token; the next call logs in again.
    pub async fn invalidate_token(&self) {
        self.session().clear().await;
    }

    /// Exchange the stored credentials for a bearer token.
    ///
    /// `POST {auth_url}` with a form-encoded password grant.
    pub(crate) async fn fetch_token(&self) -> Result<SecretString, Error> {
        let credentials = self.credentials();
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "password"),
            ("username", credentials.username()),
            ("password", credentials.password().expose_secret()),
        ];
        if let Some(client_id) = credentials.client_id() {
            form.push(("client_id", client_id));
        }
        if let Some(secret) = credentials.client_secret() {
            form.push(("client_secret", secret.expose_secret()));
        }

        let url = self.auth_url().clone();
        debug!("requesting token at {url}");

        let resp = send_retrying_once(
            || self.http().post(url.clone()).form(&form),
            self.login_retry_backoff(),
        )
        .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenError>(&body) {
                Ok(TokenError {
                    error,
                    error_description: Some(description),
                }) => format!("{error}: {description}"),
                Ok(TokenError { error, .. }) => error,
                Err(_) => format!("token request failed (HTTP {status}): {}", preview(&body)),
            };
            return Err(Error::Authentication { message });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, &body))?;

        info!(
            token_type = token.token_type.as_deref().unwrap_or("bearer"),
            expires_in = ?token.expires_in,
            "token acquired"
        );
        Ok(SecretString::from(token.access_token))
    }
}
