// Private API authentication
//
// JSON login with a PBKDF2-hashed password. The server answers with a
// session cookie (kept in the client's jar) and the account's user id,
// which the open-door route needs.

use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::hash_password;
use crate::error::{Error, preview};
use crate::legacy::client::{LegacyClient, LegacySession};
use crate::models::LoginResponse;
use crate::transport::send_retrying_once;

impl LegacyClient {
    /// Make sure a session exists, logging in if there is none.
    ///
    /// A no-op while a session is cached. Rejected credentials surface as
    /// [`Error::Authentication`] and are not retried; a network failure of
    /// the login request is retried once after the configured backoff.
    pub async fn ensure_token(&self) -> Result<(), Error> {
        self.session()
            .get_or_login(|| self.login())
            .await
            .map(|_| ())
    }

    /// Whether a session is currently cached.
    pub async fn has_token(&self) -> bool {
        self.session().is_active().await
    }

    /// Forget the cached session; the next call logs in again.
    pub async fn invalidate_token(&self) {
        self.session().clear().await;
    }

    /// Authenticate with username and hashed password.
    ///
    /// `POST login` with `{"username": "...", "password": "<hash>"}`
    pub(crate) async fn login(&self) -> Result<LegacySession, Error> {
        let credentials = self.credentials();
        let url = self.base_url().join("login")?;
        let body = json!({
            "username": credentials.username(),
            "password": hash_password(
                credentials.username(),
                credentials.password().expose_secret(),
            ),
        });

        debug!("logging in at {url}");

        let resp = send_retrying_once(
            || self.http().post(url.clone()).json(&body),
            self.login_retry_backoff(),
        )
        .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&text)),
            });
        }

        let login: LoginResponse =
            serde_json::from_str(&text).map_err(|e| Error::deserialization(&e, &text))?;

        if !login.authentication {
            warn!(status = ?login.result.status, "authentication failed");
            let message = login
                .result
                .message
                .unwrap_or_else(|| "credentials rejected".into());
            return Err(Error::Authentication {
                message: format!("login failed: {message}"),
            });
        }

        let Some(user_id) = login.user.and_then(|user| user.user_id) else {
            return Err(Error::Deserialization {
                message: "login response is missing `user.user_id`".into(),
                body: text,
            });
        };

        info!(user_id, "login successful");
        Ok(LegacySession { user_id })
    }
}
