use std::future::Future;

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Error;

/// Account credentials for authenticating with Nello.
///
/// The password grant of the public API additionally needs an OAuth
/// `client_id` (and, for confidential clients, a `client_secret`).
/// Secrets are redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            client_id: None,
            client_secret: None,
        }
    }

    /// Attach the OAuth client id required by the public API.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Attach an OAuth client secret (confidential clients only).
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::from(client_secret.into()));
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&SecretString> {
        self.client_secret.as_ref()
    }

    /// Reject empty username or password.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.username.trim().is_empty() {
            return Err(Error::Config("username must not be empty".into()));
        }
        if self.password.expose_secret().is_empty() {
            return Err(Error::Config("password must not be empty".into()));
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), and also require a client id.
    pub(crate) fn validate_oauth(&self) -> Result<(), Error> {
        self.validate()?;
        match self.client_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(()),
            _ => Err(Error::Config(
                "client_id is required for the public API".into(),
            )),
        }
    }
}

/// Hash a password the way the private API's login endpoint expects it.
///
/// `PBKDF2-HMAC-SHA1(password, SHA-256(username ‖ password), 4000, 32)`,
/// rendered as upper-case hex.
pub fn hash_password(username: &str, password: &str) -> String {
    let salt = Sha256::digest(format!("{username}{password}").as_bytes());
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha1>(password.as_bytes(), &salt, 4000, &mut derived);
    hex::encode_upper(derived)
}

// ── Session slot ────────────────────────────────────────────────────

/// A cached credential together with the login generation that produced it.
#[derive(Debug, Clone)]
pub(crate) struct Lease<T> {
    pub value: T,
    pub generation: u64,
}

#[derive(Debug)]
struct SlotState<T> {
    current: Option<T>,
    generation: u64,
}

/// Holds at most one live session credential per client instance.
///
/// The async mutex stays locked across the login round trip, so concurrent
/// callers on a cold slot wait for one login instead of racing their own.
#[derive(Debug)]
pub(crate) struct SessionSlot<T> {
    inner: Mutex<SlotState<T>>,
}

impl<T: Clone> SessionSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(SlotState {
                current: None,
                generation: 0,
            }),
        }
    }

    /// Return the cached credential, running `login` first if there is none.
    pub(crate) async fn get_or_login<F, Fut>(&self, login: F) -> Result<Lease<T>, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut state = self.inner.lock().await;
        if let Some(value) = &state.current {
            return Ok(Lease {
                value: value.clone(),
                generation: state.generation,
            });
        }

        let value = login().await?;
        state.generation += 1;
        state.current = Some(value.clone());
        Ok(Lease {
            value,
            generation: state.generation,
        })
    }

    /// Drop the cached credential if it is still the one from `generation`.
    ///
    /// A stale generation means another caller already logged in again;
    /// that fresh session is kept.
    pub(crate) async fn invalidate(&self, generation: u64) {
        let mut state = self.inner.lock().await;
        if state.generation == generation {
            state.current = None;
        }
    }

    /// Drop whatever credential is cached.
    pub(crate) async fn clear(&self) {
        self.inner.lock().await.current = None;
    }

    pub(crate) async fn is_active(&self) -> bool {
        self.inner.lock().await.current.is_some()
    }

    /// Run `call` with the cached credential, logging in first if needed.
    ///
    /// If the vendor rejects the session (`Error::SessionExpired`), the
    /// credential is dropped, `login` runs once more, and `call` is retried
    /// a single time. A second rejection surfaces as `Error::Authentication`.
    pub(crate) async fn run<R, L, LFut, C, CFut>(&self, login: L, call: C) -> Result<R, Error>
    where
        L: Fn() -> LFut,
        LFut: Future<Output = Result<T, Error>>,
        C: Fn(T) -> CFut,
        CFut: Future<Output = Result<R, Error>>,
    {
        let lease = self.get_or_login(&login).await?;
        match call(lease.value).await {
            Err(Error::SessionExpired) => {
                debug!("session rejected, re-authenticating");
                self.invalidate(lease.generation).await;
                let lease = self.get_or_login(&login).await?;
                call(lease.value).await.map_err(|e| match e {
                    Error::SessionExpired => Error::Authentication {
                        message: "session rejected again after re-authentication".into(),
                    },
                    other => other,
                })
            }
            other => other,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn hash_password_matches_known_vectors() {
        assert_eq!(
            hash_password("alice@example.com", "hunter2"),
            "BEA743124DDA458D8CB583A20AC988406D9F652CB32292C3CB2D92C397152F09"
        );
        assert_eq!(
            hash_password("bob", "secret"),
            "F9E5C4408405E3C6B77B69401D749F61B714579FAE95B4A87A4BA0DB7B396DF4"
        );
    }

    #[test]
    fn credentials_reject_empty_fields() {
        assert!(matches!(
            Credentials::new("", "pw").validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Credentials::new("user", "").validate(),
            Err(Error::Config(_))
        ));
        assert!(Credentials::new("user", "pw").validate().is_ok());
    }

    #[test]
    fn oauth_requires_client_id() {
        let creds = Credentials::new("user", "pw");
        assert!(matches!(creds.validate_oauth(), Err(Error::Config(_))));
        let creds = creds.with_client_id("  ");
        assert!(matches!(creds.validate_oauth(), Err(Error::Config(_))));
        let creds = creds.with_client_id("my-app");
        assert!(creds.validate_oauth().is_ok());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = Credentials::new("user", "hunter2").with_client_secret("s3cr3t");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn slot_logs_in_once_while_cached() {
        let slot = SessionSlot::<String>::new();
        let logins = AtomicU32::new(0);

        tokio_test::block_on(async {
            for _ in 0..3 {
                let lease = slot
                    .get_or_login(|| async {
                        logins.fetch_add(1, Ordering::SeqCst);
                        Ok("token".to_owned())
                    })
                    .await
                    .unwrap();
                assert_eq!(lease.value, "token");
                assert_eq!(lease.generation, 1);
            }
        });

        assert_eq!(logins.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_invalidate_keeps_fresh_session() {
        let slot = SessionSlot::<String>::new();

        tokio_test::block_on(async {
            let first = slot
                .get_or_login(|| async { Ok("a".to_owned()) })
                .await
                .unwrap();
            slot.invalidate(first.generation).await;
            assert!(!slot.is_active().await);

            let second = slot
                .get_or_login(|| async { Ok("b".to_owned()) })
                .await
                .unwrap();
            assert_eq!(second.generation, 2);

            // A caller still holding the first lease must not evict the second.
            slot.invalidate(first.generation).await;
            assert!(slot.is_active().await);
        });
    }

    #[test]
    fn failed_login_leaves_slot_empty() {
        let slot = SessionSlot::<String>::new();

        tokio_test::block_on(async {
            let result = slot
                .get_or_login(|| async {
                    Err(Error::Authentication {
                        message: "nope".into(),
                    })
                })
                .await;
            assert!(matches!(result, Err(Error::Authentication { .. })));
            assert!(!slot.is_active().await);
        });
    }
}
