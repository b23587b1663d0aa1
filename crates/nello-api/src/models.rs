// Nello response types
//
// Typed views of the vendor's JSON. Required fields fail deserialization at
// the boundary; everything else is optional because the vendor is loose
// about field presence. Unknown fields are kept in `extra`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

// ── Location ────────────────────────────────────────────────────────

/// One lock-equipped location, as listed by either API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub location_id: String,
    #[serde(default)]
    pub address: Option<Address>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Display for LocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{address} - {}", self.location_id),
            None => write!(f, "{}", self.location_id),
        }
    }
}

/// Location address: structured on the public API, sometimes plain text on
/// the private one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    Postal(PostalAddress),
    Text(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postal(postal) => postal.fmt(f),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub country: Option<String>,
}

impl PostalAddress {
    /// German addresses put the house number after the street.
    pub fn is_german(&self) -> bool {
        self.country.as_deref().is_some_and(|c| {
            c.eq_ignore_ascii_case("deutschland") || c.eq_ignore_ascii_case("germany")
        })
    }
}

impl fmt::Display for PostalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        let (first, second) = if self.is_german() {
            (field(&self.street), field(&self.number))
        } else {
            (field(&self.number), field(&self.street))
        };
        write!(
            f,
            "{first} {second} {} {}{}, {}",
            field(&self.zip),
            field(&self.city),
            field(&self.state),
            field(&self.country),
        )
    }
}

// ── Activity ────────────────────────────────────────────────────────

/// One entry of a location's activity feed (private API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default, rename = "date", deserialize_with = "lenient_opt_string")]
    pub timestamp: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_opt_string")]
    pub kind: Option<String>,
    #[serde(default, rename = "name", deserialize_with = "lenient_opt_string")]
    pub actor: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Time windows ────────────────────────────────────────────────────

/// A recurring access window attached to a location (public API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ical: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Webhooks ────────────────────────────────────────────────────────

/// Events a webhook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAction {
    /// Door opened via the app.
    Swipe,
    /// Door opened by geofencing.
    Geo,
    /// Door opened inside a time window.
    Tw,
    /// Bell rang but access was denied.
    Deny,
}

impl WebhookAction {
    pub const ALL: &'static [Self] = &[Self::Swipe, Self::Geo, Self::Tw, Self::Deny];
}

// ── Envelopes ───────────────────────────────────────────────────────

/// `result` block of the public API envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PublicResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Public API envelope: `{ "result": {...}, "data": ... }`.
///
/// `raw` and `http_status` are filled in after parsing so that a missing
/// `data` block can still be reported with the vendor's reply.
#[derive(Debug, Deserialize)]
pub(crate) struct PublicEnvelope<T> {
    pub result: Option<PublicResult>,
    pub data: Option<T>,
    #[serde(skip)]
    pub raw: String,
    #[serde(skip)]
    pub http_status: u16,
}

impl<T> PublicEnvelope<T> {
    /// A 2xx response without a `result` block counts as success.
    pub(crate) fn succeeded(&self) -> bool {
        self.result.as_ref().is_none_or(|r| r.success)
    }

    /// Take `data`.
    ///
    /// Without `data`, an unsuccessful `result` becomes [`Error::Api`]
    /// carrying the vendor's status and message; otherwise the reply is
    /// malformed and becomes [`Error::Deserialization`].
    pub(crate) fn into_data(self) -> Result<T, Error> {
        if let Some(data) = self.data {
            return Ok(data);
        }
        match self.result {
            Some(result) if !result.success => Err(Error::Api {
                status: result
                    .status
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(self.http_status),
                message: result
                    .message
                    .unwrap_or_else(|| "request was not successful".into()),
                body: self.raw,
            }),
            _ => Err(Error::Deserialization {
                message: "response is missing `data`".into(),
                body: self.raw,
            }),
        }
    }
}

/// `result` block of the private API envelope. Success is a status of
/// `"200"` (most endpoints) or `"OK"` (login).
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PrivateResult {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PrivateResult {
    pub(crate) fn is_success(&self) -> bool {
        matches!(self.status.as_deref(), Some("200" | "OK"))
    }

    /// The private API reports an expired session as status `"400"`.
    pub(crate) fn is_session_expired(&self) -> bool {
        self.status.as_deref() == Some("400")
    }
}

/// Response of `POST login` on the private API.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub authentication: bool,
    #[serde(default)]
    pub user: Option<LoginUser>,
    #[serde(default)]
    pub result: PrivateResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginUser {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub user_id: Option<String>,
}

/// OAuth token endpoint success body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// OAuth token endpoint error body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

// ── Lenient scalars ─────────────────────────────────────────────────

/// Accept a string or any other scalar and keep it as a string.
/// Ids and zip codes show up both quoted and unquoted.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_opt_string(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a string or number, got null"))
}
