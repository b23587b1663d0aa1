//! Async Rust client for the Nello intercom APIs.
//!
//! Two independent client variants cover the vendor's two API surfaces:
//!
//! - **[`PublicClient`]** talks to the public REST API. It authenticates
//!   with the OAuth password grant and sends a bearer token on each request.
//!   Supports locations, opening the door, webhooks, and time windows.
//! - **[`LegacyClient`]** talks to the private API used by the vendor's app.
//!   It logs in with a hashed password and keeps the session cookie in a jar.
//!   Supports locations, opening the door, and the activity feed.
//!
//! Both clients log in lazily on first use, reuse the cached credential
//! until the vendor rejects it, and then re-authenticate once and retry the
//! call a single time. [`Location`] binds a listed location to its client so
//! operations can be invoked without passing the id around.
//!
//! ```no_run
//! use nello_api::{ClientConfig, Credentials, LockApi, PublicClient};
//!
//! # async fn example() -> Result<(), nello_api::Error> {
//! let credentials = Credentials::new("me@example.com", "password").with_client_id("my-app");
//! let client = PublicClient::new(credentials, ClientConfig::default())?;
//!
//! let location = client.main_location().await?;
//! println!("opening {location}");
//! location.open_door().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod legacy;
pub mod location;
pub mod models;
pub mod public;
pub mod transport;

pub use auth::{Credentials, hash_password};
pub use config::ClientConfig;
pub use error::Error;
pub use legacy::LegacyClient;
pub use location::{ActivityApi, Location, LockApi, TimeWindowApi, WebhookApi};
pub use models::{ActivityRecord, Address, LocationRecord, PostalAddress, TimeWindow, WebhookAction};
pub use public::PublicClient;
pub use transport::{TlsMode, TransportConfig};
