// Private API client modules
//
// Cookie-authenticated client for `api.nello.io`, the backend of the vendor's
// own app. Responses carry a `result: { status, message }` block next to the
// payload fields.

pub mod auth;
pub mod client;
pub mod locations;

pub use client::LegacyClient;
