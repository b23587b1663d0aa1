// Public API client modules
//
// OAuth-authenticated REST client for `public-api.nello.io`. Responses use
// the `{ result: { success, status, message }, data }` envelope.

pub mod auth;
pub mod client;
pub mod locations;

pub use client::PublicClient;
