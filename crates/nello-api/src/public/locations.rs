// Public API location endpoints
//
// Everything here is scoped under `locations/`: listing, opening the door,
// time windows, and the webhook registration.

use reqwest::Method;
use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::models::{LocationRecord, TimeWindow, WebhookAction};
use crate::public::client::PublicClient;

impl PublicClient {
    /// List all locations the account has access to, in vendor order.
    ///
    /// `GET locations/`
    pub async fn list_locations(&self) -> Result<Vec<LocationRecord>, Error> {
        debug!("listing locations");
        self.request(Method::GET, self.endpoint(&["locations"])?, None)
            .await?
            .into_data()
    }

    /// Open the door of a location. Returns the vendor's success flag.
    ///
    /// `PUT locations/{id}/open/`
    pub async fn open_door(&self, location_id: &str) -> Result<bool, Error> {
        debug!(location_id, "opening door");
        let envelope = self
            .request::<serde_json::Value>(
                Method::PUT,
                self.endpoint(&["locations", location_id, "open"])?,
                None,
            )
            .await?;
        Ok(envelope.succeeded())
    }

    /// List the time windows configured for a location.
    ///
    /// `GET locations/{id}/tw/`
    pub async fn list_time_windows(&self, location_id: &str) -> Result<Vec<TimeWindow>, Error> {
        debug!(location_id, "listing time windows");
        let envelope = self
            .request::<Vec<TimeWindow>>(
                Method::GET,
                self.endpoint(&["locations", location_id, "tw"])?,
                None,
            )
            .await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Create a time window from an iCalendar event.
    ///
    /// `POST locations/{id}/tw/` with `{"name": "...", "ical": "..."}`
    pub async fn create_time_window(
        &self,
        location_id: &str,
        name: &str,
        ical: &str,
    ) -> Result<TimeWindow, Error> {
        debug!(location_id, name, "creating time window");
        let body = json!({ "name": name, "ical": ical });
        self.request(
            Method::POST,
            self.endpoint(&["locations", location_id, "tw"])?,
            Some(&body),
        )
        .await?
        .into_data()
    }

    /// Delete a time window.
    ///
    /// `DELETE locations/{id}/tw/{tw_id}/`
    pub async fn delete_time_window(
        &self,
        location_id: &str,
        time_window_id: &str,
    ) -> Result<(), Error> {
        debug!(location_id, time_window_id, "deleting time window");
        self.request::<serde_json::Value>(
            Method::DELETE,
            self.endpoint(&["locations", location_id, "tw", time_window_id])?,
            None,
        )
        .await?;
        Ok(())
    }

    /// Register (or replace) the webhook called on location events.
    ///
    /// An empty `actions` slice subscribes to every action. URL validation
    /// happens server-side; a rejected URL comes back as [`Error::Api`].
    ///
    /// `PUT locations/{id}/webhook/` with `{"url": "...", "actions": [...]}`
    pub async fn set_webhook(
        &self,
        location_id: &str,
        url: &str,
        actions: &[WebhookAction],
    ) -> Result<(), Error> {
        let actions = if actions.is_empty() {
            WebhookAction::ALL
        } else {
            actions
        };
        debug!(location_id, url, ?actions, "setting webhook");
        let body = json!({ "url": url, "actions": actions });
        self.request::<serde_json::Value>(
            Method::PUT,
            self.endpoint(&["locations", location_id, "webhook"])?,
            Some(&body),
        )
        .await?;
        Ok(())
    }

    /// Remove the webhook of a location.
    ///
    /// `DELETE locations/{id}/webhook/`
    pub async fn delete_webhook(&self, location_id: &str) -> Result<(), Error> {
        debug!(location_id, "deleting webhook");
        self.request::<serde_json::Value>(
            Method::DELETE,
            self.endpoint(&["locations", location_id, "webhook"])?,
            None,
        )
        .await?;
        Ok(())
    }
}
