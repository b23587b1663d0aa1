// Private API location endpoints

use reqwest::Method;
use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::legacy::client::LegacyClient;
use crate::models::{ActivityRecord, LocationRecord};
use crate::transport::endpoint_url;

impl LegacyClient {
    /// List the locations (geofences) the account has access to.
    ///
    /// `GET locations/`
    pub async fn list_locations(&self) -> Result<Vec<LocationRecord>, Error> {
        debug!("listing locations");
        let url = self.endpoint(&["locations"], true)?;
        self.request(Method::GET, |_| Ok(url.clone()), None)
            .await?
            .into_field("geofences")
    }

    /// Fetch a location's activity feed, newest first, exactly as the
    /// vendor returns it.
    ///
    /// `GET locations/{id}/activity`
    pub async fn get_activity(&self, location_id: &str) -> Result<Vec<ActivityRecord>, Error> {
        debug!(location_id, "fetching activity");
        let url = self.endpoint(&["locations", location_id, "activity"], false)?;
        self.request(Method::GET, |_| Ok(url.clone()), None)
            .await?
            .into_field("activities")
    }

    /// Ring the buzzer, i.e. open the door. Returns the vendor's success flag.
    ///
    /// `POST locations/{id}/users/{user_id}/open` with `{"type": "swipe"}`
    pub async fn open_door(&self, location_id: &str) -> Result<bool, Error> {
        debug!(location_id, "opening door");
        let users = self.endpoint(&["locations", location_id, "users"], false)?;
        let body = json!({ "type": "swipe" });
        let reply = self
            .request(
                Method::POST,
                |session| endpoint_url(&users, &[session.user_id.as_str(), "open"], false),
                Some(&body),
            )
            .await?;
        Ok(reply.is_success())
    }
}
