// Location views
//
// Capability traits describe which operations a client variant supports.
// `Location` binds one location record to a borrowed client and exposes the
// operations that client supports, without the caller threading ids around.

use std::fmt;
use std::future::Future;

use crate::error::Error;
use crate::legacy::LegacyClient;
use crate::models::{ActivityRecord, LocationRecord, TimeWindow, WebhookAction};
use crate::public::PublicClient;

// ── Capabilities ────────────────────────────────────────────────────

/// Operations every client variant supports.
pub trait LockApi: Sync {
    fn list_locations(&self) -> impl Future<Output = Result<Vec<LocationRecord>, Error>> + Send;

    fn open_door(&self, location_id: &str) -> impl Future<Output = Result<bool, Error>> + Send;

    /// All locations, each bound to this client.
    fn locations(&self) -> impl Future<Output = Result<Vec<Location<'_, Self>>, Error>> + Send
    where
        Self: Sized,
    {
        async move {
            let records = self.list_locations().await?;
            Ok(records
                .into_iter()
                .map(|record| Location::new(self, record))
                .collect())
        }
    }

    /// The first listed location. Fails with [`Error::NotFound`] when the
    /// account has none.
    fn main_location(&self) -> impl Future<Output = Result<Location<'_, Self>, Error>> + Send
    where
        Self: Sized,
    {
        async move {
            self.locations()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::NotFound("no locations available".into()))
        }
    }
}

/// Activity feed access (private API).
pub trait ActivityApi: LockApi {
    fn get_activity(
        &self,
        location_id: &str,
    ) -> impl Future<Output = Result<Vec<ActivityRecord>, Error>> + Send;
}

/// Webhook registration (public API).
pub trait WebhookApi: LockApi {
    fn set_webhook(
        &self,
        location_id: &str,
        url: &str,
        actions: &[WebhookAction],
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete_webhook(&self, location_id: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Time window management (public API).
pub trait TimeWindowApi: LockApi {
    fn list_time_windows(
        &self,
        location_id: &str,
    ) -> impl Future<Output = Result<Vec<TimeWindow>, Error>> + Send;

    fn create_time_window(
        &self,
        location_id: &str,
        name: &str,
        ical: &str,
    ) -> impl Future<Output = Result<TimeWindow, Error>> + Send;

    fn delete_time_window(
        &self,
        location_id: &str,
        time_window_id: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

impl LockApi for PublicClient {
    async fn list_locations(&self) -> Result<Vec<LocationRecord>, Error> {
        PublicClient::list_locations(self).await
    }

    async fn open_door(&self, location_id: &str) -> Result<bool, Error> {
        PublicClient::open_door(self, location_id).await
    }
}

impl WebhookApi for PublicClient {
    async fn set_webhook(
        &self,
        location_id: &str,
        url: &str,
        actions: &[WebhookAction],
    ) -> Result<(), Error> {
        PublicClient::set_webhook(self, location_id, url, actions).await
    }

    async fn delete_webhook(&self, location_id: &str) -> Result<(), Error> {
        PublicClient::delete_webhook(self, location_id).await
    }
}

impl TimeWindowApi for PublicClient {
    async fn list_time_windows(&self, location_id: &str) -> Result<Vec<TimeWindow>, Error> {
        PublicClient::list_time_windows(self, location_id).await
    }

    async fn create_time_window(
        &self,
        location_id: &str,
        name: &str,
        ical: &str,
    ) -> Result<TimeWindow, Error> {
        PublicClient::create_time_window(self, location_id, name, ical).await
    }

    async fn delete_time_window(&self, location_id: &str, time_window_id: &str) -> Result<(), Error> {
        PublicClient::delete_time_window(self, location_id, time_window_id).await
    }
}

impl LockApi for LegacyClient {
    async fn list_locations(&self) -> Result<Vec<LocationRecord>, Error> {
        LegacyClient::list_locations(self).await
    }

    async fn open_door(&self, location_id: &str) -> Result<bool, Error> {
        LegacyClient::open_door(self, location_id).await
    }
}

impl ActivityApi for LegacyClient {
    async fn get_activity(&self, location_id: &str) -> Result<Vec<ActivityRecord>, Error> {
        LegacyClient::get_activity(self, location_id).await
    }
}

// ── Location view ───────────────────────────────────────────────────

/// A location bound to the client it was listed from.
///
/// Holds only the record and a borrow of the client; every operation
/// delegates to the client with this location's id.
pub struct Location<'a, C> {
    client: &'a C,
    record: LocationRecord,
}

impl<'a, C> Location<'a, C> {
    pub fn new(client: &'a C, record: LocationRecord) -> Self {
        Self { client, record }
    }

    pub fn id(&self) -> &str {
        &self.record.location_id
    }

    pub fn record(&self) -> &LocationRecord {
        &self.record
    }

    pub fn client(&self) -> &'a C {
        self.client
    }

    pub fn into_record(self) -> LocationRecord {
        self.record
    }
}

impl<C: LockApi> Location<'_, C> {
    pub async fn open_door(&self) -> Result<bool, Error> {
        self.client.open_door(self.id()).await
    }

    /// Re-read this location's record from a fresh listing.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let records = self.client.list_locations().await?;
        let record = records
            .into_iter()
            .find(|r| r.location_id == self.record.location_id)
            .ok_or_else(|| Error::NotFound(format!("location {}", self.record.location_id)))?;
        self.record = record;
        Ok(())
    }
}

impl<C: ActivityApi> Location<'_, C> {
    /// Recent activity, newest first.
    pub async fn activity(&self) -> Result<Vec<ActivityRecord>, Error> {
        self.client.get_activity(self.id()).await
    }
}

impl<C: WebhookApi> Location<'_, C> {
    pub async fn set_webhook(&self, url: &str, actions: &[WebhookAction]) -> Result<(), Error> {
        self.client.set_webhook(self.id(), url, actions).await
    }

    pub async fn delete_webhook(&self) -> Result<(), Error> {
        self.client.delete_webhook(self.id()).await
    }
}

impl<C: TimeWindowApi> Location<'_, C> {
    pub async fn time_windows(&self) -> Result<Vec<TimeWindow>, Error> {
        self.client.list_time_windows(self.id()).await
    }

    pub async fn create_time_window(&self, name: &str, ical: &str) -> Result<TimeWindow, Error> {
        self.client.create_time_window(self.id(), name, ical).await
    }

    pub async fn delete_time_window(&self, time_window_id: &str) -> Result<(), Error> {
        self.client
            .delete_time_window(self.id(), time_window_id)
            .await
    }
}

impl<C> fmt::Display for Location<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.record.fmt(f)
    }
}

impl<C> fmt::Debug for Location<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
