//! Seams to the external backend.
//!
//! The admin console and the statistics refresher only see these traits;
//! [`DashboardHttpClient`] is the production implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::rest::DashboardHttpClient;
use crate::types::{SettingsUpdate, SpikeRecord, UserRecord};

/// Stores and loads user records with their opaque `options_json`.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    async fn get_user(&self, username: &str) -> Result<UserRecord>;

    async fn save_settings(&self, username: &str, update: &SettingsUpdate) -> Result<()>;

    async fn delete_user(&self, username: &str) -> Result<()>;
}

/// Read-only source of detected spikes for the statistics view.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_spikes(&self) -> Result<Vec<SpikeRecord>>;
}

#[async_trait]
impl PersistenceGateway for DashboardHttpClient {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        DashboardHttpClient::list_users(self).await
    }

    async fn get_user(&self, username: &str) -> Result<UserRecord> {
        DashboardHttpClient::get_user(self, username).await
    }

    async fn save_settings(&self, username: &str, update: &SettingsUpdate) -> Result<()> {
        DashboardHttpClient::save_settings(self, username, update).await
    }

    async fn delete_user(&self, username: &str) -> Result<()> {
        DashboardHttpClient::delete_user(self, username).await
    }
}

#[async_trait]
impl StatsSource for DashboardHttpClient {
    async fn fetch_spikes(&self) -> Result<Vec<SpikeRecord>> {
        self.get_spikes().await
    }
}
