use crate::error::Result;
use crate::rest::DashboardHttpClient;
use crate::types::*;

impl DashboardHttpClient {
    // --- Users ---

    /// GET /users - All users with their stored configuration.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.get(&["users"]).await
    }

    /// GET /users/{name} - One user record.
    pub async fn get_user(&self, username: &str) -> Result<UserRecord> {
        self.get(&["users", username]).await
    }

    /// POST /users/{name}/settings - Persist channel fields and configuration.
    pub async fn save_settings(&self, username: &str, update: &SettingsUpdate) -> Result<()> {
        self.post(&["users", username, "settings"], update).await
    }

    /// DELETE /users/{name}/delete - Remove a user.
    ///
    /// Callers are expected to have checked protected names first; see
    /// [`crate::session::AdminConsole::delete_user`].
    pub async fn delete_user(&self, username: &str) -> Result<()> {
        self.delete(&["users", username, "delete"]).await
    }

    // --- Statistics ---

    /// GET /stats - Recently detected spikes.
    pub async fn get_spikes(&self) -> Result<Vec<SpikeRecord>> {
        self.get(&["stats"]).await
    }
}
