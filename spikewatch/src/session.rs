//! Admin console and single-owner edit sessions.
//!
//! An [`EditSession`] owns one user's in-memory configuration for the duration
//! of an edit. Several sessions (one per browser tab, say) can be open at
//! once; the [`AdminConsole`] they share refuses to run two saves for the
//! same user at the same time.

use std::sync::Arc;

use dashmap::DashSet;
use serde::Serialize;
use tracing::{info, warn};

use crate::activity::{self, ActivityStatus};
use crate::cascade::CascadeReport;
use crate::error::{DashboardError, Result};
use crate::gateway::PersistenceGateway;
use crate::migrate::migrate_str;
use crate::schema::{ExchangeMarketKey, ThresholdField, UserConfiguration};
use crate::types::{SettingsUpdate, UserRecord};

/// Names that can never be deleted, besides the configured super-admin.
const PROTECTED_USERS: [&str; 1] = ["stats"];

/// One row of the admin user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatus {
    pub username: String,
    #[serde(flatten)]
    pub status: ActivityStatus,
}

// ---------------------------------------------------------------------------
// EditSession
// ---------------------------------------------------------------------------

/// A user's configuration open for editing.
#[derive(Debug, Clone)]
pub struct EditSession {
    username: String,
    config: UserConfiguration,
    tg_token: String,
    chat_id: String,
    has_notification_channel: bool,
    dirty: bool,
}

impl EditSession {
    /// Migrate a freshly loaded record into a session.
    pub fn from_record(record: UserRecord) -> Self {
        let config = migrate_str(record.options_json.as_deref().unwrap_or_default());
        let malformed = config.malformed_pairs();
        if !malformed.is_empty() {
            warn!(user = %record.username, pairs = ?malformed, "configuration has malformed pair entries");
        }
        Self {
            username: record.username,
            config,
            tg_token: record.tg_token.unwrap_or_default(),
            chat_id: record.chat_id.unwrap_or_default(),
            has_notification_channel: record.has_telegram,
            dirty: false,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn config(&self) -> &UserConfiguration {
        &self.config
    }

    /// Whether there are edits not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Same evaluation the admin list uses.
    pub fn status(&self) -> ActivityStatus {
        ActivityStatus {
            notification_configured: activity::notification_configured(
                self.has_notification_channel,
                &self.tg_token,
                &self.chat_id,
            ),
            thresholds_configured: activity::thresholds_configured(&self.config),
        }
    }

    pub fn set_exchange_market_enabled(
        &mut self,
        key: ExchangeMarketKey,
        enabled: bool,
    ) -> CascadeReport {
        self.dirty = true;
        self.config.set_exchange_market_enabled(key, enabled)
    }

    pub fn set_pair_enabled(&mut self, pair: &str, enabled: bool) -> Result<()> {
        self.config.set_pair_enabled(pair, enabled)?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_pair_threshold(&mut self, pair: &str, field: ThresholdField, raw: &str) -> Result<()> {
        self.config.set_pair_threshold(pair, field, raw)?;
        self.dirty = true;
        Ok(())
    }

    /// Update the opaque notification channel fields.
    pub fn set_channel(&mut self, tg_token: impl Into<String>, chat_id: impl Into<String>) {
        self.tg_token = tg_token.into();
        self.chat_id = chat_id.into();
        self.dirty = true;
    }

    /// Request body for persisting this session.
    pub fn settings_update(&self) -> Result<SettingsUpdate> {
        Ok(SettingsUpdate {
            tg_token: self.tg_token.clone(),
            chat_id: self.chat_id.clone(),
            options_json: self.config.to_options_json()?,
        })
    }
}

// ---------------------------------------------------------------------------
// AdminConsole
// ---------------------------------------------------------------------------

/// Entry point for admin operations against the persistence gateway.
///
/// Cheap to clone; clones share the in-flight save set.
#[derive(Clone)]
pub struct AdminConsole {
    gateway: Arc<dyn PersistenceGateway>,
    super_admin: String,
    saves_in_flight: Arc<DashSet<String>>,
}

/// Removes its user from the in-flight set when dropped, including when the
/// save future is cancelled.
struct InFlightSave {
    set: Arc<DashSet<String>>,
    username: String,
}

impl Drop for InFlightSave {
    fn drop(&mut self) {
        self.set.remove(&self.username);
    }
}

impl AdminConsole {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, super_admin: impl Into<String>) -> Self {
        Self {
            gateway,
            super_admin: super_admin.into(),
            saves_in_flight: Arc::new(DashSet::new()),
        }
    }

    /// Load every user and evaluate their status rows.
    pub async fn list_statuses(&self) -> Result<Vec<UserStatus>> {
        let users = self.gateway.list_users().await?;
        Ok(users
            .iter()
            .map(|record| UserStatus {
                username: record.username.clone(),
                status: activity::evaluate_record(record),
            })
            .collect())
    }

    /// Load and migrate one user. On failure no session exists.
    pub async fn open_session(&self, username: &str) -> Result<EditSession> {
        let record = self.gateway.get_user(username).await.map_err(|e| {
            warn!(user = username, error = %e, "failed to load user");
            e
        })?;
        info!(user = username, "edit session opened");
        Ok(EditSession::from_record(record))
    }

    /// Persist a session.
    ///
    /// Fails with [`DashboardError::SaveInFlight`] without touching the
    /// network if another save for the same user is running. On a backend
    /// failure the session keeps its edits so the save can be retried.
    pub async fn save(&self, session: &mut EditSession) -> Result<()> {
        let _guard = self.begin_save(session.username())?;
        let update = session.settings_update()?;
        match self.gateway.save_settings(session.username(), &update).await {
            Ok(()) => {
                session.dirty = false;
                info!(user = session.username(), "settings saved");
                Ok(())
            }
            Err(e) => {
                warn!(user = session.username(), error = %e, "save failed, edits kept");
                Err(e)
            }
        }
    }

    pub fn is_saving(&self, username: &str) -> bool {
        self.saves_in_flight.contains(username)
    }

    /// `Stats` and the super-admin, compared case-insensitively.
    pub fn is_protected(&self, username: &str) -> bool {
        let name = username.trim();
        PROTECTED_USERS
            .iter()
            .any(|p| p.eq_ignore_ascii_case(name))
            || self.super_admin.trim().eq_ignore_ascii_case(name)
    }

    /// Delete a user. Protected names are rejected before any request.
    pub async fn delete_user(&self, username: &str) -> Result<()> {
        if self.is_protected(username) {
            warn!(user = username, "refusing to delete protected user");
            return Err(DashboardError::ProtectedUser(username.to_string()));
        }
        self.gateway.delete_user(username).await?;
        info!(user = username, "user deleted");
        Ok(())
    }

    fn begin_save(&self, username: &str) -> Result<InFlightSave> {
        if !self.saves_in_flight.insert(username.to_string()) {
            return Err(DashboardError::SaveInFlight(username.to_string()));
        }
        Ok(InFlightSave {
            set: Arc::clone(&self.saves_in_flight),
            username: username.to_string(),
        })
    }
}
