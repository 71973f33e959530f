use serde::{Deserialize, Serialize};

use super::opt_string_or_number;

/// A user as returned by `GET /users` and `GET /users/{name}`.
///
/// `options_json` is the opaque serialized configuration; run it through
/// [`crate::migrate::migrate_str`] before editing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "name")]
    pub username: String,
    #[serde(default)]
    pub has_telegram: bool,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub tg_token: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub options_json: Option<String>,
}

/// Body of `POST /users/{name}/settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub tg_token: String,
    pub chat_id: String,
    pub options_json: String,
}
