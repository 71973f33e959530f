//! "Is this user actually configured" summaries for the admin list and the
//! open edit session.
//!
//! Both views go through [`thresholds_configured`] on a migrated
//! configuration, so they cannot disagree.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::migrate::migrate_value;
use crate::schema::UserConfiguration;
use crate::threshold;
use crate::types::UserRecord;

/// Two independent status bits shown next to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStatus {
    pub notification_configured: bool,
    pub thresholds_configured: bool,
}

/// `has_channel` is the backend's live flag and wins outright. The token and
/// chat id pair is a fallback for when that flag lags behind.
pub fn notification_configured(has_channel: bool, token: &str, chat_id: &str) -> bool {
    has_channel || (!token.trim().is_empty() && !chat_id.trim().is_empty())
}

/// Any nonzero threshold anywhere under `pairSettings`.
///
/// Enabled flags are ignored, so a disabled pair with a threshold still
/// counts. `exchanges` and `exchangeSettings` never count.
///
/// A `pairSettings` that was stored in an unreadable shape is scanned as
/// stored.
pub fn thresholds_configured(config: &UserConfiguration) -> bool {
    if let Some(raw) = config.unreadable.get("pairSettings") {
        return any_leaf(raw, &leaf_is_configured);
    }
    match serde_json::to_value(&config.pair_settings) {
        Ok(tree) => any_leaf(&tree, &leaf_is_configured),
        Err(e) => {
            warn!(error = %e, "could not serialize pair settings, reporting as configured");
            true
        }
    }
}

/// Same as [`thresholds_configured`] but starting from the stored string.
///
/// A blob that does not parse, or is not a JSON object, reports `true`: an
/// unreadable configuration must never be shown as "nothing configured".
pub fn thresholds_configured_json(options_json: &str) -> bool {
    // Blank means never saved (a fresh user), not unreadable.
    if options_json.trim().is_empty() {
        return false;
    }
    match serde_json::from_str::<Value>(options_json) {
        Ok(Value::Null) => false,
        Ok(value @ Value::Object(_)) => thresholds_configured(&migrate_value(&value)),
        _ => true,
    }
}

/// Status row for the admin list, computed from a raw user record.
pub fn evaluate_record(record: &UserRecord) -> ActivityStatus {
    ActivityStatus {
        notification_configured: notification_configured(
            record.has_telegram,
            record.tg_token.as_deref().unwrap_or_default(),
            record.chat_id.as_deref().unwrap_or_default(),
        ),
        thresholds_configured: thresholds_configured_json(
            record.options_json.as_deref().unwrap_or_default(),
        ),
    }
}

/// Short-circuiting fold over scalar leaves.
///
/// Arrays and objects recurse; booleans and values under an `enabled` key are
/// skipped; `pred` sees strings and numbers only.
pub fn any_leaf<F>(value: &Value, pred: &F) -> bool
where
    F: Fn(&Value) -> bool,
{
    match value {
        Value::Null | Value::Bool(_) => false,
        Value::Number(_) | Value::String(_) => pred(value),
        Value::Array(items) => items.iter().any(|item| any_leaf(item, pred)),
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| key.as_str() != "enabled")
            .any(|(_, item)| any_leaf(item, pred)),
    }
}

fn leaf_is_configured(leaf: &Value) -> bool {
    match leaf {
        Value::String(s) => threshold::is_configured(s),
        Value::Number(n) => n.as_f64().is_some_and(|v| v.is_finite() && v != 0.0),
        _ => false,
    }
}
