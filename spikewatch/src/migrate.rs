//! Normalizes stored configuration blobs into the current schema.
//!
//! Migration is total: it never fails. Unparseable input is treated as an
//! empty configuration. Fragments that do not fit the current shape are kept
//! verbatim rather than discarded: malformed pair entries as
//! [`PairEntry::Malformed`], unknown exchanges and markets alongside the known
//! ones, and unreadable top-level fields in [`UserConfiguration::unreadable`].

use serde_json::{Map, Value};
use tracing::warn;

use crate::schema::{
    Exchange, Market, PairEntry, PairSetting, Threshold, ThresholdField, ThresholdSet,
    UserConfiguration, KNOWN_FIELDS, SCHEMA_VERSION,
};

/// Keys a current-shape pair entry may carry.
const PAIR_FIELDS: [&str; 4] = ["enabled", "delta", "volume", "shadow"];

/// Migrate a serialized `options_json` string.
///
/// Blank input is an empty configuration; malformed JSON is logged and also
/// treated as empty.
pub fn migrate_str(raw: &str) -> UserConfiguration {
    if raw.trim().is_empty() {
        return UserConfiguration::default();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => migrate_value(&value),
        Err(e) => {
            warn!(error = %e, "unparseable configuration, starting from empty");
            UserConfiguration::default()
        }
    }
}

/// Migrate an already-parsed configuration tree.
pub fn migrate_value(raw: &Value) -> UserConfiguration {
    let Some(root) = raw.as_object() else {
        warn!(kind = value_kind(raw), "configuration is not an object, starting from empty");
        return UserConfiguration::default();
    };

    if let Some(version) = root.get("schemaVersion").and_then(Value::as_u64) {
        if version > u64::from(SCHEMA_VERSION) {
            warn!(
                version,
                supported = SCHEMA_VERSION,
                "configuration written by a newer schema, normalizing anyway"
            );
        }
    }

    let mut config = UserConfiguration {
        extra: root
            .iter()
            .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        ..UserConfiguration::default()
    };
    migrate_exchanges(root.get("exchanges"), &mut config);
    migrate_exchange_settings(root.get("exchangeSettings"), &mut config);
    fold_exchange_switches(&mut config);
    migrate_pair_settings(root.get("pairSettings"), &mut config);
    migrate_thresholds(root.get("thresholds"), &mut config);
    migrate_blacklist(root.get("blacklist"), &mut config);
    config
}

/// Remember a known field whose shape cannot be read so it is written back
/// unchanged.
fn keep_unreadable(config: &mut UserConfiguration, field: &str, value: &Value) {
    warn!(field, kind = value_kind(value), "keeping unreadable field as stored");
    config.unreadable.insert(field.to_string(), value.clone());
}

/// Only an explicit `false` disables an exchange; everything else, including
/// a missing key, means enabled.
fn migrate_exchanges(raw: Option<&Value>, config: &mut UserConfiguration) {
    let loaded = match raw {
        None | Some(Value::Null) => return,
        Some(Value::Object(map)) => map,
        Some(other) => return keep_unreadable(config, "exchanges", other),
    };
    for (name, value) in loaded {
        match Exchange::from_key(name) {
            Some(exchange) => {
                config.exchanges.insert(exchange, *value != Value::Bool(false));
            }
            None => {
                warn!(exchange = %name, "keeping switch for unknown exchange as stored");
                config.unknown_exchanges.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Merge loaded settings over the full-coverage default, field by field and
/// market by market.
fn migrate_exchange_settings(raw: Option<&Value>, config: &mut UserConfiguration) {
    let loaded = match raw {
        None | Some(Value::Null) => return,
        Some(Value::Object(map)) => map,
        Some(other) => return keep_unreadable(config, "exchangeSettings", other),
    };

    for (name, value) in loaded {
        let Some(exchange) = Exchange::from_key(name) else {
            warn!(exchange = %name, "keeping settings for unknown exchange as stored");
            config
                .unknown_exchange_settings
                .insert(name.clone(), value.clone());
            continue;
        };
        let Some(markets) = value.as_object() else {
            warn!(%exchange, "exchange settings are not an object, keeping defaults");
            continue;
        };
        let target = config.exchange_settings.entry(exchange).or_default();
        for (market_name, fields) in markets {
            match (Market::from_key(market_name), fields.as_object()) {
                (Some(market), Some(fields)) => merge_threshold_set(target.get_mut(market), fields),
                (Some(market), None) => {
                    warn!(%exchange, %market, "market settings are not an object, keeping defaults");
                }
                (None, _) => {
                    target.extra.insert(market_name.clone(), fields.clone());
                }
            }
        }
    }
}

fn merge_threshold_set(target: &mut ThresholdSet, fields: &Map<String, Value>) {
    if let Some(enabled) = fields.get("enabled").and_then(Value::as_bool) {
        target.enabled = enabled;
    }
    for field in ThresholdField::ALL {
        if let Some(value) = fields.get(field.as_str()).and_then(scalar_threshold) {
            *target.get_mut(field) = value;
        }
    }
}

/// An exchange switched off in `exchanges` is off in both markets.
fn fold_exchange_switches(config: &mut UserConfiguration) {
    for (exchange, enabled) in &config.exchanges {
        if *enabled {
            continue;
        }
        if let Some(markets) = config.exchange_settings.get_mut(exchange) {
            markets.spot.enabled = false;
            markets.futures.enabled = false;
        }
    }
}

fn migrate_pair_settings(raw: Option<&Value>, config: &mut UserConfiguration) {
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::Object(entries)) => {
            config.pair_settings = entries
                .iter()
                .map(|(key, value)| (key.clone(), migrate_pair_entry(key, value)))
                .collect();
        }
        Some(other) => keep_unreadable(config, "pairSettings", other),
    }
}

fn migrate_pair_entry(key: &str, value: &Value) -> PairEntry {
    let upgraded;
    let obj = match value {
        Value::Object(obj) if !obj.contains_key("enabled") => {
            upgraded = upgrade_legacy(obj);
            Some(&upgraded)
        }
        Value::Object(obj) => Some(obj),
        _ => None,
    };
    match obj.and_then(setting_from_object) {
        Some(setting) => PairEntry::Setting(setting),
        None => {
            warn!(pair = %key, kind = value_kind(value), "keeping malformed pair entry as-is");
            PairEntry::Malformed(obj.map_or_else(|| value.clone(), |o| Value::Object(o.clone())))
        }
    }
}

/// Pre-`enabled` entries were implicitly active; absent or null thresholds
/// become `"0"`. Any other keys ride along untouched.
fn upgrade_legacy(obj: &Map<String, Value>) -> Map<String, Value> {
    let mut upgraded = obj.clone();
    upgraded.insert("enabled".into(), Value::Bool(true));
    for field in ThresholdField::ALL {
        let slot = upgraded
            .entry(field.as_str())
            .or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::String("0".into());
        }
    }
    upgraded
}

/// Read a current-shape entry. Returns `None` for anything that would not
/// survive a round trip unchanged: a non-boolean `enabled`, a non-scalar
/// threshold or an unknown key.
pub(crate) fn setting_from_object(obj: &Map<String, Value>) -> Option<PairSetting> {
    if obj.keys().any(|k| !PAIR_FIELDS.contains(&k.as_str())) {
        return None;
    }
    let enabled = obj.get("enabled")?.as_bool()?;
    let field = |name: &str| match obj.get(name) {
        None | Some(Value::Null) => Some(Threshold::default()),
        Some(v) => scalar_threshold(v),
    };
    Some(PairSetting {
        enabled,
        delta: field("delta")?,
        volume: field("volume")?,
        shadow: field("shadow")?,
    })
}

fn migrate_thresholds(raw: Option<&Value>, config: &mut UserConfiguration) {
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => config.thresholds = map.clone(),
        Some(other) => keep_unreadable(config, "thresholds", other),
    }
}

/// String items become the symbol set. A list holding anything else is also
/// kept as stored.
fn migrate_blacklist(raw: Option<&Value>, config: &mut UserConfiguration) {
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            config.blacklist = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            if items.iter().any(|item| !item.is_string()) {
                keep_unreadable(config, "blacklist", &Value::Array(items.clone()));
            }
        }
        Some(other) => keep_unreadable(config, "blacklist", other),
    }
}

/// A string or number threshold, kept in its stored type.
fn scalar_threshold(value: &Value) -> Option<Threshold> {
    match value {
        Value::String(s) => Some(Threshold::from(s.as_str())),
        Value::Number(n) => Some(Threshold::number(n.clone())),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
