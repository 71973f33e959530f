//! Current (version 2) shape of a user's monitoring configuration.
//!
//! Everything downstream of [`crate::migrate`] works on these types only;
//! legacy shapes never leak past the migrator.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::error::{DashboardError, Result};

/// Version tag written into every migrated configuration.
pub const SCHEMA_VERSION: u32 = 2;

/// Top-level fields the migrator understands. Anything else is carried in
/// [`UserConfiguration::extra`].
pub(crate) const KNOWN_FIELDS: [&str; 6] = [
    "schemaVersion",
    "exchanges",
    "exchangeSettings",
    "pairSettings",
    "thresholds",
    "blacklist",
];

// ---------------------------------------------------------------------------
// Exchange / market identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bybit,
    Bitget,
    Gate,
    Hyperliquid,
}

impl Exchange {
    /// Exact match on the stored key. Stored keys are never case-folded so that
    /// anything unrecognized can be written back as it was.
    pub fn from_key(key: &str) -> Option<Exchange> {
        Exchange::ALL.into_iter().find(|e| e.as_str() == key)
    }

    pub const ALL: [Exchange; 5] = [
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Bitget,
        Exchange::Gate,
        Exchange::Hyperliquid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Bitget => "bitget",
            Exchange::Gate => "gate",
            Exchange::Hyperliquid => "hyperliquid",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Exchange::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::InvalidKey(format!("unknown exchange \"{s}\"")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Spot,
    Futures,
}

impl Market {
    pub const ALL: [Market; 2] = [Market::Spot, Market::Futures];

    pub fn from_key(key: &str) -> Option<Market> {
        Market::ALL.into_iter().find(|m| m.as_str() == key)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Market::Spot => "spot",
            Market::Futures => "futures",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        Market::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::InvalidKey(format!("unknown market \"{s}\"")))
    }
}

/// One of the ten `(exchange, market)` combinations, flattened as
/// `"exchange_market"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExchangeMarketKey {
    pub exchange: Exchange,
    pub market: Market,
}

impl ExchangeMarketKey {
    pub fn new(exchange: Exchange, market: Market) -> Self {
        Self { exchange, market }
    }

    /// All ten combinations, exchange-major.
    pub fn all() -> impl Iterator<Item = ExchangeMarketKey> {
        Exchange::ALL
            .into_iter()
            .flat_map(|e| Market::ALL.into_iter().map(move |m| Self::new(e, m)))
    }

    /// Legal pair symbols for this combination.
    pub fn symbols(self) -> &'static [&'static str] {
        pair_symbols(self.exchange, self.market)
    }

    pub fn is_canonical(self, symbol: &str) -> bool {
        self.symbols().contains(&symbol)
    }

    /// Prefix shared by every pair key under this combination (`"binance_spot_"`).
    pub fn pair_prefix(self) -> String {
        format!("{self}_")
    }
}

impl fmt::Display for ExchangeMarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.exchange, self.market)
    }
}

impl FromStr for ExchangeMarketKey {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let (exchange, market) = s
            .split_once('_')
            .ok_or_else(|| DashboardError::InvalidKey(s.to_string()))?;
        Ok(Self::new(exchange.parse()?, market.parse()?))
    }
}

impl Serialize for ExchangeMarketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A monitored pair, flattened as `"exchange_market_SYMBOL"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub exchange: Exchange,
    pub market: Market,
    pub symbol: String,
}

impl PairKey {
    pub fn new(exchange: Exchange, market: Market, symbol: impl Into<String>) -> Self {
        Self {
            exchange,
            market,
            symbol: symbol.into(),
        }
    }

    pub fn exchange_market(&self) -> ExchangeMarketKey {
        ExchangeMarketKey::new(self.exchange, self.market)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.exchange, self.market, self.symbol)
    }
}

impl FromStr for PairKey {
    type Err = DashboardError;

    /// Splits on the first two underscores; the symbol keeps any further ones.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, '_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(exchange), Some(market), Some(symbol)) if !symbol.is_empty() => {
                Ok(Self::new(exchange.parse()?, market.parse()?, symbol))
            }
            _ => Err(DashboardError::InvalidKey(s.to_string())),
        }
    }
}

/// Authoritative pair table. Never inferred from stored keys.
pub fn pair_symbols(exchange: Exchange, market: Market) -> &'static [&'static str] {
    match (exchange, market) {
        (Exchange::Binance, Market::Spot) => &[
            "USDT", "USDC", "FDUSD", "BTC", "ETH", "BNB", "TRY", "EUR", "BRL", "JPY", "TUSD",
            "DAI", "AEUR", "BIDR", "IDRT", "UAH",
        ],
        (Exchange::Binance, Market::Futures) => &["USDT", "USDC"],
        (Exchange::Hyperliquid, _) => &["USDC"],
        (Exchange::Bybit | Exchange::Bitget | Exchange::Gate, _) => &["USDT"],
    }
}

// ---------------------------------------------------------------------------
// Threshold sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdField {
    /// Price move, percent.
    Delta,
    /// Traded volume, quote currency.
    Volume,
    /// Wick size, percent.
    Shadow,
}

impl ThresholdField {
    pub const ALL: [ThresholdField; 3] = [
        ThresholdField::Delta,
        ThresholdField::Volume,
        ThresholdField::Shadow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThresholdField::Delta => "delta",
            ThresholdField::Volume => "volume",
            ThresholdField::Shadow => "shadow",
        }
    }
}

impl fmt::Display for ThresholdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdField {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        ThresholdField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::InvalidKey(format!("unknown threshold \"{s}\"")))
    }
}

/// One stored threshold value.
///
/// Operator input is kept as typed, so `""` (unset) and `"0"` stay distinct.
/// A value stored as a JSON number stays a number on the way back out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Threshold {
    text: String,
    number: Option<Number>,
}

impl Threshold {
    pub fn number(number: Number) -> Self {
        Self {
            text: number.to_string(),
            number: Some(number),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_number(&self) -> bool {
        self.number.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for Threshold {
    fn from(text: String) -> Self {
        Self { text, number: None }
    }
}

impl From<&str> for Threshold {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl PartialEq<str> for Threshold {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Threshold {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Threshold {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.number {
            Some(number) => number.serialize(serializer),
            None => serializer.serialize_str(&self.text),
        }
    }
}

/// `{ enabled, delta, volume, shadow }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdSet {
    pub enabled: bool,
    pub delta: Threshold,
    pub volume: Threshold,
    pub shadow: Threshold,
}

/// Per-pair settings share the threshold-set shape.
pub type PairSetting = ThresholdSet;

impl ThresholdSet {
    /// Enabled with every threshold `"0"`, the `exchangeSettings` default.
    pub fn enabled_zeroed() -> Self {
        Self {
            enabled: true,
            delta: "0".into(),
            volume: "0".into(),
            shadow: "0".into(),
        }
    }

    /// Every threshold unset.
    pub fn unset(enabled: bool) -> Self {
        Self {
            enabled,
            delta: Threshold::default(),
            volume: Threshold::default(),
            shadow: Threshold::default(),
        }
    }

    pub fn get(&self, field: ThresholdField) -> &Threshold {
        match field {
            ThresholdField::Delta => &self.delta,
            ThresholdField::Volume => &self.volume,
            ThresholdField::Shadow => &self.shadow,
        }
    }

    pub fn get_mut(&mut self, field: ThresholdField) -> &mut Threshold {
        match field {
            ThresholdField::Delta => &mut self.delta,
            ThresholdField::Volume => &mut self.volume,
            ThresholdField::Shadow => &mut self.shadow,
        }
    }
}

/// `{ spot, futures }` threshold sets for one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketThresholds {
    pub spot: ThresholdSet,
    pub futures: ThresholdSet,
    /// Market keys other than `spot` and `futures`, kept as stored.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MarketThresholds {
    fn default() -> Self {
        Self {
            spot: ThresholdSet::enabled_zeroed(),
            futures: ThresholdSet::enabled_zeroed(),
            extra: Map::new(),
        }
    }
}

impl MarketThresholds {
    pub fn get(&self, market: Market) -> &ThresholdSet {
        match market {
            Market::Spot => &self.spot,
            Market::Futures => &self.futures,
        }
    }

    pub fn get_mut(&mut self, market: Market) -> &mut ThresholdSet {
        match market {
            Market::Spot => &mut self.spot,
            Market::Futures => &mut self.futures,
        }
    }
}

/// A `pairSettings` value.
///
/// Entries that do not fit [`PairSetting`] are kept verbatim rather than
/// dropped, and reported through [`UserConfiguration::malformed_pairs`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PairEntry {
    Setting(PairSetting),
    Malformed(Value),
}

impl PairEntry {
    pub fn enabled(&self) -> Option<bool> {
        match self {
            PairEntry::Setting(s) => Some(s.enabled),
            PairEntry::Malformed(Value::Object(obj)) => obj.get("enabled").and_then(Value::as_bool),
            PairEntry::Malformed(_) => None,
        }
    }

    pub fn as_setting(&self) -> Option<&PairSetting> {
        match self {
            PairEntry::Setting(s) => Some(s),
            PairEntry::Malformed(_) => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, PairEntry::Malformed(_))
    }
}

/// Flattened coarse flags keyed by `"exchange_market"`.
pub type ExchangeFilters = BTreeMap<ExchangeMarketKey, bool>;

// ---------------------------------------------------------------------------
// UserConfiguration
// ---------------------------------------------------------------------------

/// A user's full monitoring configuration, always in the current shape.
///
/// `pair_settings` is the source of truth for per-pair display;
/// `exchanges` and `exchange_settings` are coarser defaults and cascade
/// targets. After migration an exchange switched off in `exchanges` has both
/// of its market flags off as well.
///
/// Nothing that was stored is lost on the way back out: unknown exchanges,
/// unknown top-level fields and known fields with an unreadable shape are all
/// carried alongside the normalized data and serialized again as they were.
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfiguration {
    pub schema_version: u32,
    /// Legacy per-exchange switch, applies to both markets.
    pub exchanges: BTreeMap<Exchange, bool>,
    pub exchange_settings: BTreeMap<Exchange, MarketThresholds>,
    pub pair_settings: BTreeMap<String, PairEntry>,
    /// Global defaults, passed through untouched.
    pub thresholds: Map<String, Value>,
    /// Read-only here.
    pub blacklist: BTreeSet<String>,
    /// `exchanges` entries for exchanges outside [`Exchange::ALL`].
    pub unknown_exchanges: Map<String, Value>,
    /// `exchangeSettings` entries for exchanges outside [`Exchange::ALL`].
    pub unknown_exchange_settings: Map<String, Value>,
    /// Known top-level fields whose stored shape could not be read, keyed by
    /// field name. Written back in place of the normalized field until an
    /// edit replaces it.
    pub unreadable: Map<String, Value>,
    /// Unrecognized top-level fields.
    pub extra: Map<String, Value>,
}

impl Default for UserConfiguration {
    /// What an empty (or unparseable) blob migrates to.
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            exchanges: Exchange::ALL.into_iter().map(|e| (e, true)).collect(),
            exchange_settings: Exchange::ALL
                .into_iter()
                .map(|e| (e, MarketThresholds::default()))
                .collect(),
            pair_settings: BTreeMap::new(),
            thresholds: Map::new(),
            blacklist: BTreeSet::new(),
            unknown_exchanges: Map::new(),
            unknown_exchange_settings: Map::new(),
            unreadable: Map::new(),
            extra: Map::new(),
        }
    }
}

/// Known exchanges followed by the unknown ones, as one JSON object.
struct WithUnknown<'a, V> {
    known: &'a BTreeMap<Exchange, V>,
    unknown: &'a Map<String, Value>,
}

impl<V: Serialize> Serialize for WithUnknown<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.known.len() + self.unknown.len()))?;
        for (exchange, value) in self.known {
            map.serialize_entry(exchange.as_str(), value)?;
        }
        for (name, value) in self.unknown {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Write the stored raw value for `name` if it was unreadable, else the
/// normalized one.
fn field_or_raw<M, T>(
    map: &mut M,
    unreadable: &Map<String, Value>,
    name: &str,
    normalized: &T,
) -> std::result::Result<(), M::Error>
where
    M: SerializeMap,
    T: Serialize + ?Sized,
{
    match unreadable.get(name) {
        Some(raw) => map.serialize_entry(name, raw),
        None => map.serialize_entry(name, normalized),
    }
}

impl Serialize for UserConfiguration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("schemaVersion", &self.schema_version)?;

        let exchanges = WithUnknown {
            known: &self.exchanges,
            unknown: &self.unknown_exchanges,
        };
        let exchange_settings = WithUnknown {
            known: &self.exchange_settings,
            unknown: &self.unknown_exchange_settings,
        };
        let unreadable = &self.unreadable;
        field_or_raw(&mut map, unreadable, "exchanges", &exchanges)?;
        field_or_raw(&mut map, unreadable, "exchangeSettings", &exchange_settings)?;
        field_or_raw(&mut map, unreadable, "pairSettings", &self.pair_settings)?;
        field_or_raw(&mut map, unreadable, "thresholds", &self.thresholds)?;
        field_or_raw(&mut map, unreadable, "blacklist", &self.blacklist)?;

        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl UserConfiguration {
    /// Configuration written when a user is created: every exchange and
    /// market disabled, no pairs.
    pub fn new_user() -> Self {
        let mut config = Self::default();
        config.exchanges.values_mut().for_each(|v| *v = false);
        for markets in config.exchange_settings.values_mut() {
            markets.spot.enabled = false;
            markets.futures.enabled = false;
        }
        config
    }

    /// Coarse enable flag for one exchange/market.
    ///
    /// The legacy `exchanges` switch is folded into these flags at migration,
    /// so this is the only place to look.
    pub fn coarse_enabled(&self, key: ExchangeMarketKey) -> bool {
        self.exchange_settings
            .get(&key.exchange)
            .map(|m| m.get(key.market).enabled)
            .unwrap_or(true)
    }

    pub fn exchange_filters(&self) -> ExchangeFilters {
        ExchangeMarketKey::all()
            .map(|key| (key, self.coarse_enabled(key)))
            .collect()
    }

    pub fn exchange_enabled(&self, exchange: Exchange) -> bool {
        self.exchanges.get(&exchange).copied().unwrap_or(true)
    }

    pub fn pair(&self, key: &str) -> Option<&PairEntry> {
        self.pair_settings.get(key)
    }

    /// Pair entries under one exchange/market, canonical or not.
    pub fn pairs_under(
        &self,
        key: ExchangeMarketKey,
    ) -> impl Iterator<Item = (&String, &PairEntry)> {
        let prefix = key.pair_prefix();
        self.pair_settings
            .iter()
            .filter(move |(k, _)| k.starts_with(&prefix))
    }

    pub fn malformed_pairs(&self) -> Vec<&str> {
        self.pair_settings
            .iter()
            .filter(|(_, v)| v.is_malformed())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Forget the stored raw value of `field`; an edit is about to replace it.
    pub(crate) fn discard_unreadable(&mut self, field: &str) {
        if let Some(raw) = self.unreadable.remove(field) {
            warn!(field, value = %raw, "edit replaces unreadable stored value");
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Serialize into the opaque `options_json` string the backend stores.
    pub fn to_options_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ten_exchange_market_combinations() {
        let keys: Vec<String> = ExchangeMarketKey::all().map(|k| k.to_string()).collect();
        assert_eq!(keys.len(), 10);
        assert_eq!(keys[0], "binance_spot");
        assert_eq!(keys[9], "hyperliquid_futures");
    }

    #[test]
    fn test_pair_table_sizes() {
        assert_eq!(pair_symbols(Exchange::Binance, Market::Spot).len(), 16);
        assert_eq!(pair_symbols(Exchange::Binance, Market::Futures).len(), 2);
        for key in ExchangeMarketKey::all().filter(|k| k.exchange != Exchange::Binance) {
            assert_eq!(key.symbols().len(), 1, "{key}");
        }
    }

    #[test]
    fn test_pair_key_parse_keeps_underscored_symbol() {
        let key: PairKey = "gate_futures_BTC_USDT".parse().unwrap();
        assert_eq!(key.exchange, Exchange::Gate);
        assert_eq!(key.market, Market::Futures);
        assert_eq!(key.symbol, "BTC_USDT");
        assert_eq!(key.to_string(), "gate_futures_BTC_USDT");
    }

    #[test]
    fn test_pair_key_rejects_unknown_exchange_and_missing_symbol() {
        assert!("okx_spot_USDT".parse::<PairKey>().is_err());
        assert!("binance_spot_".parse::<PairKey>().is_err());
        assert!("binance_spot".parse::<PairKey>().is_err());
        assert!("x".parse::<PairKey>().is_err());
    }

    #[test]
    fn test_exchange_market_key_round_trips_display() {
        let key: ExchangeMarketKey = "bybit_futures".parse().unwrap();
        assert_eq!(key, ExchangeMarketKey::new(Exchange::Bybit, Market::Futures));
        assert_eq!(key.pair_prefix(), "bybit_futures_");
    }

    #[test]
    fn test_new_user_is_fully_disabled() {
        let config = UserConfiguration::new_user();
        assert!(config.exchanges.values().all(|v| !v));
        assert!(config.exchange_filters().values().all(|v| !v));
        assert!(config.pair_settings.is_empty());
    }

    #[test]
    fn test_serialized_shape_uses_camel_case_and_version() {
        let mut config = UserConfiguration::default();
        config
            .extra
            .insert("uiTheme".into(), Value::String("dark".into()));
        config.pair_settings.insert(
            "binance_spot_BTC".into(),
            PairEntry::Setting(ThresholdSet::unset(true)),
        );
        let value = config.to_value().unwrap();
        assert_eq!(value["schemaVersion"], json!(SCHEMA_VERSION));
        assert_eq!(value["exchanges"]["gate"], json!(true));
        assert_eq!(
            value["exchangeSettings"]["bybit"]["futures"],
            json!({"enabled": true, "delta": "0", "volume": "0", "shadow": "0"})
        );
        assert_eq!(
            value["pairSettings"]["binance_spot_BTC"],
            json!({"enabled": true, "delta": "", "volume": "", "shadow": ""})
        );
        assert_eq!(value["uiTheme"], json!("dark"));
    }

    #[test]
    fn test_numeric_threshold_serializes_as_number() {
        let mut setting = ThresholdSet::unset(true);
        setting.delta = Threshold::number(Number::from_f64(0.5).unwrap());
        setting.volume = "0,5".into();
        assert_eq!(
            serde_json::to_value(&setting).unwrap(),
            json!({"enabled": true, "delta": 0.5, "volume": "0,5", "shadow": ""})
        );
        assert_eq!(setting.delta, "0.5");
        assert!(setting.delta.is_number());
    }

    #[test]
    fn test_unknown_and_unreadable_data_is_written_back() {
        let mut config = UserConfiguration::default();
        config.unknown_exchanges.insert("okx".into(), json!(false));
        config
            .unknown_exchange_settings
            .insert("okx".into(), json!({"spot": {"enabled": false}}));
        config.unreadable.insert("blacklist".into(), json!("LUNA,FTT"));
        config
            .exchange_settings
            .get_mut(&Exchange::Gate)
            .unwrap()
            .extra
            .insert("margin".into(), json!({"enabled": true}));

        let value = config.to_value().unwrap();
        assert_eq!(value["exchanges"]["okx"], json!(false));
        assert_eq!(value["exchanges"]["binance"], json!(true));
        assert_eq!(value["exchangeSettings"]["okx"], json!({"spot": {"enabled": false}}));
        assert_eq!(value["exchangeSettings"]["gate"]["margin"], json!({"enabled": true}));
        assert_eq!(value["blacklist"], json!("LUNA,FTT"));
    }

    #[test]
    fn test_exchange_keys_match_exactly() {
        assert_eq!(Exchange::from_key("gate"), Some(Exchange::Gate));
        assert_eq!(Exchange::from_key("Gate"), None);
        assert_eq!(Market::from_key("futures"), Some(Market::Futures));
        assert_eq!(Market::from_key("margin"), None);
    }

    #[test]
    fn test_exchange_filters_serialize_with_flat_keys() {
        let filters = UserConfiguration::default().exchange_filters();
        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(value["hyperliquid_spot"], json!(true));
    }
}
