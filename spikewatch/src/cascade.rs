//! Enable-flag propagation from exchange/market level down to pairs, plus
//! single-pair edits.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::migrate::setting_from_object;
use crate::schema::{
    ExchangeMarketKey, PairEntry, PairKey, ThresholdField, ThresholdSet, UserConfiguration,
};
use crate::threshold;

/// What a cascade touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Canonical pairs that had no entry yet.
    pub created: usize,
    /// Canonical pairs whose existing entry was updated.
    pub updated: usize,
    /// Non-canonical entries under the same prefix.
    pub residual: usize,
}

impl PairEntry {
    /// Overwrite only the enabled flag.
    ///
    /// A malformed object gets the flag inserted and is upgraded if that makes
    /// it well-formed. A malformed non-object cannot hold a flag and is
    /// replaced by an unset setting.
    fn apply_enabled(&mut self, pair: &str, enabled: bool) {
        let replacement = match self {
            PairEntry::Setting(setting) => {
                setting.enabled = enabled;
                None
            }
            PairEntry::Malformed(Value::Object(obj)) => {
                obj.insert("enabled".into(), Value::Bool(enabled));
                setting_from_object(obj).map(PairEntry::Setting)
            }
            PairEntry::Malformed(other) => {
                warn!(pair, value = %other, "replacing malformed pair entry that cannot hold a flag");
                Some(PairEntry::Setting(ThresholdSet::unset(enabled)))
            }
        };
        if let Some(entry) = replacement {
            *self = entry;
        }
    }
}

impl UserConfiguration {
    /// Set the coarse flag for `key` and push it onto every pair beneath it.
    ///
    /// Canonical pairs from the lookup table are created if missing; existing
    /// entries under the same prefix that are not in the table are updated
    /// too. Threshold values are never touched. The legacy per-exchange switch
    /// follows: on while either market is on.
    pub fn set_exchange_market_enabled(
        &mut self,
        key: ExchangeMarketKey,
        enabled: bool,
    ) -> CascadeReport {
        self.discard_unreadable("exchanges");
        self.discard_unreadable("exchangeSettings");
        self.discard_unreadable("pairSettings");

        let markets = self.exchange_settings.entry(key.exchange).or_default();
        markets.get_mut(key.market).enabled = enabled;
        let any_market_on = markets.spot.enabled || markets.futures.enabled;
        self.exchanges.insert(key.exchange, any_market_on);

        let mut report = CascadeReport::default();

        for symbol in key.symbols() {
            let pair = PairKey::new(key.exchange, key.market, *symbol).to_string();
            match self.pair_settings.get_mut(&pair) {
                Some(entry) => {
                    entry.apply_enabled(&pair, enabled);
                    report.updated += 1;
                }
                None => {
                    self.pair_settings
                        .insert(pair, PairEntry::Setting(ThresholdSet::unset(enabled)));
                    report.created += 1;
                }
            }
        }

        let prefix = key.pair_prefix();
        for (pair, entry) in self.pair_settings.iter_mut() {
            let Some(symbol) = pair.strip_prefix(&prefix) else {
                continue;
            };
            if !key.is_canonical(symbol) {
                entry.apply_enabled(pair, enabled);
                report.residual += 1;
            }
        }

        debug!(
            %key,
            enabled,
            created = report.created,
            updated = report.updated,
            residual = report.residual,
            "cascaded exchange/market flag"
        );
        report
    }

    /// Toggle one pair. The coarse exchange/market flag is left alone.
    ///
    /// A missing entry is created when `pair` is a well-formed pair key.
    pub fn set_pair_enabled(&mut self, pair: &str, enabled: bool) -> Result<()> {
        if let Some(entry) = self.pair_settings.get_mut(pair) {
            entry.apply_enabled(pair, enabled);
            return Ok(());
        }
        let key: PairKey = pair
            .parse()
            .map_err(|_| DashboardError::UnknownPair(pair.to_string()))?;
        self.discard_unreadable("pairSettings");
        self.pair_settings
            .insert(key.to_string(), PairEntry::Setting(ThresholdSet::unset(enabled)));
        Ok(())
    }

    /// Edit one threshold of one pair.
    ///
    /// Rejected input leaves the configuration unchanged. A new entry inherits
    /// the coarse flag of its exchange/market.
    pub fn set_pair_threshold(
        &mut self,
        pair: &str,
        field: ThresholdField,
        raw: &str,
    ) -> Result<()> {
        let value = threshold::validate(field, raw)?;
        match self.pair_settings.get_mut(pair) {
            Some(PairEntry::Setting(setting)) => {
                *setting.get_mut(field) = value.into();
            }
            Some(PairEntry::Malformed(_)) => {
                return Err(DashboardError::MalformedPair(pair.to_string()));
            }
            None => {
                let key: PairKey = pair
                    .parse()
                    .map_err(|_| DashboardError::UnknownPair(pair.to_string()))?;
                let mut setting = ThresholdSet::unset(self.coarse_enabled(key.exchange_market()));
                *setting.get_mut(field) = value.into();
                self.discard_unreadable("pairSettings");
                self.pair_settings
                    .insert(key.to_string(), PairEntry::Setting(setting));
            }
        }
        Ok(())
    }
}
