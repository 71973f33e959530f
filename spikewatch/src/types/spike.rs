use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::opt_f64_lenient;

/// One detected event from `GET /stats`. Produced by the detection service,
/// read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeRecord {
    pub exchange: String,
    pub market: String,
    pub symbol: String,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub delta: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub shadow: Option<f64>,
    pub detected_at: DateTime<Utc>,
}

impl SpikeRecord {
    /// `"exchange_market"`, matching the configuration's flat keys.
    pub fn exchange_market(&self) -> String {
        format!(
            "{}_{}",
            self.exchange.to_lowercase(),
            self.market.to_lowercase()
        )
    }
}
