pub mod activity;
pub mod cascade;
pub mod config;
pub mod error;
pub mod gateway;
pub mod migrate;
pub mod rest;
pub mod schema;
pub mod session;
pub mod stats;
pub mod threshold;
pub mod types;

// ---- Top-level re-exports for ergonomic usage ----

// Config + errors
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};

// Schema
pub use schema::{
    Exchange, ExchangeFilters, ExchangeMarketKey, Market, MarketThresholds, PairEntry, PairKey,
    PairSetting, ThresholdField, ThresholdSet, UserConfiguration, SCHEMA_VERSION,
};

// Reconciliation
pub use activity::{evaluate_record, ActivityStatus};
pub use cascade::CascadeReport;
pub use migrate::{migrate_str, migrate_value};

// Backend boundary
pub use gateway::{PersistenceGateway, StatsSource};
pub use rest::DashboardHttpClient;
pub use types::{SettingsUpdate, SpikeRecord, UserRecord};

// Admin sessions + statistics
pub use session::{AdminConsole, EditSession, UserStatus};
pub use stats::{StatsRefresher, StatsSnapshot};
