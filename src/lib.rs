//! plangate - subscription entitlement checks for SaaS dashboards
//!
//! plangate decides what a subscription may do: which features it can use,
//! how much of each metered resource is left, which tier unlocks a feature,
//! and what changes if the subscriber switches plans. It is a pure library:
//! the caller supplies a subscription snapshot, plangate returns decisions.
//!
//! # Features
//!
//! - **Plan catalog**: one plan per tier with price, features and resource caps
//! - **Feature gates**: per-tier restrictions with upgrade prompts
//! - **Entitlement evaluator**: access checks, usage percentage, remaining quota
//! - **Plan change analyzer**: upgrade/downgrade comparison and data-loss warnings
//! - **Display helpers**: billing dates, status badges, price differences
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use plangate::billing::{EntitlementEngine, MeteredResource, Subscription, SubscriptionTier};
//! use plangate::ConfigBuilder;
//!
//! fn main() -> plangate::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     plangate::init_tracing_with_config(&config);
//!
//!     let engine = EntitlementEngine::builder()
//!         .settings(config.entitlements)
//!         .build()?;
//!
//!     let sub = Subscription::new("prof_123", SubscriptionTier::Free, chrono::Utc::now())
//!         .with_usage(MeteredResource::Campaigns, 3);
//!
//!     if engine.evaluator().can_access_feature(&sub, "campaigns") {
//!         // create the campaign
//!     }
//!     Ok(())
//! }
//! ```

pub mod billing;
mod config;
mod error;
pub mod utils;

// Re-exports for public API
pub use billing::{
    BillingError, EntitlementEngine, EntitlementEvaluator, EntitlementSettings, FeatureGate,
    PlanCatalog, PlanChangeAnalyzer, RequiredTierScan, Subscription, SubscriptionStatus,
    SubscriptionTier, UnknownFeaturePolicy,
};
pub use config::{Config, ConfigBuilder, LoggingConfig};
pub use error::{PlangateError, Result};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// Call this once, early in `main()`.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "plangate=debug")
/// - `PLANGATE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
