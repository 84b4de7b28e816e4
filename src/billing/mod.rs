//! Subscription plans, feature gates and entitlement checks.
//!
//! Everything here is synchronous and side-effect free apart from `tracing`
//! events. The caller supplies a [`Subscription`] snapshot from its billing
//! backend; this module decides what that subscription may do.
//!
//! # Example
//!
//! ```rust,ignore
//! use plangate::billing::{EntitlementEngine, Subscription, SubscriptionTier, MeteredResource};
//!
//! let engine = EntitlementEngine::with_defaults()?;
//! let evaluator = engine.evaluator();
//!
//! let sub = Subscription::new("prof_123", SubscriptionTier::Free, period_end)
//!     .with_usage(MeteredResource::Campaigns, 5);
//!
//! if !evaluator.can_access_feature(&sub, "campaigns") {
//!     let gate = evaluator.get_feature_gate(&sub, "campaigns");
//!     return Err(ApiError::UpgradeRequired(gate));
//! }
//!
//! // Considering a downgrade?
//! let free = engine.catalog().require_plan(SubscriptionTier::Free)?;
//! let impact = engine.analyzer().analyze_plan_change_impact(&sub, free)?;
//! if impact.will_lose_data {
//!     // show impact.warnings
//! }
//! ```

pub mod audit;
pub mod dates;
pub mod defaults;
pub mod display;
pub mod engine;
pub mod entitlements;
pub mod error;
pub mod gates;
pub mod plan_change;
pub mod plans;
pub mod resource;
pub mod settings;
pub mod subscription;
pub mod tier;
pub mod validation;

// Catalog exports
pub use plans::{
    LimitCheckResult, PlanBuilder, PlanCatalog, PlanCatalogBuilder, PlanLimits, SubscriptionPlan,
    format_cents,
};
pub use resource::{Limit, MeteredResource};
pub use tier::SubscriptionTier;

// Gate exports
pub use gates::{
    FeatureGateBuilder, FeatureGateRule, FeatureGateTable, FeatureGateTableBuilder, FeatureId,
    TierGate,
};

// Subscription exports
pub use subscription::{Subscription, SubscriptionStatus};

// Evaluation exports
pub use entitlements::{
    DenialReason, EntitlementEvaluator, Entitlements, FeatureCheckResult, FeatureGate,
    ResourceUsage,
};
pub use settings::{
    DEFAULT_NEAR_LIMIT_THRESHOLD, EntitlementSettings, RequiredTierScan, UnknownFeaturePolicy,
};

// Plan change exports
pub use plan_change::{
    FeatureChanges, LimitChange, PlanChangeAnalyzer, PlanChangeImpact, PlanComparison,
    ResourceOverage,
};

// Date and display exports
pub use dates::{days_until_billing, days_until_billing_at, is_overdue_at, next_billing_date};
pub use display::{
    StatusColor, format_billing_date, format_limit, format_price_difference, status_color,
    status_text,
};

// Engine exports
pub use engine::{EntitlementEngine, EntitlementEngineBuilder};
pub use defaults::{default_catalog, default_gates};

// Audit exports
pub use audit::{
    EntitlementAuditEvent, EntitlementAuditLogger, NoOpAuditLogger, TracingAuditLogger,
    audited_plan_change, require_feature,
};

// Error exports
pub use error::BillingError;

// Validation exports
pub use validation::{validate_catalog, validate_feature_id, validate_gate_table};
