//! Validated entitlement configuration.
//!
//! The engine owns the catalog, gate table and settings, checks them once
//! at construction, and lends them to evaluators and analyzers.
//!
//! ```rust,ignore
//! let engine = EntitlementEngine::builder()
//!     .catalog(PlanCatalog::from_json(&plans_json)?)
//!     .gates(FeatureGateTable::from_json(&gates_json)?)
//!     .settings(config.entitlements)
//!     .build()?;
//!
//! let allowed = engine.evaluator().can_access_feature(&sub, "campaigns");
//! ```

use super::defaults::{default_catalog, default_gates};
use super::entitlements::EntitlementEvaluator;
use super::error::BillingError;
use super::gates::FeatureGateTable;
use super::plan_change::PlanChangeAnalyzer;
use super::plans::PlanCatalog;
use super::settings::EntitlementSettings;
use super::validation::{validate_catalog, validate_gate_table};

/// Immutable, validated entitlement configuration.
#[derive(Debug, Clone)]
pub struct EntitlementEngine {
    catalog: PlanCatalog,
    gates: FeatureGateTable,
    settings: EntitlementSettings,
}

impl EntitlementEngine {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> EntitlementEngineBuilder {
        EntitlementEngineBuilder::new()
    }

    /// Engine with the dashboard catalog, gates and default settings.
    ///
    /// # Errors
    ///
    /// Fails only if the stock configuration is inconsistent.
    pub fn with_defaults() -> Result<Self, BillingError> {
        Self::builder().build()
    }

    /// Borrow an evaluator.
    #[must_use]
    pub fn evaluator(&self) -> EntitlementEvaluator<'_> {
        EntitlementEvaluator::new(&self.catalog, &self.gates, &self.settings)
    }

    /// Borrow a plan change analyzer.
    #[must_use]
    pub fn analyzer(&self) -> PlanChangeAnalyzer<'_> {
        PlanChangeAnalyzer::new(&self.catalog, &self.gates)
    }

    /// The plan catalog.
    #[must_use]
    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// The feature gate table.
    #[must_use]
    pub fn gates(&self) -> &FeatureGateTable {
        &self.gates
    }

    /// The evaluation settings.
    #[must_use]
    pub fn settings(&self) -> &EntitlementSettings {
        &self.settings
    }
}

/// Builder for an [`EntitlementEngine`].
///
/// The catalog and gates default to the dashboard configuration in
/// [`defaults`](super::defaults).
#[derive(Debug, Default)]
#[must_use]
pub struct EntitlementEngineBuilder {
    catalog: Option<PlanCatalog>,
    gates: Option<FeatureGateTable>,
    settings: EntitlementSettings,
}

impl EntitlementEngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the plan catalog.
    pub fn catalog(mut self, catalog: PlanCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the feature gate table.
    pub fn gates(mut self, gates: FeatureGateTable) -> Self {
        self.gates = Some(gates);
        self
    }

    /// Set the evaluation settings.
    pub fn settings(mut self, settings: EntitlementSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate the configuration and build the engine.
    ///
    /// # Errors
    ///
    /// Returns the first catalog, gate table or settings violation.
    pub fn build(self) -> Result<EntitlementEngine, BillingError> {
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => default_catalog()?,
        };
        let gates = match self.gates {
            Some(gates) => gates,
            None => default_gates()?,
        };

        self.settings.validate()?;
        validate_catalog(&catalog)?;
        validate_gate_table(&gates, &catalog)?;

        tracing::info!(
            target: "plangate::engine",
            plans = catalog.len(),
            gated_features = gates.len(),
            near_limit_threshold = self.settings.near_limit_threshold,
            required_tier_scan = ?self.settings.required_tier_scan,
            unknown_feature_policy = ?self.settings.unknown_feature_policy,
            "Entitlement engine ready"
        );

        Ok(EntitlementEngine {
            catalog,
            gates,
            settings: self.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::resource::{Limit, MeteredResource};
    use crate::billing::subscription::Subscription;
    use crate::billing::tier::SubscriptionTier;
    use chrono::Utc;

    #[test]
    fn test_with_defaults() {
        let engine = EntitlementEngine::with_defaults().unwrap();
        assert_eq!(engine.catalog().len(), 3);
        assert_eq!(engine.settings().near_limit_threshold, 80.0);

        let sub = Subscription::new("prof_1", SubscriptionTier::Free, Utc::now())
            .with_usage(MeteredResource::Campaigns, 5);
        assert!(!engine.evaluator().can_access_feature(&sub, "campaigns"));
        assert!(engine.evaluator().can_access_feature(&sub, "brands"));
    }

    #[test]
    fn test_build_rejects_bad_threshold() {
        let result = EntitlementEngine::builder()
            .settings(EntitlementSettings {
                near_limit_threshold: 150.0,
                ..Default::default()
            })
            .build();
        assert_eq!(result.unwrap_err(), BillingError::InvalidThreshold { value: 150.0 });
    }

    #[test]
    fn test_build_rejects_incomplete_catalog() {
        let catalog = PlanCatalog::builder()
            .plan(SubscriptionTier::Free)
            .done()
            .build()
            .unwrap();
        let result = EntitlementEngine::builder()
            .catalog(catalog)
            .gates(FeatureGateTable::new())
            .build();
        assert!(matches!(result, Err(BillingError::PlanNotFound { .. })));
    }

    #[test]
    fn test_build_rejects_decreasing_gate() {
        let gates = FeatureGateTable::builder()
            .feature("campaigns")
            .resource(MeteredResource::Campaigns)
            .tier(SubscriptionTier::Free, Limit::Capped(10), "Upgrade")
            .tier(SubscriptionTier::Pro, Limit::Capped(5), "Upgrade")
            .done()
            .build()
            .unwrap();
        let result = EntitlementEngine::builder().gates(gates).build();
        assert!(matches!(result, Err(BillingError::GateInvariant { .. })));
    }

    #[test]
    fn test_build_rejects_gate_capped_above_open_tier() {
        let gates = FeatureGateTable::builder()
            .feature("campaigns")
            .resource(MeteredResource::Campaigns)
            .tier(SubscriptionTier::Free, Limit::Capped(5), "Upgrade to add more campaigns")
            .tier(SubscriptionTier::Enterprise, Limit::Capped(10), "Contact sales")
            .done()
            .build()
            .unwrap();
        let err = EntitlementEngine::builder().gates(gates).build().unwrap_err();
        assert!(err.is_configuration_error());
        assert!(matches!(err, BillingError::GateInvariant { .. }));
    }

    #[test]
    fn test_analyzer_shares_configuration() {
        let engine = EntitlementEngine::with_defaults().unwrap();
        let comparison = engine
            .analyzer()
            .compare_tiers(SubscriptionTier::Free, SubscriptionTier::Pro)
            .unwrap();
        assert!(comparison.is_upgrade);
        assert_eq!(comparison.price_difference_cents, 4900);
    }
}
