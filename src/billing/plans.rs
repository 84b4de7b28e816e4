//! Plan catalog.
//!
//! One plan per tier, each with a monthly price, the features it grants and
//! its per-resource limits. The catalog is built once at startup and only read
//! afterwards.
//!
//! # Code-configured
//!
//! ```rust,ignore
//! use plangate::billing::{Limit, MeteredResource, PlanCatalog, SubscriptionTier};
//!
//! let catalog = PlanCatalog::builder()
//!     .plan(SubscriptionTier::Free)
//!         .features(["campaigns", "brands"])
//!         .limit(MeteredResource::Campaigns, Limit::Capped(5))
//!         .done()
//!     .plan(SubscriptionTier::Pro)
//!         .monthly_price_cents(4900)
//!         .features(["campaigns", "brands", "api_access"])
//!         .limit(MeteredResource::Campaigns, Limit::Capped(50))
//!         .trial_days(14)
//!         .done()
//!     .plan(SubscriptionTier::Enterprise)
//!         .monthly_price_cents(19900)
//!         .features(["campaigns", "brands", "api_access", "white_label"])
//!         .done()
//!     .build()?;
//! ```
//!
//! # JSON-configured
//!
//! ```rust,ignore
//! let catalog = PlanCatalog::from_json(&std::fs::read_to_string("plans.json")?)?;
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::gates::FeatureId;
use super::resource::{Limit, MeteredResource};
use super::tier::SubscriptionTier;

/// The set of plans, keyed by tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SubscriptionPlan>", into = "Vec<SubscriptionPlan>")]
pub struct PlanCatalog {
    plans: BTreeMap<SubscriptionTier, SubscriptionPlan>,
}

impl PlanCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing a catalog.
    #[must_use]
    pub fn builder() -> PlanCatalogBuilder {
        PlanCatalogBuilder::new()
    }

    /// Parse a catalog from a JSON array of plans.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, holds invalid values, or
    /// lists two plans for the same tier.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Get the plan for a tier.
    #[must_use]
    pub fn get_plan_by_tier(&self, tier: SubscriptionTier) -> Option<&SubscriptionPlan> {
        self.plans.get(&tier)
    }

    /// Get the plan for a tier or fail with `PlanNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::PlanNotFound` if no plan is configured.
    pub fn require_plan(&self, tier: SubscriptionTier) -> Result<&SubscriptionPlan, BillingError> {
        self.get_plan_by_tier(tier)
            .ok_or(BillingError::PlanNotFound { tier })
    }

    /// Check if a plan exists for a tier.
    #[must_use]
    pub fn contains(&self, tier: SubscriptionTier) -> bool {
        self.plans.contains_key(&tier)
    }

    /// Iterate over plans, cheapest tier first.
    pub fn plans(&self) -> impl Iterator<Item = &SubscriptionPlan> {
        self.plans.values()
    }

    /// Check if any plan lists the feature.
    #[must_use]
    pub fn offers_feature(&self, feature: &str) -> bool {
        self.plans.values().any(|p| p.has_feature(feature))
    }

    /// Cheapest tier whose plan lists the feature.
    #[must_use]
    pub fn lowest_tier_with_feature(&self, feature: &str) -> Option<SubscriptionTier> {
        self.plans
            .values()
            .find(|p| p.has_feature(feature))
            .map(|p| p.tier)
    }

    /// Get the number of plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Check if there are no plans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Add a plan, replacing any existing plan for its tier.
    pub fn add(&mut self, plan: SubscriptionPlan) {
        self.plans.insert(plan.tier, plan);
    }
}

impl TryFrom<Vec<SubscriptionPlan>> for PlanCatalog {
    type Error = BillingError;

    fn try_from(plans: Vec<SubscriptionPlan>) -> Result<Self, Self::Error> {
        let mut catalog = PlanCatalog::new();
        for plan in plans {
            if catalog.contains(plan.tier) {
                return Err(BillingError::CatalogInvariant {
                    tier: plan.tier,
                    reason: "duplicate plan for tier".to_string(),
                });
            }
            catalog.add(plan);
        }
        Ok(catalog)
    }
}

impl From<PlanCatalog> for Vec<SubscriptionPlan> {
    fn from(catalog: PlanCatalog) -> Self {
        catalog.plans.into_values().collect()
    }
}

/// Configuration for a single plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    /// Tier this plan belongs to.
    pub tier: SubscriptionTier,
    /// Display name for the plan.
    pub name: String,
    /// Monthly price in the smallest currency unit.
    pub monthly_price_cents: i64,
    /// Currency code (e.g., "usd", "gbp", "eur").
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Features granted by this plan.
    #[serde(default)]
    pub features: BTreeSet<FeatureId>,
    /// Resource limits for this plan.
    #[serde(default)]
    pub limits: PlanLimits,
    /// Description of the plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Trial period in days (None = no trial).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_days: Option<u32>,
}

fn default_currency() -> String {
    "usd".to_string()
}

impl SubscriptionPlan {
    /// Check if this plan has a specific feature.
    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Limit for a resource (unlimited if not configured).
    #[must_use]
    pub fn limit_for(&self, resource: MeteredResource) -> Limit {
        self.limits.get(resource)
    }

    /// Check if a resource usage is within limits.
    #[must_use]
    pub fn check_limit(&self, resource: MeteredResource, current: u64) -> LimitCheckResult {
        self.limits.check(resource, current)
    }

    /// Get the price formatted for display (e.g., "$49.00").
    #[must_use]
    pub fn formatted_price(&self) -> String {
        format_cents(self.monthly_price_cents, &self.currency)
    }
}

/// Format an amount in the smallest currency unit (e.g., "$9.99", "-£5.00").
#[must_use]
pub fn format_cents(cents: i64, currency: &str) -> String {
    let symbol = match currency {
        "usd" => "$",
        "gbp" => "£",
        "eur" => "€",
        other => other,
    };
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}{}.{:02}", sign, symbol, abs / 100, abs % 100)
}

/// Resource limits for a plan.
///
/// Resources without an entry are unlimited.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanLimits {
    limits: BTreeMap<MeteredResource, Limit>,
}

impl PlanLimits {
    /// Create unlimited limits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Set a limit.
    pub fn set(&mut self, resource: MeteredResource, limit: Limit) {
        self.limits.insert(resource, limit);
    }

    /// Get a specific limit value.
    #[must_use]
    pub fn get(&self, resource: MeteredResource) -> Limit {
        self.limits.get(&resource).copied().unwrap_or(Limit::Unlimited)
    }

    /// Iterate over explicitly configured limits.
    pub fn iter(&self) -> impl Iterator<Item = (MeteredResource, Limit)> + '_ {
        self.limits.iter().map(|(r, l)| (*r, *l))
    }

    /// Check if a resource usage is within limits.
    #[must_use]
    pub fn check(&self, resource: MeteredResource, current: u64) -> LimitCheckResult {
        match self.get(resource) {
            Limit::Unlimited => LimitCheckResult::Unlimited,
            Limit::Capped(max) if current < max => LimitCheckResult::WithinLimit { current, max },
            Limit::Capped(max) => LimitCheckResult::AtLimit { current, max },
        }
    }
}

/// Result of checking a resource limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LimitCheckResult {
    /// No limit on this resource.
    Unlimited,
    /// Usage is within the limit.
    WithinLimit { current: u64, max: u64 },
    /// Usage has reached or exceeded the limit.
    AtLimit { current: u64, max: u64 },
}

impl LimitCheckResult {
    /// Check if usage is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Unlimited | Self::WithinLimit { .. })
    }

    /// Check if at or over limit.
    #[must_use]
    pub fn is_at_limit(&self) -> bool {
        matches!(self, Self::AtLimit { .. })
    }
}

/// Builder for constructing a catalog.
#[derive(Debug, Default)]
pub struct PlanCatalogBuilder {
    plans: Vec<PlanDraft>,
}

impl PlanCatalogBuilder {
    /// Create a new catalog builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start defining the plan for a tier.
    #[must_use]
    pub fn plan(self, tier: SubscriptionTier) -> PlanBuilder {
        PlanBuilder {
            parent: self,
            draft: PlanDraft {
                tier,
                name: None,
                monthly_price_cents: 0,
                currency: default_currency(),
                features: Vec::new(),
                limits: PlanLimits::default(),
                description: None,
                trial_days: None,
            },
        }
    }

    /// Build the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed feature IDs or a tier defined twice.
    pub fn build(self) -> Result<PlanCatalog, BillingError> {
        let plans = self
            .plans
            .into_iter()
            .map(PlanDraft::into_plan)
            .collect::<Result<Vec<_>, _>>()?;
        PlanCatalog::try_from(plans)
    }
}

/// Plan fields collected by a [`PlanBuilder`].
#[derive(Debug)]
struct PlanDraft {
    tier: SubscriptionTier,
    name: Option<String>,
    monthly_price_cents: i64,
    currency: String,
    features: Vec<String>,
    limits: PlanLimits,
    description: Option<String>,
    trial_days: Option<u32>,
}

impl PlanDraft {
    fn into_plan(self) -> Result<SubscriptionPlan, BillingError> {
        let features = self
            .features
            .into_iter()
            .map(FeatureId::new)
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(SubscriptionPlan {
            tier: self.tier,
            name: self
                .name
                .unwrap_or_else(|| self.tier.display_name().to_string()),
            monthly_price_cents: self.monthly_price_cents,
            currency: self.currency,
            features,
            limits: self.limits,
            description: self.description,
            trial_days: self.trial_days,
        })
    }
}

/// Builder for a single plan.
#[derive(Debug)]
pub struct PlanBuilder {
    parent: PlanCatalogBuilder,
    draft: PlanDraft,
}

impl PlanBuilder {
    /// Set the display name (defaults to the tier name).
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.draft.name = Some(name.to_string());
        self
    }

    /// Set the monthly price in the smallest currency unit.
    #[must_use]
    pub fn monthly_price_cents(mut self, cents: i64) -> Self {
        self.draft.monthly_price_cents = cents;
        self
    }

    /// Set the currency code (e.g., "gbp", "usd", "eur").
    #[must_use]
    pub fn currency(mut self, currency: &str) -> Self {
        self.draft.currency = currency.to_lowercase();
        self
    }

    /// Add features to this plan.
    #[must_use]
    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.draft.features.extend(features.into_iter().map(Into::into));
        self
    }

    /// Add a single feature to this plan.
    #[must_use]
    pub fn feature(mut self, feature: &str) -> Self {
        self.draft.features.push(feature.to_string());
        self
    }

    /// Set a resource limit.
    #[must_use]
    pub fn limit(mut self, resource: MeteredResource, limit: Limit) -> Self {
        self.draft.limits.set(resource, limit);
        self
    }

    /// Set the full limits configuration.
    #[must_use]
    pub fn limits(mut self, limits: PlanLimits) -> Self {
        self.draft.limits = limits;
        self
    }

    /// Set the trial period in days.
    #[must_use]
    pub fn trial_days(mut self, days: u32) -> Self {
        self.draft.trial_days = Some(days);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, desc: &str) -> Self {
        self.draft.description = Some(desc.to_string());
        self
    }

    /// Finish defining this plan and return to the parent builder.
    #[must_use]
    pub fn done(self) -> PlanCatalogBuilder {
        let mut parent = self.parent;
        parent.plans.push(self.draft);
        parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> PlanCatalog {
        PlanCatalog::builder()
            .plan(SubscriptionTier::Free)
            .features(["campaigns", "brands"])
            .limit(MeteredResource::Campaigns, Limit::Capped(5))
            .limit(MeteredResource::Brands, Limit::Capped(1))
            .done()
            .plan(SubscriptionTier::Pro)
            .name("Pro")
            .monthly_price_cents(4900)
            .features(["campaigns", "brands", "api_access"])
            .limit(MeteredResource::Campaigns, Limit::Capped(50))
            .limit(MeteredResource::Brands, Limit::Capped(10))
            .trial_days(14)
            .done()
            .plan(SubscriptionTier::Enterprise)
            .monthly_price_cents(19900)
            .features(["campaigns", "brands", "api_access", "white_label"])
            .done()
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_catalog() {
        let catalog = test_catalog();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.contains(SubscriptionTier::Free));
        assert!(catalog.contains(SubscriptionTier::Enterprise));

        let tiers: Vec<_> = catalog.plans().map(|p| p.tier).collect();
        assert_eq!(
            tiers,
            vec![SubscriptionTier::Free, SubscriptionTier::Pro, SubscriptionTier::Enterprise]
        );
    }

    #[test]
    fn test_plan_features() {
        let catalog = test_catalog();

        let free = catalog.get_plan_by_tier(SubscriptionTier::Free).unwrap();
        assert!(free.has_feature("campaigns"));
        assert!(!free.has_feature("api_access"));

        assert!(catalog.offers_feature("white_label"));
        assert!(!catalog.offers_feature("time_travel"));
        assert_eq!(
            catalog.lowest_tier_with_feature("api_access"),
            Some(SubscriptionTier::Pro)
        );
    }

    #[test]
    fn test_plan_limits() {
        let catalog = test_catalog();

        let free = catalog.get_plan_by_tier(SubscriptionTier::Free).unwrap();
        assert!(free.check_limit(MeteredResource::Campaigns, 4).is_allowed());
        assert!(free.check_limit(MeteredResource::Campaigns, 5).is_at_limit());
        assert!(free.check_limit(MeteredResource::Campaigns, 9).is_at_limit());

        let pro = catalog.get_plan_by_tier(SubscriptionTier::Pro).unwrap();
        assert_eq!(
            pro.check_limit(MeteredResource::Brands, 3),
            LimitCheckResult::WithinLimit { current: 3, max: 10 }
        );
    }

    #[test]
    fn test_unconfigured_limit_is_unlimited() {
        let catalog = test_catalog();
        let enterprise = catalog.get_plan_by_tier(SubscriptionTier::Enterprise).unwrap();
        assert_eq!(enterprise.limit_for(MeteredResource::Campaigns), Limit::Unlimited);
        assert_eq!(
            enterprise.check_limit(MeteredResource::Campaigns, 10_000),
            LimitCheckResult::Unlimited
        );
    }

    #[test]
    fn test_default_name_and_trial() {
        let catalog = test_catalog();
        let free = catalog.get_plan_by_tier(SubscriptionTier::Free).unwrap();
        assert_eq!(free.name, "Free");
        assert_eq!(free.trial_days, None);

        let pro = catalog.get_plan_by_tier(SubscriptionTier::Pro).unwrap();
        assert_eq!(pro.trial_days, Some(14));
    }

    #[test]
    fn test_require_plan() {
        let catalog = PlanCatalog::builder()
            .plan(SubscriptionTier::Free)
            .done()
            .build()
            .unwrap();
        assert!(catalog.require_plan(SubscriptionTier::Free).is_ok());
        assert_eq!(
            catalog.require_plan(SubscriptionTier::Pro).unwrap_err(),
            BillingError::PlanNotFound { tier: SubscriptionTier::Pro }
        );
    }

    #[test]
    fn test_duplicate_tier_rejected() {
        let result = PlanCatalog::builder()
            .plan(SubscriptionTier::Free)
            .done()
            .plan(SubscriptionTier::Free)
            .done()
            .build();
        assert!(matches!(result, Err(BillingError::CatalogInvariant { .. })));
    }

    #[test]
    fn test_invalid_feature_rejected() {
        let result = PlanCatalog::builder()
            .plan(SubscriptionTier::Free)
            .feature("Not Valid")
            .done()
            .build();
        assert!(matches!(result, Err(BillingError::InvalidFeatureId { .. })));
    }

    #[test]
    fn test_formatted_price() {
        let catalog = test_catalog();
        let pro = catalog.get_plan_by_tier(SubscriptionTier::Pro).unwrap();
        assert_eq!(pro.formatted_price(), "$49.00");

        assert_eq!(format_cents(999, "gbp"), "£9.99");
        assert_eq!(format_cents(-15000, "usd"), "-$150.00");
        assert_eq!(format_cents(5, "eur"), "€0.05");
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {
                "tier": "free",
                "name": "Starter",
                "monthly_price_cents": 0,
                "features": ["campaigns"],
                "limits": { "campaigns": 5, "team_members": 1 }
            },
            {
                "tier": "pro",
                "name": "Pro",
                "monthly_price_cents": 4900,
                "features": ["campaigns", "api_access"],
                "limits": { "campaigns": -1 }
            }
        ]"#;

        let catalog = PlanCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let free = catalog.get_plan_by_tier(SubscriptionTier::Free).unwrap();
        assert_eq!(free.name, "Starter");
        assert_eq!(free.currency, "usd");
        assert_eq!(free.limit_for(MeteredResource::TeamMembers), Limit::Capped(1));

        let pro = catalog.get_plan_by_tier(SubscriptionTier::Pro).unwrap();
        assert_eq!(pro.limit_for(MeteredResource::Campaigns), Limit::Unlimited);
    }

    #[test]
    fn test_from_json_duplicate_tier() {
        let json = r#"[
            { "tier": "free", "name": "A", "monthly_price_cents": 0 },
            { "tier": "free", "name": "B", "monthly_price_cents": 0 }
        ]"#;
        assert!(PlanCatalog::from_json(json).is_err());
    }
}
