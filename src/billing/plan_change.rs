//! Plan comparison and plan change impact.
//!
//! Used when a user is considering a different tier: what they gain, what
//! they lose, and whether anything they already created is over the new caps.

use serde::Serialize;

use super::display::format_billing_date;
use super::error::BillingError;
use super::gates::{FeatureGateTable, FeatureId};
use super::plans::{PlanCatalog, SubscriptionPlan, format_cents};
use super::resource::{Limit, MeteredResource};
use super::subscription::Subscription;
use super::tier::SubscriptionTier;

/// Compares plans and assesses tier changes.
#[derive(Debug, Clone, Copy)]
pub struct PlanChangeAnalyzer<'a> {
    catalog: &'a PlanCatalog,
    gates: &'a FeatureGateTable,
}

impl<'a> PlanChangeAnalyzer<'a> {
    /// Create a new analyzer.
    #[must_use]
    pub fn new(catalog: &'a PlanCatalog, gates: &'a FeatureGateTable) -> Self {
        Self { catalog, gates }
    }

    /// Compare two plans.
    ///
    /// A feature counts as improved when both plans include it and the
    /// resource it is joined to has a strictly higher cap in `target`.
    pub fn compare_plans(
        &self,
        current: &SubscriptionPlan,
        target: &SubscriptionPlan,
    ) -> PlanComparison {
        let added = target.features.difference(&current.features).cloned().collect();
        let removed = current.features.difference(&target.features).cloned().collect();
        let improved = current
            .features
            .intersection(&target.features)
            .filter(|feature| {
                self.gates
                    .resource_for(feature.as_str())
                    .is_some_and(|r| target.limit_for(r) > current.limit_for(r))
            })
            .cloned()
            .collect();

        let limit_changes = MeteredResource::ALL
            .into_iter()
            .filter_map(|resource| {
                let from = current.limit_for(resource);
                let to = target.limit_for(resource);
                (from != to).then_some(LimitChange { resource, from, to })
            })
            .collect();

        PlanComparison {
            is_upgrade: target.tier > current.tier,
            is_downgrade: target.tier < current.tier,
            price_difference_cents: target.monthly_price_cents - current.monthly_price_cents,
            feature_changes: FeatureChanges {
                added,
                removed,
                improved,
            },
            limit_changes,
        }
    }

    /// Compare the catalog plans of two tiers.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::PlanNotFound` if either tier has no plan.
    pub fn compare_tiers(
        &self,
        current: SubscriptionTier,
        target: SubscriptionTier,
    ) -> Result<PlanComparison, BillingError> {
        let current = self.catalog.require_plan(current)?;
        let target = self.catalog.require_plan(target)?;
        Ok(self.compare_plans(current, target))
    }

    /// Work out what moving a subscription to `target` would do.
    ///
    /// Upgrades take effect immediately. Downgrades take effect at the end of
    /// the current period, and warn about lost features and about any
    /// resource whose usage is over the target cap.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::PlanNotFound` if the subscription's tier has no
    /// plan in the catalog.
    pub fn analyze_plan_change_impact(
        &self,
        sub: &Subscription,
        target: &SubscriptionPlan,
    ) -> Result<PlanChangeImpact, BillingError> {
        let current = self.catalog.require_plan(sub.tier)?;
        let comparison = self.compare_plans(current, target);

        let overages: Vec<ResourceOverage> = MeteredResource::ALL
            .into_iter()
            .filter_map(|resource| {
                let used = sub.usage_of(resource);
                match target.limit_for(resource) {
                    Limit::Capped(limit) if used > limit => Some(ResourceOverage {
                        resource,
                        used,
                        limit,
                        excess: used - limit,
                    }),
                    _ => None,
                }
            })
            .collect();

        let will_lose_features = !comparison.feature_changes.removed.is_empty();
        let will_lose_data = comparison.is_downgrade && !overages.is_empty();

        let mut immediate_changes = Vec::new();
        let mut end_of_period_changes = Vec::new();
        let mut warnings = Vec::new();

        if comparison.is_upgrade {
            immediate_changes.push(format!("Your plan changes to {} immediately", target.name));
            for feature in &comparison.feature_changes.added {
                immediate_changes.push(format!("Access to {} starts now", feature));
            }
            for change in comparison.limit_changes.iter().filter(|c| c.to > c.from) {
                immediate_changes.push(format!(
                    "Your {} limit rises from {} to {}",
                    change.resource.label(),
                    change.from,
                    change.to
                ));
            }
            if comparison.price_difference_cents > 0 {
                immediate_changes.push(format!(
                    "You will be charged {} more per month, prorated for this period",
                    format_cents(comparison.price_difference_cents, &target.currency)
                ));
            }
        } else if comparison.is_downgrade {
            let period_end = format_billing_date(sub.current_period_end);
            end_of_period_changes.push(format!(
                "Your plan changes to {} on {}",
                target.name, period_end
            ));
            for feature in &comparison.feature_changes.removed {
                end_of_period_changes.push(format!("You will lose access to {}", feature));
            }
            for change in comparison.limit_changes.iter().filter(|c| c.to < c.from) {
                end_of_period_changes.push(format!(
                    "Your {} limit drops from {} to {}",
                    change.resource.label(),
                    change.from,
                    change.to
                ));
            }

            if will_lose_features {
                let names: Vec<&str> = comparison
                    .feature_changes
                    .removed
                    .iter()
                    .map(FeatureId::as_str)
                    .collect();
                warnings.push(format!(
                    "{} will no longer be available: {}",
                    if names.len() == 1 { "1 feature" } else { "Some features" },
                    names.join(", ")
                ));
            }
            for overage in &overages {
                warnings.push(format!(
                    "You have {} {} but {} allows {}; remove {} before {} or they will become read-only",
                    overage.used,
                    overage.resource.label(),
                    target.name,
                    overage.limit,
                    overage.excess,
                    period_end
                ));
            }
        }

        tracing::info!(
            target: "plangate::plan_change",
            profile_id = %sub.profile_id,
            from = %current.tier,
            to = %target.tier,
            will_lose_features,
            will_lose_data,
            "Plan change analyzed"
        );

        Ok(PlanChangeImpact {
            comparison,
            will_lose_features,
            will_lose_data,
            overages,
            immediate_changes,
            end_of_period_changes,
            warnings,
        })
    }
}

/// Differences between two plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct PlanComparison {
    /// Target tier is above the current one.
    pub is_upgrade: bool,
    /// Target tier is below the current one.
    pub is_downgrade: bool,
    /// Target price minus current price, per month.
    pub price_difference_cents: i64,
    pub feature_changes: FeatureChanges,
    /// Resources whose cap differs, in resource order.
    pub limit_changes: Vec<LimitChange>,
}

impl PlanComparison {
    /// Check if the plans are equivalent.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        !self.is_upgrade
            && !self.is_downgrade
            && self.price_difference_cents == 0
            && self.feature_changes.is_empty()
            && self.limit_changes.is_empty()
    }
}

/// Feature set differences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureChanges {
    /// Only in the target plan.
    pub added: Vec<FeatureId>,
    /// Only in the current plan.
    pub removed: Vec<FeatureId>,
    /// In both, with a higher cap in the target.
    pub improved: Vec<FeatureId>,
}

impl FeatureChanges {
    /// Check if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.improved.is_empty()
    }
}

/// A resource cap that differs between plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitChange {
    pub resource: MeteredResource,
    pub from: Limit,
    pub to: Limit,
}

/// Usage over the target plan's cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceOverage {
    pub resource: MeteredResource,
    pub used: u64,
    pub limit: u64,
    pub excess: u64,
}

/// What a plan change would do to a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct PlanChangeImpact {
    /// The plan comparison the impact is derived from.
    pub comparison: PlanComparison,
    pub will_lose_features: bool,
    /// Downgrading with at least one resource over the target cap.
    pub will_lose_data: bool,
    pub overages: Vec<ResourceOverage>,
    /// Messages for changes applied right away (upgrades).
    pub immediate_changes: Vec<String>,
    /// Messages for changes applied at period end (downgrades).
    pub end_of_period_changes: Vec<String>,
    pub warnings: Vec<String>,
}
