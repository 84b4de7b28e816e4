//! Entitlements and feature gating.
//!
//! The evaluator answers "may this subscription use feature X right now" from
//! three immutable inputs: the plan catalog, the feature gate table and the
//! evaluation settings. It keeps no state of its own, so one evaluator can be
//! shared freely across threads.
//!
//! ```rust,ignore
//! let engine = EntitlementEngine::with_defaults()?;
//! let evaluator = engine.evaluator();
//!
//! if !evaluator.can_access_feature(&sub, "campaigns") {
//!     let gate = evaluator.get_feature_gate(&sub, "campaigns");
//!     // show gate.upgrade_prompt / gate.alternative_action
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::gates::{FeatureGateTable, FeatureId, TierGate};
use super::plans::PlanCatalog;
use super::resource::{Limit, MeteredResource};
use super::settings::{EntitlementSettings, RequiredTierScan, UnknownFeaturePolicy};
use super::subscription::{Subscription, SubscriptionStatus};
use super::tier::SubscriptionTier;

/// Stateless entitlement checks over a catalog and gate table.
#[derive(Debug, Clone, Copy)]
pub struct EntitlementEvaluator<'a> {
    catalog: &'a PlanCatalog,
    gates: &'a FeatureGateTable,
    settings: &'a EntitlementSettings,
}

impl<'a> EntitlementEvaluator<'a> {
    /// Create a new evaluator.
    ///
    /// The inputs are not validated here; use
    /// [`EntitlementEngine`](super::EntitlementEngine) to get validation at
    /// construction.
    #[must_use]
    pub fn new(
        catalog: &'a PlanCatalog,
        gates: &'a FeatureGateTable,
        settings: &'a EntitlementSettings,
    ) -> Self {
        Self {
            catalog,
            gates,
            settings,
        }
    }

    /// The catalog this evaluator reads.
    #[must_use]
    pub fn catalog(&self) -> &'a PlanCatalog {
        self.catalog
    }

    /// The gate table this evaluator reads.
    #[must_use]
    pub fn gates(&self) -> &'a FeatureGateTable {
        self.gates
    }

    /// The settings in effect.
    #[must_use]
    pub fn settings(&self) -> &'a EntitlementSettings {
        self.settings
    }

    /// Check if the subscription grants access (active or trialing).
    #[must_use]
    pub fn is_subscription_active(&self, sub: &Subscription) -> bool {
        sub.is_active()
    }

    /// Check if the current period has ended.
    #[must_use]
    pub fn is_subscription_expired(&self, sub: &Subscription) -> bool {
        self.is_subscription_expired_at(sub, Utc::now())
    }

    /// Check if the current period ended before `now`.
    #[must_use]
    pub fn is_subscription_expired_at(&self, sub: &Subscription, now: DateTime<Utc>) -> bool {
        sub.is_expired_at(now)
    }

    /// Check if the subscription is cancelled or will cancel at period end.
    #[must_use]
    pub fn is_subscription_cancelled(&self, sub: &Subscription) -> bool {
        sub.is_cancelled()
    }

    /// Check if the subscription may use a feature.
    #[must_use]
    pub fn can_access_feature(&self, sub: &Subscription, feature: &str) -> bool {
        self.check_feature(sub, feature).is_allowed()
    }

    /// Check a feature and report why access is denied.
    #[must_use = "feature check result must be used to enforce access control"]
    pub fn check_feature(&self, sub: &Subscription, feature: &str) -> FeatureCheckResult {
        if !sub.is_active() {
            tracing::debug!(
                target: "plangate::entitlements",
                profile_id = %sub.profile_id,
                feature = %feature,
                status = %sub.status,
                "Feature denied: subscription inactive"
            );
            return FeatureCheckResult::SubscriptionInactive { status: sub.status };
        }

        let Some(gate) = self.gates.lookup(feature, sub.tier) else {
            if self.is_unknown_feature(feature) {
                tracing::warn!(
                    target: "plangate::entitlements",
                    feature = %feature,
                    policy = ?self.settings.unknown_feature_policy,
                    "Feature is not gated and no plan offers it"
                );
                if self.settings.unknown_feature_policy == UnknownFeaturePolicy::Deny {
                    return FeatureCheckResult::UnknownFeatureDenied;
                }
            }
            return FeatureCheckResult::Allowed;
        };

        let used = self.usage_for(sub, feature);
        match gate.limit {
            Limit::Unlimited => FeatureCheckResult::Allowed,
            Limit::Capped(limit) if used < limit => FeatureCheckResult::Allowed,
            Limit::Capped(limit) => {
                tracing::debug!(
                    target: "plangate::entitlements",
                    profile_id = %sub.profile_id,
                    feature = %feature,
                    tier = %sub.tier,
                    used,
                    limit,
                    "Feature denied: limit reached"
                );
                FeatureCheckResult::LimitReached { used, limit }
            }
        }
    }

    /// Check if no gate and no plan has heard of a feature.
    #[must_use]
    pub fn is_unknown_feature(&self, feature: &str) -> bool {
        !self.gates.contains(feature) && !self.catalog.offers_feature(feature)
    }

    /// Assemble the gate shown to the user for a feature.
    ///
    /// Returns `None` when the feature is unrestricted on the subscription's
    /// tier and access is allowed: there is nothing to show.
    #[must_use]
    pub fn get_feature_gate(&self, sub: &Subscription, feature: &str) -> Option<FeatureGate> {
        let rule = self.gates.rule(feature)?;
        let entry = rule.for_tier(sub.tier);
        let check = self.check_feature(sub, feature);
        if entry.is_none() && check.is_allowed() {
            return None;
        }

        let required_tier = self.get_required_tier_for_feature(feature);

        let upgrade_prompt = entry
            .map(|g| g.upgrade_prompt.as_str())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Upgrade to {} to unlock this feature", required_tier));

        let alternative_action = if check.is_allowed() {
            None
        } else {
            Some(self.alternative_action(sub, feature, &check))
        };

        Some(FeatureGate {
            feature_id: feature.to_string(),
            required_tier,
            is_enabled: check.is_allowed(),
            upgrade_prompt,
            alternative_action,
            current_usage: self.usage_for(sub, feature),
            limit: entry.map(|g| g.limit),
            denial: check.denial(),
        })
    }

    /// The tier a user must be on to use a feature.
    ///
    /// A feature with no entries at all is available from Free.
    #[must_use]
    pub fn get_required_tier_for_feature(&self, feature: &str) -> SubscriptionTier {
        let Some(rule) = self.gates.rule(feature).filter(|r| !r.tiers.is_empty()) else {
            return SubscriptionTier::Free;
        };

        match self.settings.required_tier_scan {
            RequiredTierScan::Ascending => SubscriptionTier::ALL
                .into_iter()
                .find(|tier| rule.for_tier(*tier).is_none_or(grants_access))
                .unwrap_or(SubscriptionTier::Enterprise),
            RequiredTierScan::Descending => SubscriptionTier::ALL
                .into_iter()
                .rev()
                .find(|tier| rule.for_tier(*tier).is_some())
                .unwrap_or(SubscriptionTier::Free),
        }
    }

    /// Usage of a feature's resource as a percentage of the cap, in `[0, 100]`.
    ///
    /// Ungated and unlimited features report 0; a cap of 0 reports 100.
    #[must_use]
    pub fn get_usage_percentage(&self, sub: &Subscription, feature: &str) -> f64 {
        let Some(gate) = self.gates.lookup(feature, sub.tier) else {
            return 0.0;
        };
        usage_percentage(self.usage_for(sub, feature), gate.limit)
    }

    /// Check if usage is at or above `threshold` percent of the cap.
    #[must_use]
    pub fn is_usage_near_limit(&self, sub: &Subscription, feature: &str, threshold: f64) -> bool {
        self.get_usage_percentage(sub, feature) >= threshold
    }

    /// [`is_usage_near_limit`](Self::is_usage_near_limit) with the configured threshold.
    #[must_use]
    pub fn is_usage_near_limit_default(&self, sub: &Subscription, feature: &str) -> bool {
        self.is_usage_near_limit(sub, feature, self.settings.near_limit_threshold)
    }

    /// Units left before the cap, or `-1` if ungated or unlimited.
    #[must_use]
    pub fn get_remaining_usage(&self, sub: &Subscription, feature: &str) -> i64 {
        match self.gates.lookup(feature, sub.tier).map(|g| g.limit) {
            None | Some(Limit::Unlimited) => -1,
            Some(Limit::Capped(limit)) => remaining(self.usage_for(sub, feature), limit),
        }
    }

    /// Metered features whose usage is at or above the configured threshold.
    ///
    /// Access-only features and features blocked on the subscription's tier
    /// are skipped: a cap of 0 always reads 100%.
    #[must_use]
    pub fn near_limit_resources(&self, sub: &Subscription) -> Vec<FeatureId> {
        self.gates
            .iter()
            .filter(|(_, rule)| rule.resource.is_some())
            .filter(|(_, rule)| rule.for_tier(sub.tier).is_none_or(grants_access))
            .filter(|(feature, _)| self.is_usage_near_limit_default(sub, feature.as_str()))
            .map(|(feature, _)| feature.clone())
            .collect()
    }

    /// Summary of what a subscription includes and how much of it is used.
    ///
    /// Resource caps come from the subscription's plan. A tier with no plan in
    /// the catalog yields an empty summary.
    pub fn entitlements(&self, sub: &Subscription) -> Entitlements {
        let Some(plan) = self.catalog.get_plan_by_tier(sub.tier) else {
            tracing::warn!(
                target: "plangate::entitlements",
                tier = %sub.tier,
                "No plan in catalog for subscription tier"
            );
            return Entitlements::empty(sub);
        };

        let threshold = self.settings.near_limit_threshold;
        let resources = MeteredResource::ALL
            .into_iter()
            .map(|resource| {
                let used = sub.usage_of(resource);
                let limit = plan.limit_for(resource);
                let percentage = usage_percentage(used, limit);
                ResourceUsage {
                    resource,
                    used,
                    limit,
                    remaining: match limit {
                        Limit::Unlimited => -1,
                        Limit::Capped(max) => remaining(used, max),
                    },
                    percentage,
                    near_limit: matches!(limit, Limit::Capped(max) if max > 0)
                        && percentage >= threshold,
                }
            })
            .collect();

        Entitlements {
            profile_id: sub.profile_id.clone(),
            tier: sub.tier,
            is_active: sub.is_active(),
            features: plan.features.iter().cloned().collect(),
            resources,
        }
    }

    fn usage_for(&self, sub: &Subscription, feature: &str) -> u64 {
        self.gates
            .resource_for(feature)
            .map_or(0, |resource| sub.usage_of(resource))
    }

    fn alternative_action(
        &self,
        sub: &Subscription,
        feature: &str,
        check: &FeatureCheckResult,
    ) -> String {
        match check {
            FeatureCheckResult::SubscriptionInactive { status } => match status {
                SubscriptionStatus::Cancelled => {
                    "Resubscribe to restore access to this feature".to_string()
                }
                _ => "Update your payment method to reactivate your subscription".to_string(),
            },
            FeatureCheckResult::LimitReached { limit, .. } => {
                let upgrade = sub.tier.higher().find(|tier| {
                    self.gates
                        .lookup(feature, *tier)
                        .is_none_or(|g| g.limit > Limit::Capped(*limit))
                });
                match (upgrade, self.gates.resource_for(feature)) {
                    (Some(tier), Some(resource)) => format!(
                        "Upgrade to {} or remove existing {} to free up space",
                        tier,
                        resource.label()
                    ),
                    (Some(tier), None) => format!("Upgrade to {} to unlock this feature", tier),
                    (None, _) => "Contact sales to raise your limit".to_string(),
                }
            }
            FeatureCheckResult::UnknownFeatureDenied => {
                "Contact support if you believe you should have access".to_string()
            }
            FeatureCheckResult::Allowed => String::new(),
        }
    }
}

fn grants_access(gate: &TierGate) -> bool {
    gate.limit != Limit::Capped(0)
}

fn usage_percentage(used: u64, limit: Limit) -> f64 {
    match limit {
        Limit::Unlimited => 0.0,
        Limit::Capped(0) => 100.0,
        Limit::Capped(max) => (used as f64 / max as f64 * 100.0).min(100.0),
    }
}

fn remaining(used: u64, limit: u64) -> i64 {
    i64::try_from(limit.saturating_sub(used)).unwrap_or(i64::MAX)
}

/// Result of a feature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FeatureCheckResult {
    /// Feature is available.
    Allowed,
    /// Subscription is not active.
    SubscriptionInactive { status: SubscriptionStatus },
    /// Usage has reached the cap for this tier.
    LimitReached { used: u64, limit: u64 },
    /// Feature is unknown and the policy denies unknown features.
    UnknownFeatureDenied,
}

impl FeatureCheckResult {
    /// Check if the feature is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Why access was denied, if it was.
    #[must_use]
    pub fn denial(&self) -> Option<DenialReason> {
        match *self {
            Self::Allowed => None,
            Self::SubscriptionInactive { status } => {
                Some(DenialReason::SubscriptionInactive { status })
            }
            Self::LimitReached { used, limit } => Some(DenialReason::LimitReached { used, limit }),
            Self::UnknownFeatureDenied => Some(DenialReason::UnknownFeature),
        }
    }
}

/// Why a feature gate is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    /// Subscription is past due, cancelled or incomplete.
    SubscriptionInactive { status: SubscriptionStatus },
    /// Usage has reached the cap.
    LimitReached { used: u64, limit: u64 },
    /// Feature is unknown.
    UnknownFeature,
}

/// A feature gate as presented to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureGate {
    /// Feature identifier.
    pub feature_id: String,
    /// Lowest tier offering this feature.
    pub required_tier: SubscriptionTier,
    /// Whether the subscription may use the feature now.
    pub is_enabled: bool,
    /// Message to show next to the gated feature.
    pub upgrade_prompt: String,
    /// Suggested next step, set only when denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_action: Option<String>,
    /// Usage of the joined resource (0 for access-only features).
    pub current_usage: u64,
    /// Cap on the subscription's tier, `None` if unrestricted there.
    pub limit: Option<Limit>,
    /// Why access was denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
}

/// Entitlements for a subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[must_use]
pub struct Entitlements {
    /// Profile the summary belongs to.
    pub profile_id: String,
    /// Subscription tier.
    pub tier: SubscriptionTier,
    /// Whether the subscription is active.
    pub is_active: bool,
    /// Features included in the plan.
    pub features: Vec<FeatureId>,
    /// Usage per metered resource.
    pub resources: Vec<ResourceUsage>,
}

impl Entitlements {
    fn empty(sub: &Subscription) -> Self {
        Self {
            profile_id: sub.profile_id.clone(),
            tier: sub.tier,
            is_active: sub.is_active(),
            features: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Check if a feature is available.
    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.is_active && self.features.iter().any(|f| f.as_str() == feature)
    }

    /// Usage summary for one resource.
    #[must_use]
    pub fn resource(&self, resource: MeteredResource) -> Option<&ResourceUsage> {
        self.resources.iter().find(|r| r.resource == resource)
    }

    /// Resources at or above the near-limit threshold.
    pub fn near_limit(&self) -> impl Iterator<Item = &ResourceUsage> {
        self.resources.iter().filter(|r| r.near_limit)
    }
}

/// Usage of one metered resource against the plan cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceUsage {
    pub resource: MeteredResource,
    pub used: u64,
    pub limit: Limit,
    /// `-1` when unlimited.
    pub remaining: i64,
    pub percentage: f64,
    /// Never set for unlimited or blocked (cap of 0) resources.
    pub near_limit: bool,
}
