//! Validation for billing configuration.
//!
//! Feature IDs are validated on construction. The catalog and gate table are
//! validated once at startup by [`EntitlementEngine`](super::EntitlementEngine)
//! so that ordering mistakes in static configuration fail loudly instead of
//! producing odd upgrade advice at runtime.

use super::error::BillingError;
use super::gates::FeatureGateTable;
use super::plans::PlanCatalog;
use super::resource::{Limit, MeteredResource};
use super::tier::SubscriptionTier;

/// Maximum length for feature IDs.
const MAX_FEATURE_ID_LENGTH: usize = 64;

/// Valid ISO 4217 currency codes (lowercase).
const VALID_CURRENCIES: &[&str] = &[
    "usd", "eur", "gbp", "cad", "aud", "jpy", "chf", "sek", "nok", "dkk",
    "nzd", "sgd", "hkd", "inr", "brl", "mxn", "pln", "czk", "huf", "ron",
];

/// Validate a feature ID.
///
/// Feature IDs must:
/// - Not be empty
/// - Not exceed 64 characters
/// - Contain only lowercase ASCII letters, digits, underscores, hyphens and dots
///
/// # Errors
///
/// Returns `BillingError::InvalidFeatureId` if validation fails.
pub fn validate_feature_id(id: &str) -> Result<(), BillingError> {
    if id.is_empty() {
        return Err(BillingError::InvalidFeatureId {
            id: id.to_string(),
            reason: "feature_id cannot be empty".to_string(),
        });
    }

    if id.len() > MAX_FEATURE_ID_LENGTH {
        return Err(BillingError::InvalidFeatureId {
            id: sanitize_for_error(id),
            reason: format!("feature_id exceeds maximum length of {}", MAX_FEATURE_ID_LENGTH),
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'))
    {
        return Err(BillingError::InvalidFeatureId {
            id: sanitize_for_error(id),
            reason: "feature_id contains invalid characters (only lowercase alphanumeric, underscore, hyphen, and dot allowed)".to_string(),
        });
    }

    Ok(())
}

/// Validate a currency code.
///
/// # Errors
///
/// Returns `BillingError::CatalogInvariant` if the code is not a supported
/// lowercase ISO 4217 code.
pub fn validate_currency(tier: SubscriptionTier, currency: &str) -> Result<(), BillingError> {
    if VALID_CURRENCIES.contains(&currency) {
        Ok(())
    } else {
        Err(BillingError::CatalogInvariant {
            tier,
            reason: format!("unsupported currency '{}'", sanitize_for_error(currency)),
        })
    }
}

/// Validate the ordering invariants of a plan catalog.
///
/// Checks that:
/// - every tier has a plan
/// - prices are non-negative and never decrease going up a tier
/// - all plans share one currency
/// - each tier offers every feature of the tier below it
/// - no resource limit decreases going up a tier
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_catalog(catalog: &PlanCatalog) -> Result<(), BillingError> {
    for tier in SubscriptionTier::ALL {
        if !catalog.contains(tier) {
            return Err(BillingError::PlanNotFound { tier });
        }
    }

    let plans: Vec<_> = catalog.plans().collect();

    for plan in &plans {
        if plan.monthly_price_cents < 0 {
            return Err(BillingError::CatalogInvariant {
                tier: plan.tier,
                reason: format!("negative price {}", plan.monthly_price_cents),
            });
        }
        validate_currency(plan.tier, &plan.currency)?;
    }

    for pair in plans.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);

        if upper.currency != lower.currency {
            return Err(BillingError::CatalogInvariant {
                tier: upper.tier,
                reason: format!(
                    "currency '{}' differs from '{}' on {}",
                    upper.currency,
                    lower.currency,
                    lower.tier.as_str()
                ),
            });
        }

        if upper.monthly_price_cents < lower.monthly_price_cents {
            return Err(BillingError::CatalogInvariant {
                tier: upper.tier,
                reason: format!(
                    "price {} is lower than {} price {}",
                    upper.monthly_price_cents,
                    lower.tier.as_str(),
                    lower.monthly_price_cents
                ),
            });
        }

        if let Some(missing) = lower.features.iter().find(|f| !upper.features.contains(*f)) {
            return Err(BillingError::CatalogInvariant {
                tier: upper.tier,
                reason: format!(
                    "missing feature '{}' offered by {}",
                    missing,
                    lower.tier.as_str()
                ),
            });
        }

        for resource in MeteredResource::ALL {
            let lower_limit = lower.limits.get(resource);
            let upper_limit = upper.limits.get(resource);
            if upper_limit < lower_limit {
                return Err(BillingError::CatalogInvariant {
                    tier: upper.tier,
                    reason: format!(
                        "{} limit {} is lower than {} limit {}",
                        resource,
                        upper_limit,
                        lower.tier.as_str(),
                        lower_limit
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Validate a feature gate table against the catalog.
///
/// Checks that:
/// - limits never decrease going up a tier, where a tier without an entry
///   above one that has one counts as unlimited
/// - every capped entry carries an upgrade prompt
/// - no tier blocks (limit 0) a feature its own plan lists
///
/// # Errors
///
/// Returns `BillingError::GateInvariant` for the first inconsistency.
pub fn validate_gate_table(
    gates: &FeatureGateTable,
    catalog: &PlanCatalog,
) -> Result<(), BillingError> {
    for (feature, rule) in gates.iter() {
        let mut below: Option<(SubscriptionTier, Limit)> = None;
        for tier in SubscriptionTier::ALL {
            let limit = match (rule.for_tier(tier), below) {
                (Some(gate), _) => gate.limit,
                (None, Some(_)) => Limit::Unlimited,
                (None, None) => continue,
            };
            if let Some((lower_tier, lower_limit)) = below
                && limit < lower_limit
            {
                return Err(BillingError::GateInvariant {
                    feature: feature.to_string(),
                    reason: format!(
                        "{} limit {} is lower than {} limit {}",
                        tier.as_str(),
                        limit,
                        lower_tier.as_str(),
                        lower_limit
                    ),
                });
            }
            below = Some((tier, limit));
        }

        let entries: Vec<_> = rule.entries().collect();

        for (tier, gate) in &entries {
            if !gate.limit.is_unlimited() && gate.upgrade_prompt.trim().is_empty() {
                return Err(BillingError::GateInvariant {
                    feature: feature.to_string(),
                    reason: format!("capped entry for {} has no upgrade prompt", tier.as_str()),
                });
            }

            let granted_by_plan = catalog
                .get_plan_by_tier(*tier)
                .is_some_and(|plan| plan.has_feature(feature.as_str()));
            if granted_by_plan && gate.limit == Limit::Capped(0) {
                return Err(BillingError::GateInvariant {
                    feature: feature.to_string(),
                    reason: format!(
                        "{} plan lists the feature but the gate blocks it",
                        tier.as_str()
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Sanitize a string for error messages to prevent log injection.
fn sanitize_for_error(s: &str) -> String {
    let sanitized: String = s
        .chars()
        .take(50)
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '?' })
        .collect();

    if s.chars().count() > 50 {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
