//! Stock catalog and gate table for the marketing dashboard.
//!
//! Three tiers: Free ($0), Pro ($49/mo, 14 day trial) and Enterprise
//! ($199/mo, no caps). Deployments that sell different plans load their own
//! catalog from JSON instead.

use super::error::BillingError;
use super::gates::FeatureGateTable;
use super::plans::PlanCatalog;
use super::resource::{Limit, MeteredResource};
use super::tier::SubscriptionTier;

/// Feature identifiers used by the dashboard.
pub mod features {
    pub const CAMPAIGNS: &str = "campaigns";
    pub const BRANDS: &str = "brands";
    pub const AD_SETS: &str = "ad_sets";
    pub const CONTENT_ITEMS: &str = "content_items";
    pub const TEAM_MEMBERS: &str = "team_members";
    pub const APPROVALS: &str = "approvals";
    pub const ADVANCED_ANALYTICS: &str = "advanced_analytics";
    pub const API_ACCESS: &str = "api_access";
    pub const WHITE_LABEL: &str = "white_label";
}

use features::*;

/// The dashboard plan catalog.
///
/// # Errors
///
/// Only fails if a feature constant above is malformed.
pub fn default_catalog() -> Result<PlanCatalog, BillingError> {
    PlanCatalog::builder()
        .plan(SubscriptionTier::Free)
        .name("Free")
        .description("For trying things out")
        .features([CAMPAIGNS, BRANDS, AD_SETS, CONTENT_ITEMS, TEAM_MEMBERS])
        .limit(MeteredResource::Campaigns, Limit::Capped(5))
        .limit(MeteredResource::Brands, Limit::Capped(1))
        .limit(MeteredResource::AdSets, Limit::Capped(10))
        .limit(MeteredResource::ContentItems, Limit::Capped(50))
        .limit(MeteredResource::TeamMembers, Limit::Capped(1))
        .limit(MeteredResource::Approvals, Limit::Capped(0))
        .limit(MeteredResource::StorageMb, Limit::Capped(500))
        .done()
        .plan(SubscriptionTier::Pro)
        .name("Pro")
        .description("For growing marketing teams")
        .monthly_price_cents(4900)
        .trial_days(14)
        .features([
            CAMPAIGNS,
            BRANDS,
            AD_SETS,
            CONTENT_ITEMS,
            TEAM_MEMBERS,
            APPROVALS,
            ADVANCED_ANALYTICS,
            API_ACCESS,
        ])
        .limit(MeteredResource::Campaigns, Limit::Capped(50))
        .limit(MeteredResource::Brands, Limit::Capped(10))
        .limit(MeteredResource::AdSets, Limit::Capped(200))
        .limit(MeteredResource::ContentItems, Limit::Capped(1000))
        .limit(MeteredResource::TeamMembers, Limit::Capped(10))
        .limit(MeteredResource::Approvals, Limit::Capped(100))
        .limit(MeteredResource::StorageMb, Limit::Capped(10_000))
        .done()
        .plan(SubscriptionTier::Enterprise)
        .name("Enterprise")
        .description("For agencies and large brands")
        .monthly_price_cents(19900)
        .features([
            CAMPAIGNS,
            BRANDS,
            AD_SETS,
            CONTENT_ITEMS,
            TEAM_MEMBERS,
            APPROVALS,
            ADVANCED_ANALYTICS,
            API_ACCESS,
            WHITE_LABEL,
        ])
        .done()
        .build()
}

/// The dashboard feature gates.
///
/// Enterprise has no entries, so every feature is unrestricted there.
///
/// # Errors
///
/// Only fails if a feature constant above is malformed.
pub fn default_gates() -> Result<FeatureGateTable, BillingError> {
    use SubscriptionTier::{Free, Pro};

    FeatureGateTable::builder()
        .feature(CAMPAIGNS)
        .resource(MeteredResource::Campaigns)
        .tier(Free, Limit::Capped(5), "Upgrade to Pro to run up to 50 campaigns")
        .tier(Pro, Limit::Capped(50), "Upgrade to Enterprise for unlimited campaigns")
        .done()
        .feature(BRANDS)
        .resource(MeteredResource::Brands)
        .tier(Free, Limit::Capped(1), "Upgrade to Pro to manage up to 10 brands")
        .tier(Pro, Limit::Capped(10), "Upgrade to Enterprise for unlimited brands")
        .done()
        .feature(AD_SETS)
        .resource(MeteredResource::AdSets)
        .tier(Free, Limit::Capped(10), "Upgrade to Pro to create up to 200 ad sets")
        .tier(Pro, Limit::Capped(200), "Upgrade to Enterprise for unlimited ad sets")
        .done()
        .feature(CONTENT_ITEMS)
        .resource(MeteredResource::ContentItems)
        .tier(Free, Limit::Capped(50), "Upgrade to Pro to store up to 1,000 content items")
        .tier(Pro, Limit::Capped(1000), "Upgrade to Enterprise for unlimited content")
        .done()
        .feature(TEAM_MEMBERS)
        .resource(MeteredResource::TeamMembers)
        .tier(Free, Limit::Capped(1), "Upgrade to Pro to invite your team")
        .tier(Pro, Limit::Capped(10), "Upgrade to Enterprise for unlimited seats")
        .done()
        .feature(APPROVALS)
        .resource(MeteredResource::Approvals)
        .blocked_on(Free, "Upgrade to Pro to use approval workflows")
        .tier(Pro, Limit::Capped(100), "Upgrade to Enterprise for unlimited approvals")
        .done()
        .feature(ADVANCED_ANALYTICS)
        .blocked_on(Free, "Upgrade to Pro for advanced analytics")
        .done()
        .feature(API_ACCESS)
        .blocked_on(Free, "Upgrade to Pro for API access")
        .done()
        .feature(WHITE_LABEL)
        .blocked_on(Free, "White label reports are available on Enterprise")
        .blocked_on(Pro, "White label reports are available on Enterprise")
        .done()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::validation::{validate_catalog, validate_gate_table};

    #[test]
    fn test_defaults_pass_validation() {
        let catalog = default_catalog().unwrap();
        let gates = default_gates().unwrap();

        assert!(validate_catalog(&catalog).is_ok());
        assert!(validate_gate_table(&gates, &catalog).is_ok());
        assert_eq!(catalog.len(), 3);
        assert_eq!(gates.len(), 9);
    }

    #[test]
    fn test_default_prices() {
        let catalog = default_catalog().unwrap();
        let prices: Vec<String> = catalog.plans().map(|p| p.formatted_price()).collect();
        assert_eq!(prices, vec!["$0.00", "$49.00", "$199.00"]);
    }

    #[test]
    fn test_every_gated_feature_is_offered() {
        let catalog = default_catalog().unwrap();
        let gates = default_gates().unwrap();

        for feature in gates.features() {
            assert!(
                catalog.offers_feature(feature.as_str()),
                "{} is gated but no plan offers it",
                feature
            );
        }
    }

    #[test]
    fn test_plan_limits_match_gates() {
        let catalog = default_catalog().unwrap();
        let gates = default_gates().unwrap();

        for (feature, rule) in gates.iter() {
            let Some(resource) = rule.resource else { continue };
            for (tier, gate) in rule.entries() {
                let plan = catalog.get_plan_by_tier(tier).unwrap();
                assert_eq!(
                    plan.limit_for(resource),
                    gate.limit,
                    "{} on {}",
                    feature,
                    tier
                );
            }
        }
    }
}
