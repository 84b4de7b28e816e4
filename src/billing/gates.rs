//! Feature gate table.
//!
//! Maps a feature to per-tier restrictions. The table lists restrictions, not
//! grants: a feature with no entry for a tier is unrestricted on that tier.
//!
//! ```rust,ignore
//! use plangate::billing::{FeatureGateTable, Limit, MeteredResource, SubscriptionTier};
//!
//! let gates = FeatureGateTable::builder()
//!     .feature("campaigns")
//!         .resource(MeteredResource::Campaigns)
//!         .tier(SubscriptionTier::Free, Limit::Capped(5), "Upgrade to add more campaigns")
//!         .tier(SubscriptionTier::Pro, Limit::Capped(50), "Upgrade to Enterprise for unlimited campaigns")
//!         .tier(SubscriptionTier::Enterprise, Limit::Unlimited, "")
//!         .done()
//!     .build()?;
//! ```

use std::borrow::Borrow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::resource::{Limit, MeteredResource};
use super::tier::SubscriptionTier;
use super::validation::validate_feature_id;

/// Identifier of a gated capability (e.g. `"campaigns"`, `"api_access"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureId(String);

impl FeatureId {
    /// Create a feature ID after validation.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidFeatureId` if the ID is malformed.
    pub fn new(id: impl Into<String>) -> Result<Self, BillingError> {
        let id = id.into();
        validate_feature_id(&id)?;
        Ok(Self(id))
    }

    /// Returns the inner string reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FeatureId {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        id.0
    }
}

impl Borrow<str> for FeatureId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Restriction for one feature on one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierGate {
    /// Usage cap (`-1` on the wire for unlimited).
    pub limit: Limit,
    /// Message shown when the cap blocks the caller.
    #[serde(default)]
    pub upgrade_prompt: String,
}

/// All restrictions for one feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGateRule {
    /// Counter consumed by this feature. `None` means access-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<MeteredResource>,
    /// Per-tier restrictions.
    #[serde(default)]
    pub tiers: BTreeMap<SubscriptionTier, TierGate>,
}

impl FeatureGateRule {
    /// Restriction for a tier, if one is defined.
    #[must_use]
    pub fn for_tier(&self, tier: SubscriptionTier) -> Option<&TierGate> {
        self.tiers.get(&tier)
    }

    /// Defined entries, cheapest tier first.
    pub fn entries(&self) -> impl Iterator<Item = (SubscriptionTier, &TierGate)> {
        self.tiers.iter().map(|(t, g)| (*t, g))
    }
}

/// Feature identifier to per-tier restriction mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureGateTable {
    rules: BTreeMap<FeatureId, FeatureGateRule>,
}

impl FeatureGateTable {
    /// Create an empty table (every feature unrestricted).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing a table.
    #[must_use]
    pub fn builder() -> FeatureGateTableBuilder {
        FeatureGateTableBuilder::new()
    }

    /// Parse a table from JSON.
    ///
    /// The expected shape is
    /// `{"campaigns": {"resource": "campaigns", "tiers": {"free": {"limit": 5, "upgrade_prompt": "..."}}}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or holds invalid feature IDs,
    /// tiers, resources or limits.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up the restriction for a feature on a tier.
    ///
    /// `None` means unrestricted.
    #[must_use]
    pub fn lookup(&self, feature: &str, tier: SubscriptionTier) -> Option<&TierGate> {
        self.rules.get(feature).and_then(|rule| rule.for_tier(tier))
    }

    /// The full rule for a feature.
    #[must_use]
    pub fn rule(&self, feature: &str) -> Option<&FeatureGateRule> {
        self.rules.get(feature)
    }

    /// Check if a feature has any entry at all.
    #[must_use]
    pub fn contains(&self, feature: &str) -> bool {
        self.rules.contains_key(feature)
    }

    /// Metered resource joined to a feature.
    #[must_use]
    pub fn resource_for(&self, feature: &str) -> Option<MeteredResource> {
        self.rules.get(feature).and_then(|rule| rule.resource)
    }

    /// Iterate over all gated features.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, &FeatureGateRule)> {
        self.rules.iter()
    }

    /// Gated feature IDs.
    pub fn features(&self) -> impl Iterator<Item = &FeatureId> {
        self.rules.keys()
    }

    /// Number of gated features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no feature is gated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Add or replace a rule.
    pub fn insert(&mut self, feature: FeatureId, rule: FeatureGateRule) {
        self.rules.insert(feature, rule);
    }
}

/// Builder for a [`FeatureGateTable`].
///
/// Feature IDs are validated in [`build`](Self::build) so the chain stays
/// infallible.
#[derive(Debug, Default)]
pub struct FeatureGateTableBuilder {
    rules: Vec<(String, FeatureGateRule)>,
}

impl FeatureGateTableBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start defining a feature.
    #[must_use]
    pub fn feature(self, id: &str) -> FeatureGateBuilder {
        FeatureGateBuilder {
            parent: self,
            id: id.to_string(),
            rule: FeatureGateRule::default(),
        }
    }

    /// Build the table.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidFeatureId` for the first malformed ID.
    pub fn build(self) -> Result<FeatureGateTable, BillingError> {
        let mut table = FeatureGateTable::new();
        for (id, rule) in self.rules {
            table.insert(FeatureId::new(id)?, rule);
        }
        Ok(table)
    }
}

/// Builder for one feature's rule.
#[derive(Debug)]
pub struct FeatureGateBuilder {
    parent: FeatureGateTableBuilder,
    id: String,
    rule: FeatureGateRule,
}

impl FeatureGateBuilder {
    /// Join this feature to a metered resource.
    #[must_use]
    pub fn resource(mut self, resource: MeteredResource) -> Self {
        self.rule.resource = Some(resource);
        self
    }

    /// Restrict the feature on a tier.
    #[must_use]
    pub fn tier(mut self, tier: SubscriptionTier, limit: Limit, upgrade_prompt: &str) -> Self {
        self.rule.tiers.insert(
            tier,
            TierGate {
                limit,
                upgrade_prompt: upgrade_prompt.to_string(),
            },
        );
        self
    }

    /// Block the feature entirely on a tier.
    #[must_use]
    pub fn blocked_on(self, tier: SubscriptionTier, upgrade_prompt: &str) -> Self {
        self.tier(tier, Limit::Capped(0), upgrade_prompt)
    }

    /// Finish this feature and return to the table builder.
    #[must_use]
    pub fn done(mut self) -> FeatureGateTableBuilder {
        self.parent.rules.push((self.id, self.rule));
        self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign_table() -> FeatureGateTable {
        FeatureGateTable::builder()
            .feature("campaigns")
            .resource(MeteredResource::Campaigns)
            .tier(SubscriptionTier::Free, Limit::Capped(5), "Upgrade to add more campaigns")
            .tier(SubscriptionTier::Enterprise, Limit::Unlimited, "")
            .done()
            .feature("api_access")
            .blocked_on(SubscriptionTier::Free, "Upgrade to Pro for API access")
            .done()
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup() {
        let table = campaign_table();

        let gate = table.lookup("campaigns", SubscriptionTier::Free).unwrap();
        assert_eq!(gate.limit, Limit::Capped(5));
        assert_eq!(gate.upgrade_prompt, "Upgrade to add more campaigns");

        // Pro has no entry: unrestricted.
        assert!(table.lookup("campaigns", SubscriptionTier::Pro).is_none());
        assert!(table.lookup("unknown", SubscriptionTier::Free).is_none());
    }

    #[test]
    fn test_resource_join() {
        let table = campaign_table();
        assert_eq!(table.resource_for("campaigns"), Some(MeteredResource::Campaigns));
        assert_eq!(table.resource_for("api_access"), None);
        assert_eq!(table.resource_for("missing"), None);
    }

    #[test]
    fn test_builder_rejects_bad_feature_id() {
        let result = FeatureGateTable::builder()
            .feature("Bad Feature!")
            .tier(SubscriptionTier::Free, Limit::Capped(1), "")
            .done()
            .build();
        assert!(matches!(result, Err(BillingError::InvalidFeatureId { .. })));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "campaigns": {
                "resource": "campaigns",
                "tiers": {
                    "free": { "limit": 5, "upgrade_prompt": "Upgrade to add more campaigns" },
                    "pro": { "limit": -1 }
                }
            },
            "white_label": {
                "tiers": { "free": { "limit": 0, "upgrade_prompt": "Enterprise only" } }
            }
        }"#;

        let table = FeatureGateTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup("campaigns", SubscriptionTier::Pro).unwrap().limit,
            Limit::Unlimited
        );
        assert_eq!(
            table.lookup("white_label", SubscriptionTier::Free).unwrap().limit,
            Limit::Capped(0)
        );
        assert_eq!(table.resource_for("white_label"), None);
    }

    #[test]
    fn test_from_json_rejects_bad_limit() {
        let json = r#"{ "campaigns": { "tiers": { "free": { "limit": -5 } } } }"#;
        assert!(FeatureGateTable::from_json(json).is_err());
    }

    #[test]
    fn test_feature_id_validation() {
        assert!(FeatureId::new("advanced_analytics").is_ok());
        assert!(FeatureId::new("reports.export").is_ok());
        assert!(FeatureId::new("").is_err());
        assert!(FeatureId::new("has space").is_err());
    }
}
