//! Evaluation settings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BillingError;

/// Default usage percentage at which a resource counts as "near the limit".
pub const DEFAULT_NEAR_LIMIT_THRESHOLD: f64 = 80.0;

/// How the required tier of a feature is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredTierScan {
    /// Cheapest tier whose gate entry grants access.
    #[default]
    Ascending,
    /// Highest tier with any gate entry, checked Enterprise first.
    ///
    /// Kept for dashboards that relied on the old lookup order.
    Descending,
}

impl FromStr for RequiredTierScan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" | "legacy" => Ok(Self::Descending),
            other => Err(format!(
                "unknown required tier scan '{}', expected 'ascending' or 'descending'",
                other
            )),
        }
    }
}

/// What to do with a feature no plan or gate knows about.
///
/// Such a feature is usually a typo in a feature constant. It is always
/// logged; the policy decides the answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFeaturePolicy {
    /// Treat it as ungated.
    #[default]
    Allow,
    /// Deny access.
    Deny,
}

impl FromStr for UnknownFeaturePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            other => Err(format!(
                "unknown feature policy '{}', expected 'allow' or 'deny'",
                other
            )),
        }
    }
}

/// Settings shared by every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntitlementSettings {
    /// Percentage (0, 100] at which usage is reported as near the limit.
    #[serde(default = "default_threshold")]
    pub near_limit_threshold: f64,
    /// Required-tier resolution order.
    #[serde(default)]
    pub required_tier_scan: RequiredTierScan,
    /// Handling of features nothing has heard of.
    #[serde(default)]
    pub unknown_feature_policy: UnknownFeaturePolicy,
}

fn default_threshold() -> f64 {
    DEFAULT_NEAR_LIMIT_THRESHOLD
}

impl Default for EntitlementSettings {
    fn default() -> Self {
        Self {
            near_limit_threshold: DEFAULT_NEAR_LIMIT_THRESHOLD,
            required_tier_scan: RequiredTierScan::default(),
            unknown_feature_policy: UnknownFeaturePolicy::default(),
        }
    }
}

impl EntitlementSettings {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidThreshold` if the threshold is not in `(0, 100]`.
    pub fn validate(&self) -> Result<(), BillingError> {
        let t = self.near_limit_threshold;
        if t.is_nan() || t <= 0.0 || t > 100.0 {
            return Err(BillingError::InvalidThreshold { value: t });
        }
        Ok(())
    }
}
