//! Metered resources and their limits.
//!
//! Resources are the counters a subscription consumes (campaigns created,
//! brands, team seats, ...). They form their own key space: features refer to
//! a resource through the gate table, never by sharing its name.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::BillingError;

/// A counted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeteredResource {
    /// Campaigns created in the current period.
    Campaigns,
    /// Brands managed by the account.
    Brands,
    /// Ad sets across all campaigns.
    AdSets,
    /// Content items in the library.
    ContentItems,
    /// Team seats.
    TeamMembers,
    /// Approval workflows.
    Approvals,
    /// Uploaded media in megabytes.
    StorageMb,
}

impl MeteredResource {
    /// All resources in declaration order.
    pub const ALL: [MeteredResource; 7] = [
        Self::Campaigns,
        Self::Brands,
        Self::AdSets,
        Self::ContentItems,
        Self::TeamMembers,
        Self::Approvals,
        Self::StorageMb,
    ];

    /// Convert to the wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Campaigns => "campaigns",
            Self::Brands => "brands",
            Self::AdSets => "ad_sets",
            Self::ContentItems => "content_items",
            Self::TeamMembers => "team_members",
            Self::Approvals => "approvals",
            Self::StorageMb => "storage_mb",
        }
    }

    /// Human-readable plural noun, used in change summaries.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Campaigns => "campaigns",
            Self::Brands => "brands",
            Self::AdSets => "ad sets",
            Self::ContentItems => "content items",
            Self::TeamMembers => "team members",
            Self::Approvals => "approval workflows",
            Self::StorageMb => "MB of storage",
        }
    }
}

impl FromStr for MeteredResource {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| BillingError::InvalidResource { value: s.to_string() })
    }
}

impl std::fmt::Display for MeteredResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A usage limit.
///
/// On the wire a limit is an integer: `-1` is unlimited, anything else is a
/// hard cap. `Capped` is declared first so every cap orders below `Unlimited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Limit {
    /// At most this many units.
    Capped(u64),
    /// No cap.
    Unlimited,
}

impl Limit {
    /// Raw value meaning "unlimited".
    pub const UNLIMITED_RAW: i64 = -1;

    /// Parse the raw integer form.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidLimit` for negative values other than `-1`.
    pub fn from_raw(value: i64) -> Result<Self, BillingError> {
        match value {
            Self::UNLIMITED_RAW => Ok(Self::Unlimited),
            v if v >= 0 => Ok(Self::Capped(v as u64)),
            v => Err(BillingError::InvalidLimit { value: v }),
        }
    }

    /// Convert to the raw integer form, saturating very large caps.
    #[must_use]
    pub fn to_raw(&self) -> i64 {
        match self {
            Self::Unlimited => Self::UNLIMITED_RAW,
            Self::Capped(n) => i64::try_from(*n).unwrap_or(i64::MAX),
        }
    }

    /// Check if this limit is unlimited.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// The cap, if any.
    #[must_use]
    pub fn cap(&self) -> Option<u64> {
        match self {
            Self::Capped(n) => Some(*n),
            Self::Unlimited => None,
        }
    }

    /// Check if one more unit can be created at the given usage.
    ///
    /// Being exactly at the cap denies.
    #[must_use]
    pub fn allows(&self, used: u64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Capped(max) => used < *max,
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_raw())
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Limit::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Capped(n) => write!(f, "{}", n),
        }
    }
}
