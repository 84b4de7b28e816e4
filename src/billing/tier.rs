//! Subscription tiers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BillingError;

/// Subscription tier.
///
/// Variants are declared cheapest first, so the derived ordering is the
/// upgrade order: `Free < Pro < Enterprise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// Free tier.
    Free,
    /// Paid tier for growing teams.
    Pro,
    /// Top tier, usually unlimited.
    Enterprise,
}

impl SubscriptionTier {
    /// All tiers, cheapest first.
    pub const ALL: [SubscriptionTier; 3] = [Self::Free, Self::Pro, Self::Enterprise];

    /// Convert to the wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Display name for the tier.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Pro => "Pro",
            Self::Enterprise => "Enterprise",
        }
    }

    /// The next tier up, or `None` at the top.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Free => Some(Self::Pro),
            Self::Pro => Some(Self::Enterprise),
            Self::Enterprise => None,
        }
    }

    /// Tiers strictly above this one, cheapest first.
    pub fn higher(&self) -> impl Iterator<Item = SubscriptionTier> + use<> {
        let current = *self;
        Self::ALL.into_iter().filter(move |t| *t > current)
    }

    /// Check if this is a paid tier.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }
}

impl FromStr for SubscriptionTier {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(BillingError::InvalidTier { value: s.to_string() }),
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(SubscriptionTier::Free < SubscriptionTier::Pro);
        assert!(SubscriptionTier::Pro < SubscriptionTier::Enterprise);
        assert!(SubscriptionTier::Free < SubscriptionTier::Enterprise);
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("free".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Free);
        assert_eq!(" PRO ".parse::<SubscriptionTier>().unwrap(), SubscriptionTier::Pro);
        assert_eq!(
            "Enterprise".parse::<SubscriptionTier>().unwrap(),
            SubscriptionTier::Enterprise
        );
        assert_eq!(
            "gold".parse::<SubscriptionTier>(),
            Err(BillingError::InvalidTier { value: "gold".to_string() })
        );
    }

    #[test]
    fn test_next_and_higher() {
        assert_eq!(SubscriptionTier::Free.next(), Some(SubscriptionTier::Pro));
        assert_eq!(SubscriptionTier::Enterprise.next(), None);

        let higher: Vec<_> = SubscriptionTier::Free.higher().collect();
        assert_eq!(higher, vec![SubscriptionTier::Pro, SubscriptionTier::Enterprise]);
        assert_eq!(SubscriptionTier::Enterprise.higher().count(), 0);
    }

    #[test]
    fn test_tier_serde() {
        let json = serde_json::to_string(&SubscriptionTier::Enterprise).unwrap();
        assert_eq!(json, "\"enterprise\"");

        let tier: SubscriptionTier = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(tier, SubscriptionTier::Pro);
    }

    #[test]
    fn test_is_paid() {
        assert!(!SubscriptionTier::Free.is_paid());
        assert!(SubscriptionTier::Pro.is_paid());
    }
}
