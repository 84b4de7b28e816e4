//! Subscription snapshots.
//!
//! A [`Subscription`] is the caller's view of a billing record at one point in
//! time. It is produced by the billing backend (and its webhooks) and only
//! read here. Nothing in this crate caches or refreshes it; callers must
//! re-fetch after any usage-incrementing action before evaluating again.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::BillingError;
use super::resource::MeteredResource;
use super::tier::SubscriptionTier;

/// Subscription status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active and paid.
    Active,
    /// Subscription is in trial period.
    Trialing,
    /// Payment failed; access is suspended until it is fixed.
    PastDue,
    /// Subscription has been cancelled.
    #[serde(alias = "canceled")]
    Cancelled,
    /// Subscription is incomplete (awaiting payment).
    Incomplete,
}

impl SubscriptionStatus {
    /// All statuses.
    pub const ALL: [SubscriptionStatus; 5] = [
        Self::Active,
        Self::Trialing,
        Self::PastDue,
        Self::Cancelled,
        Self::Incomplete,
    ];

    /// Convert to the wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Cancelled => "cancelled",
            Self::Incomplete => "incomplete",
        }
    }

    /// Check if this status grants access.
    #[must_use]
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl FromStr for SubscriptionStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "trialing" => Ok(Self::Trialing),
            "past_due" => Ok(Self::PastDue),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "incomplete" => Ok(Self::Incomplete),
            _ => Err(BillingError::InvalidStatus { value: s.to_string() }),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A caller's live entitlement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Profile (account) that owns the subscription.
    pub profile_id: String,
    /// Current tier.
    pub tier: SubscriptionTier,
    /// Billing status.
    pub status: SubscriptionStatus,
    /// End of the current billing period.
    pub current_period_end: DateTime<Utc>,
    /// Whether the subscription will cancel at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Consumption per metered resource in the current period.
    #[serde(default)]
    pub usage: BTreeMap<MeteredResource, u64>,
}

impl Subscription {
    /// Create an active subscription with no usage.
    #[must_use]
    pub fn new(
        profile_id: impl Into<String>,
        tier: SubscriptionTier,
        current_period_end: DateTime<Utc>,
    ) -> Self {
        Self {
            profile_id: profile_id.into(),
            tier,
            status: SubscriptionStatus::Active,
            current_period_end,
            cancel_at_period_end: false,
            usage: BTreeMap::new(),
        }
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the usage of one resource.
    #[must_use]
    pub fn with_usage(mut self, resource: MeteredResource, used: u64) -> Self {
        self.usage.insert(resource, used);
        self
    }

    /// Mark the subscription as cancelling at period end.
    #[must_use]
    pub fn cancelling_at_period_end(mut self) -> Self {
        self.cancel_at_period_end = true;
        self
    }

    /// Current usage of a resource (0 if not tracked).
    #[must_use]
    pub fn usage_of(&self, resource: MeteredResource) -> u64 {
        self.usage.get(&resource).copied().unwrap_or(0)
    }

    /// Check if the subscription is active (including trialing).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.grants_access()
    }

    /// Check if the subscription is in trial.
    #[must_use]
    pub fn is_trialing(&self) -> bool {
        self.status == SubscriptionStatus::Trialing
    }

    /// Check if payment has failed.
    #[must_use]
    pub fn is_past_due(&self) -> bool {
        self.status == SubscriptionStatus::PastDue
    }

    /// Check if the subscription is cancelled or will cancel at period end.
    ///
    /// Informational only: a subscription cancelling at period end keeps its
    /// access until then.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status == SubscriptionStatus::Cancelled || self.cancel_at_period_end
    }

    /// Check if the subscription will cancel at period end.
    #[must_use]
    pub fn will_cancel(&self) -> bool {
        self.cancel_at_period_end
    }

    /// Check if the current period ended before `now`.
    ///
    /// Independent of `status`: a subscription can be `Active` and expired
    /// when renewal has not been processed yet.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.current_period_end < now
    }
}
