//! Billing-specific error types.
//!
//! Evaluation itself never fails for well-typed input. These errors come from
//! the edges: parsing tiers and statuses from strings, validating feature ids,
//! and checking catalog and gate-table invariants at startup.

use std::fmt;

use super::tier::SubscriptionTier;

/// Billing-specific errors.
///
/// These can be converted to [`PlangateError`](crate::PlangateError) for
/// callers that want a single error type.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingError {
    // Parse errors
    /// The tier string is not one of the known tiers.
    InvalidTier { value: String },
    /// The status string is not one of the known statuses.
    InvalidStatus { value: String },
    /// The metered resource name is not known.
    InvalidResource { value: String },
    /// The feature identifier is malformed.
    InvalidFeatureId { id: String, reason: String },
    /// A raw limit value is neither `-1` nor a non-negative integer.
    InvalidLimit { value: i64 },

    // Catalog errors
    /// No plan is configured for the tier.
    PlanNotFound { tier: SubscriptionTier },
    /// The plan catalog breaks one of its ordering invariants.
    CatalogInvariant { tier: SubscriptionTier, reason: String },
    /// The feature gate table is inconsistent.
    GateInvariant { feature: String, reason: String },

    // Settings errors
    /// The near-limit threshold is outside `(0, 100]`.
    InvalidThreshold { value: f64 },
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTier { value } => {
                write!(f, "Unknown subscription tier '{}'", value)
            }
            Self::InvalidStatus { value } => {
                write!(f, "Unknown subscription status '{}'", value)
            }
            Self::InvalidResource { value } => {
                write!(f, "Unknown metered resource '{}'", value)
            }
            Self::InvalidFeatureId { id, reason } => {
                write!(f, "Invalid feature ID '{}': {}", id, reason)
            }
            Self::InvalidLimit { value } => {
                write!(f, "Invalid limit {}: expected -1 (unlimited) or a non-negative cap", value)
            }
            Self::PlanNotFound { tier } => {
                write!(f, "No plan configured for tier '{}'", tier.as_str())
            }
            Self::CatalogInvariant { tier, reason } => {
                write!(f, "Plan catalog invalid at tier '{}': {}", tier.as_str(), reason)
            }
            Self::GateInvariant { feature, reason } => {
                write!(f, "Feature gate '{}' invalid: {}", feature, reason)
            }
            Self::InvalidThreshold { value } => {
                write!(f, "Near-limit threshold {} must be in (0, 100]", value)
            }
        }
    }
}

impl std::error::Error for BillingError {}

impl BillingError {
    /// Check if this error points at bad static configuration.
    ///
    /// These should surface at startup, never while serving requests.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::PlanNotFound { .. }
                | Self::CatalogInvariant { .. }
                | Self::GateInvariant { .. }
                | Self::InvalidThreshold { .. }
        )
    }

    /// Check if this error was caused by malformed input from a caller.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTier { .. }
                | Self::InvalidStatus { .. }
                | Self::InvalidResource { .. }
                | Self::InvalidFeatureId { .. }
                | Self::InvalidLimit { .. }
        )
    }
}
