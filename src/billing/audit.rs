//! Audit logging for entitlement decisions.
//!
//! Provides a trait-based audit logging system for tracking denials, usage
//! approaching a cap, unknown feature lookups and plan change previews.

use std::fmt;

use super::entitlements::{EntitlementEvaluator, FeatureCheckResult};
use super::error::BillingError;
use super::plan_change::{PlanChangeAnalyzer, PlanChangeImpact};
use super::plans::SubscriptionPlan;
use super::subscription::Subscription;
use super::tier::SubscriptionTier;

/// Audit event types for entitlement checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementAuditEvent {
    /// A feature check was denied.
    AccessDenied {
        profile_id: String,
        feature: String,
        tier: SubscriptionTier,
        reason: String,
    },
    /// A check passed with usage at or above the near-limit threshold.
    UsageNearLimit {
        profile_id: String,
        feature: String,
        used: u64,
        limit: u64,
    },
    /// A feature nobody has heard of was checked.
    UnknownFeature {
        profile_id: String,
        feature: String,
        allowed: bool,
    },
    /// A plan change was previewed.
    PlanChangeAnalyzed {
        profile_id: String,
        from: SubscriptionTier,
        to: SubscriptionTier,
        will_lose_data: bool,
    },
}

impl EntitlementAuditEvent {
    /// Get the event kind as a string for structured logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "access_denied",
            Self::UsageNearLimit { .. } => "usage_near_limit",
            Self::UnknownFeature { .. } => "unknown_feature",
            Self::PlanChangeAnalyzed { .. } => "plan_change_analyzed",
        }
    }
}

impl fmt::Display for EntitlementAuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied { profile_id, feature, tier, reason } => {
                write!(f, "Access denied: profile={}, feature={}, tier={}, reason={}", profile_id, feature, tier.as_str(), reason)
            }
            Self::UsageNearLimit { profile_id, feature, used, limit } => {
                write!(f, "Usage near limit: profile={}, feature={}, used={}, limit={}", profile_id, feature, used, limit)
            }
            Self::UnknownFeature { profile_id, feature, allowed } => {
                write!(f, "Unknown feature: profile={}, feature={}, allowed={}", profile_id, feature, allowed)
            }
            Self::PlanChangeAnalyzed { profile_id, from, to, will_lose_data } => {
                write!(f, "Plan change analyzed: profile={}, from={}, to={}, will_lose_data={}", profile_id, from.as_str(), to.as_str(), will_lose_data)
            }
        }
    }
}

/// Trait for audit logging backends.
///
/// Implement this trait to integrate with your logging system (e.g., database,
/// external service, file-based logging). Implementations must not fail the
/// check they are recording.
pub trait EntitlementAuditLogger: Send + Sync {
    /// Log an entitlement audit event.
    fn log(&self, event: EntitlementAuditEvent);
}

/// No-op audit logger that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditLogger;

impl EntitlementAuditLogger for NoOpAuditLogger {
    fn log(&self, _event: EntitlementAuditEvent) {}
}

/// Tracing-based audit logger.
///
/// Logs audit events using the `tracing` crate at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

impl EntitlementAuditLogger for TracingAuditLogger {
    fn log(&self, event: EntitlementAuditEvent) {
        tracing::info!(
            target: "plangate::audit",
            event_type = %event.kind(),
            "{}", event
        );
    }
}

/// Check a feature and record the decision.
///
/// Denials, unknown features and allowed checks that are near the cap are
/// sent to `logger`.
#[must_use = "feature check result must be used to enforce access control"]
pub fn require_feature<L: EntitlementAuditLogger + ?Sized>(
    evaluator: &EntitlementEvaluator<'_>,
    sub: &Subscription,
    feature: &str,
    logger: &L,
) -> FeatureCheckResult {
    let result = evaluator.check_feature(sub, feature);

    if sub.is_active() && evaluator.is_unknown_feature(feature) {
        logger.log(EntitlementAuditEvent::UnknownFeature {
            profile_id: sub.profile_id.clone(),
            feature: feature.to_string(),
            allowed: result.is_allowed(),
        });
        return result;
    }

    match result {
        FeatureCheckResult::Allowed => {
            if evaluator.is_usage_near_limit_default(sub, feature) {
                if let Some(limit) = evaluator
                    .gates()
                    .lookup(feature, sub.tier)
                    .and_then(|g| g.limit.cap())
                {
                    let used = evaluator
                        .gates()
                        .resource_for(feature)
                        .map_or(0, |r| sub.usage_of(r));
                    logger.log(EntitlementAuditEvent::UsageNearLimit {
                        profile_id: sub.profile_id.clone(),
                        feature: feature.to_string(),
                        used,
                        limit,
                    });
                }
            }
        }
        denied => {
            let reason = match denied {
                FeatureCheckResult::SubscriptionInactive { status } => {
                    format!("subscription {}", status)
                }
                FeatureCheckResult::LimitReached { used, limit } => {
                    format!("limit reached ({}/{})", used, limit)
                }
                _ => "unknown feature".to_string(),
            };
            logger.log(EntitlementAuditEvent::AccessDenied {
                profile_id: sub.profile_id.clone(),
                feature: feature.to_string(),
                tier: sub.tier,
                reason,
            });
        }
    }

    result
}

/// Analyze a plan change and record that it was previewed.
///
/// # Errors
///
/// Returns `BillingError::PlanNotFound` if the subscription's tier has no plan.
pub fn audited_plan_change<L: EntitlementAuditLogger + ?Sized>(
    analyzer: &PlanChangeAnalyzer<'_>,
    sub: &Subscription,
    target: &SubscriptionPlan,
    logger: &L,
) -> Result<PlanChangeImpact, BillingError> {
    let impact = analyzer.analyze_plan_change_impact(sub, target)?;
    logger.log(EntitlementAuditEvent::PlanChangeAnalyzed {
        profile_id: sub.profile_id.clone(),
        from: sub.tier,
        to: target.tier,
        will_lose_data: impact.will_lose_data,
    });
    Ok(impact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::gates::FeatureGateTable;
    use crate::billing::plans::PlanCatalog;
    use crate::billing::resource::{Limit, MeteredResource};
    use crate::billing::settings::EntitlementSettings;
    use crate::billing::subscription::SubscriptionStatus;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    /// Test audit logger that captures events.
    #[derive(Default)]
    struct TestAuditLogger {
        events: Mutex<Vec<EntitlementAuditEvent>>,
    }

    impl TestAuditLogger {
        fn events(&self) -> Vec<EntitlementAuditEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EntitlementAuditLogger for TestAuditLogger {
        fn log(&self, event: EntitlementAuditEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn create_test_catalog() -> PlanCatalog {
        PlanCatalog::builder()
            .plan(SubscriptionTier::Free)
            .features(["campaigns"])
            .limit(MeteredResource::Campaigns, Limit::Capped(5))
            .done()
            .plan(SubscriptionTier::Pro)
            .monthly_price_cents(4900)
            .features(["campaigns"])
            .limit(MeteredResource::Campaigns, Limit::Capped(50))
            .done()
            .build()
            .unwrap()
    }

    fn create_test_gates() -> FeatureGateTable {
        FeatureGateTable::builder()
            .feature("campaigns")
            .resource(MeteredResource::Campaigns)
            .tier(SubscriptionTier::Free, Limit::Capped(5), "Upgrade to add more campaigns")
            .done()
            .build()
            .unwrap()
    }

    fn sub(tier: SubscriptionTier) -> Subscription {
        Subscription::new("prof_1", tier, Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_noop_logger() {
        let logger = NoOpAuditLogger;
        logger.log(EntitlementAuditEvent::UnknownFeature {
            profile_id: "prof_1".to_string(),
            feature: "x".to_string(),
            allowed: true,
        });
        // Just verifies it doesn't panic
    }

    #[test]
    fn test_require_feature_logs_denial() {
        let catalog = create_test_catalog();
        let gates = create_test_gates();
        let settings = EntitlementSettings::default();
        let evaluator = EntitlementEvaluator::new(&catalog, &gates, &settings);
        let logger = TestAuditLogger::default();

        let sub = sub(SubscriptionTier::Free).with_usage(MeteredResource::Campaigns, 5);
        let result = require_feature(&evaluator, &sub, "campaigns", &logger);

        assert!(!result.is_allowed());
        let events = logger.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "access_denied");
        assert_eq!(
            events[0].to_string(),
            "Access denied: profile=prof_1, feature=campaigns, tier=free, reason=limit reached (5/5)"
        );
    }

    #[test]
    fn test_require_feature_logs_inactive() {
        let catalog = create_test_catalog();
        let gates = create_test_gates();
        let settings = EntitlementSettings::default();
        let evaluator = EntitlementEvaluator::new(&catalog, &gates, &settings);
        let logger = TestAuditLogger::default();

        let sub = sub(SubscriptionTier::Pro).with_status(SubscriptionStatus::PastDue);
        let _ = require_feature(&evaluator, &sub, "campaigns", &logger);

        assert!(matches!(
            &logger.events()[0],
            EntitlementAuditEvent::AccessDenied { reason, .. } if reason == "subscription past_due"
        ));
    }

    #[test]
    fn test_require_feature_logs_near_limit() {
        let catalog = create_test_catalog();
        let gates = create_test_gates();
        let settings = EntitlementSettings::default();
        let evaluator = EntitlementEvaluator::new(&catalog, &gates, &settings);
        let logger = TestAuditLogger::default();

        let sub = sub(SubscriptionTier::Free).with_usage(MeteredResource::Campaigns, 4);
        let result = require_feature(&evaluator, &sub, "campaigns", &logger);

        assert!(result.is_allowed());
        assert_eq!(
            logger.events(),
            vec![EntitlementAuditEvent::UsageNearLimit {
                profile_id: "prof_1".to_string(),
                feature: "campaigns".to_string(),
                used: 4,
                limit: 5,
            }]
        );
    }

    #[test]
    fn test_require_feature_quiet_when_comfortable() {
        let catalog = create_test_catalog();
        let gates = create_test_gates();
        let settings = EntitlementSettings::default();
        let evaluator = EntitlementEvaluator::new(&catalog, &gates, &settings);
        let logger = TestAuditLogger::default();

        let free = sub(SubscriptionTier::Free).with_usage(MeteredResource::Campaigns, 1);
        let pro = sub(SubscriptionTier::Pro).with_usage(MeteredResource::Campaigns, 45);
        let _ = require_feature(&evaluator, &free, "campaigns", &logger);
        let _ = require_feature(&evaluator, &pro, "campaigns", &logger);

        assert!(logger.events().is_empty());
    }

    #[test]
    fn test_require_feature_logs_unknown() {
        let catalog = create_test_catalog();
        let gates = create_test_gates();
        let settings = EntitlementSettings::default();
        let evaluator = EntitlementEvaluator::new(&catalog, &gates, &settings);
        let logger = TestAuditLogger::default();

        let result = require_feature(&evaluator, &sub(SubscriptionTier::Free), "campains", &logger);

        assert!(result.is_allowed());
        assert_eq!(logger.events()[0].kind(), "unknown_feature");
    }

    #[test]
    fn test_audited_plan_change() {
        let catalog = create_test_catalog();
        let gates = create_test_gates();
        let analyzer = PlanChangeAnalyzer::new(&catalog, &gates);
        let logger = TestAuditLogger::default();

        let sub = sub(SubscriptionTier::Pro).with_usage(MeteredResource::Campaigns, 20);
        let free = catalog.get_plan_by_tier(SubscriptionTier::Free).unwrap();
        let impact = audited_plan_change(&analyzer, &sub, free, &logger).unwrap();

        assert!(impact.will_lose_data);
        assert_eq!(
            logger.events(),
            vec![EntitlementAuditEvent::PlanChangeAnalyzed {
                profile_id: "prof_1".to_string(),
                from: SubscriptionTier::Pro,
                to: SubscriptionTier::Free,
                will_lose_data: true,
            }]
        );
    }

    #[test]
    fn test_tracing_logger() {
        let logger = TracingAuditLogger;
        logger.log(EntitlementAuditEvent::PlanChangeAnalyzed {
            profile_id: "prof_1".to_string(),
            from: SubscriptionTier::Pro,
            to: SubscriptionTier::Free,
            will_lose_data: false,
        });
    }
}
