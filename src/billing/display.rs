//! Presentation helpers for billing pages.
//!
//! Kept apart from the evaluator so UI wording and colour tokens can change
//! without touching entitlement decisions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::plans::format_cents;
use super::resource::Limit;
use super::subscription::SubscriptionStatus;

/// Format a billing date as e.g. "October 17, 2026".
#[must_use]
pub fn format_billing_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Colour token for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Blue,
    Yellow,
    Red,
    Gray,
}

impl StatusColor {
    /// The token string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Gray => "gray",
        }
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Badge colour for a status.
#[must_use]
pub fn status_color(status: SubscriptionStatus) -> StatusColor {
    match status {
        SubscriptionStatus::Active => StatusColor::Green,
        SubscriptionStatus::Trialing => StatusColor::Blue,
        SubscriptionStatus::PastDue => StatusColor::Yellow,
        SubscriptionStatus::Cancelled => StatusColor::Red,
        SubscriptionStatus::Incomplete => StatusColor::Gray,
    }
}

/// Human-readable status label.
#[must_use]
pub fn status_text(status: SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Active => "Active",
        SubscriptionStatus::Trialing => "Trial",
        SubscriptionStatus::PastDue => "Past Due",
        SubscriptionStatus::Cancelled => "Cancelled",
        SubscriptionStatus::Incomplete => "Incomplete",
    }
}

/// Format a limit for a pricing table ("Unlimited" or the number).
#[must_use]
pub fn format_limit(limit: Limit) -> String {
    match limit {
        Limit::Unlimited => "Unlimited".to_string(),
        Limit::Capped(n) => n.to_string(),
    }
}

/// Format a monthly price difference with an explicit sign ("+$49.00/mo").
#[must_use]
pub fn format_price_difference(cents: i64, currency: &str) -> String {
    let sign = if cents > 0 { "+" } else { "" };
    format!("{}{}/mo", sign, format_cents(cents, currency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_billing_date() {
        let date = Utc.with_ymd_and_hms(2026, 10, 7, 15, 30, 0).unwrap();
        assert_eq!(format_billing_date(date), "October 7, 2026");

        let date = Utc.with_ymd_and_hms(2027, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(format_billing_date(date), "January 31, 2027");
    }

    #[test]
    fn test_status_color_and_text() {
        assert_eq!(status_color(SubscriptionStatus::Active).as_str(), "green");
        assert_eq!(status_color(SubscriptionStatus::Trialing).as_str(), "blue");
        assert_eq!(status_color(SubscriptionStatus::PastDue).as_str(), "yellow");
        assert_eq!(status_color(SubscriptionStatus::Cancelled).as_str(), "red");
        assert_eq!(status_color(SubscriptionStatus::Incomplete).as_str(), "gray");

        assert_eq!(status_text(SubscriptionStatus::Trialing), "Trial");
        assert_eq!(status_text(SubscriptionStatus::PastDue), "Past Due");
    }

    #[test]
    fn test_format_limit() {
        assert_eq!(format_limit(Limit::Unlimited), "Unlimited");
        assert_eq!(format_limit(Limit::Capped(5)), "5");
    }

    #[test]
    fn test_format_price_difference() {
        assert_eq!(format_price_difference(4900, "usd"), "+$49.00/mo");
        assert_eq!(format_price_difference(-15000, "usd"), "-$150.00/mo");
        assert_eq!(format_price_difference(0, "gbp"), "£0.00/mo");
    }
}
