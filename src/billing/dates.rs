//! Billing date helpers.

use chrono::{DateTime, Utc};

use super::subscription::Subscription;

const DAY_MS: i64 = 86_400_000;

/// When the subscription next bills: the end of the current period.
#[must_use]
pub fn next_billing_date(sub: &Subscription) -> DateTime<Utc> {
    sub.current_period_end
}

/// Whole days until the next billing date, rounded up.
#[must_use]
pub fn days_until_billing(sub: &Subscription) -> i64 {
    days_until_billing_at(sub, Utc::now())
}

/// Whole days from `now` until the next billing date, rounded up.
///
/// Any part of a day counts as a day, so a period ending in one hour is
/// 1 day away and one that ended an hour ago is 0. The value goes negative
/// once a full day has passed.
#[must_use]
pub fn days_until_billing_at(sub: &Subscription, now: DateTime<Utc>) -> i64 {
    let ms = (sub.current_period_end - now).num_milliseconds();
    -(-ms).div_euclid(DAY_MS)
}

/// Check if billing is at least one full day overdue.
#[must_use]
pub fn is_overdue_at(sub: &Subscription, now: DateTime<Utc>) -> bool {
    days_until_billing_at(sub, now) < 0
}
