//! Payout Evaluation
//!
//! Pure decision logic for the recurring payout: given a currency snapshot
//! and the wall-clock minute-of-hour, decide whether this tick pays out and
//! what deltas to apply. No clock access and no store access happen here,
//! which is what keeps the interval/modulo arithmetic testable minute by
//! minute.

use crate::domain::currency::Currency;

/// The bulk adjustments one due currency produces on a tick.
///
/// The plan is executed as one bulk adjust for the base (no group filter)
/// followed by one bulk adjust per bonus entry (with group filter). Group
/// membership and the online set are resolved by the store, so a user in two
/// bonus groups is touched by three independent calls and ends up with
/// `base + bonus[g1] + bonus[g2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutPlan {
    pub currency_id: String,
    /// Credited to every online user.
    pub base: i64,
    /// Group name and extra amount, sorted by group for a stable apply order.
    pub bonuses: Vec<(String, i64)>,
}

/// Decides whether `currency` pays out at `minute_of_hour`.
///
/// Returns a plan only when the currency is active, its interval is a
/// positive number of minutes, and the minute lands on the interval grid.
/// A zero or negative interval is invalid configuration and is treated as
/// never due.
pub fn evaluate(currency: &Currency, minute_of_hour: u32) -> Option<PayoutPlan> {
    if !currency.active {
        return None;
    }
    if currency.interval <= 0 {
        return None;
    }
    if i64::from(minute_of_hour) % currency.interval != 0 {
        return None;
    }

    let mut bonuses: Vec<(String, i64)> = currency
        .bonus
        .iter()
        .map(|(group, amount)| (group.clone(), *amount))
        .collect();
    bonuses.sort_by(|a, b| a.0.cmp(&b.0));

    Some(PayoutPlan {
        currency_id: currency.id.clone(),
        base: currency.payout,
        bonuses,
    })
}
