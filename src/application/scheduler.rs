//! Payout Scheduler
//!
//! Drives the recurring payout: aligns the first tick to the next
//! top-of-minute boundary, then ticks every minute and evaluates every
//! known currency against the current minute-of-hour. The scheduler owns
//! its timer task; `start` and `stop` are instance methods and restarting
//! always tears down the previous schedule first.

use chrono::{Local, Timelike, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::payout::{self, PayoutPlan};
use crate::ports::ledger::{LedgerError, LedgerPort};

/// Minute-aligned recurring payout driver.
pub struct PayoutScheduler {
    ledger: Arc<dyn LedgerPort>,
    tick_period: Duration,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    /// Currencies whose payout from a previous tick is still in flight.
    /// A later tick never runs the same currency in parallel; it skips it.
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl PayoutScheduler {
    pub fn new(ledger: Arc<dyn LedgerPort>) -> Self {
        Self {
            ledger,
            tick_period: Duration::from_secs(60),
            task: tokio::sync::Mutex::new(None),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Set a custom tick period. Alignment generalizes to the next
    /// wall-clock multiple of the period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Starts the recurring tick. The first tick fires at the next
    /// wall-clock boundary of the tick period; any already-running
    /// schedule is fully stopped first, so two `start` calls leave
    /// exactly one active ticker.
    pub async fn start(&self) {
        self.stop().await;

        let ledger = Arc::clone(&self.ledger);
        let in_flight = Arc::clone(&self.in_flight);
        let period = self.tick_period;

        let handle = tokio::spawn(async move {
            let delay = delay_until_boundary(period);
            tracing::debug!(
                delay_ms = delay.as_millis() as u64,
                "payout timer waiting for the next boundary"
            );
            tokio::time::sleep(delay).await;

            tracing::debug!("payout timer started");
            let mut ticker = tokio::time::interval(period);
            // Never burst after a delayed tick: a stalled store must not
            // cause two evaluation passes inside the same minute.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                // The local minute, not UTC: in half-hour-offset timezones
                // the interval grid must follow the local top of hour.
                let minute = Local::now().minute();
                run_tick(&ledger, &in_flight, minute).await;
            }
        });

        *self.task.lock().await = Some(handle);
    }

    /// Cancels the pending alignment delay and the recurring tick.
    /// Evaluations already spawned by an earlier tick run to completion;
    /// no new tick fires. A no-op when not running.
    pub async fn stop(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
            tracing::debug!("payout timer stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }

    /// Runs one evaluation pass as if the timer had fired at the given
    /// minute-of-hour. The timer loop calls this on every tick.
    pub async fn run_tick(&self, minute_of_hour: u32) {
        run_tick(&self.ledger, &self.in_flight, minute_of_hour).await;
    }
}

/// Remaining time until the wall clock next lands on a multiple of
/// `period` (measured on the epoch grid, so a 60s period means the next
/// top of minute).
fn delay_until_boundary(period: Duration) -> Duration {
    let period_ms = (period.as_millis() as i64).max(1);
    let now_ms = Utc::now().timestamp_millis();
    let rem = now_ms.rem_euclid(period_ms);
    Duration::from_millis((period_ms - rem) as u64)
}

/// One evaluation pass over every known currency. Per-currency failures
/// are logged and isolated; a store error reading the definitions skips
/// the whole tick.
async fn run_tick(
    ledger: &Arc<dyn LedgerPort>,
    in_flight: &Arc<Mutex<HashSet<String>>>,
    minute_of_hour: u32,
) {
    let currencies = match ledger.currencies().await {
        Ok(currencies) => currencies,
        Err(e) => {
            tracing::error!(error = %e, "could not read currency definitions, skipping tick");
            return;
        }
    };

    tracing::debug!(
        minute = minute_of_hour,
        currencies = currencies.len(),
        "running currency payout tick"
    );

    for currency in currencies.into_values() {
        let Some(plan) = payout::evaluate(&currency, minute_of_hour) else {
            tracing::debug!(currency = %currency, "not due this minute or inactive");
            continue;
        };

        let claimed = in_flight.lock().unwrap().insert(currency.id.clone());
        if !claimed {
            tracing::warn!(
                currency_id = %currency.id,
                "previous payout still in flight, skipping this tick"
            );
            continue;
        }

        let ledger = Arc::clone(ledger);
        let in_flight = Arc::clone(in_flight);
        tokio::spawn(async move {
            match apply_plan(ledger.as_ref(), &plan).await {
                Ok(()) => tracing::debug!(
                    currency_id = %plan.currency_id,
                    base = plan.base,
                    bonuses = plan.bonuses.len(),
                    "paid out currency"
                ),
                Err(e) => tracing::error!(
                    currency_id = %plan.currency_id,
                    error = %e,
                    "payout failed, no payout this tick"
                ),
            }
            in_flight.lock().unwrap().remove(&plan.currency_id);
        });
    }
}

/// One bulk adjust for the base amount, then one per bonus group. The
/// store resolves the online set and group membership, so a user in two
/// bonus groups is touched by three independent calls.
async fn apply_plan(ledger: &dyn LedgerPort, plan: &PayoutPlan) -> Result<(), LedgerError> {
    ledger
        .bulk_adjust_online(&plan.currency_id, plan.base, None)
        .await?;
    for (group, amount) in &plan.bonuses {
        ledger
            .bulk_adjust_online(&plan.currency_id, *amount, Some(group))
            .await?;
    }
    Ok(())
}
