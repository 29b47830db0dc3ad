use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::models::{Bankroll, TxnReason};
use crate::store::Store;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use std::sync::Arc;

/// The single source of truth for a user's virtual balance. Everything that
/// moves money in §placement/settlement goes through the store's
/// `apply_delta`, which this service fronts; reads and the weekly reset
/// policy live here.
#[derive(Clone)]
pub struct BankrollLedger {
    store: Arc<dyn Store>,
    config: CoreConfig,
}

impl BankrollLedger {
    pub fn new(store: Arc<dyn Store>, config: CoreConfig) -> Self {
        Self { store, config }
    }

    /// Create the bankroll at account creation, funded with the weekly
    /// deposit. Idempotent for an existing user.
    pub async fn open_account(&self, user_id: &str) -> Result<Bankroll, CoreError> {
        self.store
            .create_bankroll(user_id, self.config.weekly_deposit_cents)
            .await
    }

    pub async fn get_balance(&self, user_id: &str) -> Result<i64, CoreError> {
        Ok(self.store.get_bankroll(user_id).await?.balance)
    }

    /// Balance minus the stakes of the user's pending bets.
    pub async fn get_available(&self, user_id: &str) -> Result<i64, CoreError> {
        let balance = self.store.get_bankroll(user_id).await?.balance;
        let pending = self.store.pending_stake_total(user_id).await?;
        Ok(balance - pending)
    }

    pub async fn get_bankroll(&self, user_id: &str) -> Result<Bankroll, CoreError> {
        self.store.get_bankroll(user_id).await
    }

    /// Apply a signed balance change with its audit entry. Fails
    /// `WouldGoNegative` instead of overdrawing.
    pub async fn apply_delta(
        &self,
        user_id: &str,
        delta: i64,
        reason: TxnReason,
        bet_id: Option<&str>,
    ) -> Result<i64, CoreError> {
        let balance = self.store.apply_delta(user_id, delta, reason, bet_id).await?;
        tracing::debug!(
            user_id = %user_id,
            delta = delta,
            balance = balance,
            reason = ?reason,
            "bankroll delta applied"
        );
        Ok(balance)
    }

    /// Accrue a referral bonus; it pays out as part of the next weekly reset
    /// baseline.
    pub async fn add_referral_bonus(&self, user_id: &str) -> Result<(), CoreError> {
        self.store
            .add_referral_bonus(user_id, self.config.referral_bonus_cents)
            .await
    }

    /// Reset the balance to the weekly deposit plus any accrued referral
    /// bonus. At most once per reset period (Monday 00:00 UTC); a second call
    /// within the same period is a no-op.
    pub async fn weekly_reset(&self, user_id: &str) -> Result<bool, CoreError> {
        self.weekly_reset_at(user_id, Utc::now()).await
    }

    pub async fn weekly_reset_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let period_start = week_start(now);
        let did_reset = self
            .store
            .weekly_reset(user_id, self.config.weekly_deposit_cents, period_start, now)
            .await?;
        if did_reset {
            tracing::info!(user_id = %user_id, period_start = %period_start, "weekly bankroll reset");
        }
        Ok(did_reset)
    }
}

/// Monday 00:00 UTC of the week containing `now`.
fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = now.weekday().num_days_from_monday() as i64;
    let monday = now.date_naive() - Duration::days(days_from_monday);
    Utc.from_utc_datetime(&monday.and_hms_opt(0, 0, 0).expect("midnight exists"))
}
