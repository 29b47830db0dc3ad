pub mod memory;

use crate::engine::BetOutcome;
use crate::error::CoreError;
use crate::models::{Bankroll, Bet, Game, PickAction, PickActionKind, TxnReason};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;

/// Result of a compare-and-set settlement attempt. A bet leaves `Pending`
/// exactly once; concurrent or repeated settlement observes `AlreadySettled`.
#[derive(Debug, Clone)]
pub enum SettleAttempt {
    Settled(Bet),
    AlreadySettled,
}

/// The narrow persistence contract the core sits on. Every method is a
/// suspension point; the composite operations (`place_bet`, `cancel_bet`,
/// `settle_bet`, `apply_delta`, `weekly_reset`) are each a single atomic
/// boundary at the backing store — the serialization guarantees of the
/// bankroll row live here, not in the services.
#[async_trait]
pub trait Store: Send + Sync {
    // -- games --
    async fn get_game(&self, id: &str) -> Result<Option<Game>, CoreError>;
    async fn upsert_game(&self, game: Game) -> Result<(), CoreError>;
    /// Record final scores and flip the game to completed. Idempotent: a
    /// repeat call with the same scores is a no-op at the game level.
    async fn complete_game(
        &self,
        id: &str,
        home_score: u32,
        away_score: u32,
    ) -> Result<Game, CoreError>;

    // -- bets --
    async fn get_bet(&self, id: &str) -> Result<Option<Bet>, CoreError>;
    async fn pending_bets_for_game(&self, game_id: &str) -> Result<Vec<Bet>, CoreError>;
    async fn pending_bets_for_user(&self, user_id: &str) -> Result<Vec<Bet>, CoreError>;
    /// Sum of stakes of the user's pending bets, for the available-balance
    /// computation.
    async fn pending_stake_total(&self, user_id: &str) -> Result<i64, CoreError>;
    /// Tag a freshly placed bet as a tail or fade of another bet. Non-monetary
    /// second update after placement.
    async fn mark_pick_link(
        &self,
        bet_id: &str,
        kind: PickActionKind,
        original_pick_id: &str,
    ) -> Result<(), CoreError>;
    /// Soft archive. Bets are never deleted.
    async fn archive_bet(&self, bet_id: &str) -> Result<(), CoreError>;

    // -- transactional boundaries --
    /// Insert the bet, debit the stake, and append the ledger entry in one
    /// transaction. Assigns the bet id. Re-checks available balance inside
    /// the critical section so concurrent placements cannot both pass a
    /// stale insufficient-funds check.
    async fn place_bet(&self, bet: Bet) -> Result<Bet, CoreError>;
    /// Flip a pending bet to cancelled and refund the stake atomically.
    /// Returns None when the bet was not pending (nothing changed).
    async fn cancel_bet(&self, bet_id: &str) -> Result<Option<Bet>, CoreError>;
    /// Settle one bet: CAS the status out of `Pending`, set `actual_win`,
    /// credit the bankroll, append the ledger entry, and bump the win/loss/
    /// push aggregates — all in one transaction, exactly once.
    async fn settle_bet(
        &self,
        bet_id: &str,
        outcome: BetOutcome,
        now: DateTime<Utc>,
    ) -> Result<SettleAttempt, CoreError>;

    // -- bankroll --
    async fn create_bankroll(&self, user_id: &str, deposit: i64) -> Result<Bankroll, CoreError>;
    async fn get_bankroll(&self, user_id: &str) -> Result<Bankroll, CoreError>;
    /// The sole free-form balance mutation: one conditional update that fails
    /// `WouldGoNegative` rather than overdrawing, paired with its ledger entry.
    async fn apply_delta(
        &self,
        user_id: &str,
        delta: i64,
        reason: TxnReason,
        bet_id: Option<&str>,
    ) -> Result<i64, CoreError>;
    async fn add_referral_bonus(&self, user_id: &str, amount: i64) -> Result<(), CoreError>;
    /// Reset the balance to `baseline` unless a reset already happened at or
    /// after `period_start`. Returns false on the no-op path.
    async fn weekly_reset(
        &self,
        user_id: &str,
        baseline: i64,
        period_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError>;

    // -- pick actions --
    async fn pick_action_exists(&self, post_id: &str, user_id: &str) -> Result<bool, CoreError>;
    /// Fails `AlreadyActioned` on a duplicate (post, user) pair.
    async fn insert_pick_action(&self, action: PickAction) -> Result<(), CoreError>;
}
