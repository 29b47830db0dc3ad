use crate::config::CoreConfig;
use crate::engine::{odds, validate};
use crate::error::CoreError;
use crate::events::{DomainEvent, EventSink};
use crate::models::{Bet, BetStatus, BetType, Game, GameStatus, Selection};
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PlaceBetRequest {
    pub user_id: String,
    pub game_id: String,
    pub bet_type: BetType,
    pub selection: Selection,
    pub stake: i64,
    pub odds: i32,
}

/// Places and cancels wagers. Validation and the funds check happen here; the
/// bet insert + stake debit + ledger entry are one atomic store operation, so
/// a crash between them is never observable as committed partial state.
#[derive(Clone)]
pub struct BetService {
    store: Arc<dyn Store>,
    config: CoreConfig,
    events: EventSink,
}

impl BetService {
    pub fn new(store: Arc<dyn Store>, config: CoreConfig, events: EventSink) -> Self {
        Self {
            store,
            config,
            events,
        }
    }

    pub async fn place_bet(&self, req: PlaceBetRequest) -> Result<Bet, CoreError> {
        let game = self
            .store
            .get_game(&req.game_id)
            .await?
            .ok_or_else(|| CoreError::GameNotFound(req.game_id.clone()))?;

        // Pre-check so the common rejection is cheap and carries the numbers;
        // the store re-checks inside the placement transaction.
        let balance = self.store.get_bankroll(&req.user_id).await?.balance;
        let pending = self.store.pending_stake_total(&req.user_id).await?;
        let available = balance - pending;
        if available < req.stake {
            return Err(CoreError::InsufficientFunds {
                available,
                stake: req.stake,
            });
        }

        validate::validate_bet(
            req.bet_type,
            &req.selection,
            req.stake,
            &game,
            self.config.min_stake_cents,
        )?;

        let potential_win = odds::potential_win(req.stake, req.odds)?;
        let now = Utc::now();
        let bet = Bet {
            id: String::new(), // assigned by the store
            user_id: req.user_id.clone(),
            game_id: req.game_id.clone(),
            bet_type: req.bet_type,
            selection: req.selection.clone(),
            stake: req.stake,
            odds: req.odds,
            potential_win,
            status: BetStatus::Pending,
            actual_win: None,
            created_at: now,
            settled_at: None,
            expires_at: Some(game.commence_time),
            is_tail: false,
            is_fade: false,
            original_pick_id: None,
            archived: false,
        };

        let bet = self.store.place_bet(bet).await?;
        tracing::info!(
            bet_id = %bet.id,
            user_id = %bet.user_id,
            game_id = %bet.game_id,
            stake = bet.stake,
            odds = bet.odds,
            potential_win = bet.potential_win,
            "bet placed"
        );
        self.events.emit(DomainEvent::BetPlaced {
            bet_id: bet.id.clone(),
            user_id: bet.user_id.clone(),
            game_id: bet.game_id.clone(),
            stake: bet.stake,
        });
        Ok(bet)
    }

    /// The user's open wagers, oldest first.
    pub async fn open_bets(&self, user_id: &str) -> Result<Vec<Bet>, CoreError> {
        self.store.pending_bets_for_user(user_id).await
    }

    /// Soft-archive a settled bet off the user's visible history. Bets are
    /// never deleted.
    pub async fn archive_bet(&self, user_id: &str, bet_id: &str) -> Result<(), CoreError> {
        let bet = self
            .store
            .get_bet(bet_id)
            .await?
            .filter(|b| b.user_id == user_id)
            .ok_or_else(|| CoreError::OriginalBetNotFound(bet_id.to_string()))?;
        self.store.archive_bet(&bet.id).await
    }

    /// Cancel a pending bet before its game starts, refunding the stake
    /// atomically with the status flip.
    pub async fn cancel_bet(&self, user_id: &str, bet_id: &str) -> Result<Bet, CoreError> {
        self.cancel_bet_at(user_id, bet_id, Utc::now()).await
    }

    pub async fn cancel_bet_at(
        &self,
        user_id: &str,
        bet_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Bet, CoreError> {
        let bet = self
            .store
            .get_bet(bet_id)
            .await?
            .filter(|b| b.user_id == user_id)
            .ok_or_else(|| CoreError::OriginalBetNotFound(bet_id.to_string()))?;

        if bet.status != BetStatus::Pending {
            // Settled or already cancelled; nothing to undo.
            return Err(CoreError::GameStarted);
        }

        let game = self
            .store
            .get_game(&bet.game_id)
            .await?
            .ok_or_else(|| CoreError::GameNotFound(bet.game_id.clone()))?;
        if game_underway(&game, now) {
            return Err(CoreError::GameStarted);
        }

        match self.store.cancel_bet(bet_id).await? {
            Some(cancelled) => {
                tracing::info!(
                    bet_id = %cancelled.id,
                    user_id = %user_id,
                    refund = cancelled.stake,
                    "bet cancelled"
                );
                Ok(cancelled)
            }
            // Lost the race with settlement; the bet reached a terminal state
            // between our read and the store's CAS.
            None => Err(CoreError::GameStarted),
        }
    }
}

fn game_underway(game: &Game, now: DateTime<Utc>) -> bool {
    game.status != GameStatus::Scheduled || game.has_started(now)
}
