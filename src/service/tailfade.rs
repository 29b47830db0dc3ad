use crate::engine::odds;
use crate::error::CoreError;
use crate::events::{DomainEvent, EventSink};
use crate::models::{Bet, PickAction, PickActionKind};
use crate::service::placement::{BetService, PlaceBetRequest};
use crate::store::Store;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TailFadeRequest {
    pub original_bet_id: String,
    pub post_id: String,
    pub user_id: String,
    /// Chosen by the acting user; independent of the original stake.
    pub stake: i64,
}

/// Result of a tail or fade. `link_recorded` is false when the bet was placed
/// but the bookkeeping behind it (linkage or pick action) could not be
/// written — money has moved, so that inconsistency is reported rather than
/// rolled back.
#[derive(Debug, Clone)]
pub struct TailFadeOutcome {
    pub bet: Bet,
    pub action: PickActionKind,
    pub link_recorded: bool,
}

/// Copies (tail) or inverts (fade) an existing pick for another user, built
/// on top of `BetService` — no ledger logic of its own.
#[derive(Clone)]
pub struct TailFadeService {
    store: Arc<dyn Store>,
    bets: BetService,
    events: EventSink,
}

impl TailFadeService {
    pub fn new(store: Arc<dyn Store>, bets: BetService, events: EventSink) -> Self {
        Self {
            store,
            bets,
            events,
        }
    }

    /// Copy the original bet verbatim: same selection, same odds, own stake.
    pub async fn tail(&self, req: TailFadeRequest) -> Result<TailFadeOutcome, CoreError> {
        self.act(req, PickActionKind::Tail).await
    }

    /// Bet the opposite side of the original's market at that side's own
    /// quoted line and odds.
    pub async fn fade(&self, req: TailFadeRequest) -> Result<TailFadeOutcome, CoreError> {
        self.act(req, PickActionKind::Fade).await
    }

    async fn act(
        &self,
        req: TailFadeRequest,
        action: PickActionKind,
    ) -> Result<TailFadeOutcome, CoreError> {
        // One action per (post, user), checked before placing anything so a
        // duplicate costs nothing.
        if self
            .store
            .pick_action_exists(&req.post_id, &req.user_id)
            .await?
        {
            return Err(CoreError::AlreadyActioned);
        }

        let original = self
            .store
            .get_bet(&req.original_bet_id)
            .await?
            .ok_or_else(|| CoreError::OriginalBetNotFound(req.original_bet_id.clone()))?;
        let game = match self.store.get_game(&original.game_id).await? {
            Some(game) => game,
            None => {
                // The game id came off a stored bet, so this is referential
                // breakage, not user error.
                tracing::warn!(
                    bet_id = %original.id,
                    game_id = %original.game_id,
                    "stored bet references a missing game"
                );
                return Err(CoreError::GameNotFound(original.game_id.clone()));
            }
        };

        let (selection, odds) = match action {
            PickActionKind::Tail => (original.selection.clone(), original.odds),
            PickActionKind::Fade => odds::invert_selection(&original, &game)?,
        };

        let bet = self
            .bets
            .place_bet(PlaceBetRequest {
                user_id: req.user_id.clone(),
                game_id: original.game_id.clone(),
                bet_type: original.bet_type,
                selection,
                stake: req.stake,
                odds,
            })
            .await?;

        // From here on the money has moved; bookkeeping failures are logged
        // and surfaced via `link_recorded`, never rolled back.
        let mut link_recorded = true;
        if let Err(err) = self
            .store
            .mark_pick_link(&bet.id, action, &req.original_bet_id)
            .await
        {
            link_recorded = false;
            tracing::error!(
                bet_id = %bet.id,
                original_bet_id = %req.original_bet_id,
                error = %err,
                "placed bet could not be linked to its original pick"
            );
        }

        if let Err(err) = self
            .store
            .insert_pick_action(PickAction {
                post_id: req.post_id.clone(),
                user_id: req.user_id.clone(),
                action,
                resulting_bet_id: bet.id.clone(),
                created_at: Utc::now(),
            })
            .await
        {
            link_recorded = false;
            tracing::error!(
                post_id = %req.post_id,
                user_id = %req.user_id,
                bet_id = %bet.id,
                error = %err,
                "pick action insert failed after bet placement"
            );
        }

        tracing::info!(
            bet_id = %bet.id,
            post_id = %req.post_id,
            user_id = %req.user_id,
            action = ?action,
            stake = req.stake,
            "pick actioned"
        );
        self.events.emit(DomainEvent::TailFadeChanged {
            post_id: req.post_id,
            user_id: req.user_id,
            action,
            bet_id: bet.id.clone(),
        });

        // Re-read so the returned bet carries the linkage flags.
        let bet = self.store.get_bet(&bet.id).await?.unwrap_or(bet);
        Ok(TailFadeOutcome {
            bet,
            action,
            link_recorded,
        })
    }
}
