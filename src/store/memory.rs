use super::{SettleAttempt, Store};
use crate::engine::BetOutcome;
use crate::error::CoreError;
use crate::models::{
    Bankroll, Bet, BetStatus, Game, GameStatus, LedgerEntry, PickAction, PickActionKind, TxnReason,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

const DEFAULT_LOG_CAPACITY: usize = 50;

/// In-process `Store`. All state sits behind one async mutex, so every trait
/// method is a single critical section — the same atomicity the production
/// backend provides with row locks and stored procedures. Used as the test
/// double and for demos.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    log_capacity: usize,
}

struct Inner {
    games: HashMap<String, Game>,
    bets: HashMap<String, Bet>,
    bankrolls: HashMap<String, Bankroll>,
    pick_actions: HashMap<(String, String), PickAction>,
    next_bet_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_log_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(log_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                games: HashMap::new(),
                bets: HashMap::new(),
                bankrolls: HashMap::new(),
                pick_actions: HashMap::new(),
                next_bet_id: 0,
            }),
            log_capacity,
        }
    }
}

impl Inner {
    fn bankroll_mut(&mut self, user_id: &str) -> Result<&mut Bankroll, CoreError> {
        self.bankrolls
            .get_mut(user_id)
            .ok_or_else(|| CoreError::Unknown(anyhow!("no bankroll for user {}", user_id)))
    }

    fn pending_stake(&self, user_id: &str) -> i64 {
        self.bets
            .values()
            .filter(|b| b.user_id == user_id && b.status == BetStatus::Pending)
            .map(|b| b.stake)
            .sum()
    }

    /// The one place a balance moves. Guards against overdraw, appends the
    /// paired ledger entry (most-recent-first, bounded), and tracks the
    /// season high/low water marks.
    fn mutate_balance(
        &mut self,
        user_id: &str,
        delta: i64,
        reason: TxnReason,
        bet_id: Option<&str>,
        now: DateTime<Utc>,
        log_capacity: usize,
    ) -> Result<i64, CoreError> {
        let bankroll = self.bankroll_mut(user_id)?;
        let new_balance = bankroll.balance + delta;
        if new_balance < 0 {
            return Err(CoreError::WouldGoNegative {
                balance: bankroll.balance,
                delta,
            });
        }
        bankroll.balance = new_balance;
        bankroll.season_high = bankroll.season_high.max(new_balance);
        bankroll.season_low = bankroll.season_low.min(new_balance);
        bankroll.transactions.push_front(LedgerEntry {
            delta,
            balance_after: new_balance,
            reason,
            bet_id: bet_id.map(str::to_string),
            created_at: now,
            detail: None,
        });
        bankroll.transactions.truncate(log_capacity);
        Ok(new_balance)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_game(&self, id: &str) -> Result<Option<Game>, CoreError> {
        Ok(self.inner.lock().await.games.get(id).cloned())
    }

    async fn upsert_game(&self, game: Game) -> Result<(), CoreError> {
        self.inner.lock().await.games.insert(game.id.clone(), game);
        Ok(())
    }

    async fn complete_game(
        &self,
        id: &str,
        home_score: u32,
        away_score: u32,
    ) -> Result<Game, CoreError> {
        let mut inner = self.inner.lock().await;
        let game = inner
            .games
            .get_mut(id)
            .ok_or_else(|| CoreError::GameNotFound(id.to_string()))?;
        if game.status != GameStatus::Completed {
            game.status = GameStatus::Completed;
            game.home_score = Some(home_score);
            game.away_score = Some(away_score);
        }
        Ok(game.clone())
    }

    async fn get_bet(&self, id: &str) -> Result<Option<Bet>, CoreError> {
        Ok(self.inner.lock().await.bets.get(id).cloned())
    }

    async fn pending_bets_for_game(&self, game_id: &str) -> Result<Vec<Bet>, CoreError> {
        let inner = self.inner.lock().await;
        let mut bets: Vec<Bet> = inner
            .bets
            .values()
            .filter(|b| b.game_id == game_id && b.status == BetStatus::Pending)
            .cloned()
            .collect();
        bets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(bets)
    }

    async fn pending_bets_for_user(&self, user_id: &str) -> Result<Vec<Bet>, CoreError> {
        let inner = self.inner.lock().await;
        let mut bets: Vec<Bet> = inner
            .bets
            .values()
            .filter(|b| b.user_id == user_id && b.status == BetStatus::Pending)
            .cloned()
            .collect();
        bets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(bets)
    }

    async fn pending_stake_total(&self, user_id: &str) -> Result<i64, CoreError> {
        Ok(self.inner.lock().await.pending_stake(user_id))
    }

    async fn mark_pick_link(
        &self,
        bet_id: &str,
        kind: PickActionKind,
        original_pick_id: &str,
    ) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().await;
        let bet = inner
            .bets
            .get_mut(bet_id)
            .ok_or_else(|| CoreError::Unknown(anyhow!("no bet {} to link", bet_id)))?;
        match kind {
            PickActionKind::Tail => bet.is_tail = true,
            PickActionKind::Fade => bet.is_fade = true,
        }
        bet.original_pick_id = Some(original_pick_id.to_string());
        Ok(())
    }

    async fn archive_bet(&self, bet_id: &str) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().await;
        let bet = inner
            .bets
            .get_mut(bet_id)
            .ok_or_else(|| CoreError::Unknown(anyhow!("no bet {} to archive", bet_id)))?;
        bet.archived = true;
        Ok(())
    }

    async fn place_bet(&self, mut bet: Bet) -> Result<Bet, CoreError> {
        let mut inner = self.inner.lock().await;

        // Funds check re-run inside the critical section: concurrent
        // placements serialize here and cannot both spend the same cents.
        let pending = inner.pending_stake(&bet.user_id);
        let balance = inner.bankroll_mut(&bet.user_id)?.balance;
        let available = balance - pending;
        if available < bet.stake {
            return Err(CoreError::InsufficientFunds {
                available,
                stake: bet.stake,
            });
        }

        inner.next_bet_id += 1;
        bet.id = format!("bet-{}", inner.next_bet_id);
        bet.status = BetStatus::Pending;

        let user_id = bet.user_id.clone();
        let log_capacity = self.log_capacity;
        inner.mutate_balance(
            &user_id,
            -bet.stake,
            TxnReason::BetPlaced,
            Some(&bet.id),
            bet.created_at,
            log_capacity,
        )?;
        let bankroll = inner.bankroll_mut(&bet.user_id)?;
        bankroll.total_wagered += bet.stake;

        inner.bets.insert(bet.id.clone(), bet.clone());
        Ok(bet)
    }

    async fn cancel_bet(&self, bet_id: &str) -> Result<Option<Bet>, CoreError> {
        let mut inner = self.inner.lock().await;
        let (user_id, stake) = match inner.bets.get(bet_id) {
            Some(bet) if bet.status == BetStatus::Pending => {
                (bet.user_id.clone(), bet.stake)
            }
            Some(_) => return Ok(None),
            None => return Err(CoreError::Unknown(anyhow!("no bet {} to cancel", bet_id))),
        };

        let log_capacity = self.log_capacity;
        inner.mutate_balance(
            &user_id,
            stake,
            TxnReason::BetRefund,
            Some(bet_id),
            Utc::now(),
            log_capacity,
        )?;
        let bet = inner.bets.get_mut(bet_id).expect("checked above");
        bet.status = BetStatus::Cancelled;
        Ok(Some(bet.clone()))
    }

    async fn settle_bet(
        &self,
        bet_id: &str,
        outcome: BetOutcome,
        now: DateTime<Utc>,
    ) -> Result<SettleAttempt, CoreError> {
        let mut inner = self.inner.lock().await;
        let (user_id, stake, potential_win) = match inner.bets.get(bet_id) {
            Some(bet) if bet.status == BetStatus::Pending => {
                (bet.user_id.clone(), bet.stake, bet.potential_win)
            }
            Some(_) => return Ok(SettleAttempt::AlreadySettled),
            None => {
                return Err(CoreError::Unknown(anyhow!("no bet {} to settle", bet_id)));
            }
        };

        let actual_win = outcome.actual_win(stake, potential_win);
        let credit = outcome.credit(stake, potential_win);
        let reason = match outcome {
            BetOutcome::Won => TxnReason::BetWon,
            BetOutcome::Lost => TxnReason::BetLost,
            BetOutcome::Push => TxnReason::BetPush,
        };

        let log_capacity = self.log_capacity;
        inner.mutate_balance(&user_id, credit, reason, Some(bet_id), now, log_capacity)?;

        let bankroll = inner.bankroll_mut(&user_id)?;
        match outcome {
            BetOutcome::Won => {
                bankroll.win_count += 1;
                bankroll.total_won += actual_win;
                bankroll.biggest_win = bankroll.biggest_win.max(actual_win);
            }
            BetOutcome::Lost => {
                bankroll.loss_count += 1;
                bankroll.biggest_loss = bankroll.biggest_loss.max(stake);
            }
            BetOutcome::Push => bankroll.push_count += 1,
        }

        let bet = inner.bets.get_mut(bet_id).expect("checked above");
        bet.status = outcome.as_status();
        bet.actual_win = Some(actual_win);
        bet.settled_at = Some(now);
        Ok(SettleAttempt::Settled(bet.clone()))
    }

    async fn create_bankroll(&self, user_id: &str, deposit: i64) -> Result<Bankroll, CoreError> {
        let mut inner = self.inner.lock().await;
        let bankroll = inner
            .bankrolls
            .entry(user_id.to_string())
            .or_insert_with(|| Bankroll::new(user_id.to_string(), deposit, Utc::now()));
        Ok(bankroll.clone())
    }

    async fn get_bankroll(&self, user_id: &str) -> Result<Bankroll, CoreError> {
        let inner = self.inner.lock().await;
        inner
            .bankrolls
            .get(user_id)
            .cloned()
            .ok_or_else(|| CoreError::Unknown(anyhow!("no bankroll for user {}", user_id)))
    }

    async fn apply_delta(
        &self,
        user_id: &str,
        delta: i64,
        reason: TxnReason,
        bet_id: Option<&str>,
    ) -> Result<i64, CoreError> {
        let mut inner = self.inner.lock().await;
        let log_capacity = self.log_capacity;
        inner.mutate_balance(user_id, delta, reason, bet_id, Utc::now(), log_capacity)
    }

    async fn add_referral_bonus(&self, user_id: &str, amount: i64) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().await;
        let bankroll = inner.bankroll_mut(user_id)?;
        bankroll.referral_bonus += amount;
        Ok(())
    }

    async fn weekly_reset(
        &self,
        user_id: &str,
        baseline: i64,
        period_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().await;
        let current = inner.bankroll_mut(user_id)?;
        if current.last_reset >= period_start {
            return Ok(false);
        }
        let baseline = baseline + current.referral_bonus;
        let delta = baseline - current.balance;
        let log_capacity = self.log_capacity;
        inner.mutate_balance(user_id, delta, TxnReason::WeeklyReset, None, now, log_capacity)?;

        let bankroll = inner.bankroll_mut(user_id)?;
        bankroll.weekly_deposit = baseline;
        bankroll.referral_bonus = 0;
        bankroll.reset_count += 1;
        bankroll.last_reset = now;
        Ok(true)
    }

    async fn pick_action_exists(&self, post_id: &str, user_id: &str) -> Result<bool, CoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .pick_actions
            .contains_key(&(post_id.to_string(), user_id.to_string())))
    }

    async fn insert_pick_action(&self, action: PickAction) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().await;
        let key = (action.post_id.clone(), action.user_id.clone());
        if inner.pick_actions.contains_key(&key) {
            return Err(CoreError::AlreadyActioned);
        }
        inner.pick_actions.insert(key, action);
        Ok(())
    }
}
