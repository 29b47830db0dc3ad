use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Domain types shared across the engine, store, and services.
/// All money fields are integer minor units (cents); odds are American format.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Spread,
    Total,
    Moneyline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalSide {
    Over,
    Under,
}

/// What the bettor picked, as a tagged union so a total's line can never be
/// confused with a spread's line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Spread { team: String, line: f64 },
    Total { side: TotalSide, line: f64 },
    Moneyline { team: String },
}

impl Selection {
    /// Well-formedness for a given bet type: team present for spread/moneyline,
    /// side + line present for totals.
    pub fn matches(&self, bet_type: BetType) -> bool {
        matches!(
            (self, bet_type),
            (Selection::Spread { .. }, BetType::Spread)
                | (Selection::Total { .. }, BetType::Total)
                | (Selection::Moneyline { .. }, BetType::Moneyline)
        )
    }

    /// The team this selection rides on, if any.
    pub fn team(&self) -> Option<&str> {
        match self {
            Selection::Spread { team, .. } | Selection::Moneyline { team } => Some(team),
            Selection::Total { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Push,
    Cancelled,
}

impl BetStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BetStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    pub user_id: String,
    pub game_id: String,
    pub bet_type: BetType,
    pub selection: Selection,
    pub stake: i64,
    pub odds: i32,
    pub potential_win: i64,
    pub status: BetStatus,
    /// Set exactly once at settlement: potential_win on a win, 0 on a loss,
    /// stake on a push.
    pub actual_win: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_tail: bool,
    pub is_fade: bool,
    pub original_pick_id: Option<String>,
    /// Bets are never deleted, only soft-archived.
    pub archived: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    Live,
    Completed,
}

/// Both sides of a spread market carry their own line and odds; the two quotes
/// are not mirror images because of vig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadMarket {
    pub home_line: f64,
    pub home_odds: i32,
    pub away_line: f64,
    pub away_odds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalMarket {
    pub line: f64,
    pub over_odds: i32,
    pub under_odds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct H2hMarket {
    pub home_odds: i32,
    pub away_odds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GameOdds {
    pub spreads: Option<SpreadMarket>,
    pub totals: Option<TotalMarket>,
    pub h2h: Option<H2hMarket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub status: GameStatus,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub odds: Option<GameOdds>,
}

impl Game {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.commence_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnReason {
    BetPlaced,
    BetWon,
    BetLost,
    BetPush,
    BetRefund,
    WeeklyReset,
}

/// One entry per balance mutation, most-recent-first in the bankroll's ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub delta: i64,
    pub balance_after: i64,
    pub reason: TxnReason,
    pub bet_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Per-user virtual balance plus the season aggregates the profile screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bankroll {
    pub user_id: String,
    pub balance: i64,
    /// Baseline set at the last weekly reset; period P/L is balance minus this.
    pub weekly_deposit: i64,
    /// Accrued referral bonus, folded into the next reset baseline.
    pub referral_bonus: i64,
    pub win_count: u32,
    pub loss_count: u32,
    pub push_count: u32,
    pub total_wagered: i64,
    pub total_won: i64,
    pub biggest_win: i64,
    pub biggest_loss: i64,
    pub season_high: i64,
    pub season_low: i64,
    pub last_reset: DateTime<Utc>,
    pub reset_count: u32,
    pub transactions: VecDeque<LedgerEntry>,
}

impl Bankroll {
    pub fn new(user_id: String, deposit: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            balance: deposit,
            weekly_deposit: deposit,
            referral_bonus: 0,
            win_count: 0,
            loss_count: 0,
            push_count: 0,
            total_wagered: 0,
            total_won: 0,
            biggest_win: 0,
            biggest_loss: 0,
            season_high: deposit,
            season_low: deposit,
            last_reset: now,
            reset_count: 0,
            transactions: VecDeque::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickActionKind {
    Tail,
    Fade,
}

/// Records that a user tailed or faded a post. At most one per (post, user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickAction {
    pub post_id: String,
    pub user_id: String,
    pub action: PickActionKind,
    pub resulting_bet_id: String,
    pub created_at: DateTime<Utc>,
}
