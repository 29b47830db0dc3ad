use crate::error::CoreError;
use crate::models::{Bet, BetStatus, BetType, Game, Selection, TotalSide};
use std::cmp::Ordering;

/// Terminal result of a settled bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetOutcome {
    Won,
    Lost,
    Push,
}

impl BetOutcome {
    pub fn as_status(&self) -> BetStatus {
        match self {
            BetOutcome::Won => BetStatus::Won,
            BetOutcome::Lost => BetStatus::Lost,
            BetOutcome::Push => BetStatus::Push,
        }
    }

    /// What settlement writes into `actual_win`: profit on a win, stake back
    /// on a push, nothing on a loss.
    pub fn actual_win(&self, stake: i64, potential_win: i64) -> i64 {
        match self {
            BetOutcome::Won => potential_win,
            BetOutcome::Lost => 0,
            BetOutcome::Push => stake,
        }
    }

    /// Total bankroll credit: stake plus profit on a win, stake on a push.
    pub fn credit(&self, stake: i64, potential_win: i64) -> i64 {
        match self {
            BetOutcome::Won => stake + potential_win,
            BetOutcome::Lost => 0,
            BetOutcome::Push => stake,
        }
    }
}

/// Resolve a bet against final scores. Pure; errors only when the bet's
/// selection doesn't fit the game it claims to be on (anomalous data, never
/// an expected path).
///
/// A moneyline tie settles as push: the sports we carry essentially never tie
/// after overtime, but a tied final must not strand the bet, and push is the
/// one outcome that moves no money unfairly. Callers log when it happens.
pub fn settle_outcome(
    bet: &Bet,
    game: &Game,
    home_score: u32,
    away_score: u32,
) -> Result<BetOutcome, CoreError> {
    let (selected_score, opponent_score) = match bet.selection.team() {
        Some(team) if team == game.home_team => (home_score, away_score),
        Some(team) if team == game.away_team => (away_score, home_score),
        Some(_) => return Err(CoreError::InvalidSelection),
        None => (0, 0), // totals don't ride on a team
    };

    match (&bet.bet_type, &bet.selection) {
        (BetType::Moneyline, Selection::Moneyline { .. }) => {
            Ok(match selected_score.cmp(&opponent_score) {
                Ordering::Greater => BetOutcome::Won,
                Ordering::Less => BetOutcome::Lost,
                Ordering::Equal => BetOutcome::Push,
            })
        }
        (BetType::Spread, Selection::Spread { line, .. }) => {
            let adjusted = selected_score as f64 + line;
            let opponent = opponent_score as f64;
            Ok(if adjusted > opponent {
                BetOutcome::Won
            } else if adjusted == opponent {
                BetOutcome::Push
            } else {
                BetOutcome::Lost
            })
        }
        (BetType::Total, Selection::Total { side, line }) => {
            let sum = (home_score + away_score) as f64;
            Ok(if sum == *line {
                BetOutcome::Push
            } else {
                let over_hit = sum > *line;
                let picked_over = matches!(side, TotalSide::Over);
                if over_hit == picked_over {
                    BetOutcome::Won
                } else {
                    BetOutcome::Lost
                }
            })
        }
        _ => Err(CoreError::InvalidSelection),
    }
}
