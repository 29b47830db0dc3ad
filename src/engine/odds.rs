use crate::error::CoreError;
use crate::models::{Bet, BetType, Game, Selection, TotalSide};

/// American-odds payout math using integer cents to avoid floating-point
/// drift on money.
///
/// Positive odds: win = floor(stake * odds / 100)
/// Negative odds: win = floor(stake * 100 / |odds|)
pub fn potential_win(stake: i64, odds: i32) -> Result<i64, CoreError> {
    if odds == 0 || odds.abs() < 100 {
        return Err(CoreError::InvalidOdds(odds));
    }
    let odds = odds as i64;
    if odds > 0 {
        Ok(stake * odds / 100)
    } else {
        Ok(stake * 100 / odds.abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub to_win: i64,
    pub total_return: i64,
}

/// Stake plus profit if the bet wins.
pub fn payout(stake: i64, odds: i32) -> Result<Payout, CoreError> {
    let to_win = potential_win(stake, odds)?;
    Ok(Payout {
        to_win,
        total_return: stake + to_win,
    })
}

/// Derive the opposite side of the market for a fade.
///
/// The inverse of a team bet is the OTHER team at that team's own quoted line
/// and odds — not a sign flip of the original quote, since the two sides carry
/// different vig. A total flips over/under at the same line using the opposite
/// side's quoted odds.
pub fn invert_selection(bet: &Bet, game: &Game) -> Result<(Selection, i32), CoreError> {
    let odds = game.odds.as_ref().ok_or(CoreError::NoOppositeAvailable)?;

    match (&bet.bet_type, &bet.selection) {
        (BetType::Spread, Selection::Spread { team, .. }) => {
            let market = odds.spreads.ok_or(CoreError::NoOppositeAvailable)?;
            let (other_team, line, side_odds) = if team == &game.home_team {
                (&game.away_team, market.away_line, market.away_odds)
            } else if team == &game.away_team {
                (&game.home_team, market.home_line, market.home_odds)
            } else {
                return Err(CoreError::NoOppositeAvailable);
            };
            Ok((
                Selection::Spread {
                    team: other_team.clone(),
                    line,
                },
                side_odds,
            ))
        }
        (BetType::Moneyline, Selection::Moneyline { team }) => {
            let market = odds.h2h.ok_or(CoreError::NoOppositeAvailable)?;
            let (other_team, side_odds) = if team == &game.home_team {
                (&game.away_team, market.away_odds)
            } else if team == &game.away_team {
                (&game.home_team, market.home_odds)
            } else {
                return Err(CoreError::NoOppositeAvailable);
            };
            Ok((
                Selection::Moneyline {
                    team: other_team.clone(),
                },
                side_odds,
            ))
        }
        (BetType::Total, Selection::Total { side, line }) => {
            let market = odds.totals.ok_or(CoreError::NoOppositeAvailable)?;
            let (other_side, side_odds) = match side {
                TotalSide::Over => (TotalSide::Under, market.under_odds),
                TotalSide::Under => (TotalSide::Over, market.over_odds),
            };
            Ok((
                Selection::Total {
                    side: other_side,
                    line: *line,
                },
                side_odds,
            ))
        }
        // Selection shape disagrees with bet_type; placement validation should
        // have rejected this bet, so there is no well-defined opposite.
        _ => Err(CoreError::NoOppositeAvailable),
    }
}
