use crate::error::CoreError;
use crate::models::{BetType, Game, Selection};

/// Business-rule checks for a candidate bet, in order, stopping at the first
/// failure. Live/in-progress games are deliberately allowed — late tails are
/// part of the product, so there is no "game already started" rejection here.
pub fn validate_bet(
    bet_type: BetType,
    selection: &Selection,
    stake: i64,
    game: &Game,
    min_stake: i64,
) -> Result<(), CoreError> {
    if stake < min_stake {
        return Err(CoreError::BelowMinimum {
            stake,
            minimum: min_stake,
        });
    }

    let odds = game.odds.as_ref().ok_or(CoreError::MarketUnavailable)?;
    let market_open = match bet_type {
        BetType::Spread => odds.spreads.is_some(),
        BetType::Total => odds.totals.is_some(),
        BetType::Moneyline => odds.h2h.is_some(),
    };
    if !market_open {
        return Err(CoreError::MarketUnavailable);
    }

    if !selection.matches(bet_type) {
        return Err(CoreError::InvalidSelection);
    }

    Ok(())
}
