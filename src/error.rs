use std::fmt;

/// Every failure the core surfaces to callers. Business-rule rejections carry
/// a human-readable reason; persistence-layer failures land in `Unknown` with
/// full context attached.
#[derive(Debug)]
pub enum CoreError {
    /// American odds of 0 or magnitude below 100 — caller bug or bad feed data.
    InvalidOdds(i32),
    /// The game's odds payload lacks the opposing side of the market.
    NoOppositeAvailable,
    /// Stake below the configured minimum.
    BelowMinimum { stake: i64, minimum: i64 },
    /// The game's odds payload has no market for the requested bet type.
    MarketUnavailable,
    /// Selection shape does not match the bet type.
    InvalidSelection,
    /// Available balance (balance minus pending stakes) cannot cover the stake.
    InsufficientFunds { available: i64, stake: i64 },
    /// A balance delta would take the bankroll below zero.
    WouldGoNegative { balance: i64, delta: i64 },
    GameNotFound(String),
    OriginalBetNotFound(String),
    /// Cancellation attempted after the game's commence time.
    GameStarted,
    /// The user already tailed or faded this post.
    AlreadyActioned,
    /// Persistence-layer failure; never silently swallowed.
    Unknown(anyhow::Error),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidOdds(odds) => {
                write!(f, "invalid American odds: {}", odds)
            }
            CoreError::NoOppositeAvailable => {
                write!(f, "no opposite side available for this market")
            }
            CoreError::BelowMinimum { stake, minimum } => {
                write!(
                    f,
                    "stake {} is below the {} minimum",
                    format_cents(*stake),
                    format_cents(*minimum)
                )
            }
            CoreError::MarketUnavailable => {
                write!(f, "this market isn't available for this game")
            }
            CoreError::InvalidSelection => {
                write!(f, "selection doesn't match the bet type")
            }
            CoreError::InsufficientFunds { available, stake } => {
                write!(
                    f,
                    "you can't afford this bet: {} available, {} needed",
                    format_cents(*available),
                    format_cents(*stake)
                )
            }
            CoreError::WouldGoNegative { balance, delta } => {
                write!(
                    f,
                    "balance change {} would overdraw {}",
                    format_cents(*delta),
                    format_cents(*balance)
                )
            }
            CoreError::GameNotFound(id) => write!(f, "game not found: {}", id),
            CoreError::OriginalBetNotFound(id) => write!(f, "original bet not found: {}", id),
            CoreError::GameStarted => {
                write!(f, "this game has already started")
            }
            CoreError::AlreadyActioned => {
                write!(f, "this pick was already acted on")
            }
            CoreError::Unknown(err) => write!(f, "something went wrong: {:#}", err),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::Unknown(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Unknown(err)
    }
}

fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}
