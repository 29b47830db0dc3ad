pub mod bankroll;
pub mod placement;
pub mod settlement;
pub mod tailfade;

pub use bankroll::BankrollLedger;
pub use placement::{BetService, PlaceBetRequest};
pub use settlement::{SettlementReport, SettlementService};
pub use tailfade::{TailFadeOutcome, TailFadeRequest, TailFadeService};
