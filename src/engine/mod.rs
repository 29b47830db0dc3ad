pub mod odds;
pub mod outcome;
pub mod validate;

pub use outcome::BetOutcome;
