//! Core betting logic for a social sports-betting app: placement, tail/fade
//! derivation, settlement, and the per-user virtual bankroll ledger. The
//! persistence layer is injected through the [`store::Store`] trait; UI,
//! realtime transport, and feed generation live elsewhere.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod models;
pub mod service;
pub mod store;

pub use config::CoreConfig;
pub use error::CoreError;
