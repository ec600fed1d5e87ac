//! Persistence and rewards ledger for NeuroIsland trivia play.

pub mod db;
pub mod error;
pub mod macros;
pub mod models;
pub mod scoring;
pub mod utils;

pub use error::{LedgerError, LedgerResult};
