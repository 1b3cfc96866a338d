//! Core domain types and logic.

pub mod window;
pub mod crossover;
pub mod ledger;
pub mod history;
pub mod summary;
pub mod trader;
pub mod config_validation;
pub mod error;
