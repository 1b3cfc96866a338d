//! Port traits for the external collaborators of the trading loop.

pub mod config_port;
pub mod history_port;
pub mod price_port;
