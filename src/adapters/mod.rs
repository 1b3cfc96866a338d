//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod json_history_adapter;
pub mod kraken_adapter;
pub mod svg_chart;
