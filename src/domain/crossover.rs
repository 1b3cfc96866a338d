//! Price/SMA crossover detection.
//!
//! Edge-triggered: a signal fires only when the relation between price and
//! average flips between two consecutive ticks.
//!
//! - `BUY`: previous relation `Below`, current `Above`
//! - `SELL`: previous relation `Above`, current `Below`
//! - anything else, including transitions into or out of `Equal`: no signal
//!
//! How an `Equal` tick affects the remembered relation is set by
//! [`EqualPolicy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// No comparison has been made yet.
    None,
    Above,
    Below,
    Equal,
}

impl Relation {
    pub fn classify(price: f64, average: f64) -> Self {
        if price > average {
            Relation::Above
        } else if price < average {
            Relation::Below
        } else {
            Relation::Equal
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::None => "none",
            Relation::Above => "above",
            Relation::Below => "below",
            Relation::Equal => "equal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => f.write_str("BUY"),
            Signal::Sell => f.write_str("SELL"),
        }
    }
}

/// Treatment of ticks where price equals the average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqualPolicy {
    /// `Equal` replaces the previous relation; `Below -> Equal -> Above`
    /// never signals.
    #[default]
    Reset,
    /// `Equal` is ignored; `Below -> Equal -> Above` signals `BUY` on the
    /// `Above` tick.
    Carry,
}

impl FromStr for EqualPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reset" => Ok(EqualPolicy::Reset),
            "carry" => Ok(EqualPolicy::Carry),
            other => Err(format!("unknown equal policy '{other}' (expected reset or carry)")),
        }
    }
}

impl fmt::Display for EqualPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EqualPolicy::Reset => f.write_str("reset"),
            EqualPolicy::Carry => f.write_str("carry"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrossoverDetector {
    previous: Relation,
    policy: EqualPolicy,
}

impl CrossoverDetector {
    pub fn new(policy: EqualPolicy) -> Self {
        CrossoverDetector {
            previous: Relation::None,
            policy,
        }
    }

    pub fn previous_relation(&self) -> Relation {
        self.previous
    }

    /// Classify the tick and return the signal it triggers, if any.
    pub fn update(&mut self, price: f64, average: f64) -> Option<Signal> {
        let current = Relation::classify(price, average);
        let signal = match (self.previous, current) {
            (Relation::Below, Relation::Above) => Some(Signal::Buy),
            (Relation::Above, Relation::Below) => Some(Signal::Sell),
            _ => None,
        };

        let keep_previous = current == Relation::Equal
            && self.policy == EqualPolicy::Carry
            && self.previous != Relation::None;
        if !keep_previous {
            self.previous = current;
        }
        signal
    }
}

impl Default for CrossoverDetector {
    fn default() -> Self {
        Self::new(EqualPolicy::default())
    }
}
