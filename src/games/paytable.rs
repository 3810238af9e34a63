//! Static payout data
//!
//! Paytable rows hold credit values per bet level (index 0 = x1, 1 = x2, 2 = x3).
//! The bet tables map each legal bet amount of a level to the internal stake
//! multiplier that scales those credits. Both are read-only for the lifetime
//! of the process.

use crate::games::types::{BetLevel, Symbol};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Paytable key for the mixed-BAR row
pub const ANY_3X_BAR_KEY: &str = "ANY_3X_BAR";

/// Label reported to the player for a mixed-BAR win
pub const ANY_3X_BAR_LABEL: &str = "ANY 3X BAR";

/// Converts paytable credits into currency units
pub const CREDIT_VALUE: f64 = 0.01;

/// Fallback when a (level, amount) pair is missing from the bet tables
pub const DEFAULT_INTERNAL_MULTIPLIER: u32 = 1;

static PAYTABLE: Lazy<HashMap<&'static str, [u32; 3]>> = Lazy::new(|| {
    HashMap::from([
        ("Kong Kong Kong", [800, 1600, 2500]),
        ("Sun Sun Sun", [400, 800, 1200]),
        ("Palm Palm Palm", [200, 400, 600]),
        ("Coconut Coconut Coconut", [100, 200, 300]),
        ("Banana Banana Banana", [80, 160, 240]),
        ("3BAR 3BAR 3BAR", [60, 120, 180]),
        ("2BAR 2BAR 2BAR", [40, 80, 120]),
        ("1BAR 1BAR 1BAR", [20, 40, 60]),
        (ANY_3X_BAR_KEY, [10, 20, 30]),
    ])
});

const LEVEL_1_BETS: &[(f64, u32)] = &[(0.01, 1), (0.05, 5), (0.1, 10), (0.2, 20), (0.25, 25)];
const LEVEL_2_BETS: &[(f64, u32)] = &[(0.02, 1), (0.1, 5), (0.2, 10), (0.4, 20), (0.5, 25)];
const LEVEL_3_BETS: &[(f64, u32)] = &[(0.03, 1), (0.15, 5), (0.3, 10), (0.6, 20), (0.75, 25)];

/// Paytable key for three identical symbols, e.g. `"Kong Kong Kong"`
pub fn combination_key(symbol: Symbol) -> String {
    format!("{symbol} {symbol} {symbol}")
}

/// Credits paid for `key` at `level`
pub fn credits(key: &str, level: BetLevel) -> Option<u32> {
    PAYTABLE.get(key).map(|payouts| payouts[level.index()])
}

/// Legal (amount, internal multiplier) pairs for a level
pub fn bet_table(level: BetLevel) -> &'static [(f64, u32)] {
    match level.get() {
        1 => LEVEL_1_BETS,
        2 => LEVEL_2_BETS,
        _ => LEVEL_3_BETS,
    }
}
