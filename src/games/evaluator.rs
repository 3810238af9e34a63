//! Win evaluation
//!
//! Pure scoring of a board: no state, no randomness.

use crate::games::paytable::{self, ANY_3X_BAR_KEY, ANY_3X_BAR_LABEL, CREDIT_VALUE};
use crate::games::types::{BetLevel, Symbol};
use serde::Serialize;

/// Amount won and the combination that paid it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinEvaluation {
    pub win_amount: f64,
    /// Empty when nothing matched
    pub combination: String,
}

impl WinEvaluation {
    pub fn no_win() -> Self {
        Self {
            win_amount: 0.0,
            combination: String::new(),
        }
    }

    pub fn is_win(&self) -> bool {
        self.win_amount > 0.0
    }
}

/// Score a board.
///
/// Only full boards pay: `Empty` stops are dropped first and anything short of
/// three symbols loses. Three identical symbols pay their own paytable row;
/// three different BARs pay the ANY 3X BAR row.
pub fn calculate_win(reels: &[Symbol], level: BetLevel, internal_multiplier: u32) -> WinEvaluation {
    let symbols: Vec<Symbol> = reels.iter().copied().filter(|s| !s.is_empty()).collect();
    if symbols.len() != 3 {
        return WinEvaluation::no_win();
    }

    if symbols[0] == symbols[1] && symbols[1] == symbols[2] {
        let key = paytable::combination_key(symbols[0]);
        if let Some(credits) = paytable::credits(&key, level) {
            return WinEvaluation {
                win_amount: payout(credits, internal_multiplier),
                combination: key,
            };
        }
    }

    if is_any_bar_combination(&symbols) {
        if let Some(credits) = paytable::credits(ANY_3X_BAR_KEY, level) {
            return WinEvaluation {
                win_amount: payout(credits, internal_multiplier),
                combination: ANY_3X_BAR_LABEL.to_string(),
            };
        }
    }

    WinEvaluation::no_win()
}

fn payout(credits: u32, internal_multiplier: u32) -> f64 {
    f64::from(credits) * f64::from(internal_multiplier) * CREDIT_VALUE
}

/// All BARs, not all the same
fn is_any_bar_combination(symbols: &[Symbol]) -> bool {
    symbols.iter().all(Symbol::is_bar) && !(symbols[0] == symbols[1] && symbols[1] == symbols[2])
}
