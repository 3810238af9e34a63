//! Bet and request validation
//!
//! Everything here runs before any upstream call is made.

use crate::errors::SpinError;
use crate::games::paytable::{self, DEFAULT_INTERNAL_MULTIPLIER};
use crate::games::types::{BetLevel, BetRequest, SpinContext};

/// True iff `level` is 1, 2 or 3
pub fn validate_bet_level(level: i64) -> bool {
    BetLevel::new(level).is_some()
}

/// True iff `amount` is exactly one of the legal amounts for `level`.
///
/// No tolerance is applied: callers pass amounts with the same precision the
/// bet tables use.
pub fn validate_bet_amount(amount: f64, level: i64) -> bool {
    BetLevel::new(level)
        .map(|level| paytable::bet_table(level).iter().any(|(valid, _)| *valid == amount))
        .unwrap_or(false)
}

/// Internal stake multiplier for a bet, or the default of 1 if the pair is unknown
pub fn internal_multiplier(amount: f64, level: i64) -> u32 {
    BetLevel::new(level)
        .and_then(|level| {
            paytable::bet_table(level)
                .iter()
                .find(|(valid, _)| *valid == amount)
                .map(|(_, multiplier)| *multiplier)
        })
        .unwrap_or(DEFAULT_INTERNAL_MULTIPLIER)
}

/// Legal amounts for `level`, ascending. Empty for an unknown level.
pub fn valid_bet_amounts(level: i64) -> Vec<f64> {
    BetLevel::new(level)
        .map(|level| paytable::bet_table(level).iter().map(|(amount, _)| *amount).collect())
        .unwrap_or_default()
}

/// A bet that passed validation, carrying the multiplier it resolved to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedBet {
    pub amount: f64,
    pub level: BetLevel,
    pub internal_multiplier: u32,
}

/// Reject empty identifiers
pub fn validate_context(context: &SpinContext) -> Result<(), SpinError> {
    let required = [
        &context.client_id,
        &context.player_id,
        &context.bet_id,
        &context.game_id,
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Err(SpinError::MissingField);
    }
    Ok(())
}

/// Validate the level, then the amount for that level
pub fn validate_bet(bet: &BetRequest) -> Result<ValidatedBet, SpinError> {
    let level = BetLevel::new(bet.bet_level).ok_or(SpinError::InvalidBetLevel(bet.bet_level))?;

    if !validate_bet_amount(bet.bet_amount, bet.bet_level) {
        return Err(SpinError::InvalidBetAmount {
            amount: bet.bet_amount,
            level,
            valid: valid_bet_amounts(bet.bet_level),
        });
    }

    Ok(ValidatedBet {
        amount: bet.bet_amount,
        level,
        // Known pair at this point, so never the fallback
        internal_multiplier: internal_multiplier(bet.bet_amount, bet.bet_level),
    })
}
