use serde::{Deserialize, Serialize};
use std::fmt;

/// A single reel stop. `Empty` marks a position with no symbol on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Symbol {
    Kong,
    Sun,
    Palm,
    Coconut,
    Banana,
    #[serde(rename = "1BAR")]
    OneBar,
    #[serde(rename = "2BAR")]
    TwoBar,
    #[serde(rename = "3BAR")]
    ThreeBar,
    #[serde(rename = "EMPTY")]
    Empty,
}

impl Symbol {
    /// Every real symbol that can land on a reel (the `Empty` sentinel excluded)
    pub const ALL: [Symbol; 8] = [
        Symbol::Kong,
        Symbol::Sun,
        Symbol::Palm,
        Symbol::Coconut,
        Symbol::Banana,
        Symbol::ThreeBar,
        Symbol::TwoBar,
        Symbol::OneBar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Kong => "Kong",
            Symbol::Sun => "Sun",
            Symbol::Palm => "Palm",
            Symbol::Coconut => "Coconut",
            Symbol::Banana => "Banana",
            Symbol::OneBar => "1BAR",
            Symbol::TwoBar => "2BAR",
            Symbol::ThreeBar => "3BAR",
            Symbol::Empty => "EMPTY",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Symbol::Empty)
    }

    /// 1BAR, 2BAR and 3BAR
    pub fn is_bar(&self) -> bool {
        matches!(self, Symbol::OneBar | Symbol::TwoBar | Symbol::ThreeBar)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three reel stops, left to right
pub type Reels = [Symbol; 3];

/// Render a board the way the client expects it on the wire
pub fn reels_to_strings(reels: &[Symbol]) -> Vec<String> {
    reels.iter().map(|s| s.as_str().to_string()).collect()
}

/// Selects one of the three parallel paytables and stake scales.
///
/// Only constructible for levels 1, 2 and 3, so `index()` is always a valid
/// column into a paytable row.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(into = "u8")]
pub struct BetLevel(u8);

impl BetLevel {
    pub const VALID: [u8; 3] = [1, 2, 3];

    pub fn new(level: i64) -> Option<Self> {
        Self::VALID
            .iter()
            .copied()
            .find(|valid| i64::from(*valid) == level)
            .map(BetLevel)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Zero-based paytable column
    pub fn index(&self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl From<BetLevel> for u8 {
    fn from(level: BetLevel) -> Self {
        level.0
    }
}

impl fmt::Display for BetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Win/loss signal returned by the RNG service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Win,
    Loss,
}

impl Verdict {
    /// Only the literal `"win"` counts as a win; anything else is a loss.
    pub fn from_pref_outcome(pref_outcome: &str) -> Self {
        if pref_outcome == "win" {
            Verdict::Win
        } else {
            Verdict::Loss
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Win => write!(f, "win"),
            Verdict::Loss => write!(f, "loss"),
        }
    }
}

/// Who is spinning and from where. Forwarded to the upstream services.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpinContext {
    pub client_id: String,
    pub game_id: String,
    pub player_id: String,
    pub bet_id: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
}

/// Raw bet as submitted by the player, before validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BetRequest {
    pub bet_amount: f64,
    pub bet_level: i64,
}

/// Final result of one spin
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpinOutcome {
    pub reels: Reels,
    pub win_amount: f64,
    /// Empty when the spin did not win
    pub winning_combination: String,
    pub bet_level: BetLevel,
    pub verdict: Verdict,
}

impl SpinOutcome {
    pub fn is_win(&self) -> bool {
        self.win_amount > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_wire_names() {
        assert_eq!(serde_json::to_string(&Symbol::OneBar).unwrap(), "\"1BAR\"");
        assert_eq!(serde_json::to_string(&Symbol::Empty).unwrap(), "\"EMPTY\"");
        assert_eq!(serde_json::to_string(&Symbol::Kong).unwrap(), "\"Kong\"");

        let parsed: Symbol = serde_json::from_str("\"3BAR\"").unwrap();
        assert_eq!(parsed, Symbol::ThreeBar);
        for symbol in Symbol::ALL {
            let json = serde_json::to_string(&symbol).unwrap();
            assert_eq!(json, format!("\"{}\"", symbol));
        }
    }

    #[test]
    fn test_bar_classification() {
        assert!(Symbol::OneBar.is_bar());
        assert!(Symbol::ThreeBar.is_bar());
        assert!(!Symbol::Kong.is_bar());
        assert!(!Symbol::Empty.is_bar());
        assert!(Symbol::Empty.is_empty());
        assert!(!Symbol::ALL.contains(&Symbol::Empty));
    }

    #[test]
    fn test_bet_level_bounds() {
        assert_eq!(BetLevel::new(1).map(|l| l.index()), Some(0));
        assert_eq!(BetLevel::new(3).map(|l| l.index()), Some(2));
        assert!(BetLevel::new(0).is_none());
        assert!(BetLevel::new(4).is_none());
        assert!(BetLevel::new(-1).is_none());
        assert_eq!(serde_json::to_string(&BetLevel::new(2).unwrap()).unwrap(), "2");
    }

    #[test]
    fn test_verdict_parsing() {
        assert_eq!(Verdict::from_pref_outcome("win"), Verdict::Win);
        assert_eq!(Verdict::from_pref_outcome("loss"), Verdict::Loss);
        assert_eq!(Verdict::from_pref_outcome("WIN"), Verdict::Loss);
        assert_eq!(Verdict::from_pref_outcome(""), Verdict::Loss);
    }
}
