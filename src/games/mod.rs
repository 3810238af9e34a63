pub mod arbiter;
pub mod evaluator;
pub mod paytable;
pub mod reels;
pub mod types;
pub mod validator;

pub use arbiter::{OutcomeArbiter, SpinReport, SpinStage};
pub use evaluator::{calculate_win, WinEvaluation};
pub use reels::{RandomSource, ReelGenerator, SharedRng};
pub use types::*;
