//! Spin resolution
//!
//! One spin walks a fixed pipeline and stops at the first failure:
//!
//! ```text
//! Validating -> AwaitingRtp -> CandidateComputed -> AwaitingVerdict -> Resolved
//! ```
//!
//! A winning candidate board is drawn and scored before the RNG service is
//! asked anything. The service only sees the candidate's payout multiplier.
//! A "win" verdict pays exactly that candidate; anything else replaces it
//! with a freshly drawn losing board and a zero payout.

use crate::errors::SpinError;
use crate::games::evaluator::{self, WinEvaluation};
use crate::games::reels::ReelGenerator;
use crate::games::types::{BetRequest, Reels, SpinContext, SpinOutcome, Verdict};
use crate::games::validator::{self, ValidatedBet};
use crate::upstream::{PlayerRef, RtpProvider, VerdictProvider, VerdictQuery};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Pipeline position of a spin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinStage {
    Validating,
    AwaitingRtp,
    CandidateComputed,
    AwaitingVerdict,
    Resolved,
}

impl fmt::Display for SpinStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpinStage::Validating => "validating",
            SpinStage::AwaitingRtp => "awaiting_rtp",
            SpinStage::CandidateComputed => "candidate_computed",
            SpinStage::AwaitingVerdict => "awaiting_verdict",
            SpinStage::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// The winning board drawn before the verdict is known
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateBoard {
    pub reels: Reels,
    pub evaluation: WinEvaluation,
    /// `potential win / bet amount`, or 0 for a zero bet
    pub payout_multiplier: f64,
}

/// Timing of the upstream calls made for one spin
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpinTimings {
    pub rtp: Duration,
    pub verdict: Duration,
}

/// A resolved spin together with what the pipeline saw on the way
#[derive(Debug, Clone)]
pub struct SpinReport {
    pub outcome: SpinOutcome,
    pub rtp: f64,
    pub candidate: CandidateBoard,
    pub timings: SpinTimings,
}

/// Failed spin, tagged with the stage it failed in
#[derive(Debug)]
pub struct SpinFailure {
    pub stage: SpinStage,
    pub error: SpinError,
}

impl SpinFailure {
    fn at(stage: SpinStage) -> impl FnOnce(SpinError) -> SpinFailure {
        move |error| SpinFailure { stage, error }
    }
}

impl fmt::Display for SpinFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spin failed while {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for SpinFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Resolves spins against one settings service and one RNG service.
///
/// Holds no per-spin state; one instance serves any number of concurrent spins.
#[derive(Clone)]
pub struct OutcomeArbiter {
    rtp_provider: Arc<dyn RtpProvider>,
    verdict_provider: Arc<dyn VerdictProvider>,
    reels: ReelGenerator,
}

impl OutcomeArbiter {
    pub fn new(
        rtp_provider: Arc<dyn RtpProvider>,
        verdict_provider: Arc<dyn VerdictProvider>,
        reels: ReelGenerator,
    ) -> Self {
        Self {
            rtp_provider,
            verdict_provider,
            reels,
        }
    }

    /// Draw a winning board and price it for this bet
    pub fn compute_candidate(&self, bet: &ValidatedBet) -> Result<CandidateBoard, SpinError> {
        let reels = self.reels.generate_winning_reels();
        let evaluation = evaluator::calculate_win(&reels, bet.level, bet.internal_multiplier);

        if !evaluation.is_win() {
            return Err(SpinError::InvariantViolation(format!(
                "winning board {:?} scored zero at level {} x{}",
                reels, bet.level, bet.internal_multiplier
            )));
        }

        let payout_multiplier = if bet.amount > 0.0 {
            evaluation.win_amount / bet.amount
        } else {
            0.0
        };

        Ok(CandidateBoard {
            reels,
            evaluation,
            payout_multiplier,
        })
    }

    /// Settle the spin once the verdict is in
    pub fn finalize(&self, bet: &ValidatedBet, candidate: &CandidateBoard, verdict: Verdict) -> Result<SpinOutcome, SpinError> {
        match verdict {
            Verdict::Win => Ok(SpinOutcome {
                reels: candidate.reels,
                win_amount: candidate.evaluation.win_amount,
                winning_combination: candidate.evaluation.combination.clone(),
                bet_level: bet.level,
                verdict,
            }),
            Verdict::Loss => {
                let reels = self.reels.generate_losing_reels();
                let check = evaluator::calculate_win(&reels, bet.level, bet.internal_multiplier);
                if check.is_win() {
                    return Err(SpinError::InvariantViolation(format!(
                        "losing board {:?} scored {} as {}",
                        reels, check.win_amount, check.combination
                    )));
                }
                Ok(SpinOutcome {
                    reels,
                    win_amount: 0.0,
                    winning_combination: String::new(),
                    bet_level: bet.level,
                    verdict,
                })
            }
        }
    }

    /// Run one spin end to end
    pub async fn spin(&self, context: &SpinContext, bet: &BetRequest) -> Result<SpinReport, SpinFailure> {
        let mut stage = SpinStage::Validating;
        debug!("Spin {} entering {}", context.bet_id, stage);
        validator::validate_context(context).map_err(SpinFailure::at(stage))?;
        let bet = validator::validate_bet(bet).map_err(SpinFailure::at(stage))?;

        stage = SpinStage::AwaitingRtp;
        debug!("Spin {} entering {}", context.bet_id, stage);
        let player = PlayerRef {
            client_id: context.client_id.clone(),
            game_id: context.game_id.clone(),
            player_id: context.player_id.clone(),
        };
        let started = Instant::now();
        let rtp = self.rtp_provider.fetch_rtp(&player).await.map_err(|e| {
            warn!("Error retrieving game settings for bet {}: {}", context.bet_id, e);
            SpinFailure {
                stage,
                error: SpinError::Rtp(e),
            }
        })?;
        let rtp_elapsed = started.elapsed();
        info!("Retrieved RTP: {}", rtp);

        stage = SpinStage::CandidateComputed;
        debug!("Spin {} entering {}", context.bet_id, stage);
        let candidate = self.compute_candidate(&bet).map_err(|e| {
            error!("Spin {}: {}", context.bet_id, e);
            SpinFailure { stage, error: e }
        })?;
        info!(
            "Candidate reels {:?}, potential win {}, combination '{}', payout multiplier {}",
            candidate.reels, candidate.evaluation.win_amount, candidate.evaluation.combination, candidate.payout_multiplier
        );

        stage = SpinStage::AwaitingVerdict;
        debug!("Spin {} entering {}", context.bet_id, stage);
        let query = VerdictQuery {
            client_id: context.client_id.clone(),
            game_id: context.game_id.clone(),
            player_id: context.player_id.clone(),
            bet_id: context.bet_id.clone(),
            rtp,
            payout_multiplier: candidate.payout_multiplier,
            bet_amount: bet.amount,
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
        };
        let started = Instant::now();
        let response = self.verdict_provider.fetch_verdict(&query).await.map_err(|e| {
            warn!("Error retrieving RNG outcome for bet {}: {}", context.bet_id, e);
            SpinFailure {
                stage,
                error: SpinError::Verdict(e),
            }
        })?;
        let verdict_elapsed = started.elapsed();
        let verdict = Verdict::from_pref_outcome(&response.pref_outcome);
        info!("RNG outcome: {} ({})", response.pref_outcome, verdict);

        let outcome = self.finalize(&bet, &candidate, verdict).map_err(|e| {
            error!("Spin {}: {}", context.bet_id, e);
            SpinFailure { stage, error: e }
        })?;
        stage = SpinStage::Resolved;
        info!(
            "Spin {} {}: reels {:?}, win amount {}",
            context.bet_id, stage, outcome.reels, outcome.win_amount
        );

        Ok(SpinReport {
            outcome,
            rtp,
            candidate,
            timings: SpinTimings {
                rtp: rtp_elapsed,
                verdict: verdict_elapsed,
            },
        })
    }
}
