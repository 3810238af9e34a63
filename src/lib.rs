//! Kongspin - Spin Outcome Engine for Funky King Kong
//!
//! A three-reel slot whose outcome is decided in two steps: the engine draws
//! and prices a winning board, then an external RNG service says whether the
//! player actually wins it. Game settings (the RTP percentage) come from a
//! separate settings service.
//!
//! - [`games`]: symbols, paytables, bet validation, reel corpora, scoring and
//!   the [`games::OutcomeArbiter`] that runs a spin end to end
//! - [`upstream`]: HTTP clients for the settings and RNG services
//! - [`api`]: the axum HTTP surface
//! - [`config`]: TOML/environment configuration

pub mod api;
pub mod config;
pub mod errors;
pub mod games;
pub mod upstream;

pub use errors::{ConfigurationError, SpinError};
