//! Spin Metrics
//!
//! Counters and latency averages for the spin endpoint, exported in the
//! Prometheus text format on `GET /metrics`.

use super::handlers::AppState;
use crate::errors::SpinError;
use crate::games::SpinReport;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

/// Prometheus-compatible metrics registry
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Spin outcomes
    pub spins_total: AtomicU64,
    pub spins_won_total: AtomicU64,
    pub spins_lost_total: AtomicU64,

    /// Failures by kind
    pub rejected_spins_total: AtomicU64,
    pub settings_failures_total: AtomicU64,
    pub rng_failures_total: AtomicU64,
    pub internal_errors_total: AtomicU64,

    /// Money moved, in bet currency
    pub wagered_total: Mutex<f64>,
    pub paid_out_total: Mutex<f64>,

    /// Upstream latency, exponential moving averages in seconds
    pub avg_settings_latency: Mutex<f64>,
    pub avg_rng_latency: Mutex<f64>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a spin that reached a verdict
    pub fn record_spin(&self, report: &SpinReport, bet_amount: f64) {
        self.spins_total.fetch_add(1, Ordering::SeqCst);
        if report.outcome.is_win() {
            self.spins_won_total.fetch_add(1, Ordering::SeqCst);
        } else {
            self.spins_lost_total.fetch_add(1, Ordering::SeqCst);
        }

        add(&self.wagered_total, bet_amount);
        add(&self.paid_out_total, report.outcome.win_amount);
        observe(&self.avg_settings_latency, report.timings.rtp);
        observe(&self.avg_rng_latency, report.timings.verdict);
    }

    /// Record a spin that failed before resolving
    pub fn record_failure(&self, error: &SpinError) {
        let counter = match error {
            e if e.is_bad_request() => &self.rejected_spins_total,
            SpinError::Rtp(_) => &self.settings_failures_total,
            SpinError::Verdict(_) => &self.rng_failures_total,
            _ => &self.internal_errors_total,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Generate Prometheus metrics format
    pub fn to_prometheus_format(&self) -> String {
        let mut output = String::new();

        counter(
            &mut output,
            "kongspin_spins_total",
            "Spins resolved with a verdict",
            self.spins_total.load(Ordering::SeqCst),
        );
        counter(
            &mut output,
            "kongspin_spins_won_total",
            "Spins that paid out",
            self.spins_won_total.load(Ordering::SeqCst),
        );
        counter(
            &mut output,
            "kongspin_spins_lost_total",
            "Spins that paid nothing",
            self.spins_lost_total.load(Ordering::SeqCst),
        );
        counter(
            &mut output,
            "kongspin_rejected_spins_total",
            "Spins rejected by request validation",
            self.rejected_spins_total.load(Ordering::SeqCst),
        );
        counter(
            &mut output,
            "kongspin_settings_failures_total",
            "Spins failed on the settings service",
            self.settings_failures_total.load(Ordering::SeqCst),
        );
        counter(
            &mut output,
            "kongspin_rng_failures_total",
            "Spins failed on the RNG service",
            self.rng_failures_total.load(Ordering::SeqCst),
        );
        counter(
            &mut output,
            "kongspin_internal_errors_total",
            "Spins failed inside the engine",
            self.internal_errors_total.load(Ordering::SeqCst),
        );

        let wagered = read(&self.wagered_total);
        let paid_out = read(&self.paid_out_total);
        let observed_rtp = if wagered > 0.0 { paid_out / wagered } else { 0.0 };

        gauge(&mut output, "kongspin_wagered_total", "Total amount wagered", wagered);
        gauge(&mut output, "kongspin_paid_out_total", "Total amount paid out", paid_out);
        gauge(
            &mut output,
            "kongspin_observed_rtp",
            "Paid out divided by wagered (0 when nothing was wagered)",
            observed_rtp,
        );
        gauge(
            &mut output,
            "kongspin_settings_latency_seconds",
            "Average settings service latency",
            read(&self.avg_settings_latency),
        );
        gauge(
            &mut output,
            "kongspin_rng_latency_seconds",
            "Average RNG service latency",
            read(&self.avg_rng_latency),
        );

        output
    }
}

fn counter(output: &mut String, name: &str, help: &str, value: u64) {
    output.push_str(&format!(
        "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n\n"
    ));
}

fn gauge(output: &mut String, name: &str, help: &str, value: f64) {
    output.push_str(&format!(
        "# HELP {name} {help}\n# TYPE {name} gauge\n{name} {value}\n\n"
    ));
}

fn read(cell: &Mutex<f64>) -> f64 {
    match cell.lock() {
        Ok(value) => *value,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn update(cell: &Mutex<f64>, f: impl FnOnce(f64) -> f64) {
    let mut guard = match cell.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = f(*guard);
}

fn add(cell: &Mutex<f64>, amount: f64) {
    update(cell, |current| current + amount);
}

fn observe(cell: &Mutex<f64>, sample: Duration) {
    let sample = sample.as_secs_f64();
    update(cell, |current| {
        if current == 0.0 {
            sample
        } else {
            current * 0.9 + sample * 0.1
        }
    });
}

/// Axum handler for Prometheus metrics endpoint
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.to_prometheus_format(),
    )
        .into_response()
}
