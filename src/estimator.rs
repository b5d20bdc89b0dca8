//! Utility Estimator
//!
//! Converts a top-up amount (in Rand) into an estimated quantity of
//! electricity, water or gas, and records each successful estimate in the
//! injected [`TransactionLog`].

use crate::ledger::{Transaction, TransactionLog};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Utility selected by the `option` field ("1", "2", "3")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilityKind {
    Electricity,
    Water,
    Gas,
}

impl UtilityKind {
    pub const ALL: [UtilityKind; 3] = [UtilityKind::Electricity, UtilityKind::Water, UtilityKind::Gas];

    /// Map a selector to a kind. Anything outside 1..=3 is rejected.
    pub fn from_selector(selector: &str) -> Result<Self, EstimateError> {
        match selector.trim() {
            "1" => Ok(UtilityKind::Electricity),
            "2" => Ok(UtilityKind::Water),
            "3" => Ok(UtilityKind::Gas),
            _ => Err(EstimateError::UnknownUtility),
        }
    }

    /// Units delivered per currency unit
    pub fn rate(&self) -> f64 {
        match self {
            UtilityKind::Electricity => 1.17,
            UtilityKind::Water => 40.0,
            UtilityKind::Gas => 0.02,
        }
    }

    pub fn unit_label(&self) -> &'static str {
        match self {
            UtilityKind::Electricity => "kWh",
            UtilityKind::Water => "liters",
            UtilityKind::Gas => "m³",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UtilityKind::Electricity => "electricity",
            UtilityKind::Water => "water",
            UtilityKind::Gas => "gas",
        }
    }
}

impl fmt::Display for UtilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Unknown utility type")]
    UnknownUtility,
}

/// Parse a user-supplied amount. Must be a finite number greater than zero.
pub fn parse_amount(raw: &str) -> Result<f64, EstimateError> {
    let amount: f64 = raw.trim().parse().map_err(|_| EstimateError::InvalidAmount)?;
    validate_amount(amount)
}

pub fn validate_amount(amount: f64) -> Result<f64, EstimateError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(EstimateError::InvalidAmount)
    }
}

/// Result of converting an amount into units
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub kind: UtilityKind,
    pub amount: f64,
    pub quantity: f64,
}

/// Two-decimal rendering with exact ties rounded up.
///
/// `{:.2}` rounds ties to even. A value lands exactly on a tie only when it is
/// an odd number of eighths (`.125`, `.375`, `.625`, `.875`), which `x * 8.0`
/// detects without rounding error.
pub fn format_fixed2(value: f64) -> String {
    let eighths = value * 8.0;
    if eighths.is_finite() && eighths.fract() == 0.0 && eighths.rem_euclid(2.0) == 1.0 {
        format!("{:.2}", (value * 100.0).ceil() / 100.0)
    } else {
        format!("{:.2}", value)
    }
}

impl Estimate {
    /// Fails when the converted quantity overflows
    pub fn compute(kind: UtilityKind, amount: f64) -> Result<Self, EstimateError> {
        let quantity = amount * kind.rate();
        if !quantity.is_finite() {
            return Err(EstimateError::InvalidAmount);
        }
        Ok(Self { kind, amount, quantity })
    }

    /// Quantity rounded to two decimals, as shown to the user
    pub fn quantity_display(&self) -> String {
        format_fixed2(self.quantity)
    }

    pub fn message(&self) -> String {
        format!("Estimated units: {} {}", self.quantity_display(), self.kind.unit_label())
    }

    /// Line stored in the transaction log
    pub fn record(&self) -> String {
        format!(
            "{} {} for R{}",
            self.quantity_display(),
            self.kind.unit_label(),
            format_fixed2(self.amount)
        )
    }
}

/// Owns the transaction log and appends to it on every successful estimate
#[derive(Clone)]
pub struct UtilityEstimator {
    log: Arc<dyn TransactionLog>,
}

impl UtilityEstimator {
    pub fn new(log: Arc<dyn TransactionLog>) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &Arc<dyn TransactionLog> {
        &self.log
    }

    /// Validate, convert and record. Nothing is appended on error.
    pub fn estimate(&self, amount: f64, kind: UtilityKind) -> Result<Estimate, EstimateError> {
        let amount = validate_amount(amount)?;
        let estimate = Estimate::compute(kind, amount)?;

        self.log.append(Transaction::now(estimate.record()));
        tracing::debug!("Recorded transaction: {}", estimate.record());

        Ok(estimate)
    }

    /// Raw string inputs, as they arrive from a form or JSON body
    pub fn estimate_raw(&self, amount: &str, selector: &str) -> Result<Estimate, EstimateError> {
        let amount = parse_amount(amount)?;
        let kind = UtilityKind::from_selector(selector)?;
        self.estimate(amount, kind)
    }
}
