//! Usage Predictor
//!
//! Predicts a household's daily usage of a utility from synthetic appliance
//! data and turns it into a suggested top-up amount:
//! - `samples`: synthetic feature generation and normalisation bounds
//! - `network`: the dense regressor and its Adam trainer
//! - `model`: one trained regressor per utility
//! - `registry`: TTL cache of trained models
//! - `topup`: period parsing and amount arithmetic

pub mod model;
pub mod network;
pub mod registry;
pub mod samples;
pub mod topup;

pub use model::UsageModel;
pub use registry::ModelRegistry;
pub use topup::TopUpPeriod;

use crate::estimator::{format_fixed2, UtilityKind};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("Unknown utility type")]
    UnknownUtility,

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Model training failed: {0}")]
    Training(String),
}

/// Predicted usage and the amount needed to cover the requested period
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub utility: UtilityKind,
    pub unit: &'static str,
    pub daily_usage: f64,
    pub days: u32,
    pub duration_label: String,
    pub top_up_amount: f64,
}

impl Suggestion {
    pub fn message(&self) -> String {
        format!(
            "Predicted Daily {}: {}\nTop-Up for {}: R{}",
            self.unit,
            format_fixed2(self.daily_usage),
            self.duration_label,
            format_fixed2(self.top_up_amount)
        )
    }
}

#[derive(Clone)]
pub struct UsagePredictor {
    registry: ModelRegistry,
    seed: Option<u64>,
}

impl UsagePredictor {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry, seed: None }
    }

    /// Fix the prediction-input sampling as well as training
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Predict daily usage for a typical household and size the top-up for `period`
    pub async fn suggest(
        &self,
        kind: UtilityKind,
        period: TopUpPeriod,
        today: NaiveDate,
    ) -> Result<Suggestion, PredictError> {
        let model = self.registry.get_or_train(kind).await?;

        let mut rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let typical = samples::mean_features(&samples::generate(kind, samples::DEFAULT_SAMPLE_COUNT, &mut rng));
        let daily_usage = model.predict_daily(&typical);
        if !daily_usage.is_finite() {
            // a bad model stays cached until its TTL otherwise
            self.registry.invalidate(kind).await;
            return Err(PredictError::Training(format!("non-finite {} prediction", kind)));
        }

        let days = period.days(today);
        let top_up_amount = topup::top_up_amount(daily_usage, days, kind.rate());

        tracing::debug!(
            "Predicted {:.3} {}/day for {}, {} days -> R{:.2}",
            daily_usage,
            kind.unit_label(),
            kind,
            days,
            top_up_amount
        );

        Ok(Suggestion {
            utility: kind,
            unit: kind.unit_label(),
            daily_usage,
            days,
            duration_label: period.label(),
            top_up_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_suggest_for_fixed_days() {
        let predictor = UsagePredictor::new(ModelRegistry::seeded(Duration::from_secs(60), 17)).with_seed(17);
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let s = predictor
            .suggest(UtilityKind::Water, TopUpPeriod::Days(7), today)
            .await
            .unwrap();

        assert_eq!(s.unit, "liters");
        assert_eq!(s.days, 7);
        assert_eq!(s.duration_label, "7 Days");
        assert!((s.top_up_amount - s.daily_usage * 7.0 / 40.0).abs() < 1e-9);
        assert!(s.message().starts_with("Predicted Daily liters: "));
        assert!(s.message().contains("Top-Up for 7 Days: R"));
    }

    #[tokio::test]
    async fn test_suggest_for_rest_of_month() {
        let predictor = UsagePredictor::new(ModelRegistry::seeded(Duration::from_secs(60), 2)).with_seed(2);
        let today = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();

        let s = predictor
            .suggest(UtilityKind::Gas, TopUpPeriod::Month, today)
            .await
            .unwrap();

        assert_eq!(s.days, 10);
        assert_eq!(s.duration_label, "1 Month");
        assert_eq!(predictor.registry().trainings(), 1);
    }
}
