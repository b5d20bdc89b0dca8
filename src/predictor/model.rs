//! Per-utility usage model

use super::network::{Mlp, TrainingConfig};
use super::samples::{self, FeatureBounds, Features, DEFAULT_SAMPLE_COUNT};
use crate::estimator::UtilityKind;
use rand::Rng;

/// Hidden layer widths between the 3 inputs and the scalar output
pub const TOPOLOGY: [usize; 4] = [samples::FEATURE_COUNT, 16, 8, 1];

/// A trained regressor for one utility
#[derive(Debug, Clone)]
pub struct UsageModel {
    kind: UtilityKind,
    network: Mlp,
    bounds: FeatureBounds,
    ceiling: f64,
    epoch_losses: Vec<f64>,
}

impl UsageModel {
    /// Generate synthetic samples and fit a fresh network on them
    pub fn train<R: Rng>(kind: UtilityKind, rng: &mut R) -> Self {
        Self::train_with(kind, DEFAULT_SAMPLE_COUNT, &TrainingConfig::default(), rng)
    }

    pub fn train_with<R: Rng>(kind: UtilityKind, sample_count: usize, config: &TrainingConfig, rng: &mut R) -> Self {
        let bounds = FeatureBounds::for_kind(kind);
        let ceiling = samples::usage_ceiling(kind);

        let data: Vec<(Vec<f64>, f64)> = samples::generate(kind, sample_count, rng)
            .into_iter()
            .map(|s| (bounds.normalize(&s.features).to_vec(), s.daily_usage / ceiling))
            .collect();

        let mut network = Mlp::new(&TOPOLOGY, rng);
        let epoch_losses = network.fit(&data, config, rng);

        tracing::info!(
            "Trained {} usage model on {} samples (final loss {:.6})",
            kind,
            data.len(),
            epoch_losses.last().copied().unwrap_or(f64::NAN)
        );

        Self {
            kind,
            network,
            bounds,
            ceiling,
            epoch_losses,
        }
    }

    pub fn kind(&self) -> UtilityKind {
        self.kind
    }

    pub fn epoch_losses(&self) -> &[f64] {
        &self.epoch_losses
    }

    /// Training blew up: some epoch produced a non-finite loss
    pub fn diverged(&self) -> bool {
        self.epoch_losses.iter().any(|l| !l.is_finite())
    }

    /// Predicted daily usage in the utility's own unit
    pub fn predict_daily(&self, features: &Features) -> f64 {
        self.network.predict(&self.bounds.normalize(features)) * self.ceiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_electricity_prediction_near_formula() {
        let mut rng = StdRng::seed_from_u64(2024);
        let model = UsageModel::train(UtilityKind::Electricity, &mut rng);

        // Midpoint household: 20h fridge, 2h geyser, 4h TV
        let features = [20.0, 2.0, 4.0];
        let expected = samples::daily_usage(UtilityKind::Electricity, &features);
        let predicted = model.predict_daily(&features);

        let tolerance = 0.3 * samples::usage_ceiling(UtilityKind::Electricity);
        assert!(
            (predicted - expected).abs() < tolerance,
            "predicted {:.3} kWh, formula says {:.3}",
            predicted,
            expected
        );
    }

    #[test]
    fn test_training_records_epoch_losses() {
        let mut rng = StdRng::seed_from_u64(5);
        let model = UsageModel::train(UtilityKind::Gas, &mut rng);
        assert_eq!(model.kind(), UtilityKind::Gas);

        let losses = model.epoch_losses();
        assert_eq!(losses.len(), TrainingConfig::default().epochs);
        assert!(losses[losses.len() - 1] < losses[0]);
        assert!(!model.diverged());
    }

    #[test]
    fn test_non_finite_loss_marks_divergence() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut model = UsageModel::train_with(UtilityKind::Water, 64, &TrainingConfig::default(), &mut rng);
        model.epoch_losses.push(f64::NAN);
        assert!(model.diverged());
    }
}
