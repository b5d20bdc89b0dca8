//! Synthetic household usage samples
//!
//! Each utility has three appliance-level features drawn uniformly from fixed
//! ranges and a daily usage target computed from a linear formula.

use crate::estimator::UtilityKind;
use rand::Rng;

pub const FEATURE_COUNT: usize = 3;

/// Samples generated per training run (and per prediction input)
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

pub type Features = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Features,
    pub daily_usage: f64,
}

/// Inclusive-exclusive `[min, max)` per feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBounds {
    pub min: Features,
    pub max: Features,
}

impl FeatureBounds {
    pub fn for_kind(kind: UtilityKind) -> Self {
        match kind {
            // fridge hours, geyser hours, TV hours
            UtilityKind::Electricity => Self { min: [16.0, 0.0, 0.0], max: [24.0, 4.0, 8.0] },
            // shower minutes, dish-washing minutes, washing machine loads
            UtilityKind::Water => Self { min: [0.0, 0.0, 0.0], max: [15.0, 20.0, 2.0] },
            // stove hours, heater hours, oven hours
            UtilityKind::Gas => Self { min: [0.0, 0.0, 0.0], max: [3.0, 5.0, 2.0] },
        }
    }

    /// Scale each feature into [0, 1]
    pub fn normalize(&self, features: &Features) -> Features {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (features[i] - self.min[i]) / (self.max[i] - self.min[i]);
        }
        out
    }
}

/// Per-feature usage coefficients
fn coefficients(kind: UtilityKind) -> Features {
    match kind {
        UtilityKind::Electricity => [0.1, 4.0, 0.15], // kWh per hour
        UtilityKind::Water => [9.0, 6.0, 50.0],       // liters per minute / per load
        UtilityKind::Gas => [0.03, 0.05, 0.04],       // m³ per hour
    }
}

/// Daily usage implied by the appliance features
pub fn daily_usage(kind: UtilityKind, features: &Features) -> f64 {
    coefficients(kind)
        .iter()
        .zip(features)
        .map(|(c, x)| c * x)
        .sum()
}

/// Target range used for normalisation: `[0, usage at max features]`
pub fn usage_ceiling(kind: UtilityKind) -> f64 {
    daily_usage(kind, &FeatureBounds::for_kind(kind).max)
}

pub fn generate<R: Rng>(kind: UtilityKind, count: usize, rng: &mut R) -> Vec<Sample> {
    let bounds = FeatureBounds::for_kind(kind);
    (0..count)
        .map(|_| {
            let mut features = [0.0; FEATURE_COUNT];
            for (i, f) in features.iter_mut().enumerate() {
                *f = rng.gen_range(bounds.min[i]..bounds.max[i]);
            }
            Sample {
                daily_usage: daily_usage(kind, &features),
                features,
            }
        })
        .collect()
}

/// Column means; zeros for an empty slice
pub fn mean_features(samples: &[Sample]) -> Features {
    let mut sums = [0.0; FEATURE_COUNT];
    for s in samples {
        for i in 0..FEATURE_COUNT {
            sums[i] += s.features[i];
        }
    }
    if !samples.is_empty() {
        for v in sums.iter_mut() {
            *v /= samples.len() as f64;
        }
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_samples_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for kind in UtilityKind::ALL {
            let bounds = FeatureBounds::for_kind(kind);
            let samples = generate(kind, 500, &mut rng);
            assert_eq!(samples.len(), 500);
            for s in &samples {
                for i in 0..FEATURE_COUNT {
                    assert!(s.features[i] >= bounds.min[i] && s.features[i] < bounds.max[i]);
                }
                assert_relative_eq!(s.daily_usage, daily_usage(kind, &s.features));
                assert!(s.daily_usage <= usage_ceiling(kind));
            }
        }
    }

    #[test]
    fn test_usage_ceilings() {
        assert_relative_eq!(usage_ceiling(UtilityKind::Electricity), 24.0 * 0.1 + 16.0 + 1.2, epsilon = 1e-9);
        assert_relative_eq!(usage_ceiling(UtilityKind::Water), 355.0, epsilon = 1e-9);
        assert_relative_eq!(usage_ceiling(UtilityKind::Gas), 0.42, epsilon = 1e-9);
    }

    #[test]
    fn test_normalize() {
        let bounds = FeatureBounds::for_kind(UtilityKind::Electricity);
        assert_eq!(bounds.normalize(&[16.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
        assert_eq!(bounds.normalize(&[20.0, 2.0, 8.0]), [0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_mean_features_near_midpoint() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples = generate(UtilityKind::Water, 5000, &mut rng);
        let mean = mean_features(&samples);
        assert_relative_eq!(mean[0], 7.5, epsilon = 0.5);
        assert_relative_eq!(mean[1], 10.0, epsilon = 0.7);
        assert_relative_eq!(mean[2], 1.0, epsilon = 0.1);

        assert_eq!(mean_features(&[]), [0.0; FEATURE_COUNT]);
    }
}
