//! Model Registry
//!
//! Trained models keyed by utility. A model is trained on first request and
//! evicted after the configured time-to-live; the next request retrains it.
//! Concurrent requests for a missing model wait on a single training run.

use super::model::UsageModel;
use super::PredictError;
use crate::estimator::UtilityKind;
use moka::future::Cache;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct ModelRegistry {
    cache: Cache<UtilityKind, Arc<UsageModel>>,
    /// Fixed seed per utility; `None` uses OS entropy
    seed: Option<u64>,
    trainings: Arc<AtomicUsize>,
}

impl ModelRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self::build(ttl, None)
    }

    /// Deterministic training, for tests and reproducible demos
    pub fn seeded(ttl: Duration, seed: u64) -> Self {
        Self::build(ttl, Some(seed))
    }

    fn build(ttl: Duration, seed: Option<u64>) -> Self {
        let cache = Cache::builder()
            .max_capacity(UtilityKind::ALL.len() as u64)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            seed,
            trainings: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of training runs started so far
    pub fn trainings(&self) -> usize {
        self.trainings.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub async fn contains(&self, kind: UtilityKind) -> bool {
        self.cache.get(&kind).await.is_some()
    }

    /// Drop a model so the next lookup retrains it
    pub async fn invalidate(&self, kind: UtilityKind) {
        self.cache.invalidate(&kind).await;
    }

    pub async fn get_or_train(&self, kind: UtilityKind) -> Result<Arc<UsageModel>, PredictError> {
        let seed = self.seed.map(|s| s.wrapping_add(kind as u64));
        let trainings = Arc::clone(&self.trainings);

        self.cache
            .try_get_with(kind, async move {
                trainings.fetch_add(1, Ordering::Relaxed);
                tracing::info!("No cached {} model, training", kind);

                let model = tokio::task::spawn_blocking(move || {
                    let mut rng = match seed {
                        Some(s) => StdRng::seed_from_u64(s),
                        None => StdRng::from_entropy(),
                    };
                    Arc::new(UsageModel::train(kind, &mut rng))
                })
                .await;

                match model {
                    Ok(model) if model.diverged() => {
                        Err(PredictError::Training(format!("{} model diverged", model.kind())))
                    }
                    Ok(model) => Ok(model),
                    Err(e) => Err(PredictError::Training(e.to_string())),
                }
            })
            .await
            .map_err(|e: Arc<PredictError>| (*e).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trains_once_and_caches() {
        let registry = ModelRegistry::seeded(Duration::from_secs(60), 1);
        assert!(!registry.contains(UtilityKind::Water).await);

        let first = registry.get_or_train(UtilityKind::Water).await.unwrap();
        let second = registry.get_or_train(UtilityKind::Water).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.trainings(), 1);
        assert!(registry.contains(UtilityKind::Water).await);
    }

    #[tokio::test]
    async fn test_models_are_keyed_by_utility() {
        let registry = ModelRegistry::seeded(Duration::from_secs(60), 1);
        let gas = registry.get_or_train(UtilityKind::Gas).await.unwrap();
        let elec = registry.get_or_train(UtilityKind::Electricity).await.unwrap();

        assert_eq!(gas.kind(), UtilityKind::Gas);
        assert_eq!(elec.kind(), UtilityKind::Electricity);
        assert_eq!(registry.trainings(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_training() {
        let registry = ModelRegistry::seeded(Duration::from_secs(60), 9);
        let (a, b) = tokio::join!(
            registry.get_or_train(UtilityKind::Gas),
            registry.get_or_train(UtilityKind::Gas)
        );
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(registry.trainings(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_retrain() {
        let registry = ModelRegistry::seeded(Duration::from_secs(60), 3);
        registry.get_or_train(UtilityKind::Gas).await.unwrap();
        registry.invalidate(UtilityKind::Gas).await;
        registry.get_or_train(UtilityKind::Gas).await.unwrap();
        assert_eq!(registry.trainings(), 2);
    }

    #[tokio::test]
    async fn test_expired_model_is_retrained() {
        let registry = ModelRegistry::seeded(Duration::from_millis(50), 4);
        registry.get_or_train(UtilityKind::Gas).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        registry.get_or_train(UtilityKind::Gas).await.unwrap();
        assert_eq!(registry.trainings(), 2);
    }
}
