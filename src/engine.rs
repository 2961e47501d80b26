//! Fit-once, predict-many regression engine.

use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::task::{spawn, spawn_blocking};
use tracing::Instrument;

use crate::dataset::TrainingSource;
use crate::prelude::*;
use crate::regression::{FittedModel, TrainingError};
use crate::tracing::format_elapsed;

#[derive(Debug, Error)]
#[error("the model is not trained yet")]
pub struct ModelNotTrainedError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionQuery {
    pub square_footage: f64,
    pub bedrooms: f64,
}

/// Owns the training source and the single fitted model slot.
///
/// The host constructs one engine at startup and shares it via [`Arc`].
pub struct Engine {
    source: Arc<dyn TrainingSource>,
    model: Arc<OnceCell<FittedModel>>,
}

impl Engine {
    pub fn new(source: impl TrainingSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            model: Arc::new(OnceCell::new()),
        }
    }

    /// Trains the model unless it is already trained.
    ///
    /// Concurrent callers wait for the single in-flight training. On failure the
    /// slot stays empty, and the next call starts over.
    ///
    /// The training runs in its own task: a caller dropped mid-way leaves it running,
    /// and later callers wait for that same training instead of starting another one.
    #[instrument(skip_all)]
    pub async fn ensure_trained(&self) -> StdResult<(), TrainingError> {
        if self.model.initialized() {
            return Ok(());
        }
        let model = Arc::clone(&self.model);
        let source = Arc::clone(&self.source);
        let task = async move { model.get_or_try_init(|| train(source)).await.map(|_| ()) };
        spawn(task.in_current_span())
            .await
            .map_err(|_| TrainingError::Interrupted)?
    }

    /// Returns the fitted model, if any.
    pub fn model(&self) -> Option<&FittedModel> {
        self.model.get()
    }

    pub fn predict(&self, query: &PredictionQuery) -> StdResult<f64, ModelNotTrainedError> {
        let model = self.model.get().ok_or(ModelNotTrainedError)?;
        Ok(model.predict(query.square_footage, query.bedrooms))
    }
}

async fn train(source: Arc<dyn TrainingSource>) -> StdResult<FittedModel, TrainingError> {
    info!(source = source.describe().as_str(), "training…");
    let start_instant = Instant::now();
    let model = spawn_blocking(move || FittedModel::fit(&source.load()?))
        .await
        .map_err(|_| TrainingError::Interrupted)??;
    info!(
        n_rows = model.n_rows,
        square_footage_weight = model.weights[0],
        bedrooms_weight = model.weights[1],
        bias = model.bias,
        elapsed = format_elapsed(start_instant).as_str(),
        "trained",
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::dataset::{DataSourceError, InMemoryTrainingSource, TrainingRow};

    fn scenario_rows() -> Vec<TrainingRow> {
        [(1000.0, 2, 210000.0), (1500.0, 3, 300000.0), (2000.0, 4, 390000.0)]
            .into_iter()
            .map(|(square_footage, bedrooms, price)| TrainingRow {
                square_footage,
                bedrooms,
                price,
            })
            .collect()
    }

    fn plane_rows() -> Vec<TrainingRow> {
        [(800.0, 1), (1200.0, 3), (1500.0, 2), (2100.0, 4), (2500.0, 3), (3000.0, 5)]
            .into_iter()
            .map(|(square_footage, bedrooms)| TrainingRow {
                square_footage,
                bedrooms,
                price: 100.0 * square_footage + 5000.0 * bedrooms as f64 + 20000.0,
            })
            .collect()
    }

    /// Counts the loads and serves whatever rows are currently set.
    #[derive(Clone)]
    struct CountingSource {
        n_loads: Arc<AtomicUsize>,
        rows: Arc<Mutex<Option<Vec<TrainingRow>>>>,
        delay: StdDuration,
    }

    impl CountingSource {
        fn new(rows: Option<Vec<TrainingRow>>) -> Self {
            Self {
                n_loads: Arc::new(AtomicUsize::new(0)),
                rows: Arc::new(Mutex::new(rows)),
                delay: StdDuration::ZERO,
            }
        }

        fn n_loads(&self) -> usize {
            self.n_loads.load(Ordering::SeqCst)
        }
    }

    impl TrainingSource for CountingSource {
        fn load(&self) -> StdResult<Vec<TrainingRow>, DataSourceError> {
            self.n_loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            let rows = self.rows.lock().map_err(|_| DataSourceError::Empty)?;
            rows.clone()
                .ok_or(DataSourceError::MissingColumn { column: crate::dataset::PRICE_COLUMN })
        }

        fn describe(&self) -> String {
            "counting source".to_string()
        }
    }

    #[tokio::test]
    async fn predict_before_training_fails() {
        let engine = Engine::new(InMemoryTrainingSource::new(scenario_rows()));
        let query = PredictionQuery {
            square_footage: 1200.0,
            bedrooms: 2.0,
        };
        assert!(engine.predict(&query).is_err());
        assert!(engine.model().is_none());
    }

    #[tokio::test]
    async fn ensure_trained_is_idempotent() -> crate::Result {
        let source = CountingSource::new(Some(plane_rows()));
        let engine = Engine::new(source.clone());

        engine.ensure_trained().await?;
        let first = *engine.model().context("model is not cached")?;
        for _ in 0..4 {
            engine.ensure_trained().await?;
            let model = engine.model().context("model is not cached")?;
            assert_eq!(model.weights[0].to_bits(), first.weights[0].to_bits());
            assert_eq!(model.weights[1].to_bits(), first.weights[1].to_bits());
            assert_eq!(model.bias.to_bits(), first.bias.to_bits());
        }
        assert_eq!(source.n_loads(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn predict_reproduces_generating_plane() -> crate::Result {
        let engine = Engine::new(InMemoryTrainingSource::new(plane_rows()));
        engine.ensure_trained().await?;
        let price = engine.predict(&PredictionQuery {
            square_footage: 1750.0,
            bedrooms: 2.0,
        })?;
        assert!((price - 205000.0).abs() < 1e-6, "{price}");
        Ok(())
    }

    #[tokio::test]
    async fn collinear_scenario_ok() -> crate::Result {
        let engine = Engine::new(InMemoryTrainingSource::new(scenario_rows()));
        engine.ensure_trained().await?;
        let price = engine.predict(&PredictionQuery {
            square_footage: 1200.0,
            bedrooms: 2.0,
        })?;
        // The rows lie on `price = 180·sqft + 30000` with `bedrooms = sqft / 500`.
        // The minimum-norm weights put a small share on bedrooms, hence the tolerance.
        assert!((price - 246000.0).abs() / 246000.0 < 1e-5, "{price}");
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_train_once() -> crate::Result {
        let mut source = CountingSource::new(Some(plane_rows()));
        source.delay = StdDuration::from_millis(100);
        let engine = Arc::new(Engine::new(source.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine.ensure_trained().await?;
                    engine.model().copied().context("model is not cached")
                })
            })
            .collect();
        let mut models = Vec::new();
        for handle in handles {
            models.push(handle.await??);
        }

        assert_eq!(source.n_loads(), 1);
        assert!(models.iter().all(|model| *model == models[0]));
        Ok(())
    }

    #[tokio::test]
    async fn failed_training_leaves_slot_empty() -> crate::Result {
        let source = CountingSource::new(None);
        let engine = Engine::new(source.clone());

        let error = engine.ensure_trained().await.unwrap_err();
        assert!(matches!(error, TrainingError::DataSource(DataSourceError::MissingColumn { .. })));
        assert!(engine.model().is_none());
        assert!(engine
            .predict(&PredictionQuery {
                square_footage: 1000.0,
                bedrooms: 1.0,
            })
            .is_err());

        *source.rows.lock().map_err(|_| anyhow!("poisoned"))? = Some(plane_rows());
        engine.ensure_trained().await?;
        assert!(engine.model().is_some());
        assert_eq!(source.n_loads(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_caller_does_not_restart_training() -> crate::Result {
        let mut source = CountingSource::new(Some(plane_rows()));
        source.delay = StdDuration::from_millis(300);
        let engine = Engine::new(source.clone());

        let result = tokio::time::timeout(StdDuration::from_millis(50), engine.ensure_trained()).await;
        assert!(result.is_err(), "training should still be running");
        assert!(engine.model().is_none());

        engine.ensure_trained().await?;
        assert!(engine.model().is_some());
        assert_eq!(source.n_loads(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn insufficient_rows_fail() {
        let rows = scenario_rows().into_iter().take(1).collect();
        let engine = Engine::new(InMemoryTrainingSource::new(rows));
        assert!(matches!(
            engine.ensure_trained().await,
            Err(TrainingError::InsufficientData { n_rows: 1 })
        ));
        assert!(engine.model().is_none());
    }
}
