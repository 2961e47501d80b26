//! Ordinary least squares over the two property features.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::dataset::{DataSourceError, TrainingRow};

/// Singular values below `max σ × RELATIVE_TOLERANCE` are treated as zero.
const RELATIVE_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error("insufficient data: {n_rows} training row(s)")]
    InsufficientData { n_rows: usize },

    #[error("least squares solver failed: {0}")]
    Solver(&'static str),

    #[error("training was interrupted")]
    Interrupted,
}

/// Linear model `price = w₁·square_footage + w₂·bedrooms + bias`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedModel {
    /// Square footage and bedrooms weights, in this order.
    pub weights: [f64; 2],

    pub bias: f64,

    /// Number of rows the model has been fitted on.
    pub n_rows: usize,
}

impl FittedModel {
    /// Fits the model by minimising the sum of squared residuals.
    ///
    /// The features and the target are centred first, so the intercept is left
    /// out of the decomposition and recovered from the means. For rank-deficient
    /// features the minimum-norm weights are returned.
    pub fn fit(rows: &[TrainingRow]) -> Result<Self, TrainingError> {
        if rows.len() <= 1 {
            return Err(TrainingError::InsufficientData { n_rows: rows.len() });
        }

        let n_rows = rows.len() as f64;
        let mean_square_footage = rows.iter().map(|row| row.square_footage).sum::<f64>() / n_rows;
        let mean_bedrooms = rows.iter().map(|row| row.bedrooms as f64).sum::<f64>() / n_rows;
        let mean_price = rows.iter().map(|row| row.price).sum::<f64>() / n_rows;

        let features = DMatrix::from_fn(rows.len(), 2, |i, j| match j {
            0 => rows[i].square_footage - mean_square_footage,
            _ => rows[i].bedrooms as f64 - mean_bedrooms,
        });
        let target = DVector::from_fn(rows.len(), |i, _| rows[i].price - mean_price);

        let weights = if features.iter().all(|x| *x == 0.0) {
            // Constant features carry no signal, the bias alone is the best fit.
            DVector::zeros(2)
        } else {
            let svd = features.svd(true, true);
            let eps = svd.singular_values.max() * RELATIVE_TOLERANCE;
            svd.solve(&target, eps).map_err(TrainingError::Solver)?
        };

        let weights = [weights[0], weights[1]];
        let bias = mean_price - weights[0] * mean_square_footage - weights[1] * mean_bedrooms;
        if !weights.iter().chain([&bias]).all(|value| value.is_finite()) {
            return Err(TrainingError::Solver("non-finite coefficients"));
        }

        Ok(Self {
            weights,
            bias,
            n_rows: rows.len(),
        })
    }

    /// Evaluates the model. Inputs outside the training domain are extrapolated.
    #[must_use]
    pub fn predict(&self, square_footage: f64, bedrooms: f64) -> f64 {
        self.weights[0] * square_footage + self.weights[1] * bedrooms + self.bias
    }
}
