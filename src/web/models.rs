//! Request and response bodies of the JSON API.

use serde::{Deserialize, Serialize};

use crate::database;
use crate::engine::PredictionQuery;
use crate::prelude::*;
use crate::regression::FittedModel;

/// Upper bound for a plausible square footage.
pub const MAX_SQUARE_FOOTAGE: f64 = 50000.0;

/// Upper bound for a plausible number of bedrooms.
pub const MAX_BEDROOMS: u32 = 20;

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct PredictRequest {
    pub sqft: f64,
    pub bedrooms: u32,
}

impl PredictRequest {
    pub fn validate(&self) -> StdResult<PredictionQuery, &'static str> {
        if !self.sqft.is_finite() || self.sqft <= 0.0 {
            return Err("please enter a valid square footage");
        }
        if self.sqft > MAX_SQUARE_FOOTAGE {
            return Err("square footage seems too large");
        }
        if self.bedrooms > MAX_BEDROOMS {
            return Err("number of bedrooms seems too large");
        }
        Ok(PredictionQuery {
            square_footage: self.sqft,
            bedrooms: self.bedrooms as f64,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub predicted_price: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub square_footage_weight: f64,
    pub bedrooms_weight: f64,
    pub bias: f64,
    pub n_rows: usize,
}

impl From<&FittedModel> for ModelResponse {
    fn from(model: &FittedModel) -> Self {
        Self {
            square_footage_weight: model.weights[0],
            bedrooms_weight: model.weights[1],
            bias: model.bias,
            n_rows: model.n_rows,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ListParams {
    #[serde(default)]
    pub sort: database::SortOrder,

    #[serde(default)]
    pub page: u64,
}

impl ListParams {
    pub const fn validate(&self) -> StdResult<(), &'static str> {
        match self.page > database::MAX_PAGE {
            true => Err("page number is too large"),
            false => Ok(()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub id: String,
    pub square_feet: f64,
    pub bedrooms: u32,
    pub predicted_price: f64,
    pub created_at: DateTime,
}

impl From<database::Prediction> for PredictionResponse {
    fn from(prediction: database::Prediction) -> Self {
        Self {
            id: prediction.id.to_hex(),
            square_feet: prediction.square_footage,
            bedrooms: prediction.bedrooms,
            predicted_price: prediction.predicted_price,
            created_at: prediction.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub items: Vec<PredictionResponse>,
    pub total: u64,
    pub has_more: bool,
}

impl From<database::Page> for PageResponse {
    fn from(page: database::Page) -> Self {
        Self {
            items: page.items.into_iter().map(PredictionResponse::from).collect(),
            total: page.total,
            has_more: page.has_more,
        }
    }
}
