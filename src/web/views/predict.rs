use poem::http::StatusCode;
use poem::web::{Data, Json};
use poem::{handler, IntoResponse, Response};

use crate::engine::Engine;
use crate::prelude::*;
use crate::web::models::{PredictRequest, PredictResponse};
use crate::web::responses::error_response;

#[handler]
#[instrument(skip_all, level = "info", fields(sqft = request.sqft, bedrooms = request.bedrooms))]
pub async fn post_predict(
    Json(request): Json<PredictRequest>,
    Data(engine): Data<&Arc<Engine>>,
) -> Response {
    match estimate(engine, &request).await {
        Ok(predicted_price) => Json(PredictResponse { predicted_price }).into_response(),
        Err(response) => response,
    }
}

/// Validates the request, trains the model if needed, and predicts the rounded price.
pub async fn estimate(engine: &Engine, request: &PredictRequest) -> StdResult<f64, Response> {
    let query = request
        .validate()
        .map_err(|message| error_response(StatusCode::BAD_REQUEST, message))?;
    if let Err(error) = engine.ensure_trained().await {
        error!("failed to train the model: {:#}", error);
        return Err(unavailable());
    }
    let price = engine.predict(&query).map_err(|error| {
        error!("failed to predict: {:#}", error);
        unavailable()
    })?;
    debug!(price, "predicted");
    Ok(price.round())
}

fn unavailable() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "prediction unavailable")
}
