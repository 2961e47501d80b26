//! Prediction history.

use mongodb::bson::oid::ObjectId;
use mongodb::Database;
use poem::http::StatusCode;
use poem::web::{Data, Json, Path, Query};
use poem::{handler, IntoResponse, Response};

use crate::database::Prediction;
use crate::engine::Engine;
use crate::prelude::*;
use crate::web::models::{ListParams, PageResponse, PredictRequest, PredictionResponse};
use crate::web::responses::error_response;
use crate::web::views::predict::estimate;

#[handler]
#[instrument(skip_all, level = "info", fields(sort = params.sort.to_str(), page = params.page))]
pub async fn list_predictions(
    Query(params): Query<ListParams>,
    Data(database): Data<&Database>,
) -> Result<Response> {
    if let Err(message) = params.validate() {
        return Ok(error_response(StatusCode::BAD_REQUEST, message));
    }
    let page = Prediction::retrieve_page(database, params.sort, params.page).await?;
    Ok(Json(PageResponse::from(page)).into_response())
}

#[handler]
#[instrument(skip_all, level = "info")]
pub async fn create_prediction(
    Json(request): Json<PredictRequest>,
    Data(engine): Data<&Arc<Engine>>,
    Data(database): Data<&Database>,
) -> Result<Response> {
    let predicted_price = match estimate(engine, &request).await {
        Ok(predicted_price) => predicted_price,
        Err(response) => return Ok(response),
    };
    let prediction = Prediction::new(request.sqft, request.bedrooms, predicted_price);
    prediction.insert(database).await?;
    info!(id = %prediction.id, predicted_price, "created");
    Ok(Json(PredictionResponse::from(prediction))
        .with_status(StatusCode::CREATED)
        .into_response())
}

/// Re-predicts the price for the new inputs and updates the stored prediction.
#[handler]
#[instrument(skip_all, level = "info", fields(id = id.as_str()))]
pub async fn update_prediction(
    Path(id): Path<String>,
    Json(request): Json<PredictRequest>,
    Data(engine): Data<&Arc<Engine>>,
    Data(database): Data<&Database>,
) -> Result<Response> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let predicted_price = match estimate(engine, &request).await {
        Ok(predicted_price) => predicted_price,
        Err(response) => return Ok(response),
    };
    let prediction =
        Prediction::update(database, id, request.sqft, request.bedrooms, predicted_price).await?;
    match prediction {
        Some(prediction) => Ok(Json(PredictionResponse::from(prediction)).into_response()),
        None => Ok(not_found()),
    }
}

#[handler]
#[instrument(skip_all, level = "info", fields(id = id.as_str()))]
pub async fn delete_prediction(
    Path(id): Path<String>,
    Data(database): Data<&Database>,
) -> Result<Response> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    match Prediction::delete(database, id).await? {
        true => Ok(StatusCode::NO_CONTENT.into_response()),
        false => Ok(not_found()),
    }
}

fn parse_id(id: &str) -> StdResult<ObjectId, Response> {
    ObjectId::parse_str(id)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("`{}` is not a valid ID", id)))
}

fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "prediction not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_ok() {
        let id = ObjectId::new();
        assert_eq!(parse_id(&id.to_hex()).ok(), Some(id));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        match parse_id("not-an-id") {
            Err(response) => assert_eq!(response.status(), StatusCode::BAD_REQUEST),
            Ok(_) => unreachable!(),
        }
    }
}
