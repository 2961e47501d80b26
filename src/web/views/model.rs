use poem::http::StatusCode;
use poem::web::{Data, Json};
use poem::{handler, IntoResponse, Response};

use crate::engine::Engine;
use crate::prelude::*;
use crate::web::models::ModelResponse;
use crate::web::responses::error_response;

/// Exposes the coefficients of the fitted model.
#[handler]
#[instrument(skip_all, level = "info")]
pub async fn get_model(Data(engine): Data<&Arc<Engine>>) -> Response {
    match engine.model() {
        Some(model) => Json(ModelResponse::from(model)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "the model is not trained yet"),
    }
}
