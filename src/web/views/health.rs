use poem::http::StatusCode;
use poem::{handler, IntoResponse, Response};

use crate::prelude::*;

#[handler]
#[instrument(skip_all, level = "debug")]
pub async fn get_health() -> Result<impl IntoResponse> {
    Ok(Response::from(StatusCode::NO_CONTENT))
}
