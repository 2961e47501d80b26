use poem::test::TestClient;
use poem::{Endpoint, Response};
use sentry::ClientInitGuard;

use crate::dataset::TrainingSource;
use crate::engine::Engine;
use crate::prelude::*;
use crate::web::create_app;

/// Creates a client for the application without the prediction history.
pub fn create_test_client(
    source: impl TrainingSource + 'static,
) -> Result<(ClientInitGuard, TestClient<impl Endpoint<Output = Response>>)> {
    let sentry_guard = crate::tracing::init(None, 0.0)?;
    let app = create_app(Arc::new(Engine::new(source)), None);
    Ok((sentry_guard, TestClient::new(app)))
}
