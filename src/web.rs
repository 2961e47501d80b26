use mongodb::Database;
use poem::listener::TcpListener;
use poem::middleware::{CatchPanic, Tracing};
use poem::{delete, get, patch, post, Endpoint, EndpointExt, Response, Route, Server};
use tokio::signal::ctrl_c;

use crate::dataset::CsvTrainingSource;
use crate::engine::Engine;
use crate::opts::WebOpts;
use crate::prelude::*;
use crate::web::middleware::{ErrorMiddleware, SecurityHeaders, SentryMiddleware};

mod middleware;
mod models;
mod responses;
mod views;

#[cfg(test)]
mod test;

const SHUTDOWN_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[instrument(skip_all, fields(host = %opts.host, port = opts.port))]
pub async fn run(opts: WebOpts) -> Result {
    sentry::configure_scope(|scope| scope.set_tag("app", "web"));

    let engine = Arc::new(Engine::new(CsvTrainingSource::new(&opts.training_set.path)));
    if opts.eager_training {
        engine
            .ensure_trained()
            .await
            .context("failed to train the model")?;
    }

    let database = match &opts.mongodb_uri {
        Some(uri) => Some(crate::database::open(uri).await?),
        None => {
            warn!("MongoDB URI is not specified, the prediction history is disabled");
            None
        }
    };

    let app = create_app(engine, database);
    info!("listening…");
    Server::new(TcpListener::bind((opts.host, opts.port)))
        .run_with_graceful_shutdown(
            app,
            async {
                let _ = ctrl_c().await;
                info!("shutting down…");
            },
            Some(SHUTDOWN_TIMEOUT),
        )
        .await?;
    Ok(())
}

/// Builds the application, the history routes are mounted only with a database.
pub fn create_app(engine: Arc<Engine>, database: Option<Database>) -> impl Endpoint<Output = Response> {
    let mut app = Route::new()
        .at("/health", get(views::health::get_health))
        .at("/api/predict", post(views::predict::post_predict))
        .at("/api/model", get(views::model::get_model));
    if let Some(database) = database {
        app = app
            .at(
                "/api/predictions",
                get(views::predictions::list_predictions.data(database.clone()))
                    .post(views::predictions::create_prediction.data(database.clone())),
            )
            .at(
                "/api/predictions/:id",
                patch(views::predictions::update_prediction.data(database.clone()))
                    .delete(views::predictions::delete_prediction.data(database)),
            );
    }
    app.data(engine)
        .with(Tracing)
        .with(CatchPanic::new())
        .with(ErrorMiddleware)
        .with(SecurityHeaders)
        .with(SentryMiddleware)
}
