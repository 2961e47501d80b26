use std::borrow::Cow;

use sentry::integrations::tracing::EventFilter;
use sentry::{ClientInitGuard, ClientOptions};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::prelude::*;

/// Initialises tracing.
pub fn init(sentry_dsn: Option<String>, traces_sample_rate: f32) -> Result<ClientInitGuard> {
    let guard = sentry::init((
        sentry_dsn,
        ClientOptions {
            release: Some(Cow::Borrowed(env!("CARGO_PKG_VERSION"))),
            traces_sample_rate,
            ..Default::default()
        },
    ));

    let sentry_filter = EnvFilter::try_from_env("PRICE_PREDICTOR_SENTRY_LOG")
        .or_else(|_| EnvFilter::try_new("price_predictor=debug"))?;
    let sentry_layer = sentry::integrations::tracing::layer()
        .event_filter(|metadata| match metadata.level() {
            &Level::ERROR | &Level::WARN => EventFilter::Event,
            &Level::INFO | &Level::DEBUG | &Level::TRACE => EventFilter::Breadcrumb,
        })
        .span_filter(|metadata| matches!(metadata.level(), &Level::ERROR | &Level::WARN | &Level::INFO))
        .with_filter(sentry_filter);

    let format_filter = EnvFilter::try_from_env("PRICE_PREDICTOR_LOG")
        .or_else(|_| EnvFilter::try_new("price_predictor=info"))?;
    let format_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_filter(format_filter);

    // Tests share the global subscriber, so a second initialisation is not an error.
    let _ = tracing_subscriber::Registry::default()
        .with(sentry_layer)
        .with(format_layer)
        .try_init();

    Ok(guard)
}

pub fn format_elapsed(instant: Instant) -> String {
    humantime::format_duration(instant.elapsed()).to_string()
}
