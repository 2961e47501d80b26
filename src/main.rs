#![warn(clippy::all)]

use clap::Parser;

use crate::dataset::CsvTrainingSource;
use crate::engine::{Engine, PredictionQuery};
use crate::opts::{Command, Opts, PredictOpts};
use crate::prelude::*;

mod database;
mod dataset;
mod engine;
mod opts;
mod prelude;
mod regression;
mod tracing;
mod web;

#[tokio::main]
async fn main() -> Result {
    let opts = Opts::parse();
    let _sentry_guard = crate::tracing::init(opts.sentry_dsn, opts.traces_sample_rate)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting…");

    let result = match opts.subcommand {
        Command::Web(opts) => web::run(opts).await,
        Command::Predict(opts) => predict(opts).await,
    };
    if let Err(error) = &result {
        error!("fatal error: {:#}", error);
    }
    result
}

async fn predict(opts: PredictOpts) -> Result {
    let engine = Engine::new(CsvTrainingSource::new(&opts.training_set.path));
    engine
        .ensure_trained()
        .await
        .context("failed to train the model")?;
    let price = engine.predict(&PredictionQuery {
        square_footage: opts.square_footage,
        bedrooms: opts.bedrooms as f64,
    })?;
    info!(square_footage = opts.square_footage, bedrooms = opts.bedrooms, price, "predicted");
    println!("{:.0}", price);
    Ok(())
}
