//! CLI options.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod parsers;

#[derive(Parser)]
#[command(author, version, about, rename_all = "kebab-case")]
pub struct Opts {
    /// Sentry DSN
    #[arg(short, long, env = "SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance monitoring sample rate for Sentry
    #[arg(long, default_value = "0", env = "PRICE_PREDICTOR_TRACES_SAMPLE_RATE")]
    pub traces_sample_rate: f32,

    #[command(subcommand)]
    pub subcommand: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Web(WebOpts),
    Predict(PredictOpts),
}

#[derive(Args)]
pub struct TrainingSetOpts {
    /// Training set CSV with `Square Footage`, `Number of Bedrooms` and `Price ($)` columns
    #[arg(
        long = "training-set",
        default_value = "public/training-data.csv",
        env = "PRICE_PREDICTOR_TRAINING_SET"
    )]
    pub path: PathBuf,
}

/// Runs the web application
#[derive(Args)]
pub struct WebOpts {
    #[command(flatten)]
    pub training_set: TrainingSetOpts,

    /// Web application bind host
    #[arg(long, default_value = "::", env = "PRICE_PREDICTOR_HOST")]
    pub host: IpAddr,

    /// Web application bind port
    #[arg(short, long, default_value = "8081", env = "PRICE_PREDICTOR_PORT")]
    pub port: u16,

    /// MongoDB URI for the prediction history, the history routes are disabled without it
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// Train the model on startup instead of on the first prediction request
    #[arg(long)]
    pub eager_training: bool,
}

/// Predicts a single price and prints it
#[derive(Args)]
pub struct PredictOpts {
    #[command(flatten)]
    pub training_set: TrainingSetOpts,

    /// Property square footage
    #[arg(long, value_parser = parsers::positive_f64)]
    pub square_footage: f64,

    /// Number of bedrooms
    #[arg(long)]
    pub bedrooms: u32,
}
