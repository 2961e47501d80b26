use mongodb::Database;

use crate::prelude::*;

pub use self::prediction::*;
use self::traits::Indexes;

mod prediction;
mod traits;

#[instrument(level = "debug", skip_all)]
pub async fn open(uri: &str) -> Result<Database> {
    info!("connecting…");
    let client = mongodb::Client::with_uri_str(uri)
        .await
        .context("failed to parse the specified MongoDB URI")?;
    let database = client
        .default_database()
        .ok_or_else(|| anyhow!("MongoDB database name is not specified"))?;

    info!("ensuring indexes…");
    Prediction::ensure_indexes(&database).await?;

    info!("connected");
    Ok(database)
}
