pub use std::result::Result as StdResult;
pub use std::sync::Arc;
pub use std::time::Duration as StdDuration;
pub use std::time::Instant;

pub use anyhow::{anyhow, ensure, Context};
pub use async_trait::async_trait;
pub use chrono::Utc;
pub use tracing::{debug, error, info, instrument, warn};

pub type DateTime = chrono::DateTime<chrono::Utc>;
pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
