use mongodb::{Collection, Database, IndexModel};

use crate::prelude::*;

pub trait TypedDocument: 'static + Sized + Send + Sync {
    const NAME: &'static str;

    #[inline]
    fn collection(in_: &Database) -> Collection<Self> {
        in_.collection(Self::NAME)
    }
}

#[async_trait]
pub trait Indexes: TypedDocument {
    type I: IntoIterator<Item = IndexModel> + Send;

    fn indexes() -> Self::I;

    #[instrument(skip_all, err)]
    async fn ensure_indexes(on: &Database) -> Result {
        Self::collection(on)
            .create_indexes(Self::indexes(), None)
            .await
            .with_context(|| format!("failed to create the indexes in `{}`", Self::NAME))?;
        Ok(())
    }
}
