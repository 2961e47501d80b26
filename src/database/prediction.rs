use std::str::FromStr;

use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{bson, Database, IndexModel};
use serde::{Deserialize, Serialize};
use serde_with::TryFromInto;

use crate::database::traits::{Indexes, TypedDocument};
use crate::prelude::*;

pub const PAGE_SIZE: u64 = 10;

/// Largest zero-based page whose offset still fits the `i64` skip of MongoDB.
pub const MAX_PAGE: u64 = i64::MAX as u64 / PAGE_SIZE;

/// Stored prediction request and its result.
#[serde_with::serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Prediction {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(rename = "sqft")]
    pub square_footage: f64,

    #[serde_as(as = "TryFromInto<i32>")]
    pub bedrooms: u32,

    #[serde(rename = "price")]
    pub predicted_price: f64,

    #[serde_as(as = "bson::DateTime")]
    pub created_at: DateTime,
}

impl TypedDocument for Prediction {
    const NAME: &'static str = "predictions";
}

#[async_trait]
impl Indexes for Prediction {
    type I = [IndexModel; 4];

    fn indexes() -> Self::I {
        [
            IndexModel::builder().keys(doc! { "created_at": -1 }).build(),
            IndexModel::builder().keys(doc! { "sqft": 1 }).build(),
            IndexModel::builder().keys(doc! { "bedrooms": 1 }).build(),
            IndexModel::builder().keys(doc! { "price": 1 }).build(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    SquareFootageAscending,
    SquareFootageDescending,
    BedroomsAscending,
    BedroomsDescending,
    PriceAscending,
    PriceDescending,
}

impl SortOrder {
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::NewestFirst => "created_at_desc",
            Self::OldestFirst => "created_at_asc",
            Self::SquareFootageAscending => "square_footage_asc",
            Self::SquareFootageDescending => "square_footage_desc",
            Self::BedroomsAscending => "bedrooms_asc",
            Self::BedroomsDescending => "bedrooms_desc",
            Self::PriceAscending => "predicted_price_asc",
            Self::PriceDescending => "predicted_price_desc",
        }
    }

    /// Sort document, ties are broken by the newest document first.
    pub fn to_document(self) -> Document {
        let (field, direction) = match self {
            Self::NewestFirst => ("created_at", -1),
            Self::OldestFirst => ("created_at", 1),
            Self::SquareFootageAscending => ("sqft", 1),
            Self::SquareFootageDescending => ("sqft", -1),
            Self::BedroomsAscending => ("bedrooms", 1),
            Self::BedroomsDescending => ("bedrooms", -1),
            Self::PriceAscending => ("price", 1),
            Self::PriceDescending => ("price", -1),
        };
        let mut document = Document::new();
        document.insert(field, direction);
        document.insert("_id", -1);
        document
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "created_at_desc" => Ok(Self::NewestFirst),
            "created_at_asc" => Ok(Self::OldestFirst),
            "square_footage_asc" => Ok(Self::SquareFootageAscending),
            "square_footage_desc" => Ok(Self::SquareFootageDescending),
            "bedrooms_asc" => Ok(Self::BedroomsAscending),
            "bedrooms_desc" => Ok(Self::BedroomsDescending),
            "predicted_price_asc" => Ok(Self::PriceAscending),
            "predicted_price_desc" => Ok(Self::PriceDescending),
            _ => Err(anyhow!("unknown sort order `{}`", value)),
        }
    }
}

impl TryFrom<String> for SortOrder {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_str(&value)
    }
}

/// One page of the prediction history.
#[derive(Debug)]
pub struct Page {
    pub items: Vec<Prediction>,
    pub total: u64,
    pub has_more: bool,
}

impl Page {
    /// Tells whether anything is left after the zero-based `page`.
    pub const fn has_more(page: u64, total: u64) -> bool {
        page.saturating_add(1).saturating_mul(PAGE_SIZE) < total
    }
}

impl Prediction {
    pub fn new(square_footage: f64, bedrooms: u32, predicted_price: f64) -> Self {
        Self {
            id: ObjectId::new(),
            square_footage,
            bedrooms,
            predicted_price,
            created_at: Utc::now(),
        }
    }

    #[instrument(level = "debug", skip_all, fields(id = %self.id), err)]
    pub async fn insert(&self, into: &Database) -> Result {
        Self::collection(into)
            .insert_one(self, None)
            .await
            .context("failed to insert the prediction")?;
        debug!("inserted");
        Ok(())
    }

    #[instrument(level = "debug", skip(from), err)]
    pub async fn retrieve_page(from: &Database, sort: SortOrder, page: u64) -> Result<Page> {
        ensure!(page <= MAX_PAGE, "page {} is out of range", page);
        let start_instant = Instant::now();
        let collection = Self::collection(from);
        let total = collection
            .count_documents(None, None)
            .await
            .context("failed to count the predictions")?;
        let options = FindOptions::builder()
            .sort(sort.to_document())
            .skip(page * PAGE_SIZE)
            .limit(PAGE_SIZE as i64)
            .build();
        let items: Vec<Self> = collection
            .find(None, options)
            .await
            .context("failed to query the predictions")?
            .try_collect()
            .await
            .context("failed to retrieve the predictions")?;
        debug!(n_items = items.len(), total, elapsed = ?start_instant.elapsed());
        Ok(Page {
            items,
            total,
            has_more: Page::has_more(page, total),
        })
    }

    /// Replaces the inputs and the price, returns the updated prediction if it exists.
    #[instrument(level = "debug", skip(in_), err)]
    pub async fn update(
        in_: &Database,
        id: ObjectId,
        square_footage: f64,
        bedrooms: u32,
        predicted_price: f64,
    ) -> Result<Option<Self>> {
        let update = doc! {
            "$set": {
                "sqft": square_footage,
                "bedrooms": bedrooms as i32,
                "price": predicted_price,
            },
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Self::collection(in_)
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await
            .with_context(|| format!("failed to update the prediction {}", id))
    }

    /// Deletes the prediction, returns whether it existed.
    #[instrument(level = "debug", skip(from), err)]
    pub async fn delete(from: &Database, id: ObjectId) -> Result<bool> {
        let result = Self::collection(from)
            .delete_one(doc! { "_id": id }, None)
            .await
            .with_context(|| format!("failed to delete the prediction {}", id))?;
        Ok(result.deleted_count == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_round_trips_names() -> crate::Result {
        for name in [
            "created_at_desc",
            "created_at_asc",
            "square_footage_asc",
            "square_footage_desc",
            "bedrooms_asc",
            "bedrooms_desc",
            "predicted_price_asc",
            "predicted_price_desc",
        ] {
            assert_eq!(SortOrder::from_str(name)?.to_str(), name);
        }
        assert!(SortOrder::from_str("price").is_err());
        Ok(())
    }

    #[test]
    fn sort_document_ok() {
        assert_eq!(SortOrder::default().to_document(), doc! { "created_at": -1, "_id": -1 });
        assert_eq!(SortOrder::PriceAscending.to_document(), doc! { "price": 1, "_id": -1 });
    }

    #[test]
    fn has_more_ok() {
        assert!(!Page::has_more(0, 0));
        assert!(!Page::has_more(0, 10));
        assert!(Page::has_more(0, 11));
        assert!(Page::has_more(1, 21));
        assert!(!Page::has_more(2, 21));
        assert!(!Page::has_more(u64::MAX / 2, 100));
        assert!(!Page::has_more(u64::MAX, u64::MAX));
        assert!(!Page::has_more(MAX_PAGE, 100));
    }

    #[test]
    fn bson_field_names_ok() -> crate::Result {
        let prediction = Prediction::new(1200.0, 3, 250000.0);
        let document = bson::to_document(&prediction)?;
        assert_eq!(document.get_object_id("_id")?, prediction.id);
        assert_eq!(document.get_f64("sqft")?, 1200.0);
        assert_eq!(document.get_i32("bedrooms")?, 3);
        assert_eq!(document.get_f64("price")?, 250000.0);
        assert!(document.get_datetime("created_at").is_ok());
        Ok(())
    }
}
