use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{msg, AppError, Result};

/// Deserialize a double Option field where:
/// - Field absent in JSON → None (don't update)
/// - Field present with null → Some(None) (set to NULL in DB)
/// - Field present with value → Some(Some(value)) (set to value)
fn deserialize_optional_nullable<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(Some(value))
}

/// Catalog entry. Prices are integer cents.
///
/// `stock_quantity` can go negative: confirmed payments decrement it
/// unconditionally, and the checkout-time availability check is only a
/// point-in-time snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    /// Stored lowercased
    pub category: String,
    pub stock_quantity: i64,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub stock_quantity: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateProduct {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation(msg::TITLE_REQUIRED.into()));
        }
        if self.title.len() > 150 {
            return Err(AppError::Validation(msg::TITLE_TOO_LONG.into()));
        }
        if self.description.len() > 2000 {
            return Err(AppError::Validation(msg::DESCRIPTION_TOO_LONG.into()));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::Validation(msg::CATEGORY_REQUIRED.into()));
        }
        if self.price_cents < 0 {
            return Err(AppError::Validation(msg::PRICE_NEGATIVE.into()));
        }
        if self.stock_quantity < 0 {
            return Err(AppError::Validation(msg::STOCK_NEGATIVE.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
    pub stock_quantity: Option<i64>,
    /// Use null to clear the image, omit to leave unchanged
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub image_url: Option<Option<String>>,
}

impl UpdateProduct {
    pub fn validate(&self) -> Result<()> {
        if self.title.is_none()
            && self.description.is_none()
            && self.price_cents.is_none()
            && self.category.is_none()
            && self.stock_quantity.is_none()
            && self.image_url.is_none()
        {
            return Err(AppError::Validation(msg::NO_UPDATE_FIELDS.into()));
        }
        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation(msg::TITLE_REQUIRED.into()));
            }
            if title.len() > 150 {
                return Err(AppError::Validation(msg::TITLE_TOO_LONG.into()));
            }
        }
        if let Some(ref description) = self.description {
            if description.len() > 2000 {
                return Err(AppError::Validation(msg::DESCRIPTION_TOO_LONG.into()));
            }
        }
        if let Some(ref category) = self.category {
            if category.trim().is_empty() {
                return Err(AppError::Validation(msg::CATEGORY_REQUIRED.into()));
            }
        }
        if matches!(self.price_cents, Some(p) if p < 0) {
            return Err(AppError::Validation(msg::PRICE_NEGATIVE.into()));
        }
        if matches!(self.stock_quantity, Some(s) if s < 0) {
            return Err(AppError::Validation(msg::STOCK_NEGATIVE.into()));
        }
        Ok(())
    }
}

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
    Oldest,
}

impl ProductSort {
    /// ORDER BY clause for this sort. Rowid breaks created_at ties so
    /// pagination is stable.
    pub fn order_clause(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_cents ASC, rowid ASC",
            Self::PriceDesc => "price_cents DESC, rowid DESC",
            Self::Newest => "created_at DESC, rowid DESC",
            Self::Oldest => "created_at ASC, rowid ASC",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            _ => Err(()),
        }
    }
}

/// Row in the admin dashboard's low-stock report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    pub id: String,
    pub title: String,
    pub stock_quantity: i64,
    pub category: String,
}
