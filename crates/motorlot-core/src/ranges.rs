//! Range bounds and option lists for the search form.
//!
//! Bounds are computed over the *entire* inventory, never the filtered
//! result set, and are recomputed on every call. When the inventory is empty
//! each range falls back to a fixed default so callers always get both ends.

use anyhow::Result;
use chrono::Datelike;
use serde::Serialize;

use crate::models::Classification;
use crate::store::InventoryStore;

/// Years shown when there is no inventory: `[current - 10, current]`.
pub const DEFAULT_YEAR_LOOKBACK: i64 = 10;
pub const DEFAULT_MAX_PRICE: f64 = 100_000.0;
pub const DEFAULT_MAX_MILES: i64 = 200_000;

/// An inclusive `{minimum, maximum}` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeBounds<T> {
    pub minimum: T,
    pub maximum: T,
}

impl<T: Copy> RangeBounds<T> {
    fn from_pair(pair: Option<(T, T)>, fallback: (T, T)) -> Self {
        let (minimum, maximum) = pair.unwrap_or(fallback);
        Self { minimum, maximum }
    }
}

/// Everything a search form needs to render its controls.
#[derive(Debug, Clone, Serialize)]
pub struct FilterMetadata {
    pub classifications: Vec<Classification>,
    pub colors: Vec<String>,
    pub year_range: RangeBounds<i64>,
    pub price_range: RangeBounds<f64>,
    pub mileage_range: RangeBounds<i64>,
}

/// Year bounds, defaulting relative to `current_year`.
pub fn year_bounds_or_default(pair: Option<(i64, i64)>, current_year: i64) -> RangeBounds<i64> {
    RangeBounds::from_pair(pair, (current_year - DEFAULT_YEAR_LOOKBACK, current_year))
}

pub fn price_bounds_or_default(pair: Option<(f64, f64)>) -> RangeBounds<f64> {
    RangeBounds::from_pair(pair, (0.0, DEFAULT_MAX_PRICE))
}

pub fn mileage_bounds_or_default(pair: Option<(i64, i64)>) -> RangeBounds<i64> {
    RangeBounds::from_pair(pair, (0, DEFAULT_MAX_MILES))
}

pub async fn year_range<S: InventoryStore + ?Sized>(store: &S) -> Result<RangeBounds<i64>> {
    let current_year = i64::from(chrono::Utc::now().year());
    Ok(year_bounds_or_default(store.year_bounds().await?, current_year))
}

pub async fn price_range<S: InventoryStore + ?Sized>(store: &S) -> Result<RangeBounds<f64>> {
    Ok(price_bounds_or_default(store.price_bounds().await?))
}

pub async fn mileage_range<S: InventoryStore + ?Sized>(store: &S) -> Result<RangeBounds<i64>> {
    Ok(mileage_bounds_or_default(store.mileage_bounds().await?))
}

/// Fetch all form metadata, one query after another.
pub async fn load_metadata<S: InventoryStore + ?Sized>(store: &S) -> Result<FilterMetadata> {
    Ok(FilterMetadata {
        classifications: store.classifications().await?,
        colors: store.distinct_colors().await?,
        year_range: year_range(store).await?,
        price_range: price_range(store).await?,
        mileage_range: mileage_range(store).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewVehicle;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn test_year_default_window() {
        let r = year_bounds_or_default(None, 2026);
        assert_eq!(r, RangeBounds { minimum: 2016, maximum: 2026 });
        let r = year_bounds_or_default(Some((2019, 2022)), 2026);
        assert_eq!(r, RangeBounds { minimum: 2019, maximum: 2022 });
    }

    #[tokio::test]
    async fn test_empty_inventory_defaults() {
        let store = InMemoryStore::new();
        let meta = load_metadata(&store).await.unwrap();
        assert!(meta.colors.is_empty());
        assert_eq!(meta.price_range, RangeBounds { minimum: 0.0, maximum: 100_000.0 });
        assert_eq!(meta.mileage_range, RangeBounds { minimum: 0, maximum: 200_000 });
        assert_eq!(
            meta.year_range.maximum - meta.year_range.minimum,
            DEFAULT_YEAR_LOOKBACK
        );
    }

    #[tokio::test]
    async fn test_bounds_over_inventory() {
        let store = InMemoryStore::new();
        let c = store.add_classification("SUV").await.unwrap();
        for (year, price, miles, color) in [
            (2019, 16999.0, 74750, Some("Silver")),
            (2021, 35999.0, 18500, Some("Blue")),
            (2020, 24999.0, 32500, None),
        ] {
            store
                .add_vehicle(&NewVehicle {
                    make: "Make".to_string(),
                    model: "Model".to_string(),
                    year,
                    description: String::new(),
                    image: String::new(),
                    thumbnail: String::new(),
                    price,
                    miles,
                    color: color.map(str::to_string),
                    classification_id: c,
                })
                .await
                .unwrap();
        }
        let meta = load_metadata(&store).await.unwrap();
        assert_eq!(meta.year_range, RangeBounds { minimum: 2019, maximum: 2021 });
        assert_eq!(meta.price_range, RangeBounds { minimum: 16999.0, maximum: 35999.0 });
        assert_eq!(meta.mileage_range, RangeBounds { minimum: 18500, maximum: 74750 });
        assert_eq!(meta.colors, vec!["Blue", "Silver"]);
    }
}
