//! SQLite-backed store implementation.
//!
//! Implements both [`InventoryStore`] and [`HistoryStore`] over a shared
//! [`SqlitePool`]. Search predicates are translated into a parameterized
//! `WHERE` clause with [`QueryBuilder`]; no filter value is ever spliced into
//! SQL text.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use motorlot_core::history::format_ts_iso;
use motorlot_core::models::{
    Classification, HistoryStats, NewSearchHistory, NewVehicle, PopularQuery,
    SearchHistoryEntry, VehicleListing,
};
use motorlot_core::store::{HistoryStore, InventoryStore};
use motorlot_core::Predicate;

use crate::config::Config;
use crate::db;

const VEHICLE_SELECT: &str = r#"
    SELECT i.id, i.make, i.model, i.year, i.description, i.image, i.thumbnail,
           i.price, i.miles, i.color, i.classification_id,
           c.name AS classification_name
    FROM inventory i
    JOIN classifications c ON c.id = i.classification_id
"#;

const VEHICLE_ORDER: &str = " ORDER BY i.make, i.model, i.id";

/// SQLite implementation of the store traits.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database.
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn listing_from_row(row: &SqliteRow) -> VehicleListing {
    VehicleListing {
        id: row.get("id"),
        make: row.get("make"),
        model: row.get("model"),
        year: row.get("year"),
        description: row.get("description"),
        image: row.get("image"),
        thumbnail: row.get("thumbnail"),
        price: row.get("price"),
        miles: row.get("miles"),
        color: row.get("color"),
        classification_id: row.get("classification_id"),
        classification_name: row.get("classification_name"),
    }
}

/// Escape `LIKE` wildcards so the query matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Append ` AND <condition>` for one predicate.
fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    match predicate {
        Predicate::Text(query) => {
            let pattern = like_pattern(query);
            qb.push(" AND (i.make LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR i.model LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR CAST(i.year AS TEXT) LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR i.description LIKE ");
            qb.push_bind(pattern);
            qb.push(" ESCAPE '\\')");
        }
        Predicate::Classification(id) => {
            qb.push(" AND i.classification_id = ");
            qb.push_bind(*id);
        }
        Predicate::MinPrice(v) => {
            qb.push(" AND i.price >= ");
            qb.push_bind(*v);
        }
        Predicate::MaxPrice(v) => {
            qb.push(" AND i.price <= ");
            qb.push_bind(*v);
        }
        Predicate::MinMileage(v) => {
            qb.push(" AND i.miles >= ");
            qb.push_bind(*v);
        }
        Predicate::MaxMileage(v) => {
            qb.push(" AND i.miles <= ");
            qb.push_bind(*v);
        }
        Predicate::MinYear(v) => {
            qb.push(" AND i.year >= ");
            qb.push_bind(*v);
        }
        Predicate::MaxYear(v) => {
            qb.push(" AND i.year <= ");
            qb.push_bind(*v);
        }
        Predicate::Color(color) => {
            qb.push(" AND i.color = ");
            qb.push_bind(color.clone());
        }
    }
}

#[async_trait]
impl InventoryStore for SqliteStore {
    async fn list_vehicles(&self) -> Result<Vec<VehicleListing>> {
        let rows = sqlx::query(&format!("{}{}", VEHICLE_SELECT, VEHICLE_ORDER))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(listing_from_row).collect())
    }

    async fn vehicles_by_classification(
        &self,
        classification_id: i64,
    ) -> Result<Vec<VehicleListing>> {
        let sql = format!(
            "{} WHERE i.classification_id = ?{}",
            VEHICLE_SELECT, VEHICLE_ORDER
        );
        let rows = sqlx::query(&sql)
            .bind(classification_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(listing_from_row).collect())
    }

    async fn vehicle_by_id(&self, id: i64) -> Result<Option<VehicleListing>> {
        let sql = format!("{} WHERE i.id = ?", VEHICLE_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(listing_from_row))
    }

    async fn search_vehicles(&self, predicates: &[Predicate]) -> Result<Vec<VehicleListing>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(VEHICLE_SELECT);
        qb.push(" WHERE 1=1");
        for predicate in predicates {
            push_predicate(&mut qb, predicate);
        }
        qb.push(VEHICLE_ORDER);

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(listing_from_row).collect())
    }

    async fn year_bounds(&self) -> Result<Option<(i64, i64)>> {
        let row = sqlx::query("SELECT MIN(year) AS lo, MAX(year) AS hi FROM inventory")
            .fetch_one(&self.pool)
            .await?;
        let lo: Option<i64> = row.get("lo");
        let hi: Option<i64> = row.get("hi");
        Ok(lo.zip(hi))
    }

    async fn price_bounds(&self) -> Result<Option<(f64, f64)>> {
        let row = sqlx::query("SELECT MIN(price) AS lo, MAX(price) AS hi FROM inventory")
            .fetch_one(&self.pool)
            .await?;
        let lo: Option<f64> = row.get("lo");
        let hi: Option<f64> = row.get("hi");
        Ok(lo.zip(hi))
    }

    async fn mileage_bounds(&self) -> Result<Option<(i64, i64)>> {
        let row = sqlx::query("SELECT MIN(miles) AS lo, MAX(miles) AS hi FROM inventory")
            .fetch_one(&self.pool)
            .await?;
        let lo: Option<i64> = row.get("lo");
        let hi: Option<i64> = row.get("hi");
        Ok(lo.zip(hi))
    }

    async fn distinct_colors(&self) -> Result<Vec<String>> {
        let colors: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT color FROM inventory WHERE color IS NOT NULL ORDER BY color",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(colors)
    }

    async fn classifications(&self) -> Result<Vec<Classification>> {
        let rows = sqlx::query("SELECT id, name FROM classifications ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| Classification {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    async fn add_classification(&self, name: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO classifications (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn add_vehicle(&self, vehicle: &NewVehicle) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory (make, model, year, description, image, thumbnail,
                                   price, miles, color, classification_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.description)
        .bind(&vehicle.image)
        .bind(&vehicle.thumbnail)
        .bind(vehicle.price)
        .bind(vehicle.miles)
        .bind(&vehicle.color)
        .bind(vehicle.classification_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn append_search(&self, entry: &NewSearchHistory) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO search_history (query, filters_json, results_count, searched_at,
                                        client_addr, user_agent)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.query)
        .bind(&entry.filters_json)
        .bind(entry.results_count)
        .bind(now)
        .bind(&entry.client_addr)
        .bind(&entry.user_agent)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn recent_searches(&self, limit: i64) -> Result<Vec<SearchHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, query, filters_json, results_count, searched_at, client_addr, user_agent
            FROM search_history
            ORDER BY searched_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let filters_json: String = row.get("filters_json");
                let searched_at: i64 = row.get("searched_at");
                SearchHistoryEntry {
                    id: row.get("id"),
                    query: row.get("query"),
                    filters: serde_json::from_str(&filters_json)
                        .unwrap_or(serde_json::json!({})),
                    results_count: row.get("results_count"),
                    searched_at: format_ts_iso(searched_at),
                    client_addr: row.get("client_addr"),
                    user_agent: row.get("user_agent"),
                }
            })
            .collect())
    }

    async fn search_stats(&self) -> Result<HistoryStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_searches,
                   COUNT(DISTINCT query) AS unique_queries,
                   AVG(results_count) AS avg_results,
                   MAX(searched_at) AS last_search
            FROM search_history
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let last_search: Option<i64> = row.get("last_search");
        Ok(HistoryStats {
            total_searches: row.get("total_searches"),
            unique_queries: row.get("unique_queries"),
            avg_results: row.get("avg_results"),
            last_search: last_search.map(format_ts_iso),
        })
    }

    async fn popular_searches(&self, limit: i64) -> Result<Vec<PopularQuery>> {
        let rows = sqlx::query(
            r#"
            SELECT query, COUNT(*) AS search_count
            FROM search_history
            WHERE query != ''
            GROUP BY query
            ORDER BY search_count DESC, query ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PopularQuery {
                query: row.get("query"),
                search_count: row.get("search_count"),
            })
            .collect())
    }

    async fn clear_history(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM search_history")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("camry"), "%camry%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c\\d"), "%c\\\\d%");
    }

    #[test]
    fn test_predicates_become_bound_parameters() {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT 1 FROM inventory i WHERE 1=1");
        push_predicate(&mut qb, &Predicate::Color("Red' OR 1=1 --".to_string()));
        push_predicate(&mut qb, &Predicate::MinPrice(100.0));
        let sql = qb.sql();
        assert!(sql.contains("i.color = ?"));
        assert!(sql.contains("i.price >= ?"));
        assert!(!sql.contains("Red"));
    }
}
