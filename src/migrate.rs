use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS inventory (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            make TEXT NOT NULL,
            model TEXT NOT NULL,
            year INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            image TEXT NOT NULL DEFAULT '',
            thumbnail TEXT NOT NULL DEFAULT '',
            price REAL NOT NULL CHECK (price > 0),
            miles INTEGER NOT NULL CHECK (miles >= 0),
            color TEXT,
            classification_id INTEGER NOT NULL,
            FOREIGN KEY (classification_id) REFERENCES classifications(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Append-only from the search path; only an explicit clear deletes.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            query TEXT NOT NULL,
            filters_json TEXT NOT NULL DEFAULT '{}',
            results_count INTEGER NOT NULL,
            searched_at INTEGER NOT NULL,
            client_addr TEXT,
            user_agent TEXT
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_inventory_classification_id ON inventory(classification_id)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_search_history_searched_at ON search_history(searched_at DESC)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}

const SAMPLE_CLASSIFICATIONS: [(i64, &str); 4] =
    [(1, "SUV"), (2, "Sedan"), (3, "Truck"), (4, "Coupe")];

struct SampleVehicle {
    id: i64,
    make: &'static str,
    model: &'static str,
    year: i64,
    description: &'static str,
    slug: &'static str,
    price: f64,
    miles: i64,
    color: &'static str,
    classification_id: i64,
}

const SAMPLE_VEHICLES: [SampleVehicle; 5] = [
    SampleVehicle {
        id: 1,
        make: "Nissan",
        model: "Sentra",
        year: 2019,
        description: "Reliable and fuel-efficient sedan perfect for daily commuting.",
        slug: "nissan-sentra-2019",
        price: 16999.00,
        miles: 74750,
        color: "Silver",
        classification_id: 2,
    },
    SampleVehicle {
        id: 2,
        make: "Honda",
        model: "CR-V",
        year: 2020,
        description: "Spacious and versatile SUV with excellent fuel economy.",
        slug: "honda-crv-2020",
        price: 24999.00,
        miles: 32500,
        color: "White",
        classification_id: 1,
    },
    SampleVehicle {
        id: 3,
        make: "Ford",
        model: "F-150",
        year: 2021,
        description: "Powerful pickup truck with advanced technology and towing capability.",
        slug: "ford-f150-2021",
        price: 35999.00,
        miles: 18500,
        color: "Blue",
        classification_id: 3,
    },
    SampleVehicle {
        id: 4,
        make: "Toyota",
        model: "Camry",
        year: 2022,
        description: "Comfortable and reliable sedan with modern features.",
        slug: "toyota-camry-2022",
        price: 27999.00,
        miles: 12000,
        color: "Black",
        classification_id: 2,
    },
    SampleVehicle {
        id: 5,
        make: "Chevrolet",
        model: "Camaro",
        year: 2020,
        description: "Sporty coupe with powerful performance and sleek design.",
        slug: "chevrolet-camaro-2020",
        price: 32999.00,
        miles: 28000,
        color: "Red",
        classification_id: 4,
    },
];

/// Insert the sample classifications and vehicles.
///
/// Rows are keyed by fixed ids and inserted with `INSERT OR IGNORE`, so
/// seeding an already-seeded database changes nothing. Returns the number
/// of vehicles actually inserted.
pub async fn seed_sample_inventory(config: &Config) -> Result<u64> {
    let pool = db::connect(config).await?;
    let inserted = seed_pool(&pool).await;
    pool.close().await;
    inserted
}

async fn seed_pool(pool: &SqlitePool) -> Result<u64> {
    let mut tx = pool.begin().await?;

    for (id, name) in SAMPLE_CLASSIFICATIONS {
        sqlx::query("INSERT OR IGNORE INTO classifications (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    let mut inserted = 0;
    for v in &SAMPLE_VEHICLES {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO inventory (id, make, model, year, description, image,
                                             thumbnail, price, miles, color, classification_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(v.id)
        .bind(v.make)
        .bind(v.model)
        .bind(v.year)
        .bind(v.description)
        .bind(format!("/images/vehicles/{}.jpg", v.slug))
        .bind(format!("/images/vehicles/thumbnails/{}.jpg", v.slug))
        .bind(v.price)
        .bind(v.miles)
        .bind(v.color)
        .bind(v.classification_id)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}
