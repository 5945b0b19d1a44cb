//! SQLite-backed product store

use crate::store::{NewProduct, ProductRecord, ProductStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use stockroom_core::{Error, Result};

/// Product store backed by a pooled SQLite database.
#[derive(Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    /// Open (creating if missing) the database at `db_path` and initialize
    /// the schema.
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Database(format!("Failed to create db directory: {}", e)))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(db_path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal),
            )
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Self::initialize_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// In-memory database for tests.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Self::initialize_schema(&pool).await?;

        Ok(Self { pool })
    }

    async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price REAL NOT NULL,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_created ON products(created_at DESC)")
            .execute(pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> ProductRecord {
    ProductRecord {
        id: row.get("id"),
        name: row.get("name"),
        quantity: row.get("quantity"),
        price: row.get("price"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<Option<DateTime<Utc>>, _>("updated_at"),
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn create(&self, product: NewProduct) -> Result<ProductRecord> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO products (name, quantity, price, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.price)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(ProductRecord {
            id: result.last_insert_rowid(),
            name: product.name,
            quantity: product.quantity,
            price: product.price,
            created_at,
            updated_at: None,
        })
    }

    async fn list(&self) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, quantity, price, created_at, updated_at FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn get(&self, id: i64) -> Result<ProductRecord> {
        let row = sqlx::query(
            "SELECT id, name, quantity, price, created_at, updated_at FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        match row {
            Some(row) => Ok(row_to_record(&row)),
            None => Err(Error::NotFound(format!("product {}", id))),
        }
    }

    async fn update(&self, id: i64, product: NewProduct) -> Result<ProductRecord> {
        let updated_at = Utc::now();
        let result = sqlx::query(
            "UPDATE products SET name = ?, quantity = ?, price = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.price)
        .bind(updated_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("product {}", id)));
        }

        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("product {}", id)));
        }

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }
}
