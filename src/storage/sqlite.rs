//! Dish repository backed by a single SQLite file.
//!
//! Timestamps are stored as RFC 3339 text, which orders lexically the same way as the
//! instants it encodes. `LIKE` is case-insensitive for ASCII only.

use crate::domain::dish::{next_updated_at, now_micros};
use crate::domain::{Dish, DishListQuery, DishPatch, NewDish, SortField};
use crate::infra::config::SqliteConfig;
use crate::storage::repository::{map_write_error, DishRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, QueryBuilder, Sqlite, SqlitePool};

const DISH_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Opens the pool, creating the database file and its directory on first use.
pub async fn connect_pool(config: &SqliteConfig) -> Result<SqlitePool, sqlx::Error> {
    if let Some(dir) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(config.acquire_timeout);
    if !config.log_statements {
        options = options.disable_statement_logging();
    }

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
}

/// Creates the `dishes` table and its indexes if they do not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // AUTOINCREMENT keeps ids of deleted rows from being handed out again.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS dishes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(255) NOT NULL,
            description VARCHAR(500),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CONSTRAINT dishes_name_key UNIQUE (name),
            CONSTRAINT dishes_updated_at_check CHECK (updated_at >= created_at)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS dishes_created_at_idx ON dishes (created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// SQLite implementation of [`DishRepository`].
#[derive(Clone)]
pub struct SqliteDishRepository {
    pool: SqlitePool,
}

impl SqliteDishRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DishRepository for SqliteDishRepository {
    async fn create(&self, dish: &NewDish) -> Result<Dish, RepositoryError> {
        let now = now_micros();
        let sql = format!(
            "INSERT INTO dishes (name, description, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING {}",
            DISH_COLUMNS
        );

        sqlx::query_as::<_, Dish>(&sql)
            .bind(&dish.name)
            .bind(&dish.description)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &dish.name))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Dish>, RepositoryError> {
        let sql = format!("SELECT {} FROM dishes WHERE id = ?", DISH_COLUMNS);
        let dish = sqlx::query_as::<_, Dish>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(dish)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Dish>, RepositoryError> {
        let sql = format!("SELECT {} FROM dishes WHERE name = ?", DISH_COLUMNS);
        let dish = sqlx::query_as::<_, Dish>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(dish)
    }

    async fn list_all(&self, query: &DishListQuery) -> Result<Vec<Dish>, RepositoryError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM dishes", DISH_COLUMNS));

        if let Some(pattern) = query.search_pattern() {
            builder
                .push(" WHERE name LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }

        builder
            .push(" ORDER BY ")
            .push(query.order_by().column())
            .push(" ")
            .push(query.direction().as_sql());
        if query.order_by() != SortField::Id {
            builder.push(", id ASC");
        }

        builder
            .push(" LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let dishes = builder
            .build_query_as::<Dish>()
            .fetch_all(&self.pool)
            .await?;
        Ok(dishes)
    }

    async fn update(&self, id: i64, patch: &DishPatch) -> Result<Option<Dish>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // No row locks in SQLite: write first so the transaction holds the database write
        // lock before it reads the previous `updated_at`.
        let touched = sqlx::query("UPDATE dishes SET updated_at = updated_at WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Ok(None);
        }

        let select = format!("SELECT {} FROM dishes WHERE id = ?", DISH_COLUMNS);
        let current = sqlx::query_as::<_, Dish>(&select)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE dishes SET ");
        let mut assignments = builder.separated(", ");
        if let Some(name) = &patch.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name.clone());
        }
        if let Some(description) = &patch.description {
            assignments.push("description = ");
            assignments.push_bind_unseparated(description.clone());
        }
        assignments.push("updated_at = ");
        assignments.push_bind_unseparated(next_updated_at(current.updated_at));

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {}", DISH_COLUMNS));

        let target_name = patch.name.as_deref().unwrap_or(&current.name);
        let updated = builder
            .build_query_as::<Dish>()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, target_name))?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM dishes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
