//! Dish repository backed by PostgreSQL.

use crate::domain::dish::{next_updated_at, now_micros};
use crate::domain::{Dish, DishListQuery, DishPatch, NewDish, SortField};
use crate::infra::config::DatabaseConfig;
use crate::storage::repository::{map_write_error, DishRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool, Postgres, QueryBuilder};
use std::str::FromStr;

const DISH_COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Opens the shared, bounded connection pool.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(&config.url)?;
    if !config.log_statements {
        options = options.disable_statement_logging();
    }

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .test_before_acquire(config.test_before_acquire)
        .connect_with(options)
        .await
}

/// Creates the `dishes` table and its indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS dishes (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            description VARCHAR(500),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
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

/// Postgres implementation of [`DishRepository`].
#[derive(Clone)]
pub struct PgDishRepository {
    pool: PgPool,
}

impl PgDishRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DishRepository for PgDishRepository {
    async fn create(&self, dish: &NewDish) -> Result<Dish, RepositoryError> {
        let now = now_micros();
        let sql = format!(
            "INSERT INTO dishes (name, description, created_at, updated_at)
             VALUES ($1, $2, $3, $3)
             RETURNING {}",
            DISH_COLUMNS
        );

        sqlx::query_as::<_, Dish>(&sql)
            .bind(&dish.name)
            .bind(&dish.description)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &dish.name))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Dish>, RepositoryError> {
        let sql = format!("SELECT {} FROM dishes WHERE id = $1", DISH_COLUMNS);
        let dish = sqlx::query_as::<_, Dish>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(dish)
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Dish>, RepositoryError> {
        let sql = format!("SELECT {} FROM dishes WHERE name = $1", DISH_COLUMNS);
        let dish = sqlx::query_as::<_, Dish>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(dish)
    }

    async fn list_all(&self, query: &DishListQuery) -> Result<Vec<Dish>, RepositoryError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM dishes", DISH_COLUMNS));

        if let Some(pattern) = query.search_pattern() {
            builder
                .push(" WHERE name ILIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }

        // Column and direction come from closed enums, never from caller text.
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
        // Dropping `tx` without commit rolls back, which covers every early return below.
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM dishes WHERE id = $1 FOR UPDATE", DISH_COLUMNS);
        let current = sqlx::query_as::<_, Dish>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE dishes SET ");
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

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, target_name))?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM dishes WHERE id = $1")
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
