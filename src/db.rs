use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        // Apply schema on startup; the table is insert-only so this is safe
        // to re-run.
        sqlx::raw_sql(include_str!(
            "../migrations/0001_create_validation_results.sql"
        ))
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}
