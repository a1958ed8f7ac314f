use sqlx::postgres::PgPoolOptions;
use url::Url;

pub use migrations::run_migrations;
pub use seeder::seed_development_data;

mod migrations;
mod seeder;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub(crate) type Transaction = sqlx::Transaction<'static, sqlx::Postgres>;

pub async fn connect(url: &Url, max_connections: u32) -> Result<Database, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url.as_str())
        .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CountRow {
    pub count: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct IdRow {
    pub id: i64,
}
