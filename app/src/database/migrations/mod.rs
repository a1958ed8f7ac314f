//! This module is in charge of migrations.
//! Add migrations as submodules to this module.

use super::{CountRow, Database, Transaction};
use async_trait::async_trait;

mod m0000_init;

/// Key of the advisory lock held while migrating.
const MIGRATION_LOCK_KEY: i64 = 0x6578_7065_6e73_6573;

#[async_trait]
pub(crate) trait Migration {
    fn serial_number(&self) -> i64;
    async fn run(&self, tx: &mut Transaction) -> Result<(), sqlx::Error>;
}

struct SimpleSqlMigration {
    pub serial_number: i64,
    pub sql: Vec<&'static str>,
}

#[async_trait]
impl Migration for SimpleSqlMigration {
    fn serial_number(&self) -> i64 {
        self.serial_number
    }

    async fn run(&self, tx: &mut Transaction) -> Result<(), sqlx::Error> {
        for sql in self.sql.iter() {
            sqlx::query(sql).execute(&mut *tx).await?;
        }
        Ok(())
    }
}

/// Execute all migrations on the database, in a single transaction.
pub async fn run_migrations(db: &Database) -> Result<(), sqlx::Error> {
    let mut transaction = db.begin().await?;
    // Concurrent startups wait here until the first one is done.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut transaction)
        .await?;
    prepare_migrations_table(&mut transaction).await?;
    run_migration(m0000_init::migration(), &mut transaction).await?;
    transaction.commit().await
}

async fn prepare_migrations_table(transaction: &mut Transaction) -> Result<(), sqlx::Error> {
    sqlx::query("CREATE TABLE IF NOT EXISTS migrations (serial_number BIGINT PRIMARY KEY)")
        .execute(&mut *transaction)
        .await?;
    Ok(())
}

async fn run_migration(
    migration: impl Migration,
    transaction: &mut Transaction,
) -> Result<(), sqlx::Error> {
    let row = sqlx::query_as::<_, CountRow>(
        "SELECT COUNT(*) AS count FROM migrations WHERE serial_number = $1",
    )
    .bind(migration.serial_number())
    .fetch_one(&mut *transaction)
    .await?;

    if row.count > 0 {
        return Ok(());
    }

    log::info!("running migration {}", migration.serial_number());
    migration.run(transaction).await?;

    sqlx::query("INSERT INTO migrations VALUES ($1)")
        .bind(migration.serial_number())
        .execute(&mut *transaction)
        .await?;
    Ok(())
}
