use super::{Database, IdRow, Transaction};
use crate::auth::{self, PasswordHash, Permissions, TokenHash};
use crate::user;
use chrono::Utc;

/// Inserts two development users, `test-1@user.net` and `test-2@user.net` (passwords `test-1`
/// and `test-2`), each with a set of fixed tokens: `all_N`, `read_only_N` and `disabled_N`.
pub async fn seed_development_data(db: &Database) -> anyhow::Result<()> {
    let mut data_tx = db.begin().await?;
    seed_test_user(&mut data_tx, 1).await?;
    seed_test_user(&mut data_tx, 2).await?;
    data_tx.commit().await?;
    Ok(())
}

async fn seed_test_user(data_tx: &mut Transaction, index: u32) -> anyhow::Result<()> {
    let email = format!("test-{}@user.net", index);
    let row = sqlx::query("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&mut *data_tx)
        .await?;
    if row.is_some() {
        return Ok(());
    }

    let password_hash = PasswordHash::generate(&format!("test-{}", index))?;
    let user_id = sqlx::query_as::<_, IdRow>(
        r#"INSERT INTO users (name, email, password_hash, created_at) VALUES ($1, $2, $3, $4)
            RETURNING id"#,
    )
    .bind(format!("Test User {}", index))
    .bind(&email)
    .bind(password_hash.as_str())
    .bind(Utc::now())
    .fetch_one(&mut *data_tx)
    .await?
    .id;
    let user_id = user::Id(user_id);

    let tokens = [
        ("all", Permissions::all()),
        (
            "read_only",
            Permissions {
                can_read: true,
                can_write: false,
            },
        ),
    ];
    for (name, permissions) in tokens {
        let token = format!("{}_{}", name, index);
        auth::insert_token(
            data_tx,
            user_id,
            &TokenHash::generate(&token),
            permissions,
            Utc::now(),
            None,
        )
        .await?;
    }

    let disabled = format!("disabled_{}", index);
    let token_id = auth::insert_token(
        data_tx,
        user_id,
        &TokenHash::generate(&disabled),
        Permissions::all(),
        Utc::now(),
        None,
    )
    .await?;
    sqlx::query("UPDATE auth_tokens SET disabled = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(token_id.0)
        .execute(&mut *data_tx)
        .await?;

    log::info!("seeded development user {}", email);
    Ok(())
}
