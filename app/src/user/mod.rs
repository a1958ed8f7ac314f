use crate::{auth, database::Database};

mod entities;

pub use entities::{Email, Error, Id, User};
pub(crate) use entities::parse_name;
pub(crate) use queries::{get_credentials, insert};

pub async fn get(grant: &auth::ReadGrant, db: &Database) -> Result<User, Error> {
    queries::get(db, grant.user_id)
        .await?
        .ok_or(Error::NotFound)
}

mod queries {
    use super::{Email, Error, Id, User};
    use crate::database::{Database, Transaction};
    use chrono::{DateTime, Utc};

    /// Postgres error code for unique constraint violations.
    const UNIQUE_VIOLATION: &str = "23505";

    pub(super) async fn get(db: &Database, id: Id) -> Result<Option<User>, sqlx::Error> {
        Ok(sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(db)
        .await?
        .map(|row| row.into_entity()))
    }

    /// Loads a user together with the stored password hash.
    pub(crate) async fn get_credentials(
        db: &Database,
        email: &Email,
    ) -> Result<Option<(User, String)>, sqlx::Error> {
        Ok(sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, name, email, created_at, password_hash FROM users WHERE email = $1",
        )
        .bind(&email.0)
        .fetch_optional(db)
        .await?
        .map(|row| {
            let user = UserRow {
                id: row.id,
                name: row.name,
                email: row.email,
                created_at: row.created_at,
            };
            (user.into_entity(), row.password_hash)
        }))
    }

    pub(crate) async fn insert(
        data_tx: &mut Transaction,
        name: &str,
        email: &Email,
        password_hash: &str,
        created: DateTime<Utc>,
    ) -> Result<User, Error> {
        sqlx::query_as::<_, UserRow>(
            r#"INSERT INTO users (name, email, password_hash, created_at) VALUES ($1, $2, $3, $4)
                RETURNING id, name, email, created_at"#,
        )
        .bind(name)
        .bind(&email.0)
        .bind(password_hash)
        .bind(created)
        .fetch_one(&mut *data_tx)
        .await
        .map(|row| row.into_entity())
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_error)
                if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Error::EmailTaken
            }
            e => Error::Storage(e),
        })
    }

    #[derive(sqlx::FromRow, Debug)]
    struct UserRow {
        id: i64,
        name: String,
        email: String,
        created_at: DateTime<Utc>,
    }

    #[derive(sqlx::FromRow, Debug)]
    struct CredentialsRow {
        id: i64,
        name: String,
        email: String,
        created_at: DateTime<Utc>,
        password_hash: String,
    }

    impl UserRow {
        fn into_entity(self) -> User {
            User {
                id: Id(self.id),
                name: self.name,
                email: Email(self.email),
                created: self.created_at,
            }
        }
    }
}
