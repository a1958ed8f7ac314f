use crate::{database::Database, user};
use chrono::{DateTime, Duration, Utc};

mod entities;

pub use entities::{
    AccessDenied, Error, PasswordHash, ReadGrant, Secret, TokenHash, TokenId, WriteGrant,
};
pub(crate) use entities::Permissions;
pub(crate) use queries::insert_token;

/// A freshly issued token together with the user it belongs to.
#[derive(Debug)]
pub struct Session {
    pub user: user::User,
    pub token: Secret,
    pub expires: DateTime<Utc>,
}

pub async fn get_read_grant(db: &Database, token: &str) -> Result<ReadGrant, Error> {
    Ok(queries::get_token(db, token)
        .await?
        .ok_or(AccessDenied)?
        .read_grant(Utc::now())?)
}

pub async fn get_write_grant(db: &Database, token: &str) -> Result<WriteGrant, Error> {
    Ok(queries::get_token(db, token)
        .await?
        .ok_or(AccessDenied)?
        .write_grant(Utc::now())?)
}

/// Creates a user and logs them in.
pub async fn register(
    db: &Database,
    name: &str,
    email: &str,
    password: &str,
    session_ttl: Duration,
) -> Result<Session, Error> {
    let name = user::parse_name(name)?;
    let email = user::Email::parse(email)?;
    let password_hash = hash_password(password.to_owned()).await?;
    let now = Utc::now();

    let mut data_tx = db.begin().await?;
    let user = user::insert(&mut data_tx, &name, &email, password_hash.as_str(), now).await?;
    let (token, expires) =
        queries::insert_session(&mut data_tx, user.id, now, now + session_ttl).await?;
    data_tx.commit().await?;

    log::info!("registered user {:?}", user.id);
    Ok(Session {
        user,
        token,
        expires,
    })
}

/// Checks the credentials and issues a new token. Unknown emails and wrong passwords fail the
/// same way, and take the same time: unknown emails are checked against a dummy hash.
pub async fn login(
    db: &Database,
    email: &str,
    password: &str,
    session_ttl: Duration,
) -> Result<Session, Error> {
    let credentials = match user::Email::parse(email) {
        Ok(email) => user::get_credentials(db, &email).await?,
        Err(_) => None,
    };
    let (user, password_hash) = credentials
        .map(|(user, password_hash)| (user, PasswordHash::from_stored(password_hash)))
        .unzip();
    let verified = verify_password(password_hash, password.to_owned()).await?;
    let user = match user {
        Some(user) if verified => user,
        Some(user) => {
            log::info!("failed login for user {:?}", user.id);
            return Err(Error::InvalidCredentials);
        }
        None => return Err(Error::InvalidCredentials),
    };

    let now = Utc::now();
    let mut data_tx = db.begin().await?;
    let (token, expires) =
        queries::insert_session(&mut data_tx, user.id, now, now + session_ttl).await?;
    data_tx.commit().await?;

    Ok(Session {
        user,
        token,
        expires,
    })
}

// Argon2 hashing runs on the blocking thread pool.

async fn hash_password(password: String) -> Result<PasswordHash, Error> {
    tokio::task::spawn_blocking(move || PasswordHash::generate(&password))
        .await
        .map_err(|_| Error::Hashing)?
}

/// Without a stored hash, verifies against [`PasswordHash::dummy`] and discards the result.
async fn verify_password(
    password_hash: Option<PasswordHash>,
    password: String,
) -> Result<bool, Error> {
    tokio::task::spawn_blocking(move || match password_hash {
        Some(password_hash) => password_hash.verify(&password),
        None => {
            PasswordHash::dummy().verify(&password);
            false
        }
    })
    .await
    .map_err(|_| Error::Hashing)
}

mod queries {
    use super::entities::{Permissions, Secret, Token};
    use super::{TokenHash, TokenId};
    use crate::{
        database::{Database, Transaction},
        user,
    };
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    pub(super) async fn get_token(db: &Database, token: &str) -> Result<Option<Token>, sqlx::Error> {
        let token_hash = TokenHash::generate(token);
        Ok(sqlx::query_as::<_, TokenRow>(
            r#"SELECT id, user_id, can_read, can_write, expires, disabled FROM auth_tokens
                WHERE token_hash = $1"#,
        )
        .bind(token_hash.as_str())
        .fetch_optional(db)
        .await?
        .map(|row| row.into_entity()))
    }

    pub(super) async fn insert_session(
        data_tx: &mut Transaction,
        user_id: user::Id,
        created: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> Result<(Secret, DateTime<Utc>), sqlx::Error> {
        let secret = Secret::generate();
        insert_token(
            data_tx,
            user_id,
            &secret.hash(),
            Permissions::all(),
            created,
            Some(expires),
        )
        .await?;
        Ok((secret, expires))
    }

    pub(crate) async fn insert_token(
        data_tx: &mut Transaction,
        user_id: user::Id,
        token_hash: &TokenHash,
        permissions: Permissions,
        created: DateTime<Utc>,
        expires: Option<DateTime<Utc>>,
    ) -> Result<TokenId, sqlx::Error> {
        let id = TokenId(Uuid::new_v4());
        sqlx::query(
            r#"INSERT INTO auth_tokens (id, user_id, token_hash, can_read, can_write, created, expires, disabled)
                VALUES ($1, $2, $3, $4, $5, $6, $7, NULL)"#,
        )
        .bind(id.0)
        .bind(user_id.0)
        .bind(token_hash.as_str())
        .bind(permissions.can_read)
        .bind(permissions.can_write)
        .bind(created)
        .bind(expires)
        .execute(&mut *data_tx)
        .await?;
        Ok(id)
    }

    #[derive(Debug, sqlx::FromRow)]
    struct TokenRow {
        id: Uuid,
        user_id: i64,
        can_read: bool,
        can_write: bool,
        expires: Option<DateTime<Utc>>,
        disabled: Option<DateTime<Utc>>,
    }

    impl TokenRow {
        fn into_entity(self) -> Token {
            Token {
                id: TokenId(self.id),
                user_id: user::Id(self.user_id),
                permissions: Permissions {
                    can_read: self.can_read,
                    can_write: self.can_write,
                },
                expires: self.expires,
                disabled: self.disabled,
            }
        }
    }
}
