//! Handles user authentication, authorization, and tokens. Authentication is proven by possession
//! of a token; authorization is proven by possession of a grant. There are two different grants:
//! read and write, and they're encoded as two separate types in the type system. Every operation
//! on user data takes one of them, and the grant's user id scopes the operation.

use crate::{hex::Hex, user, ErrorKind};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use const_format::formatcp;
use rand::RngCore;
use sha2::Digest;
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

pub(crate) const MIN_PASSWORD_CHARS: usize = 6;
const TOKEN_BYTES: usize = 32;
const DUMMY_PASSWORD: &str = "no user has this password";

#[derive(Debug, Error)]
#[error("access denied")]
pub struct AccessDenied;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid password: {0}")]
    InvalidPassword(&'static str),
    #[error("password hashing failed")]
    Hashing,
    #[error(transparent)]
    User(#[from] user::Error),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AccessDenied(_) | Error::InvalidCredentials => ErrorKind::Unauthorized,
            Error::InvalidPassword(_) => ErrorKind::Validation,
            Error::User(e) => e.kind(),
            Error::Hashing | Error::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TokenId(pub Uuid);

/// This grant represents a compile-time proof that the token is authorized to read data.
#[derive(Debug)]
pub struct ReadGrant {
    pub token_id: TokenId,
    pub user_id: user::Id,
}

/// This grant represents a compile-time proof that the token is authorized to create, delete and
/// apply expenses.
#[derive(Debug)]
pub struct WriteGrant {
    pub token_id: TokenId,
    pub user_id: user::Id,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Permissions {
    pub can_read: bool,
    pub can_write: bool,
}

impl Permissions {
    pub(crate) fn all() -> Self {
        Self {
            can_read: true,
            can_write: true,
        }
    }
}

/// A hash of the token.
pub struct TokenHash(Hex);

impl TokenHash {
    /// Hashes a token with SHA256, without salting. Tokens are generated randomly, so they have
    /// enough entropy for a fast unsalted hash.
    pub(crate) fn generate(token: &str) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(token);
        let sha = hasher.finalize();
        Self(Hex::encode(&sha))
    }

    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// The plain token handed to the user once. Only its [`TokenHash`] is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub(crate) fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(Hex::encode(&bytes).into_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn hash(&self) -> TokenHash {
        TokenHash::generate(&self.0)
    }
}

/// A token proves the identity of a user. Tokens issued at login expire; tokens created by other
/// means may not.
#[derive(Debug)]
pub struct Token {
    pub(crate) id: TokenId,
    pub(crate) user_id: user::Id,
    pub(crate) permissions: Permissions,
    pub(crate) expires: Option<DateTime<Utc>>,
    pub(crate) disabled: Option<DateTime<Utc>>,
}

impl Token {
    pub(crate) fn read_grant(&self, now: DateTime<Utc>) -> Result<ReadGrant, AccessDenied> {
        if self.is_enabled(now) && self.permissions.can_read {
            Ok(ReadGrant {
                token_id: self.id,
                user_id: self.user_id,
            })
        } else {
            Err(AccessDenied)
        }
    }

    pub(crate) fn write_grant(&self, now: DateTime<Utc>) -> Result<WriteGrant, AccessDenied> {
        if self.is_enabled(now) && self.permissions.can_write {
            Ok(WriteGrant {
                token_id: self.id,
                user_id: self.user_id,
            })
        } else {
            Err(AccessDenied)
        }
    }

    fn is_enabled(&self, now: DateTime<Utc>) -> bool {
        self.disabled.is_none() && self.expires.map_or(true, |expires| now < expires)
    }
}

/// An Argon2id hash in PHC string format.
#[derive(Debug, Clone)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub(crate) fn generate(password: &str) -> Result<Self, Error> {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(Error::InvalidPassword(formatcp!(
                "password must be at least {} characters long",
                MIN_PASSWORD_CHARS
            )));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| Error::Hashing)?;
        Ok(Self(hash.to_string()))
    }

    /// A hash to verify against when the email is unknown, so that unknown emails take as long
    /// as wrong passwords. Computed on first use.
    pub(crate) fn dummy() -> &'static PasswordHash {
        static DUMMY: OnceLock<PasswordHash> = OnceLock::new();
        DUMMY.get_or_init(|| {
            Self::generate(DUMMY_PASSWORD).unwrap_or_else(|_| Self(String::new()))
        })
    }

    pub(crate) fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns false for a wrong password as well as for a hash that can't be parsed.
    pub(crate) fn verify(&self, password: &str) -> bool {
        match argon2::PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
