use chrono::{DateTime, Utc};
use const_format::formatcp;
use thiserror::Error;

use crate::ErrorKind;

const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid name: {0}")]
    InvalidName(&'static str),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("email is already registered")]
    EmailTaken,
    #[error("user not found")]
    NotFound,
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidName(_) | Error::InvalidEmail | Error::EmailTaken => {
                ErrorKind::Validation
            }
            Error::NotFound => ErrorKind::NotFound,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// A normalized (trimmed, lowercase) email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(pub String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let email = raw.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.contains(char::is_whitespace) =>
            {
                Ok(Self(email))
            }
            _ => Err(Error::InvalidEmail),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub i64);

#[derive(Debug, Clone)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: Email,
    pub created: DateTime<Utc>,
}

pub(crate) fn parse_name(raw: &str) -> Result<String, Error> {
    let name = raw.trim();
    if name.is_empty() {
        Err(Error::InvalidName("name must not be empty"))
    } else if name.chars().count() > MAX_NAME_CHARS {
        Err(Error::InvalidName(formatcp!(
            "name can be up to {} characters long",
            MAX_NAME_CHARS
        )))
    } else {
        Ok(name.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let email = Email::parse("  Ana@Example.COM ").unwrap();
        assert_eq!(email.0, "ana@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for raw in ["", "ana", "@example.com", "ana@", "ana@b@c", "a na@example.com"] {
            assert!(
                matches!(Email::parse(raw), Err(Error::InvalidEmail)),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(parse_name("  Ana ").unwrap(), "Ana");
        assert!(matches!(parse_name("   "), Err(Error::InvalidName(_))));
        assert!(matches!(
            parse_name(&"x".repeat(MAX_NAME_CHARS + 1)),
            Err(Error::InvalidName(_))
        ));
    }
}
