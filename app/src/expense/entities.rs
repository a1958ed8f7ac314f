//! Dated expense records. An expense is either entered directly or generated by applying a
//! monthly expense, see [`crate::monthly`]; both end up as the same kind of row.

use crate::{amount, user, Amount, ErrorKind};
use chrono::NaiveDate;
use const_format::formatcp;
use thiserror::Error;

pub(crate) const MAX_LABEL_CHARS: usize = 255;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid name: {0}")]
    InvalidName(&'static str),
    #[error("invalid tag: {0}")]
    InvalidTag(&'static str),
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] amount::Error),
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("expense not found")]
    NotFound,
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidName(_)
            | Error::InvalidTag(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_) => ErrorKind::Validation,
            Error::NotFound => ErrorKind::NotFound,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    pub id: Id,
    pub user_id: user::Id,
    pub name: String,
    pub tag: String,
    pub amount: Amount,
    pub date: NaiveDate,
}

/// Expense fields as submitted by the user, before any validation.
#[derive(Debug, Clone)]
pub struct Draft {
    pub name: String,
    pub tag: String,
    pub amount: f64,
    pub date: String,
}

/// A validated expense that hasn't been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub user_id: user::Id,
    pub name: String,
    pub tag: String,
    pub amount: Amount,
    pub date: NaiveDate,
}

impl NewExpense {
    pub fn from_draft(user_id: user::Id, draft: &Draft) -> Result<Self, Error> {
        Ok(Self {
            user_id,
            name: parse_label(&draft.name).map_err(Error::InvalidName)?,
            tag: parse_label(&draft.tag).map_err(Error::InvalidTag)?,
            amount: Amount::from_f64(draft.amount)?,
            date: parse_date(&draft.date)?,
        })
    }
}

/// Inclusive bounds on the expense date. Missing bounds are open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Parses optional `YYYY-MM-DD` bounds. Empty strings count as missing.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self, Error> {
        let parse_bound = |bound: Option<&str>| match bound.map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_date(raw).map(Some),
            _ => Ok(None),
        };
        Ok(Self {
            from: parse_bound(from)?,
            to: parse_bound(to)?,
        })
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(raw.to_owned()))
}

/// Trims a name or tag and checks that it's non-empty and not too long.
pub(crate) fn parse_label(raw: &str) -> Result<String, &'static str> {
    let label = raw.trim();
    if label.is_empty() {
        Err("must not be empty")
    } else if label.chars().count() > MAX_LABEL_CHARS {
        Err(formatcp!("can be up to {} characters long", MAX_LABEL_CHARS))
    } else {
        Ok(label.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> Draft {
        Draft {
            name: " Groceries ".to_owned(),
            tag: "Food".to_owned(),
            amount: 42.5,
            date: "2023-12-09".to_owned(),
        }
    }

    #[test]
    fn valid_draft() {
        let expense = NewExpense::from_draft(user::Id(1), &draft()).unwrap();
        assert_eq!(expense.name, "Groceries");
        assert_eq!(expense.tag, "Food");
        assert_eq!(expense.amount.to_f64(), 42.5);
        assert_eq!(expense.date, date(2023, 12, 9));
    }

    #[test]
    fn invalid_drafts() {
        let mut d = draft();
        d.date = "09/12/2023".to_owned();
        let err = NewExpense::from_draft(user::Id(1), &d).unwrap_err();
        assert!(matches!(err, Error::InvalidDate(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut d = draft();
        d.date = "2023-02-30".to_owned();
        assert!(matches!(
            NewExpense::from_draft(user::Id(1), &d),
            Err(Error::InvalidDate(_))
        ));

        let mut d = draft();
        d.amount = -1.0;
        assert!(matches!(
            NewExpense::from_draft(user::Id(1), &d),
            Err(Error::InvalidAmount(amount::Error::NotPositive))
        ));

        let mut d = draft();
        d.tag = "  ".to_owned();
        assert!(matches!(
            NewExpense::from_draft(user::Id(1), &d),
            Err(Error::InvalidTag(_))
        ));

        let mut d = draft();
        d.name = "x".repeat(MAX_LABEL_CHARS + 1);
        assert!(matches!(
            NewExpense::from_draft(user::Id(1), &d),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn date_range_parses_both_bounds() {
        let range = DateRange::parse(Some("2023-01-01"), Some(" 2023-12-31 ")).unwrap();
        assert_eq!(range.from, Some(date(2023, 1, 1)));
        assert_eq!(range.to, Some(date(2023, 12, 31)));
    }

    #[test]
    fn date_range_missing_bounds_are_open() {
        assert_eq!(DateRange::parse(None, Some("")).unwrap(), DateRange::default());

        let range = DateRange::parse(Some("2023-06-01"), None).unwrap();
        assert_eq!(range.from, Some(date(2023, 6, 1)));
        assert_eq!(range.to, None);
    }

    #[test]
    fn malformed_range_bounds_fail() {
        assert!(matches!(
            DateRange::parse(Some("2023-13-01"), None),
            Err(Error::InvalidDate(raw)) if raw == "2023-13-01"
        ));
        assert!(matches!(
            DateRange::parse(None, Some("yesterday")),
            Err(Error::InvalidDate(_))
        ));
    }
}
