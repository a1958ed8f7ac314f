//! Monthly expenses are recurring expense definitions. A monthly expense doesn't schedule
//! anything: applying it turns it into a concrete [`Expense`] dated today, at most once per
//! calendar month, and remembers which expense the last application produced.
//!
//! The link to the generated expense is weak. Deleting that expense clears the link (see
//! [`crate::expense::delete`]), which makes the monthly expense eligible to be applied again in
//! the same month. Deleting the monthly expense leaves its generated expenses alone.

use crate::{
    amount,
    expense::{self, Expense, NewExpense},
    period::{self, Period},
    user, Amount, ErrorKind,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid name: {0}")]
    InvalidName(&'static str),
    #[error("invalid tag: {0}")]
    InvalidTag(&'static str),
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] amount::Error),
    #[error("monthly expense not found")]
    NotFound,
    #[error("monthly expense has already been applied in {0}")]
    AlreadyAppliedThisPeriod(Period),
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidName(_) | Error::InvalidTag(_) | Error::InvalidAmount(_) => {
                ErrorKind::Validation
            }
            Error::NotFound => ErrorKind::NotFound,
            Error::AlreadyAppliedThisPeriod(_) => ErrorKind::PolicyViolation,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub i64);

/// The most recent application of a monthly expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Application {
    pub timestamp: DateTime<Utc>,
    pub expense_id: expense::Id,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyExpense {
    pub id: Id,
    pub user_id: user::Id,
    pub name: String,
    pub tag: String,
    pub amount: Amount,
    /// None if the monthly expense has never been applied, or if the expense generated by its
    /// last application was deleted.
    pub last_application: Option<Application>,
}

/// Monthly expense fields as submitted by the user, before any validation.
#[derive(Debug, Clone)]
pub struct Draft {
    pub name: String,
    pub tag: String,
    pub amount: f64,
}

/// A validated monthly expense that hasn't been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMonthlyExpense {
    pub user_id: user::Id,
    pub name: String,
    pub tag: String,
    pub amount: Amount,
}

impl NewMonthlyExpense {
    pub fn from_draft(user_id: user::Id, draft: &Draft) -> Result<Self, Error> {
        Ok(Self {
            user_id,
            name: expense::parse_label(&draft.name).map_err(Error::InvalidName)?,
            tag: expense::parse_label(&draft.tag).map_err(Error::InvalidTag)?,
            amount: Amount::from_f64(draft.amount)?,
        })
    }
}

impl MonthlyExpense {
    pub fn is_applied_in(&self, period: Period) -> bool {
        self.last_application
            .map_or(false, |application| {
                Period::containing(application.timestamp) == period
            })
    }

    /// Enforces the once-per-month rule and builds the expense that applying at `now` creates.
    pub(crate) fn expense_for(&self, now: DateTime<Utc>) -> Result<NewExpense, Error> {
        let period = Period::containing(now);
        if self.is_applied_in(period) {
            return Err(Error::AlreadyAppliedThisPeriod(period));
        }
        Ok(NewExpense {
            user_id: self.user_id,
            name: self.name.clone(),
            tag: self.tag.clone(),
            amount: self.amount,
            date: period::reporting_date(now),
        })
    }

    /// Links the monthly expense to the expense generated from it.
    pub(crate) fn record_application(&mut self, expense: &Expense, now: DateTime<Utc>) {
        if expense.user_id != self.user_id {
            panic!(
                "expense {:?} of user {:?} can't be linked to monthly expense {:?} of user {:?}",
                expense.id, expense.user_id, self.id, self.user_id
            );
        }
        self.last_application = Some(Application {
            timestamp: now,
            expense_id: expense.id,
        });
    }
}
