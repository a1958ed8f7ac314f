use crate::{
    auth,
    database::{Database, Transaction},
    expense::{self, Expense},
    user,
};
use chrono::{DateTime, SubsecRound, Utc};

mod entities;

pub use entities::{Application, Draft, Error, Id, MonthlyExpense, NewMonthlyExpense};

/// The outcome of applying a monthly expense.
#[derive(Debug)]
pub struct Applied {
    pub expense: Expense,
    pub monthly_expense: MonthlyExpense,
}

pub async fn create(
    grant: &auth::WriteGrant,
    db: &Database,
    draft: &Draft,
) -> Result<MonthlyExpense, Error> {
    let new_monthly_expense = NewMonthlyExpense::from_draft(grant.user_id, draft)?;
    let mut data_tx = db.begin().await?;
    let monthly_expense = queries::insert(&mut data_tx, &new_monthly_expense).await?;
    data_tx.commit().await?;
    Ok(monthly_expense)
}

/// Lists the user's monthly expenses, most recently created first.
pub async fn list(grant: &auth::ReadGrant, db: &Database) -> Result<Vec<MonthlyExpense>, Error> {
    Ok(queries::list(db, grant.user_id).await?)
}

/// Deletes a monthly expense. Expenses generated from it are kept.
pub async fn delete(grant: &auth::WriteGrant, db: &Database, id: Id) -> Result<(), Error> {
    if queries::delete(db, grant.user_id, id).await? {
        Ok(())
    } else {
        Err(Error::NotFound)
    }
}

/// Turns the monthly expense into an expense dated `now`, at most once per calendar month.
///
/// The monthly expense row is locked for the duration of the transaction, so concurrent
/// applications of the same monthly expense are serialized and only the first one passes the
/// monthly check. The expense insert and the link update commit together or not at all.
pub async fn apply(
    grant: &auth::WriteGrant,
    db: &Database,
    id: Id,
    now: DateTime<Utc>,
) -> Result<Applied, Error> {
    // Postgres keeps microseconds, so truncate to return exactly what gets stored.
    let now = now.trunc_subsecs(6);

    let mut data_tx = db.begin().await?;
    let mut monthly_expense = queries::get_for_update(&mut data_tx, grant.user_id, id)
        .await?
        .ok_or(Error::NotFound)?;
    let new_expense = match monthly_expense.expense_for(now) {
        Ok(new_expense) => new_expense,
        Err(e) => {
            log::info!("rejected application of monthly expense {:?}: {}", id, e);
            return Err(e);
        }
    };
    let expense = expense::insert(&mut data_tx, &new_expense).await?;
    monthly_expense.record_application(&expense, now);
    queries::update_application(&mut data_tx, &monthly_expense).await?;
    data_tx.commit().await?;

    log::info!(
        "applied monthly expense {:?} as expense {:?}",
        monthly_expense.id,
        expense.id
    );
    Ok(Applied {
        expense,
        monthly_expense,
    })
}

/// Clears the link of every monthly expense of the user whose last application generated
/// `expense_id`. Returns the number of monthly expenses unlinked, which may be zero.
pub(crate) async fn unlink_expense(
    data_tx: &mut Transaction,
    user_id: user::Id,
    expense_id: expense::Id,
) -> Result<u64, sqlx::Error> {
    queries::unlink_expense(data_tx, user_id, expense_id).await
}

mod queries {
    use super::{Application, Id, MonthlyExpense, NewMonthlyExpense};
    use crate::{
        database::{Database, Transaction},
        expense, user, Amount,
    };
    use chrono::{DateTime, Utc};
    use const_format::formatcp;
    use rust_decimal::Decimal;

    const COLUMNS: &str = "id, user_id, name, tag, amount, last_applied_at, last_applied_expense_id";

    pub(super) async fn insert(
        data_tx: &mut Transaction,
        monthly_expense: &NewMonthlyExpense,
    ) -> Result<MonthlyExpense, sqlx::Error> {
        Ok(sqlx::query_as::<_, MonthlyExpenseRow>(formatcp!(
            r#"INSERT INTO monthly_expenses (user_id, name, tag, amount)
                VALUES ($1, $2, $3, $4) RETURNING {}"#,
            COLUMNS
        ))
        .bind(monthly_expense.user_id.0)
        .bind(&monthly_expense.name)
        .bind(&monthly_expense.tag)
        .bind(monthly_expense.amount.as_decimal())
        .fetch_one(&mut *data_tx)
        .await?
        .into_entity())
    }

    pub(super) async fn list(
        db: &Database,
        user_id: user::Id,
    ) -> Result<Vec<MonthlyExpense>, sqlx::Error> {
        Ok(sqlx::query_as::<_, MonthlyExpenseRow>(formatcp!(
            "SELECT {} FROM monthly_expenses WHERE user_id = $1 ORDER BY id DESC",
            COLUMNS
        ))
        .bind(user_id.0)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|row| row.into_entity())
        .collect())
    }

    /// Loads the monthly expense and locks its row until the transaction ends.
    pub(super) async fn get_for_update(
        data_tx: &mut Transaction,
        user_id: user::Id,
        id: Id,
    ) -> Result<Option<MonthlyExpense>, sqlx::Error> {
        Ok(sqlx::query_as::<_, MonthlyExpenseRow>(formatcp!(
            "SELECT {} FROM monthly_expenses WHERE id = $1 AND user_id = $2 FOR UPDATE",
            COLUMNS
        ))
        .bind(id.0)
        .bind(user_id.0)
        .fetch_optional(&mut *data_tx)
        .await?
        .map(|row| row.into_entity()))
    }

    pub(super) async fn update_application(
        data_tx: &mut Transaction,
        monthly_expense: &MonthlyExpense,
    ) -> Result<(), sqlx::Error> {
        let application = monthly_expense.last_application;
        sqlx::query(
            r#"UPDATE monthly_expenses SET last_applied_at = $1, last_applied_expense_id = $2
                WHERE id = $3 AND user_id = $4"#,
        )
        .bind(application.map(|application| application.timestamp))
        .bind(application.map(|application| application.expense_id.0))
        .bind(monthly_expense.id.0)
        .bind(monthly_expense.user_id.0)
        .execute(&mut *data_tx)
        .await?;
        Ok(())
    }

    /// Returns false if the user has no monthly expense with this id.
    pub(super) async fn delete(
        db: &Database,
        user_id: user::Id,
        id: Id,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM monthly_expenses WHERE id = $1 AND user_id = $2")
            .bind(id.0)
            .bind(user_id.0)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(super) async fn unlink_expense(
        data_tx: &mut Transaction,
        user_id: user::Id,
        expense_id: expense::Id,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE monthly_expenses SET last_applied_at = NULL, last_applied_expense_id = NULL
                WHERE user_id = $1 AND last_applied_expense_id = $2"#,
        )
        .bind(user_id.0)
        .bind(expense_id.0)
        .execute(&mut *data_tx)
        .await?;
        Ok(result.rows_affected())
    }

    #[derive(sqlx::FromRow, Debug)]
    struct MonthlyExpenseRow {
        id: i64,
        user_id: i64,
        name: String,
        tag: String,
        amount: Decimal,
        last_applied_at: Option<DateTime<Utc>>,
        last_applied_expense_id: Option<i64>,
    }

    impl MonthlyExpenseRow {
        fn into_entity(self) -> MonthlyExpense {
            MonthlyExpense {
                id: Id(self.id),
                user_id: user::Id(self.user_id),
                name: self.name,
                tag: self.tag,
                amount: Amount::from_stored(self.amount),
                last_application: match (self.last_applied_at, self.last_applied_expense_id) {
                    (Some(timestamp), Some(expense_id)) => Some(Application {
                        timestamp,
                        expense_id: expense::Id(expense_id),
                    }),
                    _ => None,
                },
            }
        }
    }
}
