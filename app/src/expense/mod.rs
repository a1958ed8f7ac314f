use crate::{auth, database::Database, monthly};

mod entities;

pub use entities::{parse_date, DateRange, Draft, Error, Expense, Id, NewExpense};
pub(crate) use entities::parse_label;
pub(crate) use queries::insert;

pub async fn create(
    grant: &auth::WriteGrant,
    db: &Database,
    draft: &Draft,
) -> Result<Expense, Error> {
    let new_expense = NewExpense::from_draft(grant.user_id, draft)?;
    let mut data_tx = db.begin().await?;
    let expense = queries::insert(&mut data_tx, &new_expense).await?;
    data_tx.commit().await?;
    Ok(expense)
}

/// Lists the user's expenses within `range`, newest date first. Expenses on the same day are
/// ordered by id, most recently created first.
pub async fn list(
    grant: &auth::ReadGrant,
    db: &Database,
    range: DateRange,
) -> Result<Vec<Expense>, Error> {
    Ok(queries::list(db, grant.user_id, range).await?)
}

/// Deletes an expense. A monthly expense whose last application generated this expense is
/// unlinked in the same transaction, which makes it eligible to be applied again.
pub async fn delete(grant: &auth::WriteGrant, db: &Database, id: Id) -> Result<(), Error> {
    let mut data_tx = db.begin().await?;
    let unlinked = monthly::unlink_expense(&mut data_tx, grant.user_id, id).await?;
    if !queries::delete(&mut data_tx, grant.user_id, id).await? {
        // Dropping the transaction rolls back the unlink as well.
        return Err(Error::NotFound);
    }
    data_tx.commit().await?;

    if unlinked > 0 {
        log::info!(
            "deleted expense {:?}, unlinked {} monthly expense(s)",
            id,
            unlinked
        );
    }
    Ok(())
}

mod queries {
    use super::{DateRange, Expense, Id, NewExpense};
    use crate::{
        database::{Database, Transaction},
        user, Amount,
    };
    use chrono::NaiveDate;
    use const_format::formatcp;
    use rust_decimal::Decimal;

    const COLUMNS: &str = "id, user_id, name, tag, amount, expense_date";

    pub(crate) async fn insert(
        data_tx: &mut Transaction,
        expense: &NewExpense,
    ) -> Result<Expense, sqlx::Error> {
        Ok(sqlx::query_as::<_, ExpenseRow>(formatcp!(
            r#"INSERT INTO expenses (user_id, name, tag, amount, expense_date)
                VALUES ($1, $2, $3, $4, $5) RETURNING {}"#,
            COLUMNS
        ))
        .bind(expense.user_id.0)
        .bind(&expense.name)
        .bind(&expense.tag)
        .bind(expense.amount.as_decimal())
        .bind(expense.date)
        .fetch_one(&mut *data_tx)
        .await?
        .into_entity())
    }

    pub(super) async fn list(
        db: &Database,
        user_id: user::Id,
        range: DateRange,
    ) -> Result<Vec<Expense>, sqlx::Error> {
        Ok(sqlx::query_as::<_, ExpenseRow>(formatcp!(
            r#"SELECT {} FROM expenses
                WHERE user_id = $1
                    AND ($2::DATE IS NULL OR expense_date >= $2)
                    AND ($3::DATE IS NULL OR expense_date <= $3)
                ORDER BY expense_date DESC, id DESC"#,
            COLUMNS
        ))
        .bind(user_id.0)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|row| row.into_entity())
        .collect())
    }

    /// Returns false if the user has no expense with this id.
    pub(super) async fn delete(
        data_tx: &mut Transaction,
        user_id: user::Id,
        id: Id,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND user_id = $2")
            .bind(id.0)
            .bind(user_id.0)
            .execute(&mut *data_tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[derive(sqlx::FromRow, Debug)]
    struct ExpenseRow {
        id: i64,
        user_id: i64,
        name: String,
        tag: String,
        amount: Decimal,
        expense_date: NaiveDate,
    }

    impl ExpenseRow {
        fn into_entity(self) -> Expense {
            Expense {
                id: Id(self.id),
                user_id: user::Id(self.user_id),
                name: self.name,
                tag: self.tag,
                amount: Amount::from_stored(self.amount),
                date: self.expense_date,
            }
        }
    }
}
