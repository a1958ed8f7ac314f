use crate::{
    access,
    error::{self, CreatedResult, JsonError, JsonResult, NoContentResult},
    state::RocketState,
};
use app::expense;
use chrono::NaiveDate;
use rocket::{delete, get, post, response::status::NoContent, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct ExpenseRequest {
    /// What the money was spent on.
    name: String,
    /// Free-form category, e.g. "Food".
    tag: String,
    /// Amount spent. Must be positive; rounded to cents.
    amount: f64,
    /// Expense date, formatted as YYYY-MM-DD.
    date: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct ExpenseModel {
    /// Unique expense identifier.
    id: i64,
    name: String,
    tag: String,
    amount: f64,
    /// Expense date, formatted as YYYY-MM-DD.
    date: NaiveDate,
}

impl ExpenseModel {
    pub(super) fn from_entity(expense: &expense::Expense) -> Self {
        Self {
            id: expense.id.0,
            name: expense.name.clone(),
            tag: expense.tag.clone(),
            amount: expense.amount.to_f64(),
            date: expense.date,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct ExpenseResponse {
    expense: ExpenseModel,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct ExpensesResponse {
    expenses: Vec<ExpenseModel>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please retry later.
    Unknown,
    /// The expense id is not a number.
    InvalidId,
    /// Name is empty or too long.
    InvalidName,
    /// Tag is empty or too long.
    InvalidTag,
    /// Amount must be positive and less than 10 billion.
    InvalidAmount,
    /// Dates must be formatted as YYYY-MM-DD.
    InvalidDate,
    /// No such expense.
    NotFound,
}

impl From<&expense::Error> for Error {
    fn from(e: &expense::Error) -> Self {
        match e {
            expense::Error::InvalidName(_) => Error::InvalidName,
            expense::Error::InvalidTag(_) => Error::InvalidTag,
            expense::Error::InvalidAmount(_) => Error::InvalidAmount,
            expense::Error::InvalidDate(_) => Error::InvalidDate,
            expense::Error::NotFound => Error::NotFound,
            expense::Error::Storage(_) => Error::Unknown,
        }
    }
}

fn to_json_error(e: expense::Error) -> JsonError<Error> {
    error::from_kind(e.kind(), Error::from(&e), e.to_string())
}

/// List expenses, newest first. `from` and `to` are optional inclusive bounds formatted as
/// YYYY-MM-DD.
#[openapi(tag = "Expenses")]
#[get("/expenses?<from>&<to>")]
pub(super) async fn list(
    state: &State<RocketState>,
    guard: access::ReadGuard,
    from: Option<String>,
    to: Option<String>,
) -> JsonResult<ExpensesResponse, Error> {
    let range =
        expense::DateRange::parse(from.as_deref(), to.as_deref()).map_err(to_json_error)?;
    Ok(Json(ExpensesResponse {
        expenses: expense::list(guard.grant(), &state.db, range)
            .await
            .map_err(to_json_error)?
            .iter()
            .map(ExpenseModel::from_entity)
            .collect(),
    }))
}

/// Record an expense.
#[openapi(tag = "Expenses")]
#[post("/expenses", data = "<req>")]
pub(super) async fn post(
    state: &State<RocketState>,
    req: Json<ExpenseRequest>,
    guard: access::WriteGuard,
) -> CreatedResult<ExpenseResponse, Error> {
    let req = req.into_inner();
    let draft = expense::Draft {
        name: req.name,
        tag: req.tag,
        amount: req.amount,
        date: req.date,
    };
    expense::create(guard.grant(), &state.db, &draft)
        .await
        .map(|expense| {
            error::created(ExpenseResponse {
                expense: ExpenseModel::from_entity(&expense),
            })
        })
        .map_err(to_json_error)
}

/// Delete an expense. If the expense was generated by applying a monthly expense, that monthly
/// expense can be applied again.
#[openapi(tag = "Expenses")]
#[delete("/expenses/<expense_id>")]
pub(super) async fn delete(
    state: &State<RocketState>,
    guard: access::WriteGuard,
    expense_id: String,
) -> NoContentResult<Error> {
    let id = expense::Id(error::parse_id(&expense_id, Error::InvalidId)?);
    expense::delete(guard.grant(), &state.db, id)
        .await
        .map(|_| NoContent)
        .map_err(to_json_error)
}
