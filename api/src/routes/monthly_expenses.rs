use super::expenses::ExpenseModel;
use crate::{
    access,
    error::{self, CreatedResult, JsonError, JsonResult, NoContentResult},
    state::RocketState,
};
use app::monthly;
use chrono::{DateTime, Utc};
use rocket::{delete, get, post, response::status::NoContent, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct MonthlyExpenseRequest {
    /// What the recurring expense is for, e.g. "Rent".
    name: String,
    /// Free-form category, copied to every generated expense.
    tag: String,
    /// Amount of every generated expense. Must be positive; rounded to cents.
    amount: f64,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct MonthlyExpenseModel {
    /// Unique monthly expense identifier.
    id: i64,
    name: String,
    tag: String,
    amount: f64,
    /// Time of the last application. Omitted if never applied, or if the expense generated by
    /// the last application was deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_applied_at: Option<DateTime<Utc>>,
    /// Id of the expense generated by the last application. Omitted together with
    /// `lastAppliedAt`. Older clients called this field `lastExpenseId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_applied_expense_id: Option<i64>,
}

impl MonthlyExpenseModel {
    fn from_entity(monthly_expense: &monthly::MonthlyExpense) -> Self {
        let application = monthly_expense.last_application;
        Self {
            id: monthly_expense.id.0,
            name: monthly_expense.name.clone(),
            tag: monthly_expense.tag.clone(),
            amount: monthly_expense.amount.to_f64(),
            last_applied_at: application.map(|application| application.timestamp),
            last_applied_expense_id: application.map(|application| application.expense_id.0),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct MonthlyExpenseResponse {
    monthly_expense: MonthlyExpenseModel,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct MonthlyExpensesResponse {
    monthly_expenses: Vec<MonthlyExpenseModel>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApplyResponse {
    /// The generated expense.
    expense: ExpenseModel,
    /// The monthly expense, now linked to the generated expense.
    monthly_expense: MonthlyExpenseModel,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please retry later.
    Unknown,
    /// The monthly expense id is not a number.
    InvalidId,
    /// Name is empty or too long.
    InvalidName,
    /// Tag is empty or too long.
    InvalidTag,
    /// Amount must be positive and less than 10 billion.
    InvalidAmount,
    /// No such monthly expense.
    NotFound,
    /// The monthly expense was already applied this calendar month (UTC). Deleting the
    /// generated expense allows applying it again.
    AlreadyAppliedThisPeriod,
}

impl From<&monthly::Error> for Error {
    fn from(e: &monthly::Error) -> Self {
        match e {
            monthly::Error::InvalidName(_) => Error::InvalidName,
            monthly::Error::InvalidTag(_) => Error::InvalidTag,
            monthly::Error::InvalidAmount(_) => Error::InvalidAmount,
            monthly::Error::NotFound => Error::NotFound,
            monthly::Error::AlreadyAppliedThisPeriod(_) => Error::AlreadyAppliedThisPeriod,
            monthly::Error::Storage(_) => Error::Unknown,
        }
    }
}

fn to_json_error(e: monthly::Error) -> JsonError<Error> {
    error::from_kind(e.kind(), Error::from(&e), e.to_string())
}

fn parse_id(raw: &str) -> Result<monthly::Id, JsonError<Error>> {
    error::parse_id(raw, Error::InvalidId).map(monthly::Id)
}

/// List monthly expenses, most recently created first.
#[openapi(tag = "Monthly expenses")]
#[get("/monthly-expenses")]
pub(super) async fn list(
    state: &State<RocketState>,
    guard: access::ReadGuard,
) -> JsonResult<MonthlyExpensesResponse, Error> {
    Ok(Json(MonthlyExpensesResponse {
        monthly_expenses: monthly::list(guard.grant(), &state.db)
            .await
            .map_err(to_json_error)?
            .iter()
            .map(MonthlyExpenseModel::from_entity)
            .collect(),
    }))
}

/// Define a recurring expense.
#[openapi(tag = "Monthly expenses")]
#[post("/monthly-expenses", data = "<req>")]
pub(super) async fn post(
    state: &State<RocketState>,
    req: Json<MonthlyExpenseRequest>,
    guard: access::WriteGuard,
) -> CreatedResult<MonthlyExpenseResponse, Error> {
    let req = req.into_inner();
    let draft = monthly::Draft {
        name: req.name,
        tag: req.tag,
        amount: req.amount,
    };
    monthly::create(guard.grant(), &state.db, &draft)
        .await
        .map(|monthly_expense| {
            error::created(MonthlyExpenseResponse {
                monthly_expense: MonthlyExpenseModel::from_entity(&monthly_expense),
            })
        })
        .map_err(to_json_error)
}

/// Delete a monthly expense. Expenses generated from it are kept.
#[openapi(tag = "Monthly expenses")]
#[delete("/monthly-expenses/<monthly_expense_id>")]
pub(super) async fn delete(
    state: &State<RocketState>,
    guard: access::WriteGuard,
    monthly_expense_id: String,
) -> NoContentResult<Error> {
    let id = parse_id(&monthly_expense_id)?;
    monthly::delete(guard.grant(), &state.db, id)
        .await
        .map(|_| NoContent)
        .map_err(to_json_error)
}

/// Create an expense dated today from a monthly expense. A monthly expense can be applied once
/// per calendar month (UTC).
#[openapi(tag = "Monthly expenses")]
#[post("/monthly-expenses/<monthly_expense_id>/apply")]
pub(super) async fn apply(
    state: &State<RocketState>,
    guard: access::WriteGuard,
    monthly_expense_id: String,
) -> CreatedResult<ApplyResponse, Error> {
    let id = parse_id(&monthly_expense_id)?;
    monthly::apply(guard.grant(), &state.db, id, Utc::now())
        .await
        .map(|applied| {
            error::created(ApplyResponse {
                expense: ExpenseModel::from_entity(&applied.expense),
                monthly_expense: MonthlyExpenseModel::from_entity(&applied.monthly_expense),
            })
        })
        .map_err(to_json_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use app::{expense, user, Amount, Period};
    use chrono::TimeZone;
    use rocket::http::Status;

    fn rent(last_application: Option<monthly::Application>) -> monthly::MonthlyExpense {
        monthly::MonthlyExpense {
            id: monthly::Id(1),
            user_id: user::Id(3),
            name: "Rent".to_owned(),
            tag: "Housing".to_owned(),
            amount: Amount::from_f64(1000.0).unwrap(),
            last_application,
        }
    }

    #[test]
    fn never_applied_omits_link_fields() {
        let value = serde_json::to_value(MonthlyExpenseResponse {
            monthly_expense: MonthlyExpenseModel::from_entity(&rent(None)),
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "monthlyExpense": {
                    "id": 1,
                    "name": "Rent",
                    "tag": "Housing",
                    "amount": 1000.0,
                }
            })
        );
    }

    #[test]
    fn applied_includes_link_fields() {
        let timestamp = Utc.with_ymd_and_hms(2023, 12, 9, 10, 30, 0).unwrap();
        let value = serde_json::to_value(MonthlyExpenseModel::from_entity(&rent(Some(
            monthly::Application {
                timestamp,
                expense_id: expense::Id(10),
            },
        ))))
        .unwrap();
        assert_eq!(value["lastAppliedExpenseId"], 10);
        assert_eq!(value["lastAppliedAt"], "2023-12-09T10:30:00Z");
        assert!(value.get("lastExpenseId").is_none());
        assert!(value.get("userId").is_none());
    }

    #[test]
    fn repeated_application_is_a_bad_request() {
        let now = Utc.with_ymd_and_hms(2023, 12, 9, 10, 30, 0).unwrap();
        let (status, Json(body)) =
            to_json_error(monthly::Error::AlreadyAppliedThisPeriod(Period::containing(now)));
        assert_eq!(status, Status::BadRequest);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"]["status"], "ALREADY_APPLIED_THIS_PERIOD");
    }

    #[test]
    fn missing_and_foreign_monthly_expenses_look_the_same() {
        let (status, Json(body)) = to_json_error(monthly::Error::NotFound);
        assert_eq!(status, Status::NotFound);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"]["status"], "NOT_FOUND");
        assert_eq!(value["error"]["description"], "monthly expense not found");
    }
}
