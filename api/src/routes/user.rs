//! Routes for querying user information.

use chrono::{DateTime, Utc};
use rocket::{get, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::Serialize;

use app::user;

use crate::{
    access,
    error::{self, JsonResult},
    state::RocketState,
};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserModel {
    /// Unique user identifier.
    id: i64,
    /// Display name.
    name: String,
    /// Registered user email.
    email: String,
    /// Registration time.
    created_at: DateTime<Utc>,
}

impl UserModel {
    pub(super) fn from_entity(user: &user::User) -> Self {
        Self {
            id: user.id.0,
            name: user.name.clone(),
            email: user.email.0.clone(),
            created_at: user.created,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct UserResponse {
    user: UserModel,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please retry later.
    Unknown,
    /// The user behind this token no longer exists.
    NotFound,
}

/// Get the details of the authenticated user.
#[openapi(tag = "User")]
#[get("/auth/me")]
pub(super) async fn get(
    guard: access::ReadGuard,
    state: &State<RocketState>,
) -> JsonResult<UserResponse, Error> {
    user::get(guard.grant(), &state.db)
        .await
        .map(|user| {
            Json(UserResponse {
                user: UserModel::from_entity(&user),
            })
        })
        .map_err(|e| {
            let status = match e {
                user::Error::NotFound => Error::NotFound,
                _ => Error::Unknown,
            };
            error::from_kind(e.kind(), status, e.to_string())
        })
}
