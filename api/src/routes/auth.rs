//! Registration and login. Both return a token to send in the `X-Auth-Token` header.

use super::user::UserModel;
use crate::{
    error::{self, CreatedResult, JsonResult},
    state::RocketState,
};
use app::{auth, user};
use chrono::{DateTime, Utc};
use rocket::{post, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct RegisterRequest {
    /// Display name.
    name: String,
    /// Email address, used to log in.
    email: String,
    /// At least 6 characters.
    password: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionResponse {
    user: UserModel,
    /// Token to send in the `X-Auth-Token` header.
    token: String,
    /// The token stops working after this time.
    expires_at: DateTime<Utc>,
}

impl SessionResponse {
    fn from_entity(session: &auth::Session) -> Self {
        Self {
            user: UserModel::from_entity(&session.user),
            token: session.token.as_str().to_owned(),
            expires_at: session.expires,
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please retry later.
    Unknown,
    /// Name is empty or too long.
    InvalidName,
    /// Email address is malformed.
    InvalidEmail,
    /// A user with this email is already registered.
    EmailTaken,
    /// Password is too short.
    InvalidPassword,
    /// Email or password is wrong.
    InvalidCredentials,
}

impl From<&auth::Error> for Error {
    fn from(e: &auth::Error) -> Self {
        match e {
            auth::Error::User(user::Error::InvalidName(_)) => Error::InvalidName,
            auth::Error::User(user::Error::InvalidEmail) => Error::InvalidEmail,
            auth::Error::User(user::Error::EmailTaken) => Error::EmailTaken,
            auth::Error::InvalidPassword(_) => Error::InvalidPassword,
            auth::Error::InvalidCredentials | auth::Error::AccessDenied(_) => {
                Error::InvalidCredentials
            }
            auth::Error::User(_) | auth::Error::Hashing | auth::Error::Storage(_) => {
                Error::Unknown
            }
        }
    }
}

fn to_json_error(e: auth::Error) -> error::JsonError<Error> {
    error::from_kind(e.kind(), Error::from(&e), e.to_string())
}

/// Create an account. The response contains a token, so there's no need to log in afterwards.
#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<req>")]
pub(super) async fn register(
    state: &State<RocketState>,
    req: Json<RegisterRequest>,
) -> CreatedResult<SessionResponse, Error> {
    auth::register(
        &state.db,
        &req.name,
        &req.email,
        &req.password,
        state.session_ttl,
    )
    .await
    .map(|session| error::created(SessionResponse::from_entity(&session)))
    .map_err(to_json_error)
}

/// Log in with email and password.
#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<req>")]
pub(super) async fn login(
    state: &State<RocketState>,
    req: Json<LoginRequest>,
) -> JsonResult<SessionResponse, Error> {
    auth::login(&state.db, &req.email, &req.password, state.session_ttl)
        .await
        .map(|session| Json(SessionResponse::from_entity(&session)))
        .map_err(to_json_error)
}
