//! JSON bodies for failures that happen before a route runs: malformed request bodies, rejected
//! tokens, rate limiting and unknown paths.

use rocket::{catch, catchers, Catcher};
use serde::Serialize;

use crate::error::{self, JsonError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum Error {
    /// Unexpected error, please retry later.
    Unknown,
    /// The body is not valid JSON, or misses fields, or has fields of the wrong type.
    InvalidBody,
    /// The token is missing, unknown, expired or lacks the permission.
    AccessDenied,
    RateLimited,
    NotFound,
}

// Rocket answers 422 for JSON that parses but doesn't fit the request type.

#[catch(400)]
fn bad_request() -> JsonError<Error> {
    error::bad_request(Error::InvalidBody, "the request is malformed".to_owned())
}

#[catch(422)]
fn unprocessable_entity() -> JsonError<Error> {
    error::bad_request(
        Error::InvalidBody,
        "the request body is missing fields or has fields of the wrong type".to_owned(),
    )
}

#[catch(403)]
fn forbidden() -> JsonError<Error> {
    error::forbidden(
        Error::AccessDenied,
        "missing or invalid token, or the token lacks the permission".to_owned(),
    )
}

#[catch(404)]
fn not_found() -> JsonError<Error> {
    error::not_found(Error::NotFound, "no such endpoint".to_owned())
}

#[catch(429)]
fn too_many_requests() -> JsonError<Error> {
    error::too_many_requests(
        Error::RateLimited,
        "too many requests, please slow down".to_owned(),
    )
}

#[catch(500)]
fn internal_server_error() -> JsonError<Error> {
    error::internal_server_error(
        Error::Unknown,
        "the request could not be completed, please retry later".to_owned(),
    )
}

pub(crate) fn all() -> Vec<Catcher> {
    catchers![
        bad_request,
        unprocessable_entity,
        forbidden,
        not_found,
        too_many_requests,
        internal_server_error
    ]
}
