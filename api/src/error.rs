use app::ErrorKind;
use rocket::{http::Status, response::status::NoContent, serde::json::Json};
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct Error<E: Serialize> {
    pub error: Inner<E>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Inner<E: Serialize> {
    pub code: u16,
    pub description: String,
    pub reason: Option<&'static str>,
    pub status: E,
}

impl<E: Serialize> Error<E> {
    fn new(http_status: Status, description: String, error: E) -> Self {
        Self {
            error: Inner {
                code: http_status.code,
                description,
                reason: http_status.reason(),
                status: error,
            },
        }
    }
}

pub type JsonError<E> = (Status, Json<Error<E>>);

pub type JsonResult<T, E> = Result<Json<T>, JsonError<E>>;

/// Like [`JsonResult`], but the success status is 201 Created.
pub type CreatedResult<T, E> = Result<(Status, Json<T>), JsonError<E>>;

pub type NoContentResult<E> = Result<NoContent, JsonError<E>>;

pub fn created<T>(body: T) -> (Status, Json<T>) {
    (Status::Created, Json(body))
}

fn json_error<E: Serialize>(status: Status, error: E, description: String) -> JsonError<E> {
    (status, Json(Error::new(status, description, error)))
}

pub fn bad_request<E: Serialize>(error: E, description: String) -> JsonError<E> {
    json_error(Status::BadRequest, error, description)
}

pub fn unauthorized<E: Serialize>(error: E, description: String) -> JsonError<E> {
    json_error(Status::Unauthorized, error, description)
}

pub fn forbidden<E: Serialize>(error: E, description: String) -> JsonError<E> {
    json_error(Status::Forbidden, error, description)
}

pub fn too_many_requests<E: Serialize>(error: E, description: String) -> JsonError<E> {
    json_error(Status::TooManyRequests, error, description)
}

pub fn not_found<E: Serialize>(error: E, description: String) -> JsonError<E> {
    json_error(Status::NotFound, error, description)
}

pub fn internal_server_error<E: Serialize>(error: E, description: String) -> JsonError<E> {
    json_error(Status::InternalServerError, error, description)
}

/// Maps a domain failure onto its HTTP status. Storage details are logged, never returned.
pub fn from_kind<E: Serialize>(kind: ErrorKind, error: E, description: String) -> JsonError<E> {
    match kind {
        ErrorKind::Validation | ErrorKind::PolicyViolation => bad_request(error, description),
        ErrorKind::NotFound => not_found(error, description),
        ErrorKind::Unauthorized => unauthorized(error, description),
        ErrorKind::Storage => {
            log::error!("{}", description);
            internal_server_error(
                error,
                "the request could not be completed, please retry later".to_owned(),
            )
        }
    }
}

/// Parses a numeric path id.
pub fn parse_id<E: Serialize>(raw: &str, error: E) -> Result<i64, JsonError<E>> {
    raw.parse()
        .map_err(|_| bad_request(error, format!("{:?} is not a valid id", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, JsonSchema)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    enum TestError {
        NotFound,
        Unknown,
    }

    #[test]
    fn body_carries_status_and_code() {
        let (status, Json(body)) =
            from_kind(ErrorKind::NotFound, TestError::NotFound, "gone".to_owned());
        assert_eq!(status, Status::NotFound);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"]["code"], 404);
        assert_eq!(value["error"]["status"], "NOT_FOUND");
        assert_eq!(value["error"]["description"], "gone");
    }

    #[test]
    fn storage_details_are_hidden() {
        let (status, Json(body)) = from_kind(
            ErrorKind::Storage,
            TestError::Unknown,
            "connection refused".to_owned(),
        );
        assert_eq!(status, Status::InternalServerError);
        assert!(!body.error.description.contains("connection refused"));
    }

    #[test]
    fn policy_violations_are_bad_requests() {
        let (status, _) = from_kind(
            ErrorKind::PolicyViolation,
            TestError::Unknown,
            "again".to_owned(),
        );
        assert_eq!(status, Status::BadRequest);
    }

    #[test]
    fn ids_must_be_numeric() {
        assert_eq!(parse_id("42", TestError::Unknown).unwrap(), 42);
        let (status, _) = parse_id("abc", TestError::Unknown).unwrap_err();
        assert_eq!(status, Status::BadRequest);
    }
}
