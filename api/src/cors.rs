use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Header, Method, Status},
    Request, Response,
};
use std::io::Cursor;

use crate::access::TOKEN_HEADER;

const ALLOWED_METHODS: &str = "GET, POST, DELETE, OPTIONS";

/// Adds CORS headers to every response and answers preflight `OPTIONS` requests with 204.
pub struct Cors {
    origin: String,
}

impl Cors {
    /// `origin` is the frontend allowed to call the API, or `*` for any.
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            origin: if origin.trim().is_empty() {
                "*".to_owned()
            } else {
                origin
            },
        }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        res.set_header(Header::new(
            "Access-Control-Allow-Origin",
            self.origin.clone(),
        ));
        res.set_header(Header::new("Access-Control-Allow-Methods", ALLOWED_METHODS));
        res.set_header(Header::new(
            "Access-Control-Allow-Headers",
            format!("{}, Content-Type", TOKEN_HEADER),
        ));
        if self.origin != "*" {
            res.set_header(Header::new("Vary", "Origin"));
        }

        // No route handles OPTIONS, so preflights arrive here as 404s.
        if req.method() == Method::Options {
            res.set_status(Status::NoContent);
            res.set_sized_body(0, Cursor::new(""));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_origin_allows_any() {
        assert_eq!(Cors::new("").origin, "*");
        assert_eq!(Cors::new("  ").origin, "*");
        assert_eq!(
            Cors::new("https://expenses.example.com").origin,
            "https://expenses.example.com"
        );
    }
}
