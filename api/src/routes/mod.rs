//! Add top-level routes as submodules here.

use crate::state::RocketState;
use rocket::{Build, Rocket};
use rocket_okapi::{
    openapi_get_routes,
    swagger_ui::{make_swagger_ui, DefaultModelRendering, SwaggerUIConfig},
};

mod auth;
mod expenses;
mod monthly_expenses;
mod user;

const BASE: &str = "/api";

pub fn register(rocket: Rocket<Build>, state: RocketState) -> Rocket<Build> {
    let rocket = rocket.manage(state).register(BASE, crate::catchers::all());
    let rocket = rocket.mount(
        BASE,
        openapi_get_routes![
            auth::register,
            auth::login,
            user::get,
            expenses::list,
            expenses::post,
            expenses::delete,
            monthly_expenses::list,
            monthly_expenses::post,
            monthly_expenses::delete,
            monthly_expenses::apply,
        ],
    );
    mount_swagger(rocket)
}

pub fn mount_swagger(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount(
        format!("{}/swagger", BASE),
        make_swagger_ui(&SwaggerUIConfig {
            url: "../openapi.json".to_owned(),
            default_model_rendering: DefaultModelRendering::Model,
            show_extensions: true,
            ..Default::default()
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::{access::TOKEN_HEADER, Cors, RateLimit};
    use app::database::Database;
    use chrono::Duration;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
    };
    use sqlx::postgres::PgPoolOptions;

    const FRONTEND: &str = "https://expenses.example.com";

    async fn client() -> Client {
        // Guards reject these requests before any query runs, so the pool never connects.
        let db: Database = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let rocket = crate::register(
            rocket::build(),
            db,
            RateLimit::new(100, std::time::Duration::from_secs(60)),
            Duration::hours(1),
            Cors::new(FRONTEND),
        );
        Client::tracked(rocket).await.unwrap()
    }

    async fn error_status(response: LocalResponse<'_>) -> serde_json::Value {
        assert_eq!(response.content_type(), Some(ContentType::JSON));
        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        body["error"]["status"].clone()
    }

    #[rocket::async_test]
    async fn requests_without_token_are_forbidden() {
        let client = client().await;
        for path in ["/api/expenses", "/api/monthly-expenses", "/api/auth/me"] {
            let response = client.get(path).dispatch().await;
            assert_eq!(response.status(), Status::Forbidden, "{}", path);
            assert_eq!(error_status(response).await, "ACCESS_DENIED");
        }
        let response = client
            .post("/api/monthly-expenses/1/apply")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn malformed_bodies_are_json_bad_requests() {
        let client = client().await;
        let response = client
            .post("/api/auth/register")
            .header(ContentType::JSON)
            .body(r#"{"name":"a","email":"a@b.c"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_status(response).await, "INVALID_BODY");

        let response = client
            .post("/api/auth/login")
            .header(ContentType::JSON)
            .body("{not json")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_status(response).await, "INVALID_BODY");
    }

    #[rocket::async_test]
    async fn unknown_paths_are_json_not_found() {
        let client = client().await;
        let response = client.get("/api/nothing-here").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(error_status(response).await, "NOT_FOUND");
    }

    #[rocket::async_test]
    async fn responses_carry_cors_headers() {
        let client = client().await;
        let response = client.get("/api/expenses").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
        let headers = response.headers();
        assert_eq!(headers.get_one("Access-Control-Allow-Origin"), Some(FRONTEND));
        let allowed_headers = headers.get_one("Access-Control-Allow-Headers").unwrap();
        assert!(allowed_headers.contains(TOKEN_HEADER));
        assert!(allowed_headers.contains("Content-Type"));
    }

    #[rocket::async_test]
    async fn preflight_requests_get_no_content() {
        let client = client().await;
        let response = client
            .options("/api/monthly-expenses/1/apply")
            .header(rocket::http::Header::new(
                "Access-Control-Request-Method",
                "POST",
            ))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);
        let headers = response.headers();
        assert_eq!(headers.get_one("Access-Control-Allow-Origin"), Some(FRONTEND));
        assert!(headers
            .get_one("Access-Control-Allow-Methods")
            .unwrap()
            .contains("POST"));
        assert!(response.into_string().await.unwrap_or_default().is_empty());
    }

    #[rocket::async_test]
    async fn openapi_document_is_served() {
        let client = client().await;
        let response = client.get("/api/openapi.json").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("/monthly-expenses/{monthly_expense_id}/apply"));
        assert!(body.contains(TOKEN_HEADER));
    }
}
