//! This library contains definitions for the API layer.

use app::database::Database;
use chrono::Duration;
use rocket::{Build, Rocket};
use state::RocketState;

mod access;
mod catchers;
mod cors;
mod error;
mod rate_limit;
mod routes;
mod state;

pub use cors::Cors;
pub use rate_limit::RateLimit;

pub fn register(
    rocket: Rocket<Build>,
    db: Database,
    rate_limit: RateLimit,
    session_ttl: Duration,
    cors: Cors,
) -> Rocket<Build> {
    let rocket = rocket.attach(cors);
    routes::register(
        rocket,
        RocketState {
            db,
            rate_limit,
            session_ttl,
        },
    )
}
