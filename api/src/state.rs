use app::database::Database;
use chrono::Duration;

use crate::rate_limit::RateLimit;

pub struct RocketState {
    pub db: Database,
    pub rate_limit: RateLimit,
    /// Lifetime of tokens issued at registration and login.
    pub session_ttl: Duration,
}
