use app::user;
use dashmap::{mapref::entry::Entry, DashMap};
use std::time::{Duration, Instant};

/// Allows each user `limit` requests per `span`. Windows are fixed: a user's window starts at
/// their first request and the count resets once `span` has passed.
pub struct RateLimit {
    limit: usize,
    span: Duration,
    windows: DashMap<user::Id, Window>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: usize,
}

impl RateLimit {
    pub fn new(limit: usize, span: Duration) -> Self {
        Self {
            limit,
            span,
            windows: Default::default(),
        }
    }

    /// Returns true if the user should be rate limited, false otherwise.
    pub fn limit(&self, user_id: user::Id) -> bool {
        self.limit_at(user_id, Instant::now())
    }

    fn limit_at(&self, user_id: user::Id, now: Instant) -> bool {
        match self.windows.entry(user_id) {
            Entry::Occupied(mut e) => {
                let window = e.get_mut();
                if now.duration_since(window.started) >= self.span {
                    *window = Window {
                        started: now,
                        count: 1,
                    };
                    false
                } else if window.count >= self.limit {
                    true
                } else {
                    window.count += 1;
                    false
                }
            }
            Entry::Vacant(e) => {
                e.insert(Window {
                    started: now,
                    count: 1,
                });
                false
            }
        }
    }
}
