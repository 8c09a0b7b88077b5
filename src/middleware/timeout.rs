//! Deadline for the rest of the chain.

use std::time::Duration;

use http::StatusCode;
use tracing::warn;

use crate::context::Context;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::response::{Outcome, Response};

/// Races the rest of the chain against a timer.
///
/// On expiry the dispatch resolves with `504 Gateway Timeout`. The inner
/// future is dropped, so it stops at its next suspension point; tasks it
/// spawned on the runtime keep running.
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Middleware for Timeout {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            match tokio::time::timeout(self.duration, next.run(ctx)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(timeout_ms = self.duration.as_millis() as u64, "request timed out");
                    Ok(Some(Response::status(StatusCode::GATEWAY_TIMEOUT)))
                }
            }
        })
    }
}
