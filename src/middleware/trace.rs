//! Per-request tracing span.

use std::time::Instant;

use tracing::{Instrument, field};

use crate::context::Context;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::response::Outcome;

/// Opens a `request` span around the rest of the chain and logs one line
/// per dispatch with method, path, status and latency.
///
/// Register it first so the span covers everything else, including
/// sub-requests issued from handlers (they show up as nested spans).
pub struct Trace;

impl Middleware for Trace {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        let span = tracing::info_span!(
            "request",
            method = ctx.method(),
            path = ctx.path(),
            depth = ctx.depth(),
            status = field::Empty,
        );

        Box::pin(
            async move {
                let started = Instant::now();
                let outcome = next.run(ctx).await;
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

                match &outcome {
                    Ok(Some(res)) => {
                        tracing::Span::current().record("status", res.status_code().as_u16());
                        tracing::info!(latency_ms, "request completed");
                    }
                    Ok(None) => tracing::info!(latency_ms, "request produced no response"),
                    Err(err) => tracing::warn!(latency_ms, error = %err, "request failed"),
                }
                outcome
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;
    use crate::road::Road;

    fn ok<'a>(_ctx: &'a mut Context, _next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async { Ok(Some(Response::text("ok"))) })
    }

    #[tokio::test]
    async fn passes_the_outcome_through_untouched() {
        let res = Road::new().with(Trace).with(ok)
            .dispatch("GET", "/", "", vec![]).await.unwrap().unwrap();
        assert_eq!(res.body(), b"ok");
        assert!(Road::new().with(Trace).dispatch("GET", "/", "", vec![]).await.unwrap().is_none());
    }
}
