//! The resource router: the middleware that resolves a path against a
//! [`RouteTable`] and runs the matched handler.

use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::response::Outcome;
use crate::table::RouteTable;

/// Middleware wrapping a frozen [`RouteTable`].
///
/// - Route matched, handler responds: the response ends the chain; nothing
///   registered after the router runs.
/// - Route matched, handler resolves empty (e.g. a mounted table with no
///   matching sub-route): falls through to `next`.
/// - No route: falls through to `next`. A miss is not an error.
pub struct Router {
    table: Arc<RouteTable>,
}

impl Router {
    /// Freezes `table`. It can no longer be modified once it is serving.
    pub fn new(table: RouteTable) -> Self {
        Self { table: Arc::new(table) }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

impl Middleware for Router {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let Some(matched) = self.table.lookup(ctx.method(), ctx.path()) else {
                debug!(method = ctx.method(), path = ctx.path(), "no route, falling through");
                return next.run(ctx).await;
            };

            debug!(method = ctx.method(), pattern = matched.pattern(), "route matched");
            match matched.handler.call(ctx, matched.params).await? {
                Some(res) => Ok(Some(res)),
                None => next.run(ctx).await,
            }
        })
    }
}
