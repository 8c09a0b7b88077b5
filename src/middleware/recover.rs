//! Error translation.

use tracing::{debug, error};

use crate::context::Context;
use crate::error::Error;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::response::{Outcome, Response};

/// Turns a failed chain into a response.
///
/// [`Error::Http`] becomes a response with its status and
/// message. Any other error becomes a bare `500`; its details go to the log,
/// not to the client. Register it near the front: it sees errors from every
/// middleware after it and none from those before it.
pub struct Recover;

impl Middleware for Recover {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let err = match next.run(ctx).await {
                Err(err) => err,
                ok => return ok,
            };

            let status = err.status();
            let res = match err {
                Error::Http { message, .. } => {
                    debug!(%status, %message, path = ctx.path(), "translated error");
                    Response::builder().status(status).text(message)
                }
                other => {
                    error!(%status, error = %other, path = ctx.path(), "unhandled error");
                    Response::status(status)
                }
            };
            Ok(Some(res))
        })
    }
}
