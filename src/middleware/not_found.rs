//! Empty-result fallback.

use http::StatusCode;

use crate::context::Context;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::response::{Outcome, Response};

/// Converts an empty chain result into `404 Not Found`.
///
/// Register it before the [`Router`](crate::Router): when no route matches
/// and nothing after it responds, the chain resolves empty and this turns
/// that into a 404.
pub struct NotFound;

impl Middleware for NotFound {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            match next.run(ctx).await? {
                Some(res) => Ok(Some(res)),
                None => Ok(Some(
                    Response::builder().status(StatusCode::NOT_FOUND).text("not found"),
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::road::Road;

    #[tokio::test]
    async fn empty_chain_becomes_404() {
        let res = Road::new().with(NotFound)
            .dispatch("GET", "/nowhere", "", vec![]).await.unwrap().unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }
}
