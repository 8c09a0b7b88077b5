//! The chain engine.
//!
//! A [`Road`] is an ordered list of middleware. [`Road::dispatch`] runs one
//! request through it: the first registered middleware is the outermost
//! wrapper, so code before `next.run(..)` executes in registration order and
//! code after it unwinds in reverse.
//!
//! ```text
//! dispatch ─▶ A ─▶ B ─▶ C ─▶ (end: Ok(None))
//!           ◀─   ◀─   ◀─
//! ```

use std::sync::Arc;

use bytes::Bytes;
use tracing::warn;

use crate::context::Context;
use crate::error::Error;
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::response::Outcome;

/// Default limit on nested [`Context::request`] sub-requests.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// An ordered middleware chain.
///
/// Cloning is cheap (one `Arc`) and every clone dispatches on the same chain.
/// Registration takes `self` by value; registering on a road that is already
/// shared gives the caller its own copy of the chain, so dispatches already
/// running never see a mutation.
///
/// ```rust
/// use road::{middleware, BoxFuture, Context, Params, Response, Road, RouteTable, Router};
///
/// fn hello(_ctx: &mut Context, _p: Params) -> BoxFuture<'_, Response> {
///     Box::pin(async { Response::text("hello") })
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), road::Error> {
/// let road = Road::new()
///     .with(middleware::Recover)
///     .with(middleware::NotFound)
///     .with(Router::new(RouteTable::new().get("/", hello)));
///
/// let res = road.dispatch("GET", "/", "", vec![]).await?.unwrap();
/// assert_eq!(res.body(), b"hello");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Road {
    inner: Arc<Inner>,
}

#[derive(Clone)]
struct Inner {
    chain: Vec<BoxedMiddleware>,
    max_depth: usize,
}

impl Road {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner { chain: Vec::new(), max_depth: DEFAULT_MAX_DEPTH }),
        }
    }

    /// Appends a middleware. Later registrations sit closer to the end of
    /// the chain.
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        Arc::make_mut(&mut self.inner).chain.push(Arc::new(middleware));
        self
    }

    /// Limits how deep [`Context::request`] sub-requests may nest.
    pub fn max_depth(mut self, depth: usize) -> Self {
        Arc::make_mut(&mut self.inner).max_depth = depth;
        self
    }

    pub fn len(&self) -> usize {
        self.inner.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.chain.is_empty()
    }

    /// Runs one request through the chain.
    ///
    /// Resolves to `Ok(Some(response))` when a middleware produced one,
    /// `Ok(None)` when the chain ran out without a response, or the error
    /// the first failing middleware returned. Cookies and the title set on
    /// the context are applied to the response before it is returned.
    pub async fn dispatch(
        &self,
        method: &str,
        path: &str,
        body: impl Into<Bytes>,
        headers: Vec<(String, String)>,
    ) -> Outcome {
        let ctx = Context::new(self.clone(), 0, method.to_owned(), path, body.into(), headers);
        self.run(ctx).await
    }

    pub(crate) async fn run(&self, mut ctx: Context) -> Outcome {
        if ctx.depth() > self.inner.max_depth {
            warn!(path = ctx.path(), depth = ctx.depth(), "sub-request depth limit exceeded");
            return Err(Error::RecursionLimit(self.inner.max_depth));
        }

        let outcome = Next::new(&self.inner.chain).run(&mut ctx).await?;
        Ok(outcome.map(|res| ctx.finish(res)))
    }
}

impl Default for Road {
    fn default() -> Self { Self::new() }
}
