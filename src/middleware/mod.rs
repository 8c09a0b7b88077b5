//! Middleware contract and the continuation that links a chain together.
//!
//! A middleware receives the request [`Context`] and a [`Next`] that stands
//! for everything registered after it. It can
//!
//! - return a response without calling `next` (short-circuit: nothing after
//!   it runs for this request),
//! - call `next.run(ctx).await` and inspect or replace what comes back,
//! - fail with `Err`, which ends the whole dispatch with that error.
//!
//! ```rust
//! use road::middleware::{self, Next};
//! use road::{BoxFuture, Context, Outcome, Road};
//!
//! fn tag<'a>(ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
//!     Box::pin(async move {
//!         let mut outcome = next.run(ctx).await;
//!         if let Ok(Some(res)) = &mut outcome {
//!             res.append_header("x-served-by", "road");
//!         }
//!         outcome
//!     })
//! }
//!
//! let road = Road::new()
//!     .with(tag)
//!     .with(middleware::from_fn(|ctx, next| Box::pin(async move {
//!         ctx.set_title("Home");
//!         next.run(ctx).await
//!     })));
//! ```
//!
//! Built-in middleware: [`Trace`], [`Recover`], [`NotFound`], [`Timeout`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::response::Outcome;

mod not_found;
mod recover;
mod timeout;
mod trace;

pub use not_found::NotFound;
pub use recover::Recover;
pub use timeout::Timeout;
pub use trace::Trace;

/// A heap-allocated, type-erased future.
///
/// `'a` ties the future to the [`Context`] borrow it runs with.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One unit of request processing in a [`Road`](crate::Road).
///
/// Implemented for every function with the signature
/// `fn<'a>(&'a mut Context, Next<'a>) -> BoxFuture<'a, Outcome>`. Stateful
/// middleware implement it on their own type.
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome>;
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        self(ctx, next)
    }
}

/// Pins down the signature of a middleware closure so it is generic over the
/// context borrow. Named functions do not need it.
pub fn from_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Outcome> + Send + Sync + 'static,
{
    f
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of the chain after the current middleware.
///
/// `run` takes `self` by value, so a continuation can be resumed at most
/// once per request; calling it twice does not compile. Dropping it without
/// calling `run` short-circuits the chain.
///
/// ```compile_fail,E0382
/// use road::{BoxFuture, Context, Next, Outcome};
///
/// fn twice<'a>(ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
///     Box::pin(async move {
///         let _ = next.run(ctx).await;
///         next.run(ctx).await
///     })
/// }
/// ```
pub struct Next<'a> {
    rest: &'a [BoxedMiddleware],
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [BoxedMiddleware]) -> Self {
        Self { rest: chain }
    }

    /// Resumes the chain with the following middleware.
    ///
    /// Resolves to `Ok(None)` once the chain is exhausted without any
    /// middleware producing a response.
    pub fn run<'b>(self, ctx: &'b mut Context) -> BoxFuture<'b, Outcome>
    where
        'a: 'b,
    {
        match self.rest.split_first() {
            Some((first, rest)) => first.handle(ctx, Next { rest }),
            None => Box::pin(async { Ok(None) }),
        }
    }

    /// Number of middleware still ahead in the chain.
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }
}
