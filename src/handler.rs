//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A [`RouteTable`] holds handlers of *different* types in one list, so each
//! one is hidden behind a common trait object (`dyn ErasedHandler`):
//!
//! ```text
//! fn get_user(ctx: &mut Context, p: Params) -> BoxFuture<'_, Response>  ← user writes this
//!        ↓ table.get("/users/:id", get_user)
//! get_user.into_boxed_handler()                  ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(get_user))                  ← stored as BoxedHandler
//!        ↓
//! handler.call(ctx, params)  at request time     ← one vtable dispatch
//!        ↓
//! Box::pin(async { fut.await.into_outcome() })   ← normalised Outcome
//! ```
//!
//! Handlers borrow the [`Context`] for the duration of their future, which is
//! why they return a [`BoxFuture`] tied to that borrow instead of being plain
//! `async fn`s. A named `fn` with that signature works as-is; closures go
//! through [`from_fn`] so the compiler infers a signature that is generic
//! over the borrow.

use std::sync::Arc;

use crate::context::Context;
use crate::middleware::BoxFuture;
use crate::params::Params;
use crate::response::{IntoOutcome, Outcome};
use crate::table::RouteTable;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context, params: Params) -> BoxFuture<'a, Outcome>;
}

/// A type-erased handler shared across concurrent dispatches.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any function with
/// the signature
///
/// ```text
/// fn name(ctx: &mut Context, params: Params) -> BoxFuture<'_, impl IntoOutcome>
/// ```
///
/// and by nested tables registered through [`RouteTable::mount`].
///
/// The trait is sealed: only the impls in this module can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

/// Pins down the signature of a handler closure.
///
/// ```rust
/// use road::{handler, Response, RouteTable};
///
/// let table = RouteTable::new().get(
///     "/hello/:name",
///     handler::from_fn(|_ctx, params| {
///         let name = params.get("name").unwrap_or("world").to_owned();
///         Box::pin(async move { Response::text(format!("hello {name}")) })
///     }),
/// );
/// ```
pub fn from_fn<F, R>(f: F) -> F
where
    F: for<'a> Fn(&'a mut Context, Params) -> BoxFuture<'a, R> + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    f
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, R> private::Sealed for F
where
    F: for<'a> Fn(&'a mut Context, Params) -> BoxFuture<'a, R> + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
}

impl<F, R> Handler for F
where
    F: for<'a> Fn(&'a mut Context, Params) -> BoxFuture<'a, R> + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Params) -> BoxFuture<'a, R> + Send + Sync + 'static,
    R: IntoOutcome + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, params: Params) -> BoxFuture<'a, Outcome> {
        let fut = (self.0)(ctx, params);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── Nested tables ─────────────────────────────────────────────────────────────

/// A route table mounted under a prefix of an outer table.
///
/// Registered with a trailing remainder segment; at request time the
/// remainder is matched against the inner table. An inner miss resolves to
/// an empty outcome so the outer router falls through.
pub(crate) struct Mount(pub(crate) Arc<RouteTable>);

impl private::Sealed for Mount {}

impl Handler for Mount {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl ErasedHandler for Mount {
    fn call<'a>(&'a self, ctx: &'a mut Context, params: Params) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let rest = params.remainder().unwrap_or("/");
            let Some(matched) = self.0.lookup(ctx.method(), rest) else {
                tracing::debug!(path = rest, "no route in mounted table");
                return Ok(None);
            };
            let params = params.merge(matched.params);
            matched.handler.call(ctx, params).await
        })
    }
}
