//! # road
//!
//! A request-dispatch engine: an ordered chain of middleware plus a resource
//! router that resolves paths against registered routes.
//!
//! The same [`Road`] serves an HTTP transport and same-process callers
//! (sub-requests, client-side navigation re-entry). Everything that turns a
//! socket or a browser event into `(method, path, body, headers)` lives
//! outside this crate; [`Server`] is a small hyper bridge for the common case.
//!
//! ## Pieces
//!
//! - [`Road`]: the middleware chain. [`Road::dispatch`] runs one request.
//! - [`Middleware`] / [`Next`]: the unit of work and its continuation.
//! - [`RouteTable`]: `(method, pattern) → handler`, with literal segments
//!   taking precedence over `:captures`, and captures over a trailing `*`.
//! - [`Router`]: the middleware that consults a frozen `RouteTable`.
//! - [`Context`]: per-request state and helpers (title, cookies,
//!   extensions, sub-requests), passed by `&mut` through the chain.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use road::{middleware, BoxFuture, Context, Params, Response, Road, RouteTable, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), road::Error> {
//!     let routes = RouteTable::new()
//!         .get("/users/:id", get_user)
//!         .get("/users/me",  me);
//!
//!     let road = Road::new()
//!         .with(middleware::Trace)
//!         .with(middleware::Recover)
//!         .with(middleware::NotFound)
//!         .with(Router::new(routes));
//!
//!     Server::bind("0.0.0.0:3000")?.serve(road).await
//! }
//!
//! fn get_user(ctx: &mut Context, params: Params) -> BoxFuture<'_, Response> {
//!     let id = params.get("id").unwrap_or_default().to_owned();
//!     Box::pin(async move {
//!         ctx.set_title(format!("User {id}"));
//!         Response::json(format!(r#"{{"id":"{id}"}}"#))
//!     })
//! }
//!
//! fn me(ctx: &mut Context, _params: Params) -> BoxFuture<'_, road::Outcome> {
//!     // Same-process sub-request through the whole road.
//!     ctx.request("GET", "/users/1", "", vec![])
//! }
//! ```

mod context;
mod error;
mod params;
mod pattern;
mod response;
mod road;
mod router;
mod server;
mod table;

pub mod handler;
pub mod health;
pub mod middleware;

pub use context::{Context, Cookie, SameSite};
pub use error::Error;
pub use handler::Handler;
pub use middleware::{BoxFuture, Middleware, Next};
pub use params::Params;
pub use response::{ContentType, IntoOutcome, IntoResponse, Outcome, Response, ResponseBuilder};
pub use road::{Road, DEFAULT_MAX_DEPTH};
pub use router::Router;
pub use server::Server;
pub use table::{RouteMatch, RouteTable};

pub use http::StatusCode;
