//! The route table: registered (method, pattern) → handler entries.
//!
//! Build it once at startup, then hand it to [`Router::new`](crate::Router::new),
//! which freezes it behind an `Arc`. From then on the table is shared
//! read-only state and can serve any number of concurrent dispatches.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler, Mount};
use crate::params::Params;
use crate::pattern::{split_path, Pattern};

struct Route {
    pattern: Pattern,
    handler: BoxedHandler,
}

/// The registered routes, grouped by method.
///
/// Among all routes that match a path, the one with a literal segment at the
/// first position where they differ wins over a capture, and a capture wins
/// over a trailing remainder. Registration order never changes which route
/// wins; two routes of the same shape for one method are rejected.
///
/// ```rust
/// # use road::{BoxFuture, Context, Params, Response, RouteTable};
/// # fn get_user(_: &mut Context, _: Params) -> BoxFuture<'_, Response> { Box::pin(async { Response::text("") }) }
/// # fn me(_: &mut Context, _: Params) -> BoxFuture<'_, Response> { Box::pin(async { Response::text("") }) }
/// let table = RouteTable::new()
///     .get("/users/:id", get_user)
///     .get("/users/me",  me);
///
/// let matched = table.lookup("GET", "/users/me").unwrap();
/// assert_eq!(matched.pattern(), "/users/me");
/// ```
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<Method, Vec<Route>>,
}

/// The winning route for one lookup.
pub struct RouteMatch {
    pub(crate) handler: BoxedHandler,
    pub(crate) params: Params,
    pattern: String,
}

impl RouteMatch {
    pub fn params(&self) -> &Params { &self.params }
    pub fn pattern(&self) -> &str { &self.pattern }

    /// True when both matches resolved to the same registered handler.
    pub fn same_handler(&self, other: &RouteMatch) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a method + pattern pair.
    ///
    /// The method is case-insensitive (`"get"` and `"GET"` are the same).
    /// Fails on malformed patterns and on a pattern with the same shape as
    /// one already registered for the method.
    pub fn add_route(
        &mut self,
        method: &str,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<(), Error> {
        let method = parse_method(method)?;
        self.insert(method, Pattern::parse(pattern)?, handler.into_boxed_handler())
    }

    /// Chainable [`add_route`](Self::add_route).
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting route. Routes are registered at
    /// startup, so a bad one should stop the process before it serves.
    pub fn route(mut self, method: &str, pattern: &str, handler: impl Handler) -> Self {
        self.add_route(method, pattern, handler)
            .unwrap_or_else(|e| panic!("{e}"));
        self
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.route("GET", pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.route("POST", pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
        self.route("PUT", pattern, handler)
    }

    pub fn patch(self, pattern: &str, handler: impl Handler) -> Self {
        self.route("PATCH", pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
        self.route("DELETE", pattern, handler)
    }

    /// Nests `table` under `prefix`, for every method it has routes for.
    ///
    /// `/admin` mounted with an inner `/users/:id` answers `/admin/users/7`.
    /// Prefix params (`/orgs/:org`) are visible to inner handlers.
    ///
    /// The mount is a single `prefix/*` route per method and competes with
    /// sibling routes like any other. When it wins a lookup but the inner
    /// table has no route for the rest of the path, the request falls
    /// through to the next middleware; lower-ranked siblings that also
    /// matched (`/:section/status` next to a mount at `/api`) are not tried.
    ///
    /// Either every method is mounted or, on a conflict, none is.
    pub fn try_mount(&mut self, prefix: &str, table: RouteTable) -> Result<(), Error> {
        let pattern = Pattern::parse(&format!("{}/*", prefix.trim_end_matches('/')))?;
        let methods: Vec<Method> = table.routes.keys().cloned().collect();
        if let Some(err) = methods.iter().find_map(|m| self.conflict(m, &pattern)) {
            return Err(err);
        }
        let handler = Mount(Arc::new(table)).into_boxed_handler();
        for method in methods {
            self.insert(method, pattern.clone(), Arc::clone(&handler))?;
        }
        Ok(())
    }

    /// Chainable [`try_mount`](Self::try_mount).
    ///
    /// # Panics
    ///
    /// Panics on an invalid prefix or a conflicting route.
    pub fn mount(mut self, prefix: &str, table: RouteTable) -> Self {
        self.try_mount(prefix, table).unwrap_or_else(|e| panic!("{e}"));
        self
    }

    /// Number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the best route for a method and concrete path.
    ///
    /// `None` is the ordinary "no route" outcome, not an error; the caller
    /// decides what a miss means. An unknown method is a miss.
    pub fn lookup(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let method = parse_method(method).ok()?;
        let routes = self.routes.get(&method)?;
        let segments = split_path(path);

        let mut best: Option<(&Route, Params)> = None;
        for route in routes {
            let Some(params) = route.pattern.matches(&segments) else { continue };
            // Strictly better only, so equal ranks keep the first registered.
            if best.as_ref().is_none_or(|(b, _)| route.pattern.rank() < b.pattern.rank()) {
                best = Some((route, params));
            }
        }

        best.map(|(route, params)| RouteMatch {
            handler: Arc::clone(&route.handler),
            params,
            pattern: route.pattern.as_str().to_owned(),
        })
    }

    fn conflict(&self, method: &Method, pattern: &Pattern) -> Option<Error> {
        let existing = self.routes.get(method)?.iter().find(|r| r.pattern.same_shape(pattern))?;
        Some(Error::ConflictingRoute {
            method: method.to_string(),
            pattern: pattern.as_str().to_owned(),
            existing: existing.pattern.as_str().to_owned(),
        })
    }

    fn insert(&mut self, method: Method, pattern: Pattern, handler: BoxedHandler) -> Result<(), Error> {
        if let Some(err) = self.conflict(&method, &pattern) {
            return Err(err);
        }
        tracing::debug!(%method, pattern = pattern.as_str(), "route registered");
        self.routes.entry(method).or_default().push(Route { pattern, handler });
        Ok(())
    }
}

/// Parses a method name case-insensitively (`get` → `GET`).
pub(crate) fn parse_method(method: &str) -> Result<Method, Error> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::InvalidMethod(method.to_owned()))
}
