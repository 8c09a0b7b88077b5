//! Per-request context shared by every middleware and handler of one dispatch.

use std::fmt;

use bytes::Bytes;

use crate::middleware::BoxFuture;
use crate::response::{Outcome, Response, ResponseBuilder};
use crate::road::Road;

/// The request being dispatched plus the mutable helper state that travels
/// with it down the chain.
///
/// Each [`Road::dispatch`] creates its own `Context` and drops it when the
/// dispatch resolves. Middleware and handlers see it through `&mut`, so two
/// concurrent dispatches can never observe each other's context.
pub struct Context {
    method: String,
    path: String,
    query: Option<String>,
    body: Bytes,
    headers: Vec<(String, String)>,
    title: Option<String>,
    cookies: Vec<Cookie>,
    extensions: http::Extensions,
    road: Road,
    depth: usize,
}

impl Context {
    pub(crate) fn new(
        road: Road,
        depth: usize,
        method: String,
        target: &str,
        body: Bytes,
        headers: Vec<(String, String)>,
    ) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (target.to_owned(), None),
        };
        Self {
            method,
            path,
            query,
            body,
            headers,
            title: None,
            cookies: Vec::new(),
            extensions: http::Extensions::new(),
            road,
            depth,
        }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// How many sub-requests deep this dispatch is. `0` for a dispatch
    /// started by the host.
    pub fn depth(&self) -> usize { self.depth }

    /// The road this request is being dispatched on.
    pub fn road(&self) -> &Road { &self.road }

    // ── Helpers ──────────────────────────────────────────────────────────────

    /// Starts building a response. Same as [`Response::builder`].
    pub fn response(&self) -> ResponseBuilder {
        Response::builder()
    }

    /// Sets the page title. It is attached to the final response unless the
    /// response already carries one.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn title(&self) -> Option<&str> { self.title.as_deref() }

    /// Queues a cookie. Every queued cookie becomes a `set-cookie` header on
    /// the response this dispatch resolves to.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    pub fn cookies(&self) -> &[Cookie] { &self.cookies }

    /// Typed per-request state shared between middleware (auth results,
    /// request ids, ...).
    pub fn extensions(&self) -> &http::Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut http::Extensions { &mut self.extensions }

    /// Issues a same-process sub-request through the whole road.
    ///
    /// The sub-request gets a fresh context; nothing set on this one (title,
    /// cookies, extensions) leaks into it or back out of it. The returned
    /// future does not borrow `self`.
    pub fn request(
        &self,
        method: &str,
        path: &str,
        body: impl Into<Bytes>,
        headers: Vec<(String, String)>,
    ) -> BoxFuture<'static, Outcome> {
        let road = self.road.clone();
        let ctx = Context::new(
            road.clone(),
            self.depth + 1,
            method.to_owned(),
            path,
            body.into(),
            headers,
        );
        Box::pin(async move { road.run(ctx).await })
    }

    /// Applies the accumulated helper state to the response the chain
    /// produced.
    pub(crate) fn finish(self, mut res: Response) -> Response {
        for cookie in &self.cookies {
            res.append_header("set-cookie", cookie.to_string());
        }
        if res.title.is_none() {
            res.title = self.title;
        }
        res
    }
}

// ── Cookie ────────────────────────────────────────────────────────────────────

/// A cookie to send back with the response.
///
/// ```rust
/// use road::{Cookie, SameSite};
///
/// let c = Cookie::new("session", "abc123")
///     .path("/")
///     .max_age(3600)
///     .http_only()
///     .same_site(SameSite::Lax);
/// assert_eq!(c.to_string(), "session=abc123; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    max_age: Option<u64>,
    http_only: bool,
    secure: bool,
    same_site: Option<SameSite>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            http_only: false,
            secure: false,
            same_site: None,
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn value(&self) -> &str { &self.value }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Lifetime in seconds. `0` asks the client to delete the cookie.
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// Renders the `set-cookie` header value.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        match self.same_site {
            Some(SameSite::Strict) => f.write_str("; SameSite=Strict"),
            Some(SameSite::Lax) => f.write_str("; SameSite=Lax"),
            Some(SameSite::None) => f.write_str("; SameSite=None"),
            None => Ok(()),
        }
    }
}
