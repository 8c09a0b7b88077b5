//! Reference transport: a hyper server that feeds every request into a
//! [`Road`] and writes back whatever it resolves to.
//!
//! | Chain result        | Sent to the client                          |
//! |---------------------|---------------------------------------------|
//! | `Ok(Some(res))`     | `res`                                       |
//! | `Ok(None)`          | `404 Not Found`                             |
//! | `Err(e)`            | empty body, `e.status()` (usually `500`)    |
//!
//! A request body that cannot be read is answered with `400 Bad Request`
//! before the chain runs. The query string reaches [`Context::query`](crate::Context::query).
//!
//! Register [`middleware::Recover`](crate::middleware::Recover) and
//! [`middleware::NotFound`](crate::middleware::NotFound) if you want control
//! over those fallbacks.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or Ctrl-C the server stops accepting connections and asks
//! every open connection to close once its in-flight requests are answered.
//! Idle keep-alive connections close at once. [`Server::serve`] returns when
//! the last one is gone. [`Server::serve_with_shutdown`] takes the trigger as
//! a future instead.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::response::Response;
use crate::road::Road;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use road::Server;
    /// assert!(Server::bind("0.0.0.0:3000").is_ok());
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|_| Error::InvalidAddress(addr.to_owned()))?;
        Ok(Self { addr })
    }

    /// Starts accepting connections and dispatching them through `road`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, road: Road) -> Result<(), Error> {
        self.serve_with_shutdown(road, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but shuts down when `signal` resolves
    /// instead of on SIGTERM or Ctrl-C.
    pub async fn serve_with_shutdown(
        self,
        road: Road,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        run(listener, road, signal).await
    }
}

/// Accept loop over an already bound listener.
async fn run(
    listener: TcpListener,
    road: Road,
    signal: impl Future<Output = ()>,
) -> Result<(), Error> {
    info!(addr = %listener.local_addr()?, middleware = road.len(), "road listening");

    // Tells every watched connection to finish up once shutdown starts.
    let graceful = GracefulShutdown::new();
    // Tracks every connection task so shutdown can wait for them.
    let mut tasks = tokio::task::JoinSet::new();

    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Check shutdown first so a SIGTERM stops accepting at once,
            // even with connections queued.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let road = road.clone();
                let io = TokioIo::new(stream);
                let watcher = graceful.watcher();

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let road = road.clone();
                        async move { handle(road, req).await }
                    });

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = watcher.watch(builder.serve_connection(io, svc)).await {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet stays small.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    graceful.shutdown().await;
    while tasks.join_next().await.is_some() {}

    info!("road stopped");
    Ok(())
}

// ── Request bridge ────────────────────────────────────────────────────────────

/// Converts one hyper request into a dispatch and the outcome back into a
/// hyper response. Every failure is answered here, so hyper never sees one.
async fn handle<B>(road: Road, req: http::Request<B>) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_http());
        }
    };

    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let headers = parts.headers.iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
        })
        .collect();

    let response = match road.dispatch(parts.method.as_str(), target, body, headers).await {
        Ok(Some(res)) => res,
        Ok(None) => Response::status(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(method = %parts.method, path = parts.uri.path(), "dispatch failed: {e}");
            Response::status(e.status())
        }
    };

    Ok(response.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. A handler that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}


#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context as TaskContext, Poll};
    use std::time::Duration;

    use hyper::body::Frame;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    use super::*;
    use crate::context::Context;
    use crate::middleware::BoxFuture;
    use crate::params::Params;
    use crate::router::Router;
    use crate::table::RouteTable;

    fn search(ctx: &mut Context, _params: Params) -> BoxFuture<'_, Response> {
        let body = format!(
            "{}|{}|{}",
            ctx.query().unwrap_or_default(),
            ctx.header("x-user").unwrap_or_default(),
            String::from_utf8_lossy(ctx.body()),
        );
        Box::pin(async move { Response::text(body) })
    }

    fn teapot(_ctx: &mut Context, _params: Params) -> BoxFuture<'_, Result<Response, Error>> {
        Box::pin(async { Err(Error::http(StatusCode::IM_A_TEAPOT, "short and stout")) })
    }

    fn road() -> Road {
        Road::new().with(Router::new(
            RouteTable::new()
                .post("/search", search)
                .get("/search", search)
                .get("/teapot", teapot),
        ))
    }

    async fn call(req: http::Request<Full<Bytes>>) -> http::Response<Full<Bytes>> {
        handle(road(), req).await.unwrap()
    }

    async fn body_of(res: http::Response<Full<Bytes>>) -> Bytes {
        res.into_body().collect().await.unwrap().to_bytes()
    }

    /// A request body whose first read fails.
    struct Broken;

    impl Body for Broken {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
        }
    }

    #[tokio::test]
    async fn query_headers_and_body_reach_the_context() {
        let req = http::Request::post("/search?q=rust&page=2")
            .header("x-user", "ada")
            .body(Full::new(Bytes::from_static(b"payload")))
            .unwrap();

        let res = call(req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(body_of(res).await, "q=rust&page=2|ada|payload");
    }

    #[tokio::test]
    async fn empty_outcome_is_not_found() {
        let req = http::Request::get("/nowhere").body(Full::default()).unwrap();
        assert_eq!(call(req).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dispatch_error_is_sent_as_its_status_with_no_body() {
        let req = http::Request::get("/teapot").body(Full::default()).unwrap();
        let res = call(req).await;
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
        assert!(body_of(res).await.is_empty());
    }

    #[tokio::test]
    async fn unreadable_body_is_a_bad_request() {
        let req = http::Request::post("/search").body(Broken).unwrap();
        let res = handle(road(), req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    async fn read_response(stream: &mut TcpStream, until: &str) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !String::from_utf8_lossy(&buf).contains(until) {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before {until:?}");
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn shutdown_closes_idle_keep_alive_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(run(listener, road(), async {
            let _ = stopped.await;
        }));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /search?q=1 HTTP/1.1\r\nhost: test\r\nx-user: bo\r\n\r\n")
            .await
            .unwrap();
        let res = read_response(&mut client, "q=1|bo|").await;
        assert!(res.starts_with("HTTP/1.1 200 OK"), "{res}");

        // The connection is idle but still open on our side.
        stop.send(()).unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(5), server).await;
        assert!(matches!(finished, Ok(Ok(Ok(())))));

        let mut rest = Vec::new();
        assert_eq!(client.read_to_end(&mut rest).await.unwrap(), 0);
    }
}
