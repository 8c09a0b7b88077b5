use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use road::middleware::{self, Next};
use road::{
    BoxFuture, Context, Error, Middleware, Outcome, Params, Response, Road, RouteTable, Router,
    StatusCode,
};

/// Logs "in:<name>" before calling next and "out:<name>" after it returns.
struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Middleware for Recorder {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            self.log.lock().unwrap().push(format!("in:{}", self.name));
            let outcome = next.run(ctx).await;
            self.log.lock().unwrap().push(format!("out:{}", self.name));
            outcome
        })
    }
}

/// Counts its invocations, then either responds or defers.
struct Counter {
    hits: Arc<AtomicUsize>,
    respond: bool,
}

impl Middleware for Counter {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if self.respond {
            Box::pin(async { Ok(Some(Response::text("stopped"))) })
        } else {
            next.run(ctx)
        }
    }
}

#[tokio::test]
async fn entry_in_registration_order_unwind_in_reverse() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let road = ["A", "B", "C"].into_iter().fold(Road::new(), |road, name| {
        road.with(Recorder { name, log: Arc::clone(&log) })
    });

    road.dispatch("GET", "/", "", vec![]).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        ["in:A", "in:B", "in:C", "out:C", "out:B", "out:A"],
    );
}

#[tokio::test]
async fn middleware_after_a_short_circuit_never_runs() {
    for k in 0..5 {
        let counters: Vec<Arc<AtomicUsize>> = (0..5).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let road = counters.iter().enumerate().fold(Road::new(), |road, (i, hits)| {
            road.with(Counter { hits: Arc::clone(hits), respond: i == k })
        });

        let res = road.dispatch("GET", "/", "", vec![]).await.unwrap().unwrap();
        assert_eq!(res.body(), b"stopped");

        for (i, hits) in counters.iter().enumerate() {
            let expected = usize::from(i <= k);
            assert_eq!(hits.load(Ordering::SeqCst), expected, "k={k} i={i}");
        }
    }
}

#[tokio::test]
async fn a_failing_middleware_rejects_dispatch_and_stops_the_chain() {
    #[derive(Debug)]
    struct Boom;
    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("boom")
        }
    }
    impl std::error::Error for Boom {}

    let after = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(Vec::new()));
    let road = Road::new()
        .with(Recorder { name: "outer", log: Arc::clone(&log) })
        .with(middleware::from_fn(|_ctx, _next| {
            Box::pin(async { Err(Error::other(Boom)) })
        }))
        .with(Counter { hits: Arc::clone(&after), respond: true });

    let err = road.dispatch("GET", "/", "", vec![]).await.unwrap_err();

    match err {
        Error::Middleware(inner) => assert!(inner.downcast_ref::<Boom>().is_some()),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(after.load(Ordering::SeqCst), 0);
    // The outer middleware still unwinds with the error in hand.
    assert_eq!(*log.lock().unwrap(), ["in:outer", "out:outer"]);
}

#[tokio::test]
async fn middleware_waits_for_suspended_predecessors() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let slow_log = Arc::clone(&log);
    let road = Road::new()
        .with(middleware::from_fn(move |ctx, next| {
            let log = Arc::clone(&slow_log);
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                log.lock().unwrap().push("slept".to_owned());
                next.run(ctx).await
            })
        }))
        .with(Recorder { name: "second", log: Arc::clone(&log) });

    road.dispatch("GET", "/", "", vec![]).await.unwrap();
    assert_eq!(*log.lock().unwrap(), ["slept", "in:second", "out:second"]);
}

// ── Routing through the chain ────────────────────────────────────────────────

fn post_comment(_ctx: &mut Context, params: Params) -> BoxFuture<'_, Response> {
    let body = format!(
        "{}:{}",
        params.get("id").unwrap_or_default(),
        params.get("commentId").unwrap_or_default(),
    );
    Box::pin(async move { Response::text(body) })
}

fn user_by_id(_ctx: &mut Context, _params: Params) -> BoxFuture<'_, &'static str> {
    Box::pin(async { "by id" })
}

fn current_user(_ctx: &mut Context, _params: Params) -> BoxFuture<'_, &'static str> {
    Box::pin(async { "me" })
}

#[tokio::test]
async fn parameters_are_extracted_from_the_matched_route() {
    let road = Road::new().with(Router::new(
        RouteTable::new().get("/posts/:id/comments/:commentId", post_comment),
    ));

    let res = road.dispatch("GET", "/posts/42/comments/7", "", vec![]).await.unwrap().unwrap();
    assert_eq!(res.body(), b"42:7");
}

#[tokio::test]
async fn literal_route_wins_regardless_of_registration_order() {
    let capture_first = RouteTable::new().get("/users/:id", user_by_id).get("/users/me", current_user);
    let literal_first = RouteTable::new().get("/users/me", current_user).get("/users/:id", user_by_id);

    for table in [capture_first, literal_first] {
        let road = Road::new().with(Router::new(table));
        let me = road.dispatch("get", "/users/me", "", vec![]).await.unwrap().unwrap();
        let other = road.dispatch("GET", "/users/5", "", vec![]).await.unwrap().unwrap();
        assert_eq!(me.body(), b"me");
        assert_eq!(other.body(), b"by id");
    }
}

#[tokio::test]
async fn unmatched_path_reaches_the_fallback() {
    let road = Road::new()
        .with(middleware::NotFound)
        .with(Router::new(RouteTable::new().get("/a", user_by_id)));

    let res = road.dispatch("GET", "/b", "", vec![]).await.unwrap().unwrap();
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

// ── Isolation ────────────────────────────────────────────────────────────────

fn slow_echo(ctx: &mut Context, params: Params) -> BoxFuture<'_, Response> {
    Box::pin(async move {
        let name = params.get("name").unwrap_or_default().to_owned();
        ctx.set_title(name.clone());
        // Yield so the two dispatches interleave.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let title = ctx.title().unwrap_or_default().to_owned();
        Response::text(title)
    })
}

#[tokio::test]
async fn concurrent_dispatches_do_not_share_context() {
    let road = Road::new().with(Router::new(RouteTable::new().get("/echo/:name", slow_echo)));

    let (a, b) = tokio::join!(
        road.dispatch("GET", "/echo/alpha", "", vec![]),
        road.dispatch("GET", "/echo/beta", "", vec![]),
    );
    let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());

    assert_eq!(a.body(), b"alpha");
    assert_eq!(a.title(), Some("alpha"));
    assert_eq!(b.body(), b"beta");
    assert_eq!(b.title(), Some("beta"));
}

#[tokio::test]
async fn concurrent_dispatches_across_tasks() {
    let road = Road::new().with(Router::new(RouteTable::new().get("/echo/:name", slow_echo)));

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let road = road.clone();
            tokio::spawn(async move {
                let res = road.dispatch("GET", &format!("/echo/n{i}"), "", vec![]).await;
                (i, res.unwrap().unwrap())
            })
        })
        .collect();

    for task in tasks {
        let (i, res) = task.await.unwrap();
        assert_eq!(res.body(), format!("n{i}").as_bytes());
    }
}

fn outer_page(ctx: &mut Context, _params: Params) -> BoxFuture<'_, Result<Response, Error>> {
    Box::pin(async move {
        ctx.set_title("Outer");
        let inner = ctx.request("GET", "/fragment", "", vec![]).await?
            .ok_or_else(|| Error::not_found("fragment"))?;

        // The sub-request had its own context: its title is its own and
        // ours is untouched.
        assert_eq!(inner.title(), Some("Fragment"));
        assert_eq!(ctx.title(), Some("Outer"));
        assert_eq!(ctx.depth(), 0);

        let body = format!("<main>{}</main>", String::from_utf8_lossy(inner.body()));
        Ok(Response::html(body))
    })
}

fn fragment(ctx: &mut Context, _params: Params) -> BoxFuture<'_, Response> {
    Box::pin(async move {
        assert_eq!(ctx.title(), None);
        assert_eq!(ctx.depth(), 1);
        ctx.set_title("Fragment");
        Response::html("<p>hi</p>")
    })
}

#[tokio::test]
async fn sub_dispatch_gets_an_independent_context() {
    let road = Road::new().with(Router::new(
        RouteTable::new()
            .get("/page", outer_page)
            .get("/fragment", fragment),
    ));

    let res = road.dispatch("GET", "/page", "", vec![]).await.unwrap().unwrap();
    assert_eq!(res.body(), b"<main><p>hi</p></main>");
    assert_eq!(res.title(), Some("Outer"));
}
