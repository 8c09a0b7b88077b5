//! Minimal road example: a JSON resource, a nested admin table, a
//! sub-request, cookies and health checks behind the hyper server.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i http://localhost:3000/users/me
//!   curl -i -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -i http://localhost:3000/admin/users/42
//!   curl -i http://localhost:3000/healthz

use std::time::Duration;

use road::middleware::{self, Next};
use road::{
    health, BoxFuture, Context, Cookie, Error, Outcome, Params, Response, Road, RouteTable,
    Router, Server, StatusCode,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let admin = RouteTable::new()
        .delete("/users/:id", delete_user);

    let routes = RouteTable::new()
        .get("/users/:id",  get_user)
        .get("/users/me",   me)
        .post("/users",     create_user)
        .mount("/admin",    admin)
        .get("/healthz",    health::liveness)
        .get("/readyz",     health::readiness);

    let road = Road::new()
        .with(middleware::Trace)
        .with(middleware::Recover)
        .with(middleware::Timeout::new(Duration::from_secs(10)))
        .with(remember_visit)
        .with(middleware::NotFound)
        .with(Router::new(routes));

    Server::bind("0.0.0.0:3000")?.serve(road).await
}

// Sets a cookie on every response the chain produces.
fn remember_visit<'a>(ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, Outcome> {
    Box::pin(async move {
        if ctx.header("cookie").is_none_or(|c| !c.contains("visited=")) {
            ctx.set_cookie(Cookie::new("visited", "1").path("/").http_only());
        }
        next.run(ctx).await
    })
}

// GET /users/:id
fn get_user(ctx: &mut Context, params: Params) -> BoxFuture<'_, Result<Response, Error>> {
    Box::pin(async move {
        let id = params.get("id").unwrap_or_default();
        if id.parse::<u64>().is_err() {
            return Err(Error::http(StatusCode::BAD_REQUEST, "id must be numeric"));
        }
        ctx.set_title(format!("User {id}"));
        Ok(Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#)))
    })
}

// GET /users/me → re-dispatches /users/1 in-process.
fn me(ctx: &mut Context, _params: Params) -> BoxFuture<'_, Outcome> {
    ctx.request("GET", "/users/1", "", vec![])
}

// POST /users
fn create_user(ctx: &mut Context, _params: Params) -> BoxFuture<'_, Response> {
    Box::pin(async move {
        if ctx.body().is_empty() {
            return Response::status(StatusCode::BAD_REQUEST);
        }
        ctx.response()
            .status(StatusCode::CREATED)
            .header("location", "/users/99")
            .json(r#"{"id":"99","name":"new_user"}"#)
    })
}

// DELETE /admin/users/:id → 204 No Content
fn delete_user(_ctx: &mut Context, _params: Params) -> BoxFuture<'_, StatusCode> {
    Box::pin(async { StatusCode::NO_CONTENT })
}
