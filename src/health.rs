//! Built-in health-check handlers.
//!
//! | Probe         | Path       | Question                                  |
//! |---------------|------------|-------------------------------------------|
//! | **Liveness**  | `/healthz` | Is the process alive? Failure → restart.  |
//! | **Readiness** | `/readyz`  | Can it serve traffic? Failure → drained.  |
//!
//! ```rust
//! use road::{health, RouteTable};
//!
//! let table = RouteTable::new()
//!     .get("/healthz", health::liveness)
//!     .get("/readyz",  health::readiness);
//! ```
//!
//! Replace `readiness` with your own handler to gate on dependencies.

use crate::context::Context;
use crate::middleware::BoxFuture;
use crate::params::Params;
use crate::response::Response;

/// Liveness probe. Always `200 OK` with body `"ok"`.
pub fn liveness(_ctx: &mut Context, _params: Params) -> BoxFuture<'_, Response> {
    Box::pin(async { Response::text("ok") })
}

/// Readiness probe (default implementation). `200 OK` with body `"ready"`.
pub fn readiness(_ctx: &mut Context, _params: Params) -> BoxFuture<'_, Response> {
    Box::pin(async { Response::text("ready") })
}

#[cfg(test)]
mod tests {
    use crate::{Road, RouteTable, Router};

    #[tokio::test]
    async fn probes_answer_through_a_router() {
        let road = Road::new().with(Router::new(
            RouteTable::new()
                .get("/healthz", super::liveness)
                .get("/readyz", super::readiness),
        ));

        let live = road.dispatch("GET", "/healthz", "", vec![]).await.unwrap().unwrap();
        let ready = road.dispatch("GET", "/readyz", "", vec![]).await.unwrap().unwrap();
        assert_eq!(live.body(), b"ok");
        assert_eq!(ready.body(), b"ready");
    }
}
