//! Radix-tree request router.
//!
//! One tree per HTTP method. Every handler gets a clone of the router's
//! state. CORS and request tracing wrap every dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use serde::Serialize;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{cors, trace};
use crate::request::Request;
use crate::response::Response;

/// Called with the registered route pattern of every matched request,
/// before its handler runs.
type MatchHook = Arc<dyn Fn(&str) + Send + Sync + 'static>;

struct Endpoint<S> {
    route: Arc<str>,
    handler: BoxedHandler<S>,
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router<S> {
    routes: HashMap<Method, MatchitRouter<Endpoint<S>>>,
    on_match: Option<MatchHook>,
    state: S,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// A router whose handlers each receive a clone of `state`.
    pub fn with_state(state: S) -> Self {
        Self { routes: HashMap::new(), on_match: None, state }
    }

    /// Register a handler for a method + path pair.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup, so this is a
    /// programming error rather than a runtime condition.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        let endpoint = Endpoint { route: Arc::from(path), handler: handler.into_boxed_handler() };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, endpoint)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::GET, path, handler)
    }

    /// Install a hook that observes the route pattern of every matched
    /// request. Unmatched requests (404/405) never reach it.
    pub fn on_match(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_match = Some(Arc::new(hook));
        self
    }

    /// Routes one request and produces one response, in process.
    ///
    /// This is the server's hot path; tests call it directly to exercise
    /// handlers without a socket. CORS preflights are answered without
    /// routing; every other response is marked readable from any origin.
    pub async fn oneshot(&self, req: Request) -> Response {
        let method = req.method().clone();
        let path = req.path().to_owned();
        trace::request(&method, &path, async {
            if cors::is_preflight(&req) {
                return cors::preflight();
            }
            cors::allow_any_origin(self.route(req).await)
        })
        .await
    }

    async fn route(&self, req: Request) -> Response {
        let path = req.path().to_owned();
        let matched = self.routes.get(req.method()).and_then(|tree| tree.at(&path).ok());

        let Some(matched) = matched else {
            return if self.allows_other_method(req.method(), &path) {
                not_routed(StatusCode::METHOD_NOT_ALLOWED, format!("{} is not allowed on {path}", req.method()))
            } else {
                not_routed(StatusCode::NOT_FOUND, format!("no route for {path}"))
            };
        };

        let endpoint = matched.value;
        if let Some(hook) = &self.on_match {
            hook(&*endpoint.route);
        }
        let handler = Arc::clone(&endpoint.handler);
        handler.call(req, self.state.clone()).await
    }

    fn allows_other_method(&self, method: &Method, path: &str) -> bool {
        self.routes.iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok())
    }
}

#[derive(Serialize)]
struct NotRouted {
    error: &'static str,
    message: String,
}

fn not_routed(status: StatusCode, message: String) -> Response {
    let body = NotRouted { error: status.canonical_reason().unwrap_or("Error"), message };
    Response::builder().status(status).json(&body)
}
