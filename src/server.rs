//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server stops accepting and waits for every open
//! connection to finish. Requests here sleep on purpose (the timeout trap
//! holds one for 60 s), so a drain can take that long. Give the supervisor
//! a matching grace period.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    listener: Listen,
}

enum Listen {
    At(SocketAddr),
    On(TcpListener),
}

impl Server {
    /// Binds to `addr` when [`serve`](Server::serve) is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { listener: Listen::At(addr) }
    }

    /// Serves on an already-bound listener (e.g. one bound to port 0).
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listener: Listen::On(listener) }
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve<S>(self, router: Router<S>) -> Result<(), Error>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves.
    pub async fn serve_with_shutdown<S, F>(self, router: Router<S>, signal: F) -> Result<(), Error>
    where
        S: Clone + Send + Sync + 'static,
        F: Future<Output = ()>,
    {
        let listener = match self.listener {
            Listen::At(addr) => TcpListener::bind(addr).await?,
            Listen::On(listener) => listener,
        };
        let router = Arc::new(router);
        let in_flight = Arc::new(AtomicUsize::new(0));

        info!(addr = %listener.local_addr()?, "laggard listening");

        let mut connections = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                biased;

                () = &mut signal => {
                    info!(
                        connections = connections.len(),
                        requests = in_flight.load(Ordering::Relaxed),
                        "shutdown requested, waiting for in-flight requests"
                    );
                    break;
                }

                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let in_flight = Arc::clone(&in_flight);
                    connections.spawn(async move {
                        let svc = service_fn(move |req| {
                            dispatch(Arc::clone(&router), Arc::clone(&in_flight), req)
                        });
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(TokioIo::new(stream), svc)
                            .await
                        {
                            warn!(%peer, "connection closed with error: {e}");
                        }
                    });
                }

                Some(done) = connections.join_next(), if !connections.is_empty() => {
                    reap(done);
                }
            }
        }

        let draining = Instant::now();
        while let Some(done) = connections.join_next().await {
            reap(done);
        }

        info!(drain_ms = draining.elapsed().as_millis() as u64, "laggard stopped");
        Ok(())
    }
}

fn reap(done: Result<(), JoinError>) {
    if let Err(e) = done {
        if e.is_panic() {
            error!("connection task panicked: {e}");
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Decrements the in-flight count however the request ends, including when
/// the client hangs up mid-delay and hyper drops the future.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self(count)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Every failure is already a response, so hyper never sees an error.
/// Request bodies are ignored: every route is a `GET`.
async fn dispatch<S>(
    router: Arc<Router<S>>,
    in_flight: Arc<AtomicUsize>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    S: Clone + Send + Sync + 'static,
{
    let _guard = InFlight::enter(in_flight);
    let (parts, _body) = req.into_parts();
    let response = router.oneshot(Request::from_parts(parts)).await;
    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only, off Unix). A signal
/// that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C"),
        () = sigterm => info!("received SIGTERM"),
    }
}
