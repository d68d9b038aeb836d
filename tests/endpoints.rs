//! End-to-end behaviour of the route table, driven in process.

use std::time::Duration;

use http::StatusCode;
use http::header::{ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, HeaderValue, ORIGIN};
use laggard::{AppState, Config, Entropy, Request, Response, Router, ScriptedEntropy, ThreadEntropy, app};
use serde_json::Value;
use tokio::time::Instant;

fn router_with(entropy: impl Entropy) -> Router<AppState> {
    app::router(AppState::new(Config::default(), entropy))
}

fn body(res: &Response) -> Value {
    serde_json::from_slice(res.body()).expect("response body is JSON")
}

async fn get(router: &Router<AppState>, target: &str) -> Response {
    router.oneshot(Request::get(target)).await
}

#[tokio::test]
async fn index_advertises_every_route_and_each_is_served() {
    let router = router_with(ThreadEntropy);
    let res = get(&router, "/").await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let info = body(&res);
    assert_eq!(info["service"], "laggard");
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    let paths: Vec<&str> = info["endpoints"].as_array().unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    for path in ["/", "/health", "/stats", "/slow", "/random", "/sometimes-fail", "/timeout-trap", "/cascade", "/burst-error"] {
        assert!(paths.contains(&path), "{path} missing from index");
    }
}

#[tokio::test]
async fn health_reports_healthy() {
    let res = get(&router_with(ThreadEntropy), "/health").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(body(&res)["status"], "healthy");
}

#[tokio::test(start_paused = true)]
async fn slow_sleeps_then_reports_delay() {
    let router = router_with(ThreadEntropy);
    for delay in [1u64, 7, 30] {
        let started = Instant::now();
        let res = get(&router, &format!("/slow?delay={delay}")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(started.elapsed() >= Duration::from_secs(delay));
        assert_eq!(body(&res)["delay_used"], delay as f64);
    }
}

#[tokio::test(start_paused = true)]
async fn slow_out_of_range_is_400_and_never_sleeps() {
    let router = router_with(ThreadEntropy);
    for delay in ["0", "31", "100", "-5", "abc"] {
        let started = Instant::now();
        let res = get(&router, &format!("/slow?delay={delay}")).await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST, "delay={delay}");
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(body(&res)["error"], "Bad Request");
    }
}

#[tokio::test(start_paused = true)]
async fn random_degenerate_range_always_picks_its_bound() {
    let router = router_with(ThreadEntropy);
    for _ in 0..25 {
        let res = get(&router, "/random?min_delay=2&max_delay=2").await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(body(&res)["delay_used"], 2.0);
    }
}

#[tokio::test(start_paused = true)]
async fn random_stays_within_requested_range() {
    let router = router_with(ThreadEntropy);
    for _ in 0..50 {
        let res = get(&router, "/random?min_delay=1.5&max_delay=4").await;
        let delay = body(&res)["delay_used"].as_f64().unwrap();
        assert!((1.5..=4.0).contains(&delay), "{delay}");
    }
}

#[tokio::test]
async fn random_invalid_range_is_400() {
    let router = router_with(ThreadEntropy);
    let res = get(&router, "/random?min_delay=5&max_delay=1").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sometimes_fail_never_fails_at_rate_zero() {
    let router = router_with(ThreadEntropy);
    for _ in 0..100 {
        let res = get(&router, "/sometimes-fail?failure_rate=0").await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(body(&res)["result"], "success");
    }
}

#[tokio::test]
async fn sometimes_fail_always_fails_at_rate_one() {
    let router = router_with(ThreadEntropy);
    for _ in 0..100 {
        let res = get(&router, "/sometimes-fail?failure_rate=1").await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&res)["failure_rate"], 1.0);
    }
}

#[tokio::test]
async fn sometimes_fail_half_rate_is_roughly_half() {
    let router = router_with(ThreadEntropy);
    let mut failures = 0;
    for _ in 0..1000 {
        if get(&router, "/sometimes-fail?failure_rate=0.5").await.status_code().is_server_error() {
            failures += 1;
        }
    }
    let proportion = f64::from(failures) / 1000.0;
    assert!((0.4..=0.6).contains(&proportion), "observed {proportion}");
}

#[tokio::test]
async fn sometimes_fail_follows_scripted_draws() {
    let router = router_with(ScriptedEntropy::new(vec![0.1, 0.8, 0.1]));
    let statuses: Vec<u16> = {
        let mut out = Vec::new();
        for _ in 0..3 {
            out.push(get(&router, "/sometimes-fail?failure_rate=0.5").await.status_code().as_u16());
        }
        out
    };
    assert_eq!(statuses, vec![500, 200, 500]);
}

#[tokio::test]
async fn sometimes_fail_invalid_rate_is_400() {
    let res = get(&router_with(ThreadEntropy), "/sometimes-fail?failure_rate=2").await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn timeout_trap_holds_for_sixty_seconds() {
    let router = router_with(ThreadEntropy);
    let started = Instant::now();
    let res = get(&router, "/timeout-trap").await;
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(body(&res)["delay_used"], 60);
}

#[tokio::test(start_paused = true)]
async fn timeout_trap_ignores_parameters() {
    let router = router_with(ThreadEntropy);
    let started = Instant::now();
    let res = get(&router, "/timeout-trap?delay=1").await;
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(body(&res)["delay_used"], 60);
}

#[tokio::test(start_paused = true)]
async fn cascade_is_deterministic() {
    let router = router_with(ThreadEntropy);
    let res = get(&router, "/cascade?levels=3").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let report = body(&res);
    assert_eq!(report["levels"], 3);
    assert_eq!(report["total_delay"], 3.0);
    assert_eq!(report["stages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn cascade_invalid_levels_is_400() {
    let router = router_with(ThreadEntropy);
    for levels in ["0", "6", "x"] {
        let res = get(&router, &format!("/cascade?levels={levels}")).await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST, "levels={levels}");
    }
}

#[tokio::test]
async fn burst_error_is_503_with_retry_after() {
    let res = get(&router_with(ThreadEntropy), "/burst-error?error_duration=12").await;
    assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.header("retry-after"), Some("12"));
    assert_eq!(body(&res)["retry_after"], 12);
}

#[tokio::test(start_paused = true)]
async fn stats_count_every_routed_request() {
    let router = router_with(ScriptedEntropy::constant(0.5));
    let total = |res: &Response| body(res)["total_requests"].as_u64().unwrap();

    // /stats counts itself before it takes the snapshot.
    let mut last = total(&get(&router, "/stats").await);
    assert_eq!(last, 1);

    for target in [
        "/",
        "/health",
        "/slow?delay=1",
        "/slow?delay=99",
        "/random?min_delay=1&max_delay=2",
        "/sometimes-fail?failure_rate=0",
        "/sometimes-fail?failure_rate=1",
        "/timeout-trap",
        "/cascade?levels=1",
        "/burst-error",
    ] {
        get(&router, target).await;
        let now = total(&get(&router, "/stats").await);
        assert_eq!(now, last + 2, "after {target}");
        last = now;
    }

    let snapshot = body(&get(&router, "/stats").await);
    assert_eq!(snapshot["endpoints"]["/slow"], 2);
    assert_eq!(snapshot["endpoints"]["/sometimes-fail"], 2);
}

#[tokio::test]
async fn unrouted_requests_are_not_counted() {
    let router = router_with(ThreadEntropy);
    let res = get(&router, "/does-not-exist").await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = router.oneshot(Request::new(http::Method::POST, "/slow")).await;
    assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);

    let stats = body(&get(&router, "/stats").await);
    assert_eq!(stats["total_requests"], 1);
}

#[tokio::test(start_paused = true)]
async fn delays_do_not_block_other_requests() {
    let router = std::sync::Arc::new(router_with(ThreadEntropy));
    let slow = {
        let router = std::sync::Arc::clone(&router);
        tokio::spawn(async move { router.oneshot(Request::get("/slow?delay=10")).await })
    };

    let started = Instant::now();
    let res = get(&router, "/health").await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(slow.await.unwrap().status_code(), StatusCode::OK);
}

#[tokio::test]
async fn every_response_is_readable_cross_origin() {
    let router = router_with(ScriptedEntropy::constant(0.0));
    for target in ["/health", "/slow?delay=0", "/sometimes-fail?failure_rate=1", "/burst-error", "/nowhere"] {
        let req = Request::get(target).with_header(ORIGIN, HeaderValue::from_static("http://dash.local"));
        let res = router.oneshot(req).await;
        assert_eq!(res.header("access-control-allow-origin"), Some("*"), "{target}");
    }
}

#[tokio::test]
async fn preflight_is_204_and_not_counted() {
    let router = router_with(ThreadEntropy);
    let preflight = Request::new(http::Method::OPTIONS, "/slow")
        .with_header(ORIGIN, HeaderValue::from_static("http://dash.local"))
        .with_header(ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("GET"))
        .with_header(ACCESS_CONTROL_REQUEST_HEADERS, HeaderValue::from_static("x-trace-id"));
    let res = router.oneshot(preflight).await;

    assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(res.header("access-control-allow-origin"), Some("*"));
    assert_eq!(res.header("access-control-allow-methods"), Some("*"));
    assert_eq!(res.header("access-control-allow-headers"), Some("*"));
    assert!(res.body().is_empty());

    let stats = body(&get(&router, "/stats").await);
    assert_eq!(stats["total_requests"], 1);
}

#[tokio::test(start_paused = true)]
async fn timestamps_are_rfc3339() {
    let router = router_with(ScriptedEntropy::constant(0.0));
    for target in ["/health", "/slow?delay=1", "/timeout-trap", "/sometimes-fail?failure_rate=1"] {
        let report = body(&get(&router, target).await);
        let stamp = report["timestamp"].as_str().unwrap_or_else(|| panic!("{target}: {report}"));
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok(), "{target}: {stamp}");
    }
}
