//! Dispatcher behaviour against scripted hosts.

use mirror_dispatch::config::ValidationError;
use mirror_dispatch::{
    AttemptError, ConfigError, DispatchConfig, DispatchError, Dispatcher, RequestOptions, Transport,
};
use rand::rngs::mock::StepRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

mod common;
use common::{config, MockTransport, Outcome};

/// Dispatcher whose host order always follows the configured order.
fn dispatcher(config: DispatchConfig, transport: Arc<MockTransport>) -> Dispatcher {
    Dispatcher::builder(config)
        .transport(transport as Arc<dyn Transport>)
        .rng(StepRng::new(0, 0))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_primary_down_falls_back() {
    let transport = MockTransport::new().host("p", Outcome::Network).arc();
    let mut config = config(&[("p", 10.0), ("f", 5.0)]);
    config.performance.max_retries = 2;
    let dispatcher = dispatcher(config, transport.clone());

    let res = dispatcher.request("/x", RequestOptions::get()).await.unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.text(), "f /x");

    let status = dispatcher.status();
    assert!(status.health_by_host["p"].consecutive_failures >= 1);
    assert_eq!(status.stats.failed, 0);
    assert_eq!(status.stats.success, 1);
    assert_eq!(transport.hosts_called(), vec!["p", "f"]);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_rejects_without_network() {
    let transport = MockTransport::new().arc();
    let mut config = config(&[("p", 1.0)]);
    config.security.rate_limit_per_minute = 2;
    config.cache.enabled = false;
    let dispatcher = dispatcher(config, transport.clone());

    dispatcher.request("/a", RequestOptions::get()).await.unwrap();
    dispatcher.request("/b", RequestOptions::get()).await.unwrap();
    let err = dispatcher.request("/c", RequestOptions::get()).await.unwrap_err();

    assert_eq!(err, DispatchError::RateLimitExceeded { limit_per_minute: 2 });
    assert_eq!(transport.call_count(), 2);
    assert_eq!(dispatcher.status().in_flight, 0);
    let stats = dispatcher.status().stats;
    assert_eq!((stats.total, stats.success, stats.failed), (3, 2, 1));
}

#[tokio::test(start_paused = true)]
async fn test_cached_get_hits_network_once() {
    let transport = MockTransport::new().arc();
    let dispatcher = dispatcher(config(&[("p", 1.0)]), transport.clone());

    let first = dispatcher.request("/plans", RequestOptions::get()).await.unwrap();
    let second = dispatcher.request("/plans", RequestOptions::get()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.call_count(), 1);
    let status = dispatcher.status();
    assert_eq!(status.cache_size, 1);
    assert_eq!(status.stats.cached, 1);
    assert_eq!(status.stats.success, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cache_varies_on_authorization() {
    let transport = MockTransport::new().arc();
    let dispatcher = dispatcher(config(&[("p", 1.0)]), transport.clone());

    let alice = RequestOptions::get().header("authorization", "Bearer alice");
    let bob = RequestOptions::get().header("authorization", "Bearer bob");
    dispatcher.request("/me", alice.clone()).await.unwrap();
    dispatcher.request("/me", bob).await.unwrap();
    dispatcher.request("/me", alice).await.unwrap();

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cache_entry_expires() {
    let transport = MockTransport::new().arc();
    let mut config = config(&[("p", 1.0)]);
    config.cache.ttl_ms = 1_000;
    let dispatcher = dispatcher(config, transport.clone());

    dispatcher.request("/plans", RequestOptions::get()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_001)).await;
    dispatcher.request("/plans", RequestOptions::get()).await.unwrap();

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_post_is_never_cached() {
    let transport = MockTransport::new().arc();
    let dispatcher = dispatcher(config(&[("p", 1.0)]), transport.clone());

    let post = RequestOptions::method(reqwest::Method::POST).body(r#"{"plan":1}"#);
    dispatcher.request("/orders", post.clone()).await.unwrap();
    dispatcher.request("/orders", post).await.unwrap();

    assert_eq!(transport.call_count(), 2);
    assert_eq!(dispatcher.status().cache_size, 0);
    let sent = transport.requests();
    assert_eq!(sent[0].method, reqwest::Method::POST);
    assert_eq!(sent[0].body.as_deref(), Some(&br#"{"plan":1}"#[..]));
}

#[tokio::test(start_paused = true)]
async fn test_all_breakers_open_fails_without_network() {
    let transport = MockTransport::new()
        .host("p", Outcome::Network)
        .host("f", Outcome::Network)
        .arc();
    let mut config = config(&[("p", 1.0), ("f", 1.0)]);
    config.circuit_breaker.failure_threshold = 1;
    config.performance.max_retries = 1;
    let dispatcher = dispatcher(config, transport.clone());

    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    assert!(matches!(err, DispatchError::AllHostsUnavailable { attempts: 2, .. }));
    let calls = transport.call_count();

    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    assert_eq!(err, DispatchError::NoHealthyHosts);
    assert_eq!(transport.call_count(), calls);
    assert_eq!(dispatcher.status().stats.failed, 2);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_readmits_after_cooldown() {
    let transport = MockTransport::new().host("p", Outcome::Network).arc();
    let mut config = config(&[("p", 1.0)]);
    config.circuit_breaker.failure_threshold = 1;
    config.circuit_breaker.cooldown_ms = 30_000;
    config.performance.max_retries = 0;
    let dispatcher = dispatcher(config, transport.clone());

    dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    assert_eq!(err, DispatchError::NoHealthyHosts);

    tokio::time::sleep(Duration::from_millis(30_001)).await;
    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    assert!(matches!(err, DispatchError::AllHostsUnavailable { attempts: 1, .. }));
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_single_attempt() {
    let transport = MockTransport::new().host("p", Outcome::Status(503)).arc();
    let mut config = config(&[("p", 10.0), ("f", 5.0)]);
    config.performance.max_retries = 0;
    let dispatcher = dispatcher(config, transport.clone());

    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    match err {
        DispatchError::AllHostsUnavailable { attempts, last_error } => {
            assert_eq!(attempts, 1);
            assert_eq!(last_error, AttemptError::Http { status: 503 });
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(transport.hosts_called(), vec!["p"]);
}

#[tokio::test(start_paused = true)]
async fn test_client_error_advances_to_next_host() {
    let transport = MockTransport::new().host("p", Outcome::Status(404)).arc();
    let dispatcher = dispatcher(config(&[("p", 1.0), ("f", 1.0)]), transport.clone());

    let res = dispatcher.request("/x", RequestOptions::get()).await.unwrap();
    assert_eq!(res.text(), "f /x");
    assert_eq!(dispatcher.status().health_by_host["p"].consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_client_errors_not_revisited() {
    let transport = MockTransport::new()
        .host("p", Outcome::Status(404))
        .host("f", Outcome::Status(403))
        .arc();
    let mut config = config(&[("p", 1.0), ("f", 1.0)]);
    config.performance.max_retries = 5;
    let dispatcher = dispatcher(config, transport.clone());

    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    match err {
        DispatchError::AllHostsUnavailable { attempts, last_error } => {
            assert_eq!(attempts, 2);
            assert_eq!(last_error, AttemptError::Http { status: 403 });
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(transport.hosts_called(), vec!["p", "f"]);
}

#[tokio::test(start_paused = true)]
async fn test_server_errors_wrap_around_hosts() {
    let transport = MockTransport::new()
        .host("p", Outcome::Status(503))
        .host("f", Outcome::Status(502))
        .arc();
    let mut config = config(&[("p", 1.0), ("f", 1.0)]);
    config.performance.max_retries = 3;
    config.circuit_breaker.failure_threshold = 10;
    let dispatcher = dispatcher(config, transport.clone());

    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    assert!(matches!(err, DispatchError::AllHostsUnavailable { attempts: 4, .. }));
    assert_eq!(transport.hosts_called(), vec!["p", "f", "p", "f"]);
}

#[tokio::test(start_paused = true)]
async fn test_open_circuit_skips_without_io() {
    let transport = MockTransport::new()
        .host("p", Outcome::Status(503))
        .host("f", Outcome::Status(503))
        .arc();
    let mut config = config(&[("p", 1.0), ("f", 1.0)]);
    config.performance.max_retries = 3;
    config.circuit_breaker.failure_threshold = 1;
    let dispatcher = dispatcher(config, transport.clone());

    let started = Instant::now();
    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    match err {
        DispatchError::AllHostsUnavailable { attempts, last_error } => {
            assert_eq!(attempts, 4);
            assert_eq!(last_error, AttemptError::Http { status: 503 });
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(transport.call_count(), 2);
    // two backoffs (1s, 2s) after the real failures, none after skips
    assert_eq!(started.elapsed().as_millis() / 100, 30);
}

#[tokio::test(start_paused = true)]
async fn test_exponential_backoff_between_attempts() {
    let transport = MockTransport::new().host("p", Outcome::Status(500)).arc();
    let mut config = config(&[("p", 1.0)]);
    config.performance.max_retries = 3;
    config.performance.retry_delay_ms = 100;
    config.performance.max_retry_delay_ms = 250;
    config.circuit_breaker.failure_threshold = 10;
    let dispatcher = dispatcher(config, transport.clone());

    let started = Instant::now();
    dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    let elapsed = started.elapsed();

    // 100 + 200 + 250 (capped); no sleep after the last attempt
    assert!(elapsed >= Duration::from_millis(550), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(600), "{:?}", elapsed);
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_timeout_moves_on() {
    let transport = MockTransport::new().host("p", Outcome::Hang).arc();
    let mut config = config(&[("p", 1.0), ("f", 1.0)]);
    config.performance.request_timeout_ms = 100;
    let dispatcher = dispatcher(config, transport.clone());

    let res = dispatcher.request("/x", RequestOptions::get()).await.unwrap();
    assert_eq!(res.text(), "f /x");
    let status = dispatcher.status();
    assert_eq!(status.health_by_host["p"].consecutive_failures, 1);
    assert!(status.health_by_host["f"].last_response_time_ms.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_request_id_shared_across_attempts() {
    let transport = MockTransport::new().host("p", Outcome::Status(503)).arc();
    let dispatcher = dispatcher(config(&[("p", 1.0), ("f", 1.0)]), transport.clone());

    dispatcher.request("/x", RequestOptions::get()).await.unwrap();
    let sent = transport.requests();
    assert_eq!(sent.len(), 2);
    let id = &sent[0].headers["x-request-id"];
    assert_eq!(&sent[1].headers["x-request-id"], id);

    dispatcher.request("/y", RequestOptions::get()).await.unwrap();
    assert_ne!(&transport.requests()[2].headers["x-request-id"], id);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_aborts_in_flight_and_rejects() {
    let transport = MockTransport::new().host("p", Outcome::Hang).arc();
    let dispatcher = Arc::new(dispatcher(config(&[("p", 1.0)]), transport.clone()));

    let in_flight = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.request("/slow", RequestOptions::get()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dispatcher.status().in_flight, 1);

    dispatcher.shutdown();
    assert_eq!(in_flight.await.unwrap(), Err(DispatchError::Shutdown));

    let err = dispatcher.request("/x", RequestOptions::get()).await.unwrap_err();
    assert_eq!(err, DispatchError::Shutdown);

    let status = dispatcher.status();
    assert!(!status.initialized);
    assert_eq!(status.in_flight, 0);
    assert_eq!(status.cache_size, 0);
}

#[tokio::test(start_paused = true)]
async fn test_status_snapshot() {
    let transport = MockTransport::new().arc();
    let dispatcher = dispatcher(config(&[("p", 1.0), ("f", 1.0)]), transport);

    dispatcher.request("/x", RequestOptions::get()).await.unwrap();
    let status = dispatcher.status();

    assert!(status.initialized);
    assert!(!status.prober_running);
    assert!(status.last_probe_at.is_none());
    assert_eq!(status.cache_size, 1);
    assert_eq!(status.in_flight, 0);
    assert_eq!(status.health_by_host.len(), 1);
    assert!(status.health_by_host["p"].healthy);

    dispatcher.reset_stats();
    assert_eq!(dispatcher.status().stats.total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_overflowing_total_weight_rejected_at_build() {
    let transport = MockTransport::new().arc();
    let err = Dispatcher::builder(config(&[("p", 1e308), ("f", 1e308)]))
        .transport(transport.clone() as Arc<dyn Transport>)
        .build()
        .unwrap_err();

    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors, vec![ValidationError::TotalWeightOverflow]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(transport.call_count(), 0);
}
