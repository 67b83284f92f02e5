//! Active health checking against live sockets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use lb_proxy::health::HealthMonitor;
use lb_proxy::http::client::build_client;
use lb_proxy::load_balancer::BackendPool;

mod common;

use common::{client, config, Proxy};

#[tokio::test]
async fn test_probe_timeout_marks_dead_then_recovers() {
    let hang = Arc::new(AtomicBool::new(true));
    let flag = hang.clone();
    let backend = common::start_programmable_backend(move || {
        let flag = flag.clone();
        async move {
            if flag.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            (200, "ok".to_string())
        }
    })
    .await;

    let mut config = config(&[backend]);
    config.health_check.enabled = true;
    config.health_check.timeout_secs = 1;
    let client = build_client(Duration::from_secs(1));
    let pool = Arc::new(BackendPool::with_client(&config, client.clone()).unwrap());
    let monitor = HealthMonitor::new(pool.clone(), config.health_check.clone(), client);

    monitor.check_all().await;
    assert!(!pool.backends()[0].is_alive(), "timed-out probe must mark the backend dead");

    hang.store(false, Ordering::SeqCst);
    monitor.check_all().await;
    assert!(pool.backends()[0].is_alive(), "successful probe must revive the backend");
}

#[tokio::test]
async fn test_unhealthy_backend_evicted_and_restored() {
    let b1 = common::start_mock_backend("b1").await;

    let b2_healthy = Arc::new(AtomicBool::new(true));
    let flag = b2_healthy.clone();
    let b2 = common::start_programmable_backend(move || {
        let flag = flag.clone();
        async move {
            if flag.load(Ordering::SeqCst) {
                (200, "b2".to_string())
            } else {
                (503, "down".to_string())
            }
        }
    })
    .await;

    let mut config = config(&[b1, b2]);
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    let proxy = Proxy::start(config).await;

    b2_healthy.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!proxy.pool.backends()[1].is_alive());

    let client = client();
    for _ in 0..6 {
        let res = client.get(proxy.url("/")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), "b1", "evicted backend must receive no traffic");
    }

    b2_healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(proxy.pool.backends()[1].is_alive());

    proxy.stop().await;
}
