//! Integration tests for push accounting through the public API.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fleetcfg_metrics::kind::{CLUSTER_TYPE, LISTENER_TYPE};
use fleetcfg_metrics::{init, render, MetricsError, ResourceKind, TriggerReason};
use prometheus::Registry;
use tonic::Status;

fn scrape(registry: &Registry) -> String {
    let (body, _) = render(registry).unwrap();
    String::from_utf8(body).unwrap()
}

/// Test 1000 connects followed by 400 disconnects from many threads.
#[test]
fn test_client_tracker_under_contention() {
    let registry = Registry::new();
    let catalog = init(&registry).unwrap();

    let connects: Vec<_> = (0..10)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                for _ in 0..100 {
                    catalog.record_client_change("1.12", 1.0);
                }
            })
        })
        .collect();
    for handle in connects {
        handle.join().unwrap();
    }

    let disconnects: Vec<_> = (0..4)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                for _ in 0..100 {
                    catalog.record_client_change("1.12", -1.0);
                }
            })
        })
        .collect();
    for handle in disconnects {
        handle.join().unwrap();
    }

    assert!(scrape(&registry).contains("config_clients_connected{version=\"1.12\"} 600"));
}

/// Test a typical stream lifecycle as seen by a connection worker.
#[test]
fn test_stream_lifecycle() {
    let registry = Registry::new();
    let catalog = init(&registry).unwrap();
    let cluster = ResourceKind::from_type_url(CLUSTER_TYPE);
    let listener = ResourceKind::from_type_url(LISTENER_TYPE);

    catalog.record_client_change("1.20", 1.0);
    catalog.record_push_triggers([TriggerReason::ConfigChange, TriggerReason::EndpointChange]);
    catalog.record_push_time(&cluster, Duration::from_millis(15));
    catalog.record_push_time(&listener, Duration::from_millis(8));
    catalog.record_send_time(Duration::from_millis(3));
    catalog.record_reject(
        &listener,
        "sidecar~10.1.1.1~pod.ns~ns.svc.cluster.local",
        "13",
    );
    catalog.record_send_error(
        &cluster,
        "conn-1",
        &Status::unavailable("transport closing"),
    );
    catalog.record_client_change("1.20", -1.0);

    let text = scrape(&registry);
    assert!(text.contains("config_push_attempts{kind=\"cds\"} 1"));
    assert!(text.contains("config_push_attempts{kind=\"lds\"} 1"));
    assert!(text.contains("config_send_duration_seconds_count 1"));
    assert!(text.contains("config_push_triggers_total{reason=\"config\"} 1"));
    assert!(text.contains("config_push_triggers_total{reason=\"endpoint\"} 1"));
    assert!(text.contains("config_rejects_total{kind=\"lds\"} 1"));
    assert!(text.contains("config_clients_connected{version=\"1.20\"} 0"));
    assert!(!text.contains("config_send_errors_total{"));
}

/// Test that a second catalog cannot be registered into the same registry.
#[test]
fn test_bootstrap_fails_fast_on_duplicate() {
    let registry = Registry::new();
    let _catalog = init(&registry).unwrap();

    match init(&registry) {
        Err(MetricsError::Registration { name, .. }) => {
            assert_eq!(name, "config_rejects_legacy_listener")
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("duplicate registration must fail"),
    }
}
