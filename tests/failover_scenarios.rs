//! End-to-end failover behavior against the in-memory registry.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{failover_loop, FaultyRegistry, ScriptedProbe};
use dns_failover::dns::memory::RegistryOp;
use dns_failover::dns::{DnsRegistry, InMemoryRegistry};
use dns_failover::Shutdown;

const DOMAIN: &str = "www.example.com";

#[tokio::test]
async fn dead_server_is_replaced_across_rounds() {
    let registry = Arc::new(InMemoryRegistry::new().with_records(DOMAIN, ["10.0.0.1"]));
    let probe = ScriptedProbe::new(["10.0.0.1", "10.0.0.2"]);
    let failover = failover_loop(
        &[DOMAIN],
        &["10.0.0.1", "10.0.0.2"],
        registry.clone(),
        probe.clone(),
        2,
    );

    let reports = failover.run_once().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].added, vec!["10.0.0.2"]);
    assert_eq!(registry.addresses(DOMAIN), vec!["10.0.0.1", "10.0.0.2"]);

    probe.set_alive(["10.0.0.2"]);
    let reports = failover.run_once().await;
    assert_eq!(reports[0].removed, vec!["10.0.0.1"]);
    assert_eq!(registry.addresses(DOMAIN), vec!["10.0.0.2"]);
    // The dead server used its whole retry budget: 1 call in round one, 2 in round two.
    assert_eq!(probe.calls("10.0.0.1"), 3);

    assert_eq!(
        registry.operations(),
        vec![
            RegistryOp::Add {
                domain: DOMAIN.into(),
                address: "10.0.0.2".into()
            },
            RegistryOp::Delete {
                domain: DOMAIN.into(),
                address: "10.0.0.1".into()
            },
        ]
    );
}

#[tokio::test]
async fn deletion_cap_applies_per_domain() {
    let registry = Arc::new(
        InMemoryRegistry::new()
            .with_records("a.example.com", ["10.0.0.1", "10.0.0.2", "10.0.0.3"])
            .with_records("b.example.com", ["10.0.0.1", "10.0.0.2", "10.0.0.3"]),
    );
    let probe = Arc::new(ScriptedProbe::default());
    let failover = failover_loop(
        &["a.example.com", "b.example.com"],
        &["10.0.0.1", "10.0.0.2", "10.0.0.3"],
        registry.clone(),
        probe,
        1,
    );

    let reports = failover.run_once().await;
    assert_eq!(reports[0].removed, vec!["10.0.0.1"]);
    assert_eq!(reports[1].removed, vec!["10.0.0.1"]);
    assert_eq!(registry.addresses("a.example.com"), vec!["10.0.0.2", "10.0.0.3"]);
    assert_eq!(registry.addresses("b.example.com"), vec!["10.0.0.2", "10.0.0.3"]);
}

#[tokio::test]
async fn converged_round_issues_no_writes() {
    let servers = ["10.0.0.1", "10.0.0.2"];
    let registry = Arc::new(InMemoryRegistry::new().with_records(DOMAIN, servers));
    let probe = ScriptedProbe::new(servers);
    let failover = failover_loop(&[DOMAIN], &servers, registry.clone(), probe, 3);

    for _ in 0..3 {
        let reports = failover.run_once().await;
        assert_eq!(reports[0].mutations(), 0);
    }
    assert!(registry.operations().is_empty());
}

#[tokio::test]
async fn unreadable_domain_does_not_block_others() {
    let mut faulty = FaultyRegistry::new(
        InMemoryRegistry::new()
            .with_records("a.example.com", ["10.0.0.1"])
            .with_records("b.example.com", ["10.0.0.1"]),
    );
    faulty.fail_reads.insert("a.example.com".into());
    let registry = Arc::new(faulty);
    let probe = ScriptedProbe::new(["10.0.0.1", "10.0.0.2"]);
    let failover = failover_loop(
        &["a.example.com", "b.example.com"],
        &["10.0.0.1", "10.0.0.2"],
        registry.clone(),
        probe,
        1,
    );

    let reports = failover.run_once().await;
    assert!(reports[0].skipped);
    assert!(!reports[1].skipped);
    assert_eq!(reports[1].added, vec!["10.0.0.2"]);
    assert_eq!(registry.inner.addresses("a.example.com"), vec!["10.0.0.1"]);
}

#[tokio::test]
async fn failed_add_moves_on_to_next_server() {
    let mut faulty =
        FaultyRegistry::new(InMemoryRegistry::new().with_records(DOMAIN, ["10.0.0.1"]));
    faulty.fail_adds.insert("10.0.0.2".into());
    let registry = Arc::new(faulty);
    let probe = ScriptedProbe::new(["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    let failover = failover_loop(
        &[DOMAIN],
        &["10.0.0.1", "10.0.0.2", "10.0.0.3"],
        registry.clone(),
        probe,
        1,
    );

    let reports = failover.run_once().await;
    assert_eq!(reports[0].write_errors, 1);
    assert_eq!(reports[0].added, vec!["10.0.0.3"]);
    assert_eq!(registry.attempted_writes.load(Ordering::SeqCst), 2);
    assert_eq!(registry.inner.addresses(DOMAIN), vec!["10.0.0.1", "10.0.0.3"]);
}

#[tokio::test]
async fn failed_delete_does_not_consume_the_cap() {
    let mut faulty = FaultyRegistry::new(
        InMemoryRegistry::new().with_records(DOMAIN, ["10.0.0.1", "10.0.0.2", "10.0.0.3"]),
    );
    faulty.fail_deletes.insert("10.0.0.1".into());
    let registry = Arc::new(faulty);
    let probe = ScriptedProbe::new(["10.0.0.3"]);
    let failover = failover_loop(
        &[DOMAIN],
        &["10.0.0.1", "10.0.0.2", "10.0.0.3"],
        registry.clone(),
        probe,
        1,
    );

    let reports = failover.run_once().await;
    assert_eq!(reports[0].write_errors, 1);
    assert_eq!(reports[0].removed, vec!["10.0.0.2"]);
    assert_eq!(registry.inner.addresses(DOMAIN), vec!["10.0.0.1", "10.0.0.3"]);
}

#[tokio::test(start_paused = true)]
async fn loop_runs_on_schedule_until_shutdown() {
    let registry = Arc::new(InMemoryRegistry::new().with_records(DOMAIN, ["10.0.0.1"]));
    let probe = ScriptedProbe::new(["10.0.0.1", "10.0.0.2"]);
    let failover = failover_loop(
        &[DOMAIN],
        &["10.0.0.1", "10.0.0.2"],
        registry.clone() as Arc<dyn DnsRegistry>,
        probe.clone(),
        2,
    );

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(failover.run(shutdown.subscribe()));

    // First round fires one second after start.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(probe.total_calls(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(registry.addresses(DOMAIN), vec!["10.0.0.1", "10.0.0.2"]);

    probe.set_alive(["10.0.0.2"]);
    tokio::time::sleep(Duration::from_secs(299)).await;
    assert_eq!(registry.addresses(DOMAIN), vec!["10.0.0.1", "10.0.0.2"]);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(registry.addresses(DOMAIN), vec!["10.0.0.2"]);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop did not stop")
        .unwrap();
}
