// tests/registry.rs

use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::task::JoinSet;

use tws::exec::{ContainerHandle, ContainerRuntime};
use tws::fleet::{FleetRegistry, Registration, WorkerSpec};
use tws_test_utils::builders::LaunchTemplateBuilder;
use tws_test_utils::{FakeRuntime, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn spec(index: usize) -> WorkerSpec {
    let template = LaunchTemplateBuilder::new("http://target.test").build();
    WorkerSpec::new(index, "jess/ab", "tws", &template)
}

/// Create `n` containers on `fake` and register them concurrently.
async fn register_concurrently(
    fake: &Arc<FakeRuntime>,
    registry: &FleetRegistry,
    n: usize,
) -> Vec<ContainerHandle> {
    let mut set = JoinSet::new();
    for i in 1..=n {
        let fake = Arc::clone(fake);
        let registry = registry.clone();
        set.spawn(async move {
            let handle = fake.create(&spec(i)).await.unwrap();
            assert_eq!(registry.register(handle.clone()).await, Registration::Accepted);
            handle
        });
    }

    let mut handles = Vec::new();
    while let Some(joined) = set.join_next().await {
        handles.push(joined.unwrap());
    }
    handles
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_loses_nothing() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let registry = FleetRegistry::new(fake.clone());

    let created = with_timeout(register_concurrently(&fake, &registry, 64)).await;

    let registered = registry.handles().await;
    assert_eq!(registered.len(), 64);
    let distinct: HashSet<_> = registered.iter().cloned().collect();
    assert_eq!(distinct.len(), 64);
    assert_eq!(distinct, created.into_iter().collect::<HashSet<_>>());
    Ok(())
}

#[tokio::test]
async fn remove_all_empties_the_runtime() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let registry = FleetRegistry::new(fake.clone());
    register_concurrently(&fake, &registry, 5).await;
    assert_eq!(fake.live_count(), 5);

    let report = registry.remove_all().await;

    assert_eq!(report.removed, 5);
    assert_eq!(report.failed, 0);
    assert_eq!(fake.live_count(), 0);
    // Membership only grows; removal does not drop entries.
    assert_eq!(registry.len().await, 5);
    Ok(())
}

#[tokio::test]
async fn second_remove_all_treats_missing_containers_as_benign() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let registry = FleetRegistry::new(fake.clone());
    let handles = register_concurrently(&fake, &registry, 3).await;

    let first = registry.remove_all().await;
    let second = registry.remove_all().await;

    assert_eq!(first.removed, 3);
    assert_eq!(second.removed, 0);
    assert_eq!(second.already_gone, 3);
    assert_eq!(second.failed, 0);
    for handle in handles.iter() {
        assert_eq!(fake.remove_attempts(handle), 2);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_remove_all_callers_do_not_deadlock() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let registry = FleetRegistry::new(fake.clone());
    register_concurrently(&fake, &registry, 10).await;

    let (a, b) = with_timeout(async {
        tokio::join!(registry.remove_all(), registry.remove_all())
    })
    .await;

    assert_eq!(a.removed + b.removed, 10);
    assert_eq!(a.already_gone + b.already_gone, 10);
    assert_eq!(a.failed + b.failed, 0);
    assert_eq!(fake.live_count(), 0);
    Ok(())
}

#[tokio::test]
async fn one_stuck_container_does_not_block_the_rest() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new().fail_remove_for("tws_2"));
    let registry = FleetRegistry::new(fake.clone());
    register_concurrently(&fake, &registry, 4).await;

    let report = registry.remove_all().await;

    assert_eq!(report.removed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(fake.live_count(), 1);
    Ok(())
}

#[tokio::test]
async fn registration_after_teardown_is_refused() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let registry = FleetRegistry::new(fake.clone());
    registry.remove_all().await;

    let late = fake.create(&spec(1)).await?;
    assert_eq!(registry.register(late).await, Registration::Sealed);
    assert!(registry.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn create_tickets_are_counted_until_dropped() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let registry = FleetRegistry::new(fake.clone());

    let first = registry.begin_create().await.ok_or("registry sealed")?;
    let second = registry.begin_create().await.ok_or("registry sealed")?;
    assert_eq!(registry.pending_creates(), 2);

    drop(first);
    assert_eq!(registry.pending_creates(), 1);
    assert!(!registry.wait_for_pending_creates(Duration::from_millis(20)).await);

    let waiter = {
        let registry = registry.clone();
        tokio::spawn(async move { registry.wait_for_pending_creates(Duration::from_secs(2)).await })
    };
    drop(second);
    assert!(with_timeout(waiter).await?);
    assert_eq!(registry.pending_creates(), 0);
    Ok(())
}

#[tokio::test]
async fn no_create_tickets_after_teardown() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let registry = FleetRegistry::new(fake.clone());

    let in_flight = registry.begin_create().await.ok_or("registry sealed")?;
    registry.remove_all().await;

    assert!(registry.begin_create().await.is_none());
    assert_eq!(registry.pending_creates(), 1);
    drop(in_flight);
    assert!(registry.wait_for_pending_creates(Duration::from_millis(20)).await);
    Ok(())
}

#[test]
fn short_id_is_first_seven_characters() {
    let handle = ContainerHandle::new("4f1c2b9a0d3e5f67");
    assert_eq!(handle.short(), "4f1c2b9");
    assert_eq!(ContainerHandle::new("abc").short(), "abc");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_fleet_size_registers_exactly_n_distinct(n in 1usize..48) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let (registered, live_after) = rt.block_on(async {
            let fake = Arc::new(FakeRuntime::new());
            let registry = FleetRegistry::new(fake.clone());
            register_concurrently(&fake, &registry, n).await;
            let registered = registry.handles().await;
            registry.remove_all().await;
            (registered, fake.live_count())
        });

        let distinct: HashSet<_> = registered.iter().collect();
        prop_assert_eq!(registered.len(), n);
        prop_assert_eq!(distinct.len(), n);
        prop_assert_eq!(live_after, 0);
    }
}
