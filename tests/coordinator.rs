// tests/coordinator.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tws::fleet::{Coordinator, WorkerOutcome};
use tws_test_utils::builders::{FleetConfigBuilder, LaunchTemplateBuilder};
use tws_test_utils::{FakeRuntime, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn every_worker_completes_and_the_fleet_is_removed() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let config = FleetConfigBuilder::new(8).build();

    let coordinator = Coordinator::new(&config, fake.clone());
    let registry = coordinator.registry();
    let (report, cleanup) = with_timeout(coordinator.run()).await;

    assert_eq!(report.total(), 8);
    assert_eq!(report.completed(), 8);
    assert_eq!(cleanup.removed, 8);
    assert_eq!(registry.len().await, 8);
    assert_eq!(fake.live_count(), 0);
    assert_eq!(fake.total_remove_calls(), 8);
    Ok(())
}

#[tokio::test]
async fn workers_get_ordinal_names_and_the_shared_command() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new());
    let template = LaunchTemplateBuilder::new("http://target.test")
        .method("put")
        .header("X-Run: 1")
        .build();
    let config = FleetConfigBuilder::new(3)
        .name_prefix("spear")
        .template(template.clone())
        .build();

    let coordinator = Coordinator::new(&config, fake.clone());
    let planned: Vec<_> = coordinator.worker_specs().iter().map(|s| s.name.clone()).collect();
    assert_eq!(planned, vec!["spear_1", "spear_2", "spear_3"]);

    with_timeout(coordinator.run()).await;

    let mut created = fake.created_specs();
    created.sort_by_key(|s| s.index);
    let names: Vec<_> = created.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["spear_1", "spear_2", "spear_3"]);
    for spec in created.iter() {
        assert_eq!(spec.image, "jess/ab");
        assert_eq!(spec.command, template.command());
    }
    Ok(())
}

#[tokio::test]
async fn create_failure_does_not_affect_siblings() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new().fail_create_for("tws_3"));
    let config = FleetConfigBuilder::new(5).build();

    let (report, cleanup) = with_timeout(Coordinator::new(&config, fake.clone()).run()).await;

    assert_eq!(report.outcome(3), Some(WorkerOutcome::CreateFailed));
    for i in [1, 2, 4, 5] {
        assert_eq!(report.outcome(i), Some(WorkerOutcome::Completed));
    }
    assert_eq!(report.completed(), 4);
    assert_eq!(report.failed(), 1);
    assert_eq!(cleanup.removed, 4);
    assert_eq!(fake.live_count(), 0);
    Ok(())
}

#[tokio::test]
async fn start_failure_is_still_cleaned_up() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new().fail_start_for("tws_2"));
    let config = FleetConfigBuilder::new(3).build();

    let (report, cleanup) = with_timeout(Coordinator::new(&config, fake.clone()).run()).await;

    assert_eq!(report.outcome(2), Some(WorkerOutcome::StartFailed));
    assert_eq!(report.completed(), 2);
    assert_eq!(fake.created_count(), 3);
    assert_eq!(cleanup.removed, 3);
    assert_eq!(fake.live_count(), 0);
    Ok(())
}

#[tokio::test]
async fn log_failure_counts_as_finished() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new().fail_logs_for("tws_1"));
    let config = FleetConfigBuilder::new(2).build();

    let (report, _) = with_timeout(Coordinator::new(&config, fake.clone()).run()).await;

    assert_eq!(report.outcome(1), Some(WorkerOutcome::LogReadFailed));
    assert_eq!(report.outcome(2), Some(WorkerOutcome::Completed));
    assert_eq!(report.total(), 2);
    assert_eq!(fake.live_count(), 0);
    Ok(())
}

#[tokio::test]
async fn panicking_worker_is_counted_and_siblings_finish() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new().panic_on_create_for("tws_2"));
    let config = FleetConfigBuilder::new(4).build();

    let coordinator = Coordinator::new(&config, fake.clone());
    let registry = coordinator.registry();
    let (report, cleanup) = with_timeout(coordinator.run()).await;

    assert_eq!(report.lost(), 1);
    assert_eq!(report.outcome(2), None);
    assert_eq!(report.completed(), 3);
    assert_eq!(report.total(), 4);
    assert_eq!(cleanup.removed, 3);
    assert_eq!(registry.pending_creates(), 0);
    assert_eq!(fake.live_count(), 0);
    Ok(())
}

#[tokio::test]
async fn a_single_container_fleet_works() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new().with_output(b"Complete requests: 10\n"));
    let config = FleetConfigBuilder::new(1).build();

    let (report, cleanup) = with_timeout(Coordinator::new(&config, fake.clone()).run()).await;

    assert_eq!(report.completed(), 1);
    assert_eq!(cleanup.attempted(), 1);
    assert_eq!(fake.live_count(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_the_run_future_still_tears_down() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new().block_logs_until_removed());
    let config = FleetConfigBuilder::new(4).build();

    let coordinator = Coordinator::new(&config, fake.clone());
    let registry = coordinator.registry();
    let run = tokio::spawn(coordinator.run());

    with_timeout(fake.wait_for_started(4)).await;
    assert_eq!(registry.len().await, 4);
    assert_eq!(fake.live_count(), 4);

    run.abort();
    assert!(run.await.unwrap_err().is_cancelled());

    with_timeout(async {
        while fake.live_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    Ok(())
}

#[tokio::test]
async fn run_fleet_with_watcher_installed_cleans_up() -> TestResult {
    init_tracing();
    let fake = Arc::new(FakeRuntime::new().fail_start_for("tws_1"));
    let config = FleetConfigBuilder::new(3).build();

    let report = with_timeout(tws::run_fleet(&config, fake.clone())).await;

    assert_eq!(report.outcome(1), Some(WorkerOutcome::StartFailed));
    assert_eq!(report.completed(), 2);
    assert_eq!(fake.live_count(), 0);
    Ok(())
}
