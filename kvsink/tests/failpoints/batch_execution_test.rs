use kvsink::destination::memory::MemoryStore;
use kvsink::error::ErrorKind;
use kvsink::failpoints::EXECUTE_BATCH__BEFORE_OPERATION;
use kvsink::task::SinkTask;
use kvsink::test_utils::failpoints::SinkFailScenario;
use kvsink::test_utils::record::{keyed_record, router, upsert_op};
use kvsink::test_utils::test_store_wrapper::TestStoreWrapper;
use kvsink::types::NullValuePolicy;
use kvsink_telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn batch_stops_at_the_first_failed_operation() {
    init_test_tracing();

    let wrapper = TestStoreWrapper::wrap(MemoryStore::new());
    let mut task = SinkTask::start_with(
        router(&[("t1", &["R"])]),
        NullValuePolicy::Remove,
        wrapper.clone(),
    )
    .await
    .unwrap();

    // The first operation goes through, the second one fails.
    let _scenario = SinkFailScenario::setup(&[(EXECUTE_BATCH__BEFORE_OPERATION, "1*off->return")]);

    let err = task
        .put(vec![
            keyed_record("t1", "k1", "v1"),
            keyed_record("t1", "k2", "v2"),
            keyed_record("t1", "k3", "v3"),
        ])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationWriteFailed);
    assert_eq!(wrapper.applied("R").await.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn sink_recovers_once_the_failure_is_cleared() {
    init_test_tracing();

    let wrapper = TestStoreWrapper::wrap(MemoryStore::new());
    let mut task = SinkTask::start_with(
        router(&[("t1", &["R"])]),
        NullValuePolicy::Remove,
        wrapper.clone(),
    )
    .await
    .unwrap();

    // Only the first evaluation of the failpoint fails.
    let _scenario = SinkFailScenario::setup(&[(EXECUTE_BATCH__BEFORE_OPERATION, "1*return")]);

    let err = task
        .put(vec![keyed_record("t1", "k1", "v1")])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DestinationWriteFailed);
    assert!(wrapper.applied("R").await.is_empty());

    task.put(vec![keyed_record("t1", "k1", "v1")])
        .await
        .unwrap();
    assert_eq!(wrapper.applied("R").await, vec![upsert_op("k1", "v1")]);
}
