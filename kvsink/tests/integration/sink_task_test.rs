use bytes::Bytes;
use kvsink::destination::memory::MemoryStore;
use kvsink::error::ErrorKind;
use kvsink::task::SinkTask;
use kvsink::test_utils::record::{
    keyed_record, keyless_record, null_upsert_op, null_value_record, remove_op, router, routes,
    upsert_op, with_offsets,
};
use kvsink::test_utils::test_store_wrapper::TestStoreWrapper;
use kvsink::types::{NullValuePolicy, RecordKey};
use kvsink_config::shared::{BatchConfig, SinkConfig, StoreConfig};
use kvsink_telemetry::tracing::init_test_tracing;

fn sink_config(table: &[(&str, &[&str])], null_value_means_remove: bool) -> SinkConfig {
    SinkConfig {
        task_id: 0,
        topic_to_destinations: routes(table),
        null_value_means_remove,
        batch: BatchConfig::default(),
        store: StoreConfig::Memory,
    }
}

async fn start_task(
    table: &[(&str, &[&str])],
    policy: NullValuePolicy,
) -> (SinkTask<TestStoreWrapper<MemoryStore>>, TestStoreWrapper<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    let wrapper = TestStoreWrapper::wrap(store.clone());

    let task = SinkTask::start_with(router(table), policy, wrapper.clone())
        .await
        .unwrap();

    (task, wrapper, store)
}

#[tokio::test(flavor = "multi_thread")]
async fn start_opens_every_routed_destination() {
    init_test_tracing();

    let store = MemoryStore::new();
    let wrapper = TestStoreWrapper::wrap(store.clone());
    let config = sink_config(&[("t1", &["R1", "R2"]), ("t2", &["R2", "R3"])], true);

    let task = SinkTask::start(&config, wrapper.clone()).await.unwrap();

    assert_eq!(task.destinations().len(), 3);
    assert!(format!("{task:?}").contains(r#"destinations: ["R1", "R2", "R3"]"#));
    assert_eq!(store.destination_names().await, vec!["R1", "R2", "R3"]);
    for destination in ["R1", "R2", "R3"] {
        assert_eq!(wrapper.create_attempts(destination).await, 1);
        assert_eq!(wrapper.get_attempts(destination).await, 0);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn start_rejects_invalid_configuration() {
    init_test_tracing();

    let wrapper = TestStoreWrapper::wrap(MemoryStore::new());
    let config = sink_config(&[("t1", &[])], true);

    let err = SinkTask::start(&config, wrapper.clone()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert!(wrapper.applied_by_destination().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn start_fails_when_a_destination_cannot_be_created() {
    init_test_tracing();

    let wrapper = TestStoreWrapper::wrap(MemoryStore::new());
    wrapper.fail_creation_of("R2").await;

    let err = SinkTask::start_with(
        router(&[("t1", &["R1", "R2"])]),
        NullValuePolicy::Remove,
        wrapper.clone(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DestinationCreationFailed);
    // A connection failure is not an "already exists" answer, so no lookup is attempted.
    assert_eq!(wrapper.get_attempts("R2").await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn records_for_the_same_key_collapse_to_the_last_one() {
    init_test_tracing();

    let (mut task, wrapper, store) = start_task(&[("t1", &["R"])], NullValuePolicy::Remove).await;

    let records = with_offsets(vec![
        keyed_record("t1", "k1", "v1"),
        keyed_record("t1", "k1", "v2"),
        keyed_record("t1", "k2", "v1"),
        keyed_record("t1", "k1", "v3"),
    ]);
    let summary = task.put(records).await.unwrap();

    assert_eq!(summary.records_received, 4);
    assert_eq!(summary.operations_applied.get("R"), Some(&2));

    let mut applied = wrapper.applied("R").await;
    applied.sort_by(|a, b| a.key().cmp(b.key()));
    assert_eq!(applied, vec![upsert_op("k1", "v3"), upsert_op("k2", "v1")]);

    let entries = store.entries("R").await.unwrap();
    assert_eq!(
        entries.get(&RecordKey::from("k1")),
        Some(&Some(Bytes::from_static(b"v3")))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn null_value_after_a_write_removes_the_key_without_writing_it() {
    init_test_tracing();

    let (mut task, wrapper, store) = start_task(&[("t1", &["R"])], NullValuePolicy::Remove).await;

    let records = with_offsets(vec![
        keyed_record("t1", "k1", "v1"),
        null_value_record("t1", "k1"),
    ]);
    task.put(records).await.unwrap();

    assert_eq!(wrapper.applied("R").await, vec![remove_op("k1")]);
    let entries = store.entries("R").await.unwrap();
    assert!(!entries.contains_key(&RecordKey::from("k1")));
}

#[tokio::test(flavor = "multi_thread")]
async fn null_value_is_stored_when_nulls_are_values() {
    init_test_tracing();

    let (mut task, wrapper, store) = start_task(&[("t1", &["R"])], NullValuePolicy::Upsert).await;

    task.put(vec![null_value_record("t1", "k1")]).await.unwrap();

    assert_eq!(wrapper.applied("R").await, vec![null_upsert_op("k1")]);
    let entries = store.entries("R").await.unwrap();
    assert_eq!(entries.get(&RecordKey::from("k1")), Some(&None));
}

#[tokio::test(flavor = "multi_thread")]
async fn records_fan_out_to_every_routed_destination() {
    init_test_tracing();

    let (mut task, wrapper, _store) =
        start_task(&[("t1", &["R1", "R2"])], NullValuePolicy::Remove).await;

    let summary = task
        .put(vec![keyed_record("t1", "k1", "v1")])
        .await
        .unwrap();

    assert_eq!(summary.total_operations_applied(), 2);
    assert_eq!(wrapper.applied("R1").await, vec![upsert_op("k1", "v1")]);
    assert_eq!(wrapper.applied("R2").await, vec![upsert_op("k1", "v1")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unrouted_topics_are_dropped_without_errors() {
    init_test_tracing();

    let (mut task, wrapper, _store) = start_task(&[("t1", &["R"])], NullValuePolicy::Remove).await;

    let summary = task
        .put(vec![keyed_record("t2", "k1", "v1")])
        .await
        .unwrap();

    assert_eq!(summary.records_unrouted, 1);
    assert_eq!(summary.records_dropped(), 1);
    assert_eq!(summary.total_operations_applied(), 0);
    assert!(wrapper.applied_by_destination().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn keyless_records_are_dropped_and_processing_continues() {
    init_test_tracing();

    let (mut task, wrapper, _store) =
        start_task(&[("t1", &["R1", "R2"])], NullValuePolicy::Remove).await;

    let records = with_offsets(vec![
        keyless_record("t1", "v0"),
        keyed_record("t1", "k1", "v1"),
    ]);
    let summary = task.put(records).await.unwrap();

    // Counted once even though the topic fans out to two destinations.
    assert_eq!(summary.records_without_key, 1);
    assert_eq!(wrapper.applied("R1").await, vec![upsert_op("k1", "v1")]);
    assert_eq!(wrapper.applied("R2").await, vec![upsert_op("k1", "v1")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn keyless_records_reach_no_destination() {
    init_test_tracing();

    let (mut task, wrapper, _store) =
        start_task(&[("t1", &["R1", "R2"])], NullValuePolicy::Upsert).await;

    let summary = task
        .put(with_offsets(vec![
            keyless_record("t1", "v0"),
            keyless_record("t1", "v1"),
            keyless_record("t2", "v2"),
        ]))
        .await
        .unwrap();

    assert_eq!(summary.records_without_key, 2);
    // A keyless record of an unrouted topic is dropped for its topic first.
    assert_eq!(summary.records_unrouted, 1);
    assert_eq!(summary.records_dropped(), 3);
    assert!(summary.operations_applied.is_empty());
    assert!(wrapper.applied_by_destination().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn invocations_do_not_share_pending_operations() {
    init_test_tracing();

    let (mut task, wrapper, store) = start_task(&[("t1", &["R"])], NullValuePolicy::Remove).await;

    task.put(vec![keyed_record("t1", "k1", "v1")]).await.unwrap();
    task.put(vec![null_value_record("t1", "k1")]).await.unwrap();
    let summary = task.put(Vec::new()).await.unwrap();

    assert_eq!(summary.total_operations_applied(), 0);
    assert_eq!(
        wrapper.applied("R").await,
        vec![upsert_op("k1", "v1"), remove_op("k1")]
    );
    assert!(store.entries("R").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_destination_does_not_stop_other_destinations() {
    init_test_tracing();

    let (mut task, wrapper, store) =
        start_task(&[("t1", &["R1", "R2"])], NullValuePolicy::Remove).await;
    wrapper.fail_writes_of("R1", "k1").await;

    let err = task
        .put(vec![keyed_record("t1", "k1", "v1"), keyed_record("t1", "k2", "v2")])
        .await
        .unwrap_err();

    assert_eq!(err.kinds(), vec![ErrorKind::DestinationWriteFailed]);

    let r1 = store.entries("R1").await.unwrap();
    assert!(!r1.contains_key(&RecordKey::from("k1")));

    let r2 = store.entries("R2").await.unwrap();
    assert_eq!(r2.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn failures_of_several_destinations_are_aggregated() {
    init_test_tracing();

    let (mut task, wrapper, _store) =
        start_task(&[("t1", &["R1", "R2", "R3"])], NullValuePolicy::Remove).await;
    wrapper.fail_writes_of("R1", "k1").await;
    wrapper.fail_writes_of("R3", "k1").await;

    let err = task
        .put(vec![keyed_record("t1", "k1", "v1")])
        .await
        .unwrap_err();

    assert_eq!(err.errors().map(|errors| errors.len()), Some(2));
    assert_eq!(
        err.kinds(),
        vec![
            ErrorKind::DestinationWriteFailed,
            ErrorKind::DestinationWriteFailed
        ]
    );
    assert_eq!(wrapper.applied("R2").await, vec![upsert_op("k1", "v1")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_closes_the_store_client() {
    init_test_tracing();

    let (task, wrapper, store) = start_task(&[("t1", &["R"])], NullValuePolicy::Remove).await;

    task.stop().await.unwrap();

    assert!(wrapper.close_called().await);
    assert!(store.is_closed().await);
}
