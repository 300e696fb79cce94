use bytes::Bytes;
use kvsink::destination::DestinationHandle;
use kvsink::destination::manager::{DestinationManager, DestinationResolution, create_or_fetch};
use kvsink::destination::memory::MemoryStore;
use kvsink::task::SinkTask;
use kvsink::test_utils::record::{keyed_record, router};
use kvsink::test_utils::test_store_wrapper::TestStoreWrapper;
use kvsink::types::{NullValuePolicy, RecordKey};
use kvsink_telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creation_converges_on_one_destination() {
    init_test_tracing();

    // Both workers talk to the same store through their own client.
    let store = MemoryStore::new();
    let first = TestStoreWrapper::wrap(store.clone());
    let second = TestStoreWrapper::wrap(store.clone());

    let (first_resolution, second_resolution) = tokio::join!(
        create_or_fetch(&first, "R"),
        create_or_fetch(&second, "R")
    );
    let first_resolution = first_resolution.unwrap();
    let second_resolution = second_resolution.unwrap();

    let created = [&first_resolution, &second_resolution]
        .iter()
        .filter(|resolution| matches!(resolution, DestinationResolution::Created(_)))
        .count();
    assert_eq!(created, 1);

    assert_eq!(first.create_attempts("R").await, 1);
    assert_eq!(second.create_attempts("R").await, 1);
    assert_eq!(store.destination_names().await, vec!["R"]);

    // Both handles are usable and point at the same destination.
    first_resolution
        .into_handle()
        .upsert(RecordKey::from("k1"), Some(Bytes::from_static(b"v1")))
        .await
        .unwrap();
    second_resolution
        .into_handle()
        .upsert(RecordKey::from("k2"), Some(Bytes::from_static(b"v2")))
        .await
        .unwrap();
    assert_eq!(store.entries("R").await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn late_worker_fetches_the_existing_destination() {
    init_test_tracing();

    let store = MemoryStore::new();
    let early = TestStoreWrapper::wrap(store.clone());
    let late = TestStoreWrapper::wrap(store.clone());

    let mut early_manager = DestinationManager::new(early.clone());
    let mut late_manager = DestinationManager::new(late.clone());

    early_manager.get_or_create("R").await.unwrap();
    late_manager.get_or_create("R").await.unwrap();
    // Served from the cache.
    late_manager.get_or_create("R").await.unwrap();

    assert_eq!(early.create_attempts("R").await, 1);
    assert_eq!(early.get_attempts("R").await, 0);
    assert_eq!(late.create_attempts("R").await, 1);
    assert_eq!(late.get_attempts("R").await, 1);
    assert_eq!(store.destination_names().await, vec!["R"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn tasks_started_concurrently_share_destinations() {
    init_test_tracing();

    let store = MemoryStore::new();
    let routes = [("t1", &["R1", "R2"][..])];

    let (first, second) = tokio::join!(
        SinkTask::start_with(router(&routes), NullValuePolicy::Remove, store.clone()),
        SinkTask::start_with(router(&routes), NullValuePolicy::Remove, store.clone())
    );
    let mut first = first.unwrap();
    let mut second = second.unwrap();

    first
        .put(vec![keyed_record("t1", "k1", "v1")])
        .await
        .unwrap();
    second
        .put(vec![keyed_record("t1", "k2", "v2")])
        .await
        .unwrap();

    assert_eq!(store.destination_names().await, vec!["R1", "R2"]);
    for destination in ["R1", "R2"] {
        let entries = store.entries(destination).await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
