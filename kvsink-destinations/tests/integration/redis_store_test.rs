use kvsink::destination::StoreClient;
use kvsink::destination::manager::{DestinationResolution, create_or_fetch};
use kvsink::error::ErrorKind;
use kvsink::task::SinkTask;
use kvsink::test_utils::record::{keyed_record, null_value_record, router};
use kvsink::types::NullValuePolicy;
use kvsink_destinations::redis::{RedisConfig, RedisStore};
use kvsink_telemetry::tracing::init_test_tracing;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns a config for the server in `TESTS_REDIS_HOST`, or `None` to skip the test.
fn redis_config() -> Option<RedisConfig> {
    let host = std::env::var("TESTS_REDIS_HOST").ok()?;
    let port = std::env::var("TESTS_REDIS_PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(6379);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();

    Some(RedisConfig {
        host,
        port,
        username: std::env::var("TESTS_REDIS_USERNAME").ok(),
        password: std::env::var("TESTS_REDIS_PASSWORD").ok(),
        key_prefix: format!("kvsink-test-{nanos}"),
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creation_has_a_single_winner() {
    init_test_tracing();

    let Some(config) = redis_config() else {
        return;
    };

    let first = RedisStore::connect(config.clone()).await.unwrap();
    let second = RedisStore::connect(config).await.unwrap();

    let (first_resolution, second_resolution) = tokio::join!(
        create_or_fetch(&first, "orders"),
        create_or_fetch(&second, "orders")
    );

    let created = [first_resolution.unwrap(), second_resolution.unwrap()]
        .iter()
        .filter(|resolution| matches!(resolution, DestinationResolution::Created(_)))
        .count();
    assert_eq!(created, 1);

    let err = first.create_destination("orders").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DestinationAlreadyExists);

    let err = first.get_destination("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DestinationMissing);

    first.close().await.unwrap();
    second.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn sink_task_writes_and_removes_fields() {
    init_test_tracing();

    let Some(config) = redis_config() else {
        return;
    };

    let store = RedisStore::connect(config).await.unwrap();
    let mut task = SinkTask::start_with(
        router(&[("orders", &["orders_cache", "audit"])]),
        NullValuePolicy::Remove,
        store,
    )
    .await
    .unwrap();

    let summary = task
        .put(vec![
            keyed_record("orders", "1", "first"),
            keyed_record("orders", "2", "second"),
            null_value_record("orders", "2"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.operations_applied.get("orders_cache"), Some(&2));
    assert_eq!(summary.operations_applied.get("audit"), Some(&2));

    task.stop().await.unwrap();
}
