//! Parameter cache behavior under concurrent callers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use mssql_helper::{ParameterCache, ParameterCacheConfig, ProcedureParameterRow};
use mssql_helper_testing::MockConnection;

const IDENTITY: &str = "Server=mock;Database=sales;User Id=app;Password=secret";

fn connection(discovery_delay: Duration) -> MockConnection {
    MockConnection::builder(IDENTITY)
        .with_procedure(
            "dbo.GetOrders",
            vec![
                ProcedureParameterRow::new("@customer_id", "int", 4, 10, false),
                ProcedureParameterRow::new("@since", "datetime2", 8, 27, false),
            ],
        )
        .with_procedure(
            "dbo.Fast",
            vec![ProcedureParameterRow::new("@id", "int", 4, 10, false)],
        )
        .with_procedure(
            "dbo.Slow",
            vec![ProcedureParameterRow::new("@id", "int", 4, 10, false)],
        )
        .with_discovery_delay(discovery_delay)
        .with_procedure_delay("dbo.Fast", Duration::ZERO)
        .build()
}

#[tokio::test]
async fn concurrent_misses_race_by_default() {
    let conn = connection(Duration::from_millis(20));
    let cache = ParameterCache::new();

    let results = join_all(
        (0..8).map(|_| cache.get_sp_parameter_set(Some(&conn), "dbo.GetOrders", false)),
    )
    .await;

    // Every caller missed before any discovery finished.
    assert_eq!(conn.discovery_count(), 8);
    assert_eq!(cache.len(), 1);
    for set in results {
        let set = set.unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].name(), "@customer_id");
    }

    // Settled: later callers hit.
    cache
        .get_sp_parameter_set(Some(&conn), "dbo.GetOrders", false)
        .await
        .unwrap();
    assert_eq!(conn.discovery_count(), 8);
}

#[tokio::test]
async fn single_flight_discovers_once() {
    let conn = connection(Duration::from_millis(20));
    let cache = ParameterCache::with_config(ParameterCacheConfig::new().single_flight(true));

    let results = join_all(
        (0..8).map(|_| cache.get_sp_parameter_set(Some(&conn), "dbo.GetOrders", true)),
    )
    .await;

    assert_eq!(conn.discovery_count(), 1);
    for set in results {
        assert_eq!(set.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn single_flight_failure_is_not_cached() {
    let conn = connection(Duration::from_millis(10));
    conn.fail_discovery("dbo.GetOrders", 1205, "deadlock victim");
    let cache = ParameterCache::with_config(ParameterCacheConfig::new().single_flight(true));

    let results = join_all(
        (0..4).map(|_| cache.get_sp_parameter_set(Some(&conn), "dbo.GetOrders", false)),
    )
    .await;
    assert!(results.iter().all(|r| r.is_err()));
    assert!(cache.is_empty());

    conn.clear_failure("dbo.GetOrders");
    let set = cache
        .get_sp_parameter_set(Some(&conn), "dbo.GetOrders", false)
        .await
        .unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn different_keys_do_not_wait_on_each_other() {
    for single_flight in [false, true] {
        let conn = connection(Duration::from_secs(1));
        let cache = ParameterCache::with_config(
            ParameterCacheConfig::new().single_flight(single_flight),
        );

        let slow = cache.get_sp_parameter_set(Some(&conn), "dbo.Slow", false);
        let fast = tokio::time::timeout(
            Duration::from_millis(300),
            cache.get_sp_parameter_set(Some(&conn), "dbo.Fast", false),
        );
        let (slow, fast) = tokio::join!(slow, fast);

        assert!(slow.is_ok());
        let fast = fast.expect("fast discovery waited on the slow one");
        assert_eq!(fast.unwrap().len(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_cache_across_tasks() {
    let conn = Arc::new(connection(Duration::from_millis(5)));
    let cache = Arc::new(ParameterCache::with_config(
        ParameterCacheConfig::new().single_flight(true),
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let conn = Arc::clone(&conn);
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let include = i % 2 == 0;
                cache
                    .get_sp_parameter_set(Some(conn.as_ref()), "dbo.GetOrders", include)
                    .await
                    .map(|set| (include, set.len()))
            })
        })
        .collect();

    for handle in join_all(handles).await {
        let (include, len) = handle.unwrap().unwrap();
        assert_eq!(len, if include { 3 } else { 2 });
    }
    // One discovery per key variant.
    assert_eq!(conn.discovery_count(), 2);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn copies_are_independent_under_mutation() {
    let conn = connection(Duration::ZERO);
    let cache = ParameterCache::new();

    let mut first = cache
        .get_sp_parameter_set(Some(&conn), "dbo.GetOrders", false)
        .await
        .unwrap();
    first.get_mut("customer_id").unwrap().set_value(99i32);

    let second = cache
        .get_sp_parameter_set(Some(&conn), "dbo.GetOrders", false)
        .await
        .unwrap();
    assert!(second.get("customer_id").unwrap().is_null());
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 1);
}
