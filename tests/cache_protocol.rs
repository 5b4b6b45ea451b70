//! End-to-end behavior of the cache protocol against the in-memory store:
//! read-through population, role-scoped invalidation fanout, pattern purges
//! and concurrent expiry races.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use bookstay_ws::cache::{
    get_or_load_list, CacheKeyPolicy, InvalidationFanout, KeyValueStore, MemoryStore, Resource,
    StaffDirectory,
};
use bookstay_ws::middleware::auth::Role;

struct FakeDirectory {
    admin_id: i64,
    receptionists: Vec<i64>,
}

#[async_trait]
impl StaffDirectory for FakeDirectory {
    async fn receptionists_of(&self, admin_id: i64) -> Result<Vec<i64>> {
        if admin_id == self.admin_id {
            Ok(self.receptionists.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn admin_of(&self, receptionist_id: i64) -> Result<Option<i64>> {
        if self.receptionists.contains(&receptionist_id) {
            Ok(Some(self.admin_id))
        } else {
            Ok(None)
        }
    }
}

fn fanout_over(store: Arc<MemoryStore>) -> InvalidationFanout {
    let directory = Arc::new(FakeDirectory {
        admin_id: 5,
        receptionists: vec![11, 12],
    });
    InvalidationFanout::new(store, directory)
}

async fn seed(store: &MemoryStore, keys: &[&str]) {
    for key in keys {
        store
            .set(key, b"[1]", Duration::from_secs(300))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn read_through_populates_once_then_serves_hits() {
    let store = MemoryStore::new();
    let key = CacheKeyPolicy::derive(Resource::Accommodations, Role::Admin, 5);
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let items: Vec<i64> = get_or_load_list(&store, &key, Duration::from_secs(60), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![10, 20])
        })
        .await
        .unwrap();
        assert_eq!(items, vec![10, 20]);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(store.contains(&key).await);
}

#[tokio::test]
async fn admin_mutation_fans_out_to_every_scoped_key() {
    let store = Arc::new(MemoryStore::new());
    seed(
        &store,
        &[
            "accommodations:all",
            "accommodations:admin:5",
            "accommodations:receptionist:11",
            "accommodations:receptionist:12",
            "rooms:all",
        ],
    )
    .await;

    let fanout = fanout_over(Arc::clone(&store));
    fanout
        .invalidate(Resource::Accommodations, Role::Admin, 5)
        .await;

    assert!(!store.contains("accommodations:all").await);
    assert!(!store.contains("accommodations:admin:5").await);
    assert!(!store.contains("accommodations:receptionist:11").await);
    assert!(!store.contains("accommodations:receptionist:12").await);
    // Untouched resource survives.
    assert!(store.contains("rooms:all").await);
}

#[tokio::test]
async fn receptionist_mutation_drops_own_and_owning_admin_keys() {
    let store = Arc::new(MemoryStore::new());
    seed(
        &store,
        &[
            "rooms:all",
            "rooms:receptionist:11",
            "rooms:admin:5",
            "rooms:receptionist:12",
        ],
    )
    .await;

    let fanout = fanout_over(Arc::clone(&store));
    fanout.invalidate(Resource::Rooms, Role::Receptionist, 11).await;

    assert!(!store.contains("rooms:all").await);
    assert!(!store.contains("rooms:receptionist:11").await);
    assert!(!store.contains("rooms:admin:5").await);
    // A sibling receptionist's key is not part of this fanout.
    assert!(store.contains("rooms:receptionist:12").await);
}

#[tokio::test]
async fn order_mutation_cascades_across_derived_resources() {
    let store = Arc::new(MemoryStore::new());
    seed(
        &store,
        &[
            "orders:all",
            "orders:all:user:7",
            "invoices:all",
            "accommodations:statuses",
            "rooms:statuses",
            "orders:admin:5",
            "invoices:admin:5",
            "accommodations:all",
        ],
    )
    .await;

    let fanout = fanout_over(Arc::clone(&store));
    fanout.order_mutation(7, 5).await;

    assert!(!store.contains("orders:all").await);
    assert!(!store.contains("orders:all:user:7").await);
    assert!(!store.contains("invoices:all").await);
    assert!(!store.contains("accommodations:statuses").await);
    assert!(!store.contains("rooms:statuses").await);
    assert!(!store.contains("orders:admin:5").await);
    assert!(!store.contains("invoices:admin:5").await);
    assert!(store.contains("accommodations:all").await);
}

#[tokio::test]
async fn guest_booking_clears_the_owning_admins_cached_order_list() {
    let store = Arc::new(MemoryStore::new());
    seed(
        &store,
        &[
            "orders:admin:5",
            "orders:receptionist:11",
            "orders:receptionist:12",
            "invoices:admin:5",
        ],
    )
    .await;

    let fanout = fanout_over(Arc::clone(&store));
    // Anonymous guest (actor 0) booking on admin 5's accommodation.
    fanout.order_mutation(0, 5).await;

    assert!(!store.contains("orders:admin:5").await);
    assert!(!store.contains("orders:receptionist:11").await);
    assert!(!store.contains("orders:receptionist:12").await);
    assert!(!store.contains("invoices:admin:5").await);
}

#[tokio::test]
async fn payment_change_purges_the_whole_invoices_subtree() {
    let store = Arc::new(MemoryStore::new());
    seed(
        &store,
        &[
            "invoices:all",
            "invoices:admin:5",
            "invoices:receptionist:11",
            "orders:all",
            "users:all",
        ],
    )
    .await;

    let fanout = fanout_over(Arc::clone(&store));
    fanout.payment_status_change(5).await;

    assert_eq!(store.scan_keys("invoices:*").await.unwrap(), Vec::<String>::new());
    assert!(!store.contains("orders:all").await);
    assert!(store.contains("users:all").await);
}

#[tokio::test]
async fn concurrent_callers_racing_an_expired_key_all_get_correct_data() {
    let store = Arc::new(MemoryStore::new());
    let key = CacheKeyPolicy::all(Resource::Accommodations);
    store
        .set(&key, b"[1]", Duration::from_millis(10))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let calls = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        let key = key.clone();
        let calls = Arc::clone(&calls);
        handles.push(tokio::spawn(async move {
            get_or_load_list(store.as_ref(), &key, Duration::from_secs(60), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(vec![42_i64])
            })
            .await
            .unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), vec![42]);
    }

    // A stampede is tolerated: between one and ten loads, never corruption.
    let loads = calls.load(Ordering::SeqCst);
    assert!((1..=10).contains(&loads), "unexpected load count {}", loads);
    assert!(store.contains(&key).await);
}
