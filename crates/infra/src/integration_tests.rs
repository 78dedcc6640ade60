//! Cross-crate scenarios: catalog + order placement + order queue over one
//! store, including concurrent callers and a store that fails on demand.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::json;

use everglow_auth::{Principal, PrincipalId, Role, RolePolicy, StaticCredentials, CredentialVerifier};
use everglow_core::{ExpectedRevision, ProductCode};
use everglow_inventory::{InventoryItem, NewItem};
use everglow_orders::{OrderStatus, RequesterInfo};

use crate::config::{DeskConfig, StoreBackend};
use crate::desk::OrderDesk;
use crate::error::ServiceError;
use crate::order_handler::{OrderRequest, OrderTransactionHandler};
use crate::retry::RetryPolicy;
use crate::store::{InMemoryTableStore, Row, StoreError, TableName, TableSnapshot, TableStore};
use crate::tables::inventory;

fn item(code: &str, stock: u32) -> InventoryItem {
    InventoryItem::new(NewItem {
        code: ProductCode::parse(code).unwrap(),
        name: format!("Item {code}"),
        stock,
        wholesale_price: 120_000,
        retail_price: 150_000,
        image_ref: Some("https://img.example/eg.jpg".to_string()),
    })
    .unwrap()
}

fn seeded(items: &[InventoryItem]) -> Arc<InMemoryTableStore> {
    everglow_observability::init_for_tests();
    let rows = items.iter().map(inventory::encode).collect();
    Arc::new(InMemoryTableStore::new().with_rows(TableName::Inventory, rows))
}

fn desk(store: &Arc<InMemoryTableStore>) -> OrderDesk<Arc<InMemoryTableStore>> {
    OrderDesk::with_store(store.clone(), &DeskConfig::default())
}

fn shop(name: &str) -> RequesterInfo {
    RequesterInfo {
        name: name.to_string(),
        contact: "01711-222333".to_string(),
        ..RequesterInfo::default()
    }
}

fn partner() -> Principal {
    Principal::partner("Shop A")
}

fn admin() -> Principal {
    Principal::admin("owner")
}

fn snapshot(store: &impl TableStore, table: TableName) -> TableSnapshot {
    store.read_table(table).unwrap()
}

#[test]
fn placing_an_order_reduces_stock_and_queues_it() {
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);

    let order = desk
        .place_order(&partner(), OrderRequest::direct("EG-R001", 4, shop("Shop A")))
        .unwrap();
    assert_eq!(order.quantity(), 4);
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.requester().name, "Shop A");

    assert_eq!(desk.find_by_code(&partner(), "EG-R001").unwrap().stock(), 6);

    let queued = desk.list_orders(&admin(), Some(OrderStatus::Pending)).unwrap();
    assert_eq!(queued, vec![order]);
}

#[test]
fn name_only_partner_order_is_accepted_by_default() {
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);
    let requester = RequesterInfo {
        name: "Shop A".to_string(),
        ..RequesterInfo::default()
    };

    let order = desk
        .place_order(&partner(), OrderRequest::direct("EG-R001", 4, requester))
        .unwrap();
    assert_eq!(order.quantity(), 4);
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(desk.find_by_code(&partner(), "EG-R001").unwrap().stock(), 6);
}

#[test]
fn over_ordering_changes_nothing() {
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);
    desk.place_order(&partner(), OrderRequest::direct("EG-R001", 4, shop("Shop A")))
        .unwrap();

    let inventory_before = snapshot(&store, TableName::Inventory);
    let orders_before = snapshot(&store, TableName::Orders);

    let err = desk
        .place_order(&partner(), OrderRequest::direct("EG-R001", 20, shop("Shop A")))
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::InsufficientStock {
            requested: 20,
            available: 6
        }
    );
    assert!(!err.is_retryable());
    assert_eq!(snapshot(&store, TableName::Inventory), inventory_before);
    assert_eq!(snapshot(&store, TableName::Orders), orders_before);
    assert_eq!(desk.find_by_code(&partner(), "EG-R001").unwrap().stock(), 6);
}

#[test]
fn unknown_code_changes_nothing() {
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);
    let before = snapshot(&store, TableName::Inventory);

    let err = desk
        .place_order(&partner(), OrderRequest::direct("EG-R999", 1, shop("Shop A")))
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(snapshot(&store, TableName::Inventory), before);
    assert_eq!(snapshot(&store, TableName::Orders).revision, 0);
}

#[test]
fn dispatching_twice_is_reported_not_repeated() {
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);
    let order = desk
        .place_order(&partner(), OrderRequest::direct("EG-R001", 2, shop("Shop A")))
        .unwrap();

    let dispatched = desk.mark_dispatched(&admin(), order.order_id()).unwrap();
    assert_eq!(dispatched.status(), OrderStatus::Dispatched);
    let after_first = snapshot(&store, TableName::Orders);

    assert_eq!(
        desk.mark_dispatched(&admin(), order.order_id()),
        Err(ServiceError::AlreadyDispatched)
    );
    assert_eq!(snapshot(&store, TableName::Orders), after_first);
    assert!(desk.list_orders(&admin(), Some(OrderStatus::Pending)).unwrap().is_empty());
}

#[test]
fn lookup_is_case_insensitive() {
    let store = seeded(&[item("EG-R001", 10), item("EG-N002", 3)]);
    let desk = desk(&store);
    assert_eq!(
        desk.find_by_code(&partner(), "eg-r001").unwrap(),
        desk.find_by_code(&partner(), "EG-R001").unwrap()
    );
    assert_eq!(desk.list_all(&partner()).unwrap().len(), 2);
}

#[test]
fn customer_orders_need_delivery_details() {
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);

    let err = desk
        .place_order(&partner(), OrderRequest::on_behalf("EG-R001", 1, shop("Shop A")))
        .unwrap_err();
    match err {
        ServiceError::InvalidInput(msg) => {
            assert!(msg.contains("customer_name"), "{msg}");
            assert!(msg.contains("delivery_address"), "{msg}");
        }
        other => panic!("expected InvalidInput, got {other:?}"),
    }

    let requester = RequesterInfo {
        customer_name: Some("Nusrat".to_string()),
        customer_phone: Some("01811-000111".to_string()),
        delivery_address: Some("House 12, Road 5, Dhanmondi".to_string()),
        note: Some("gift wrap".to_string()),
        ..shop("Shop A")
    };
    let order = desk
        .place_order(&partner(), OrderRequest::on_behalf("EG-R001", 1, requester.clone()))
        .unwrap();
    assert_eq!(order.requester(), &requester);
    assert_eq!(desk.list_orders(&admin(), None).unwrap()[0].requester(), &requester);
}

#[test]
fn roles_gate_each_operation() {
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);
    let order = desk
        .place_order(&partner(), OrderRequest::direct("EG-R001", 1, shop("Shop A")))
        .unwrap();

    assert!(matches!(
        desk.mark_dispatched(&partner(), order.order_id()),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        desk.add_item(&partner(), NewItem {
            code: ProductCode::parse("EG-X1").unwrap(),
            name: "Bangle".to_string(),
            stock: 1,
            wholesale_price: 1,
            retail_price: 1,
            image_ref: None,
        }),
        Err(ServiceError::Forbidden(_))
    ));

    // Admin inherits everything through the wildcard grant.
    desk.place_order(&admin(), OrderRequest::direct("EG-R001", 1, shop("owner")))
        .unwrap();
}

#[test]
fn verified_login_yields_a_usable_principal() {
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);
    let accounts = StaticCredentials::new(RolePolicy::default())
        .with_account("shop-a", "s3cret", "Shop A", vec![Role::partner()]);

    let caller = accounts.verify("Shop-A", "s3cret").unwrap();
    desk.place_order(&caller, OrderRequest::direct("EG-R001", 1, shop("Shop A")))
        .unwrap();
    assert!(accounts.verify("shop-a", "wrong").is_err());
}

#[test]
fn two_racing_orders_cannot_overdraw_stock() {
    let store = seeded(&[item("EG-R001", 5)]);
    let handler = Arc::new(OrderTransactionHandler::new(store.clone()));
    let barrier = Arc::new(Barrier::new(2));

    let workers: Vec<_> = (0..2)
        .map(|n| {
            let handler = handler.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let caller = Principal::partner(format!("Shop {n}"));
                barrier.wait();
                handler.place_order(&caller, OrderRequest::direct("EG-R001", 3, shop("racer")))
            })
        })
        .collect();
    let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(ServiceError::InsufficientStock {
            requested: 3,
            available: 2
        })
    )));

    let desk = desk(&store);
    assert_eq!(desk.find_by_code(&partner(), "EG-R001").unwrap().stock(), 2);
    assert_eq!(desk.list_orders(&admin(), None).unwrap().len(), 1);
}

#[test]
fn many_racing_orders_conserve_stock() {
    const THREADS: usize = 8;
    let store = seeded(&[item("EG-R001", 20)]);
    let handler = Arc::new(OrderTransactionHandler::from_config(store.clone(), &DeskConfig::default()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let handler = handler.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                handler.place_order(&partner(), OrderRequest::direct("eg-r001", 3, shop("racer")))
            })
        })
        .collect();
    let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    let placed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(placed, 6);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, ServiceError::InsufficientStock { .. }))
    );

    let desk = desk(&store);
    assert_eq!(desk.find_by_code(&partner(), "EG-R001").unwrap().stock(), 2);
    assert_eq!(desk.list_orders(&admin(), None).unwrap().len(), placed);
}

#[test]
fn concurrent_orders_for_different_products_all_commit() {
    const THREADS: usize = 8;
    const ROUNDS: u32 = 3;
    everglow_observability::init_for_tests();

    let codes: Vec<String> = (0..THREADS).map(|n| format!("EG-P{n:03}")).collect();
    let rows = codes.iter().map(|code| inventory::encode(&item(code, 10))).collect();
    let store = Arc::new(FlakyStore {
        latency: Duration::from_millis(2),
        ..FlakyStore::over(InMemoryTableStore::new().with_rows(TableName::Inventory, rows))
    });
    let desk = Arc::new(OrderDesk::with_store(store.clone(), &DeskConfig::default()));

    for _ in 0..ROUNDS {
        let barrier = Arc::new(Barrier::new(THREADS));
        let workers: Vec<_> = codes
            .iter()
            .cloned()
            .map(|code| {
                let desk = desk.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    desk.place_order(&partner(), OrderRequest::direct(code, 1, shop("racer")))
                })
            })
            .collect();
        for worker in workers {
            let result = worker.join().unwrap();
            assert!(result.is_ok(), "{result:?}");
        }
    }

    for code in &codes {
        assert_eq!(desk.find_by_code(&partner(), code).unwrap().stock(), 10 - ROUNDS);
    }
    assert_eq!(
        desk.list_orders(&admin(), None).unwrap().len(),
        THREADS * ROUNDS as usize
    );
}

/// Wraps the in-memory store and fails chosen calls.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryTableStore,
    fail_reads_of: Option<TableName>,
    fail_writes_of: Option<TableName>,
    writes: AtomicUsize,
    /// Added to every call, like a remote sheet round trip.
    latency: Duration,
    /// Stock to force into the first inventory row just before the next
    /// inventory write, as if another admin edited it concurrently.
    interfere_with_stock: Mutex<Option<u32>>,
}

impl FlakyStore {
    fn over(inner: InMemoryTableStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }
}

impl TableStore for FlakyStore {
    fn read_table(&self, table: TableName) -> Result<TableSnapshot, StoreError> {
        thread::sleep(self.latency);
        if self.fail_reads_of == Some(table) {
            return Err(StoreError::Timeout(format!("reading {table}")));
        }
        self.inner.read_table(table)
    }

    fn write_table(&self, table: TableName, rows: Vec<Row>, expected: ExpectedRevision) -> Result<u64, StoreError> {
        thread::sleep(self.latency);
        if self.fail_writes_of == Some(table) {
            return Err(StoreError::Unavailable(format!("writing {table}")));
        }
        if table == TableName::Inventory {
            let stolen = self.interfere_with_stock.lock().unwrap().take();
            if let Some(stock) = stolen {
                let mut current = self.inner.read_table(table)?.rows;
                current[0].insert(inventory::STOCK.to_string(), json!(stock));
                self.inner.write_table(table, current, ExpectedRevision::Any)?;
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_table(table, rows, expected)
    }
}

fn flaky(stock: u32) -> FlakyStore {
    everglow_observability::init_for_tests();
    FlakyStore::over(
        InMemoryTableStore::new().with_rows(TableName::Inventory, vec![inventory::encode(&item("EG-R001", stock))]),
    )
}

#[test]
fn failed_inventory_read_aborts_before_any_write() {
    let store = FlakyStore {
        fail_reads_of: Some(TableName::Inventory),
        ..flaky(10)
    };
    let handler = OrderTransactionHandler::new(store);

    let err = handler
        .place_order(&partner(), OrderRequest::direct("EG-R001", 1, shop("Shop A")))
        .unwrap_err();
    assert!(matches!(err, ServiceError::StoreUnavailable(_)));
    assert!(err.is_retryable());
    assert_eq!(handler.store().writes.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_inventory_write_leaves_stock_alone() {
    let store = FlakyStore {
        fail_writes_of: Some(TableName::Inventory),
        ..flaky(10)
    };
    let handler = OrderTransactionHandler::new(store);

    let err = handler
        .place_order(&partner(), OrderRequest::direct("EG-R001", 1, shop("Shop A")))
        .unwrap_err();
    assert!(err.is_retryable());

    let table = inventory::decode(handler.store().inner.read_table(TableName::Inventory).unwrap()).unwrap();
    assert_eq!(table.records()[0].stock(), 10);
    assert_eq!(handler.store().inner.read_table(TableName::Orders).unwrap().revision, 0);
}

#[test]
fn failed_order_append_reports_the_orphaned_reservation() {
    let store = FlakyStore {
        fail_writes_of: Some(TableName::Orders),
        ..flaky(10)
    };
    let handler = OrderTransactionHandler::new(store);

    let err = handler
        .place_order(&partner(), OrderRequest::direct("EG-R001", 4, shop("Shop A")))
        .unwrap_err();
    match &err {
        ServiceError::OrphanedReservation {
            product_code,
            quantity,
            ..
        } => {
            assert_eq!(product_code, "EG-R001");
            assert_eq!(*quantity, 4);
        }
        other => panic!("expected OrphanedReservation, got {other:?}"),
    }
    assert!(!err.is_retryable());

    // Inventory was committed first; the gap is visible, not hidden.
    let table = inventory::decode(handler.store().inner.read_table(TableName::Inventory).unwrap()).unwrap();
    assert_eq!(table.records()[0].stock(), 6);
}

#[test]
fn lost_race_is_re_decided_against_fresh_stock() {
    let store = flaky(10);
    *store.interfere_with_stock.lock().unwrap() = Some(2);
    let handler = OrderTransactionHandler::new(store);

    let err = handler
        .place_order(&partner(), OrderRequest::direct("EG-R001", 4, shop("Shop A")))
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::InsufficientStock {
            requested: 4,
            available: 2
        }
    );
    assert!(handler.store().inner.read_table(TableName::Orders).unwrap().rows.is_empty());
}

#[test]
fn lost_race_with_enough_stock_still_commits_once() {
    let store = flaky(10);
    *store.interfere_with_stock.lock().unwrap() = Some(7);
    // One lost race, one retry.
    let handler = OrderTransactionHandler::new(store).with_retry_policy(RetryPolicy::immediate(2));

    handler
        .place_order(&partner(), OrderRequest::direct("EG-R001", 4, shop("Shop A")))
        .unwrap();
    let table = inventory::decode(handler.store().inner.read_table(TableName::Inventory).unwrap()).unwrap();
    assert_eq!(table.records()[0].stock(), 3);
}

#[test]
fn blank_and_extra_sheet_content_survives_an_order() {
    let mut row = inventory::encode(&item("EG-R001", 10));
    row.insert("Supplier".to_string(), json!("Dhaka Gold House"));
    let mut blank = Row::new();
    blank.insert(inventory::CODE.to_string(), json!(""));
    let store = Arc::new(InMemoryTableStore::new().with_rows(TableName::Inventory, vec![blank, row]));
    let desk = desk(&store);

    desk.place_order(&partner(), OrderRequest::direct("EG-R001", 1, shop("Shop A")))
        .unwrap();

    let rows = snapshot(&store, TableName::Inventory).rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["Supplier"], json!("Dhaka Gold House"));
    assert_eq!(rows[1][inventory::STOCK], json!(9));
}

#[test]
fn malformed_inventory_row_is_reported_not_guessed() {
    let mut row = inventory::encode(&item("EG-R001", 10));
    row.insert(inventory::STOCK.to_string(), json!("-3"));
    let store = Arc::new(InMemoryTableStore::new().with_rows(TableName::Inventory, vec![row]));
    let desk = desk(&store);

    let err = desk
        .place_order(&partner(), OrderRequest::direct("EG-R001", 1, shop("Shop A")))
        .unwrap_err();
    assert!(matches!(err, ServiceError::MalformedTable(msg) if msg.contains("row 1")));
}

#[test]
fn json_directory_store_persists_across_desks() {
    let dir = std::env::temp_dir().join(format!("everglow-desk-{}", uuid::Uuid::now_v7()));
    let config = DeskConfig {
        store: StoreBackend::JsonDir { path: dir.clone() },
        ..DeskConfig::default()
    };

    let order_id = {
        let desk = OrderDesk::open(&config).unwrap();
        desk.add_item(&admin(), NewItem {
            code: ProductCode::parse("EG-R001").unwrap(),
            name: "Rose Ring".to_string(),
            stock: 10,
            wholesale_price: 120_000,
            retail_price: 150_000,
            image_ref: None,
        })
        .unwrap();
        desk.place_order(&partner(), OrderRequest::direct("EG-R001", 4, shop("Shop A")))
            .unwrap()
            .order_id()
    };

    let reopened = OrderDesk::open(&config).unwrap();
    assert_eq!(reopened.find_by_code(&partner(), "eg-r001").unwrap().stock(), 6);
    let dispatched = reopened.mark_dispatched(&admin(), order_id).unwrap();
    assert_eq!(dispatched.status(), OrderStatus::Dispatched);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn principals_carry_no_ambient_session() {
    // Two callers with different roles share one desk without interfering.
    let store = seeded(&[item("EG-R001", 10)]);
    let desk = desk(&store);
    let guest = Principal::with_roles(PrincipalId::new(), "guest", vec![], &RolePolicy::default());

    assert!(matches!(desk.list_all(&guest), Err(ServiceError::Forbidden(_))));
    assert!(desk.list_all(&partner()).is_ok());
    assert!(matches!(desk.list_all(&guest), Err(ServiceError::Forbidden(_))));
}
