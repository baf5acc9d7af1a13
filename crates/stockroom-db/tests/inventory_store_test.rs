//! Integration tests for the item store and ledger using in-memory SurrealDB.

use futures::future::join_all;
use stockroom_core::error::{ConflictReason, StockroomError};
use stockroom_core::models::item::{CreateItem, MAX_QUANTITY, UpdateItem};
use stockroom_core::models::transaction::{RecordMovement, TransactionKind};
use stockroom_core::repository::{ItemRepository, LedgerRepository};
use stockroom_db::repository::SurrealInventoryStore;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> SurrealInventoryStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    stockroom_db::run_migrations(&db).await.unwrap();
    SurrealInventoryStore::open(db).await.unwrap()
}

fn new_item(id: &str, quantity: i64) -> CreateItem {
    CreateItem {
        id: id.into(),
        name: "Laptop".into(),
        category: "Electronics".into(),
        quantity,
        added_by: "admin".into(),
    }
}

fn movement(item_id: &str, quantity: i64, actor: &str) -> RecordMovement {
    RecordMovement {
        item_id: item_id.into(),
        quantity,
        actor: actor.into(),
        notes: None,
    }
}

// ---------------------------------------------------------------------------
// Item store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_normalizes_item_id() {
    let store = setup().await;

    let item = store.create(new_item(" item001 ", 10)).await.unwrap();
    assert_eq!(item.id, "ITEM001");
    assert_eq!(item.quantity, 10);
    assert_eq!(item.added_by.as_deref(), Some("admin"));

    let fetched = store.get_by_id("item001").await.unwrap();
    assert_eq!(fetched, item);
}

#[tokio::test]
async fn duplicate_item_is_a_conflict() {
    let store = setup().await;
    store.create(new_item("ITEM001", 1)).await.unwrap();

    let err = store.create(new_item("item001", 5)).await.unwrap_err();
    assert!(matches!(
        err,
        StockroomError::Conflict {
            reason: ConflictReason::Duplicate,
            ..
        }
    ));
    assert_eq!(store.get_by_id("ITEM001").await.unwrap().quantity, 1);
}

#[tokio::test]
async fn invalid_item_input_is_rejected() {
    let store = setup().await;

    let err = store.create(new_item("ITEM001", -1)).await.unwrap_err();
    assert!(matches!(err, StockroomError::Validation { .. }));

    let mut blank = new_item("ITEM002", 0);
    blank.name = "  ".into();
    let err = store.create(blank).await.unwrap_err();
    assert!(matches!(err, StockroomError::Validation { .. }));

    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_is_ordered_by_id() {
    let store = setup().await;
    for id in ["ITEM003", "ITEM001", "ITEM002"] {
        store.create(new_item(id, 0)).await.unwrap();
    }

    let ids: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec!["ITEM001", "ITEM002", "ITEM003"]);
}

#[tokio::test]
async fn names_of_returns_only_requested_items() {
    let store = setup().await;
    for id in ["ITEM001", "ITEM002", "ITEM003"] {
        store.create(new_item(id, 0)).await.unwrap();
    }

    let names = store
        .names_of(&["ITEM001".into(), "item003".into(), "MISSING".into()])
        .await
        .unwrap();
    assert_eq!(names.len(), 2);
    assert_eq!(names["ITEM001"], "Laptop");
    assert_eq!(names["ITEM003"], "Laptop");

    assert!(store.names_of(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_name_and_category_leaves_ledger_alone() {
    let store = setup().await;
    let before = store.create(new_item("ITEM001", 4)).await.unwrap();

    let after = store
        .update(
            "admin",
            "item001",
            UpdateItem {
                name: Some("Notebook".into()),
                category: Some("Office".into()),
                quantity: Some(4),
            },
        )
        .await
        .unwrap();
    assert_eq!(after.name, "Notebook");
    assert_eq!(after.category, "Office");
    assert_eq!(after.quantity, 4);
    assert!(after.last_update >= before.last_update);
    assert!(store.list_transactions(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn quantity_override_appends_correction_entry() {
    let store = setup().await;
    store.create(new_item("ITEM001", 10)).await.unwrap();

    let item = store
        .update(
            "admin",
            "ITEM001",
            UpdateItem {
                quantity: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity, 7);

    let entries = store.list_transactions(None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, TransactionKind::Outgoing);
    assert_eq!(entries[0].quantity, 3);
    assert_eq!(entries[0].user_username, "admin");
    assert!(
        entries[0]
            .notes
            .as_deref()
            .is_some_and(|n| n.starts_with("stock correction"))
    );

    let item = store
        .update(
            "admin",
            "ITEM001",
            UpdateItem {
                name: Some("Laptop Pro".into()),
                quantity: Some(12),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity, 12);
    assert_eq!(item.name, "Laptop Pro");

    let entries = store.find_transactions_by_item("item001").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, TransactionKind::Incoming);
    assert_eq!(entries[0].quantity, 5);
}

#[tokio::test]
async fn empty_or_negative_update_is_rejected() {
    let store = setup().await;
    store.create(new_item("ITEM001", 1)).await.unwrap();

    let err = store
        .update("admin", "ITEM001", UpdateItem::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::Validation { .. }));

    let err = store
        .update(
            "admin",
            "ITEM001",
            UpdateItem {
                quantity: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::Validation { .. }));

    let err = store
        .update(
            "admin",
            "NOPE",
            UpdateItem {
                name: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::NotFound { .. }));
}

#[tokio::test]
async fn delete_unreferenced_item() {
    let store = setup().await;
    store.create(new_item("ITEM001", 3)).await.unwrap();

    store.delete("item001").await.unwrap();
    let err = store.get_by_id("ITEM001").await.unwrap_err();
    assert!(matches!(err, StockroomError::NotFound { .. }));

    let err = store.delete("ITEM001").await.unwrap_err();
    assert!(matches!(err, StockroomError::NotFound { .. }));
}

#[tokio::test]
async fn item_with_transactions_cannot_be_deleted() {
    let store = setup().await;
    store.create(new_item("ITEM001", 3)).await.unwrap();
    store
        .record_incoming(movement("ITEM001", 1, "op"))
        .await
        .unwrap();

    let err = store.delete("ITEM001").await.unwrap_err();
    assert!(matches!(
        err,
        StockroomError::Conflict {
            reason: ConflictReason::Referenced,
            ..
        }
    ));
    assert_eq!(store.get_by_id("ITEM001").await.unwrap().quantity, 4);
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replay_matches_final_quantity() {
    let store = setup().await;
    store.create(new_item("ITEM001", 10)).await.unwrap();

    for _ in 0..3 {
        store
            .record_incoming(movement("ITEM001", 5, "op"))
            .await
            .unwrap();
    }
    for _ in 0..2 {
        store
            .record_outgoing(movement("ITEM001", 7, "op"))
            .await
            .unwrap();
    }

    let item = store.get_by_id("ITEM001").await.unwrap();
    assert_eq!(item.quantity, 11);

    let entries = store.list_transactions(None).await.unwrap();
    assert_eq!(entries.len(), 5);
    let replayed: i64 = 10 + entries
        .iter()
        .map(|t| t.kind.signed(t.quantity))
        .sum::<i64>();
    assert_eq!(replayed, item.quantity);

    // Newest first.
    let ids: Vec<i64> = entries.iter().map(|t| t.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);
    assert_eq!(entries[0].kind, TransactionKind::Outgoing);
    assert_eq!(entries[4].kind, TransactionKind::Incoming);
}

#[tokio::test]
async fn over_withdrawal_changes_nothing() {
    let store = setup().await;
    store.create(new_item("ITEM001", 4)).await.unwrap();

    let err = store
        .record_outgoing(movement("ITEM001", 5, "op"))
        .await
        .unwrap_err();
    match err {
        StockroomError::InsufficientStock {
            item_id,
            available,
            requested,
        } => {
            assert_eq!(item_id, "ITEM001");
            assert_eq!(available, 4);
            assert_eq!(requested, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(store.get_by_id("ITEM001").await.unwrap().quantity, 4);
    assert!(store.list_transactions(None).await.unwrap().is_empty());

    // Draining exactly to zero is fine.
    store
        .record_outgoing(movement("ITEM001", 4, "op"))
        .await
        .unwrap();
    assert_eq!(store.get_by_id("ITEM001").await.unwrap().quantity, 0);
}

#[tokio::test]
async fn incoming_past_ceiling_changes_nothing() {
    let store = setup().await;

    let err = store.create(new_item("HUGE", i64::MAX)).await.unwrap_err();
    assert!(matches!(err, StockroomError::Validation { .. }));

    store.create(new_item("ITEM001", MAX_QUANTITY)).await.unwrap();
    let err = store
        .record_incoming(movement("ITEM001", 1, "op"))
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::Validation { .. }));

    let err = store
        .record_incoming(movement("ITEM001", i64::MAX, "op"))
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::Validation { .. }));

    assert_eq!(
        store.get_by_id("ITEM001").await.unwrap().quantity,
        MAX_QUANTITY
    );
    assert!(store.list_transactions(None).await.unwrap().is_empty());

    let summary = store.summary(5).await.unwrap();
    assert_eq!(summary.total_stock_quantity, MAX_QUANTITY);
}

#[tokio::test]
async fn movement_validation() {
    let store = setup().await;
    store.create(new_item("ITEM001", 4)).await.unwrap();

    let err = store
        .record_incoming(movement("ITEM001", 0, "op"))
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::Validation { .. }));

    let err = store
        .record_incoming(movement("MISSING", 1, "op"))
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::NotFound { .. }));

    let err = store
        .record_incoming(movement("ITEM001", 1, " "))
        .await
        .unwrap_err();
    assert!(matches!(err, StockroomError::Unauthenticated));
}

#[tokio::test]
async fn recorded_entry_echoes_input() {
    let store = setup().await;
    store.create(new_item("ITEM001", 0)).await.unwrap();

    let entry = store
        .record_incoming(RecordMovement {
            item_id: " item001".into(),
            quantity: 2,
            actor: "op".into(),
            notes: Some(" restock ".into()),
        })
        .await
        .unwrap();
    assert_eq!(entry.kind, TransactionKind::Incoming);
    assert_eq!(entry.item_id, "ITEM001");
    assert_eq!(entry.notes.as_deref(), Some("restock"));

    let stored = store.list_transactions(None).await.unwrap();
    assert_eq!(stored, vec![entry]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_oversell() {
    let store = setup().await;
    store.create(new_item("ITEM001", 10)).await.unwrap();

    let tasks = (0..8).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .record_outgoing(movement("ITEM001", 3, &format!("op{i}")))
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 3);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(StockroomError::InsufficientStock { .. })
        ));
    }

    assert_eq!(store.get_by_id("ITEM001").await.unwrap().quantity, 1);
    assert_eq!(store.list_transactions(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn list_filters_by_kind_item_and_user() {
    let store = setup().await;
    store.create(new_item("ITEM001", 10)).await.unwrap();
    store.create(new_item("ITEM002", 10)).await.unwrap();

    store.record_incoming(movement("ITEM001", 1, "alice")).await.unwrap();
    store.record_outgoing(movement("ITEM001", 2, "bob")).await.unwrap();
    store.record_outgoing(movement("ITEM002", 3, "alice")).await.unwrap();

    let outgoing = store
        .list_transactions(Some(TransactionKind::Outgoing))
        .await
        .unwrap();
    assert_eq!(outgoing.len(), 2);
    assert!(outgoing.iter().all(|t| t.kind == TransactionKind::Outgoing));

    let incoming = store
        .list_transactions(Some(TransactionKind::Incoming))
        .await
        .unwrap();
    assert_eq!(incoming.len(), 1);

    let by_item = store.find_transactions_by_item("item001").await.unwrap();
    assert_eq!(by_item.len(), 2);

    let by_user = store.find_transactions_by_user("ALICE").await.unwrap();
    assert_eq!(by_user.len(), 2);
    assert!(by_user.iter().all(|t| t.user_username == "alice"));
}

#[tokio::test]
async fn summary_counts_and_recent_activity() {
    let store = setup().await;

    let empty = store.summary(5).await.unwrap();
    assert_eq!(empty.total_items, 0);
    assert_eq!(empty.total_stock_quantity, 0);
    assert_eq!(empty.total_transactions, 0);
    assert!(empty.recent_activity.is_empty());

    store.create(new_item("ITEM001", 10)).await.unwrap();
    store.create(new_item("ITEM002", 2)).await.unwrap();
    store.create(new_item("ITEM003", 5)).await.unwrap();
    for _ in 0..6 {
        store.record_incoming(movement("ITEM001", 1, "op")).await.unwrap();
    }

    let summary = store.summary(5).await.unwrap();
    assert_eq!(summary.total_items, 3);
    assert_eq!(summary.total_stock_quantity, 23);
    assert_eq!(summary.low_stock_items, 1);
    assert_eq!(summary.total_transactions, 6);
    assert_eq!(summary.recent_activity.len(), 5);

    let all = store.list_transactions(None).await.unwrap();
    assert_eq!(summary.recent_activity, all[..5].to_vec());
}

#[tokio::test]
async fn sequence_resumes_after_reopen() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    stockroom_db::run_migrations(&db).await.unwrap();

    let store = SurrealInventoryStore::open(db.clone()).await.unwrap();
    store.create(new_item("ITEM001", 0)).await.unwrap();
    let first = store
        .record_incoming(movement("ITEM001", 1, "op"))
        .await
        .unwrap();

    let reopened = SurrealInventoryStore::open(db).await.unwrap();
    let second = reopened
        .record_incoming(movement("ITEM001", 1, "op"))
        .await
        .unwrap();
    assert!(second.id > first.id);
}
