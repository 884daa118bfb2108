use chrono::Utc;
use sea_orm::Database;
use uuid::Uuid;

use engine::{
    Engine, EngineError, ParticipantDraft, SplitDraft, TransactionDraft, TransactionKind,
};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn draft(title: &str, amount_minor: i64, category: &str) -> TransactionDraft {
    TransactionDraft {
        title: title.to_string(),
        amount_minor,
        category: category.to_string(),
        ..Default::default()
    }
}

fn dinner_split() -> TransactionDraft {
    let mut d = draft("Dinner", -6_000, "Food");
    d.split = Some(SplitDraft {
        total_minor: 6_000,
        participants: ["A", "B", "C"]
            .iter()
            .map(|name| ParticipantDraft {
                name: name.to_string(),
                amount_minor: 2_000,
                paid: false,
            })
            .collect(),
    });
    d
}

#[tokio::test]
async fn create_derives_kind_from_amount_sign() {
    let engine = engine_with_db().await;

    let mut d = draft("Salary", 100_000, "Work");
    d.kind = Some(TransactionKind::Expense);
    let created = engine.create_transaction("alice", &d).await.unwrap();
    assert_eq!(created.kind, TransactionKind::Income);

    let fetched = engine.transaction("alice", created.id).await.unwrap();
    assert_eq!(fetched.kind, TransactionKind::Income);
    assert_eq!(fetched.amount_minor, 100_000);
    assert_eq!(fetched.status(), "completed");
}

#[tokio::test]
async fn create_rejects_zero_amount() {
    let engine = engine_with_db().await;

    let err = engine
        .create_transaction("alice", &draft("Nothing", 0, "Misc"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn create_split_stores_participants_in_order() {
    let engine = engine_with_db().await;

    let created = engine
        .create_transaction("alice", &dinner_split())
        .await
        .unwrap();
    assert_eq!(created.kind, TransactionKind::Expense);
    assert_eq!(created.status(), "0/3 paid");

    let fetched = engine.transaction("alice", created.id).await.unwrap();
    let split = fetched.split.expect("split details");
    assert_eq!(split.total_minor, 6_000);
    let names: Vec<&str> = split.participants.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert!(split.participants.iter().all(|p| !p.paid));
}

#[tokio::test]
async fn create_split_with_sum_mismatch_is_rejected() {
    let engine = engine_with_db().await;

    let mut d = dinner_split();
    d.split.as_mut().unwrap().total_minor = 7_000;
    let err = engine.create_transaction("alice", &d).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn update_replaces_fields_and_participants() {
    let engine = engine_with_db().await;

    let created = engine
        .create_transaction("alice", &dinner_split())
        .await
        .unwrap();

    let mut replacement = draft("Dinner out", -8_000, "Restaurants");
    replacement.split = Some(SplitDraft {
        total_minor: 8_000,
        participants: vec![
            ParticipantDraft {
                name: "A".to_string(),
                amount_minor: 5_000,
                paid: true,
            },
            ParticipantDraft {
                name: "D".to_string(),
                amount_minor: 3_000,
                paid: false,
            },
        ],
    });

    let updated = engine
        .update_transaction("alice", created.id, &replacement)
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.title, "Dinner out");
    assert_eq!(updated.amount_minor, -8_000);

    let fetched = engine.transaction("alice", created.id).await.unwrap();
    let split = fetched.split.as_ref().expect("split details");
    let names: Vec<&str> = split.participants.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "D"]);
    assert_eq!(fetched.status(), "1/2 paid");
}

#[tokio::test]
async fn update_revalidates_like_create() {
    let engine = engine_with_db().await;

    let created = engine
        .create_transaction("alice", &draft("Lunch", -1_200, "Food"))
        .await
        .unwrap();

    let err = engine
        .update_transaction("alice", created.id, &draft("", 0, "Food"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // The failed update must not have partially applied.
    let fetched = engine.transaction("alice", created.id).await.unwrap();
    assert_eq!(fetched.title, "Lunch");
    assert_eq!(fetched.amount_minor, -1_200);
}

#[tokio::test]
async fn foreign_owner_cannot_read_update_or_delete() {
    let engine = engine_with_db().await;

    let created = engine
        .create_transaction("alice", &draft("Lunch", -1_200, "Food"))
        .await
        .unwrap();

    let forbidden = EngineError::Forbidden("transaction belongs to another owner".to_string());
    let err = engine.transaction("bob", created.id).await.unwrap_err();
    assert_eq!(err, forbidden);

    let err = engine
        .update_transaction("bob", created.id, &draft("Stolen", -1, "Food"))
        .await
        .unwrap_err();
    assert_eq!(err, forbidden);

    let err = engine.delete_transaction("bob", created.id).await.unwrap_err();
    assert_eq!(err, forbidden);
}

#[tokio::test]
async fn delete_removes_transaction() {
    let engine = engine_with_db().await;

    let created = engine
        .create_transaction("alice", &draft("Lunch", -1_200, "Food"))
        .await
        .unwrap();
    engine.delete_transaction("alice", created.id).await.unwrap();

    let err = engine.transaction("alice", created.id).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound("transaction".to_string()));
}

#[tokio::test]
async fn bulk_delete_skips_foreign_and_unknown_ids() {
    let engine = engine_with_db().await;

    let a1 = engine
        .create_transaction("alice", &draft("One", -100, "Misc"))
        .await
        .unwrap();
    let a2 = engine
        .create_transaction("alice", &draft("Two", -200, "Misc"))
        .await
        .unwrap();
    let b1 = engine
        .create_transaction("bob", &draft("Theirs", -300, "Misc"))
        .await
        .unwrap();

    let deleted = engine
        .delete_transactions("alice", &[a1.id, a2.id, b1.id, Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    // Bob's transaction survived untouched.
    let fetched = engine.transaction("bob", b1.id).await.unwrap();
    assert_eq!(fetched.title, "Theirs");
}

#[tokio::test]
async fn split_dinner_scenario_end_to_end() {
    let engine = engine_with_db().await;

    let created = engine
        .create_transaction("alice", &dinner_split())
        .await
        .unwrap();
    assert_eq!(created.kind, TransactionKind::Expense);

    let status = engine
        .mark_participant_paid("alice", created.id, "A")
        .await
        .unwrap();
    assert_eq!((status.paid, status.total), (1, 3));

    let fetched = engine.transaction("alice", created.id).await.unwrap();
    assert_eq!(fetched.status(), "1/3 paid");

    let summary = engine.summary("alice", None, None).await.unwrap();
    assert_eq!(summary.total_expense_minor, 6_000);
    assert_eq!(summary.total_income_minor, 0);
    assert_eq!(summary.balance_minor, -6_000);
    assert_eq!(summary.transaction_count, 1);

    // Free-text search finds the record by title, case-insensitively.
    let page = engine
        .list_transactions(
            "alice",
            &engine::TransactionListFilter {
                query: Some("din".to_string()),
                ..Default::default()
            },
            engine::PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].title, "Dinner");
}

#[tokio::test]
async fn occurred_at_is_distinct_from_audit_timestamps() {
    let engine = engine_with_db().await;

    let mut d = draft("Old expense", -500, "Misc");
    let effective = Utc::now() - chrono::Duration::days(30);
    d.occurred_at = Some(effective);

    let created = engine.create_transaction("alice", &d).await.unwrap();
    assert_eq!(created.occurred_at, effective);
    assert!(created.created_at > effective);
}
