use sea_orm::Database;
use uuid::Uuid;

use engine::{Engine, EngineError, ParticipantDraft, SplitDraft, TransactionDraft};
use migration::MigratorTrait;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

fn split_draft(names: &[(&str, i64)]) -> TransactionDraft {
    let total: i64 = names.iter().map(|(_, amount)| amount).sum();
    TransactionDraft {
        title: "Shared expense".to_string(),
        amount_minor: -total,
        category: "Shared".to_string(),
        split: Some(SplitDraft {
            total_minor: total,
            participants: names
                .iter()
                .map(|(name, amount)| ParticipantDraft {
                    name: name.to_string(),
                    amount_minor: *amount,
                    paid: false,
                })
                .collect(),
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn mark_paid_is_idempotent() {
    let engine = engine_with_db().await;
    let tx = engine
        .create_transaction("alice", &split_draft(&[("A", 100), ("B", 100), ("C", 100)]))
        .await
        .unwrap();

    let first = engine
        .mark_participant_paid("alice", tx.id, "A")
        .await
        .unwrap();
    assert_eq!((first.paid, first.total), (1, 3));

    let second = engine
        .mark_participant_paid("alice", tx.id, "A")
        .await
        .unwrap();
    assert_eq!((second.paid, second.total), (1, 3));
}

#[tokio::test]
async fn mark_paid_matches_trimmed_name_and_leaves_others_alone() {
    let engine = engine_with_db().await;
    let tx = engine
        .create_transaction("alice", &split_draft(&[("A", 100), ("B", 200)]))
        .await
        .unwrap();

    engine
        .mark_participant_paid("alice", tx.id, "  B  ")
        .await
        .unwrap();

    let fetched = engine.transaction("alice", tx.id).await.unwrap();
    let split = fetched.split.expect("split details");
    assert_eq!(split.total_minor, 300);
    let a = &split.participants[0];
    let b = &split.participants[1];
    assert!(!a.paid);
    assert!(b.paid);
    assert_eq!((a.amount_minor, b.amount_minor), (100, 200));
}

#[tokio::test]
async fn settling_every_participant_completes_the_split() {
    let engine = engine_with_db().await;
    let tx = engine
        .create_transaction("alice", &split_draft(&[("A", 100), ("B", 100)]))
        .await
        .unwrap();

    engine
        .mark_participant_paid("alice", tx.id, "A")
        .await
        .unwrap();
    let status = engine
        .mark_participant_paid("alice", tx.id, "B")
        .await
        .unwrap();
    assert!(status.is_fully_settled());

    let fetched = engine.transaction("alice", tx.id).await.unwrap();
    assert_eq!(fetched.status(), "2/2 paid");
}

#[tokio::test]
async fn mark_paid_on_unknown_participant_is_not_found() {
    let engine = engine_with_db().await;
    let tx = engine
        .create_transaction("alice", &split_draft(&[("A", 100)]))
        .await
        .unwrap();

    let err = engine
        .mark_participant_paid("alice", tx.id, "Z")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("participant".to_string()));
}

#[tokio::test]
async fn mark_paid_on_plain_transaction_is_a_conflict() {
    let engine = engine_with_db().await;
    let tx = engine
        .create_transaction(
            "alice",
            &TransactionDraft {
                title: "Solo lunch".to_string(),
                amount_minor: -900,
                category: "Food".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = engine
        .mark_participant_paid("alice", tx.id, "A")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn mark_paid_respects_ownership() {
    let engine = engine_with_db().await;
    let tx = engine
        .create_transaction("alice", &split_draft(&[("A", 100)]))
        .await
        .unwrap();

    let err = engine
        .mark_participant_paid("bob", tx.id, "A")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .mark_participant_paid("alice", Uuid::new_v4(), "A")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NotFound("transaction".to_string()));
}
