// tests/mutation/mutation_test.rs
use std::sync::{Arc, Mutex};

use futures::FutureExt;

use graphweave::auth::Identity;
use graphweave::error::MutationError;
use graphweave::executor::{Executor, SqliteExecutor};
use graphweave::mutation::{MutationConfig, Mutations};
use graphweave::resolver::ResolveContext;
use graphweave::value::{Row, ScalarValue};
use serde_json::json;

fn db() -> Arc<SqliteExecutor> {
    let db = SqliteExecutor::open_in_memory().unwrap();
    db.execute_batch(
        r#"
        CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT, authorId INTEGER);
        CREATE TABLE audit (postId INTEGER, action TEXT);
        INSERT INTO posts (id, title, authorId) VALUES (1, 'First', 1), (2, 'Second', 2);
        "#,
    )
    .unwrap();
    Arc::new(db)
}

fn row(pairs: &[(&str, ScalarValue)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

async fn count(db: &SqliteExecutor, sql: &str) -> usize {
    db.fetch_all(sql).await.unwrap().len()
}

/// Hook writing an audit row per mutation and remembering what it saw.
fn audited(action: &'static str, seen: Arc<Mutex<Vec<(ScalarValue, Row)>>>) -> MutationConfig {
    MutationConfig::new().with_post_query(move |executor, id, input| {
        seen.lock().unwrap().push((id.clone(), input.clone()));
        let sql = format!("INSERT INTO audit (postId, action) VALUES ({id}, '{action}')");
        async move {
            executor.execute(&sql).await?;
            Ok(())
        }
        .boxed()
    })
}

#[tokio::test]
async fn test_create_returns_stored_row() {
    let db = db();
    let mutations = Mutations::new(db.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let created = mutations
        .create(
            "posts",
            row(&[("title", "Third".into()), ("authorId", 2i64.into())]),
            &audited("create", seen.clone()),
            &ResolveContext::guest(),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        serde_json::to_value(&created).unwrap(),
        json!({ "id": 3, "title": "Third", "authorId": 2 })
    );
    assert_eq!(count(&db, "SELECT * FROM audit WHERE postId = 3").await, 1);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, ScalarValue::Int(3));
    assert_eq!(seen[0].1["title"], ScalarValue::from("Third"));
}

#[tokio::test]
async fn test_reducer_sees_identity_and_hook_sees_original_input() {
    let db = db();
    let mutations = Mutations::new(db.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut config = audited("create", seen.clone());
    config = config.with_input_reducer(|mut input, ctx| {
        let owner = if ctx.identity().name == "ada" { 1i64 } else { 0i64 };
        input.insert("authorId".into(), owner.into());
        input
    });

    let ada = ResolveContext::new(Identity::new("ada", ["user"]));
    let created = mutations
        .create("posts", row(&[("title", "Mine".into())]), &config, &ada)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(created["authorId"], ScalarValue::Int(1));
    assert!(!seen.lock().unwrap()[0].1.contains_key("authorId"));
}

#[tokio::test]
async fn test_update_changes_only_the_target_row() {
    let db = db();
    let mutations = Mutations::new(db.clone());

    let updated = mutations
        .update(
            "posts",
            &ScalarValue::Int(2),
            row(&[("title", "Edited".into())]),
            &MutationConfig::new(),
            &ResolveContext::guest(),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated["title"], ScalarValue::from("Edited"));
    assert_eq!(count(&db, "SELECT * FROM posts WHERE title = 'First'").await, 1);
}

#[tokio::test]
async fn test_update_without_id_touches_nothing() {
    let db = db();
    let mutations = Mutations::new(db.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let err = mutations
        .update(
            "posts",
            &ScalarValue::Null,
            row(&[("title", "Edited".into())]),
            &audited("update", seen.clone()),
            &ResolveContext::guest(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::MissingId { ref table } if table == "posts"));
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(count(&db, "SELECT * FROM posts WHERE title = 'Edited'").await, 0);
}

#[tokio::test]
async fn test_hard_delete() {
    let db = db();
    let mutations = Mutations::new(db.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let outcome = mutations
        .hard_delete("posts", &ScalarValue::Int(1), &audited("delete", seen.clone()))
        .await
        .unwrap();

    assert_eq!(serde_json::to_value(outcome).unwrap(), json!({ "result": true }));
    assert_eq!(count(&db, "SELECT * FROM posts").await, 1);
    assert_eq!(count(&db, "SELECT * FROM audit WHERE action = 'delete'").await, 1);
    assert!(seen.lock().unwrap()[0].1.is_empty());
}

#[tokio::test]
async fn test_hook_failure_propagates() {
    let db = db();
    let mutations = Mutations::new(db.clone());
    let config = MutationConfig::new().with_post_query(|_executor, id, _input| {
        let message = format!("refusing {id}");
        async move { Err(MutationError::Hook(message)) }.boxed()
    });

    let err = mutations
        .hard_delete("posts", &ScalarValue::Int(2), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, MutationError::Hook(ref m) if m == "refusing 2"));
}

#[tokio::test]
async fn test_storage_errors_surface() {
    let db = db();
    let mutations = Mutations::new(db.clone());
    let err = mutations
        .create(
            "missing",
            row(&[("title", "x".into())]),
            &MutationConfig::new(),
            &ResolveContext::guest(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MutationError::Storage(_)));
}
