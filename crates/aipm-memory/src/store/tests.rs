use super::Store;
use aipm_core::traits::DocumentStore;

async fn test_store() -> Store {
    Store::in_memory().await.unwrap()
}

#[tokio::test]
async fn test_get_missing_document() {
    let store = test_store().await;
    assert!(store.get_document("project_ai_pm").await.unwrap().is_none());
}

#[tokio::test]
async fn test_put_then_get() {
    let store = test_store().await;
    store
        .put_document("project_ai_pm", r#"{"project_name":"Atlas"}"#)
        .await
        .unwrap();
    let body = store.get_document("project_ai_pm").await.unwrap();
    assert_eq!(body.as_deref(), Some(r#"{"project_name":"Atlas"}"#));
}

#[tokio::test]
async fn test_put_replaces_whole_document() {
    let store = test_store().await;
    store.put("k", "first").await.unwrap();
    store.put("k", "second").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_keys_are_independent() {
    let store = test_store().await;
    store.put("a", "1").await.unwrap();
    store.put("b", "2").await.unwrap();
    assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let store = test_store().await;
    Store::run_migrations(store.pool()).await.unwrap();
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 2);
}
