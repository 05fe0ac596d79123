//! Database and schema tests
//!
//! Tests SQLite migrations, entity storage, and schema constraints

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Setup test database with migrations
async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

async fn insert_teacher(pool: &SqlitePool, teacher_id: Uuid) {
    sqlx::query("INSERT INTO teachers (id, language_id, created_at) VALUES (?, NULL, ?)")
        .bind(teacher_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
}

async fn insert_roleplay(pool: &SqlitePool, owner_id: Uuid, code: &str) -> Uuid {
    let roleplay_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO roleplays (id, owner_id, name, scenario, image_path, first_prompt, agent_id, code, created_at) \
         VALUES (?, ?, ?, ?, NULL, NULL, NULL, ?, ?)",
    )
    .bind(roleplay_id)
    .bind(owner_id)
    .bind("Cafe Order")
    .bind("Order a coffee in Spanish")
    .bind(code)
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap();
    roleplay_id
}

#[tokio::test]
async fn test_database_migrations_work() {
    let pool = setup_test_db().await;

    let result = sqlx::query("SELECT name FROM sqlite_master WHERE type='table'")
        .fetch_all(&pool)
        .await
        .unwrap();

    // languages, teachers, roleplays (plus sqlx's migrations table)
    assert!(result.len() >= 3);
}

#[tokio::test]
async fn test_languages_are_seeded() {
    let pool = setup_test_db().await;

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM languages")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 4);

    let korean: (Uuid, String) =
        sqlx::query_as("SELECT id, levels FROM languages WHERE code = 'KO'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let levels: Vec<String> = serde_json::from_str(&korean.1).unwrap();
    assert_eq!(levels.len(), 6);
    assert_eq!(levels[0], "TOPIK 1");
}

#[tokio::test]
async fn test_roleplay_storage_round_trip() {
    let pool = setup_test_db().await;

    let teacher_id = Uuid::new_v4();
    insert_teacher(&pool, teacher_id).await;
    let roleplay_id = insert_roleplay(&pool, teacher_id, "ZT7QKM").await;

    let row: (Uuid, Uuid, String) =
        sqlx::query_as("SELECT id, owner_id, name FROM roleplays WHERE code = ?")
            .bind("ZT7QKM")
            .fetch_one(&pool)
            .await
            .unwrap();

    assert_eq!(row.0, roleplay_id);
    assert_eq!(row.1, teacher_id);
    assert_eq!(row.2, "Cafe Order");
}

#[tokio::test]
async fn test_join_code_is_unique() {
    let pool = setup_test_db().await;

    let teacher_id = Uuid::new_v4();
    insert_teacher(&pool, teacher_id).await;
    insert_roleplay(&pool, teacher_id, "AAAAAA").await;

    // A second roleplay with the same code must fail the UNIQUE constraint.
    let result = sqlx::query(
        "INSERT INTO roleplays (id, owner_id, name, scenario, image_path, first_prompt, agent_id, code, created_at) \
         VALUES (?, ?, 'n', 's', NULL, NULL, NULL, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(teacher_id)
    .bind("AAAAAA")
    .bind(Utc::now())
    .execute(&pool)
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_teacher_created_once() {
    let pool = setup_test_db().await;

    let teacher_id = Uuid::new_v4();
    insert_teacher(&pool, teacher_id).await;

    let result = sqlx::query("INSERT INTO teachers (id, language_id, created_at) VALUES (?, NULL, ?)")
        .bind(teacher_id)
        .bind(Utc::now())
        .execute(&pool)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_teacher_language_reference() {
    let pool = setup_test_db().await;

    let teacher_id = Uuid::new_v4();
    insert_teacher(&pool, teacher_id).await;

    let english: (Uuid,) = sqlx::query_as("SELECT id FROM languages WHERE code = 'EN'")
        .fetch_one(&pool)
        .await
        .unwrap();

    sqlx::query("UPDATE teachers SET language_id = ? WHERE id = ?")
        .bind(english.0)
        .bind(teacher_id)
        .execute(&pool)
        .await
        .unwrap();

    let row: (Option<Uuid>,) = sqlx::query_as("SELECT language_id FROM teachers WHERE id = ?")
        .bind(teacher_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.0, Some(english.0));
}
