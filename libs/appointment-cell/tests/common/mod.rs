use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use shared_database::Database;

/// On-disk SQLite database that lives for the duration of one test.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

pub async fn setup() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let db = Database::connect_url(&url, 5).await.unwrap();
    db.migrate().await.unwrap();
    TestDb { db, _dir: dir }
}

pub async fn seed_doctor(db: &Database) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO doctors (id, first_name, last_name, email, field, location, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind("Ada")
    .bind("Nguyen")
    .bind(format!("{}@clinic.test", id))
    .bind("Cardiology")
    .bind("Berlin")
    .bind(Utc::now())
    .execute(db.pool())
    .await
    .unwrap();
    id
}

pub async fn seed_patient(db: &Database) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO patients (id, user_name, email, created_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind("sam")
        .bind(format!("{}@mail.test", id))
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
    id
}
