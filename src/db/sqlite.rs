use crate::db::models::{DbQueryLog, DbUser};
use crate::db::schema::SQLITE_INIT;
use crate::error::GradeError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Pooled handle over credential and audit-log storage. Cloning is cheap;
/// all clones share the same pool. Every mutation is a single statement,
/// so concurrent writers serialize on the database and readers never see
/// a partially-written state.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (creating if missing) and initialize the database.
    pub async fn connect(database_url: &str) -> Result<Self, GradeError> {
        let connect_opts =
            SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL, then apply the
    /// forward-compatibility migration for databases written before the
    /// `usage_purpose` column existed.
    async fn init_schema(&self) -> Result<(), GradeError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        self.ensure_usage_purpose_column().await
    }

    async fn ensure_usage_purpose_column(&self) -> Result<(), GradeError> {
        let rows = sqlx::query("PRAGMA table_info(query_logs)")
            .fetch_all(&self.pool)
            .await?;
        for row in &rows {
            let name: String = row.try_get("name")?;
            if name == "usage_purpose" {
                return Ok(());
            }
        }
        sqlx::query("ALTER TABLE query_logs ADD COLUMN usage_purpose TEXT NOT NULL DEFAULT ''")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- users ---

    /// Insert a credential. Returns false if the username is taken.
    pub async fn insert_user(&self, user: &DbUser) -> Result<bool, GradeError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, display_name, email, password_hash, salt, plain_password)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.salt)
        .bind(&user.plain_password)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<DbUser>, GradeError> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"SELECT username, display_name, email, password_hash, salt, plain_password
               FROM users WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Replace verifier, salt and escrow in one statement. Returns false
    /// if the user does not exist.
    pub async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
        salt: &str,
        plain_password: &str,
    ) -> Result<bool, GradeError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, salt = ?, plain_password = ? WHERE username = ?",
        )
        .bind(password_hash)
        .bind(salt)
        .bind(plain_password)
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_user(&self, username: &str) -> Result<bool, GradeError> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All credentials in creation order.
    pub async fn list_users(&self) -> Result<Vec<DbUser>, GradeError> {
        let users = sqlx::query_as::<_, DbUser>(
            r#"SELECT username, display_name, email, password_hash, salt, plain_password
               FROM users ORDER BY rowid"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn count_users(&self) -> Result<i64, GradeError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // --- query logs (append-only: no UPDATE or DELETE exists for this table) ---

    pub async fn append_log(
        &self,
        username: &str,
        cas_number: &str,
        usage_purpose: &str,
        queried_at: &str,
        result_summary: &str,
    ) -> Result<(), GradeError> {
        sqlx::query(
            r#"
            INSERT INTO query_logs (username, cas_number, usage_purpose, queried_at, result_summary)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(cas_number)
        .bind(usage_purpose)
        .bind(queried_at)
        .bind(result_summary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_logs(&self) -> Result<Vec<DbQueryLog>, GradeError> {
        let logs = sqlx::query_as::<_, DbQueryLog>(
            r#"SELECT id, username, cas_number, usage_purpose, queried_at, result_summary
               FROM query_logs ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_storage(dir: &tempfile::TempDir) -> Storage {
        let url = format!("sqlite:{}/storage.sqlite", dir.path().display());
        Storage::connect(&url).await.expect("connect storage")
    }

    #[tokio::test]
    async fn insert_is_rejected_on_duplicate_username() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = temp_storage(&dir).await;
        let user = DbUser {
            username: "alice".into(),
            display_name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "h".into(),
            salt: "s".into(),
            plain_password: Some("pw".into()),
        };
        assert!(storage.insert_user(&user).await.expect("first insert"));
        assert!(!storage.insert_user(&user).await.expect("second insert"));
        assert_eq!(storage.count_users().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn legacy_log_table_gains_usage_purpose_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("legacy.sqlite");
        let url = format!("sqlite:{}", path.display());

        // Simulate a database written before the usage-purpose column.
        {
            let opts = SqliteConnectOptions::from_str(&url)
                .expect("parse url")
                .create_if_missing(true);
            let pool = SqlitePoolOptions::new()
                .connect_with(opts)
                .await
                .expect("connect legacy");
            sqlx::query(
                r#"CREATE TABLE query_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL,
                    cas_number TEXT NOT NULL,
                    queried_at TEXT NOT NULL,
                    result_summary TEXT NOT NULL
                )"#,
            )
            .execute(&pool)
            .await
            .expect("create legacy table");
            sqlx::query(
                "INSERT INTO query_logs (username, cas_number, queried_at, result_summary)
                 VALUES ('alice', '64-17-5', '2026-01-01 08:00:00', '未找到结果')",
            )
            .execute(&pool)
            .await
            .expect("seed legacy row");
            pool.close().await;
        }

        let storage = Storage::connect(&url).await.expect("reconnect migrates");
        let logs = storage.list_logs().await.expect("list");
        assert_eq!(logs.len(), 1);
        // Old rows read back with the synthesized empty purpose.
        assert_eq!(logs[0].usage_purpose, "");

        storage
            .append_log("bob", "50-00-0", "稀释剂", "2026-01-02 09:00:00", "未找到结果")
            .await
            .expect("append after migration");
        let logs = storage.list_logs().await.expect("list again");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].usage_purpose, "稀释剂");
    }
}
