use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use thiserror::Error;
use tokio_rusqlite::Connection;

use super::models::{ChatEntry, DocumentSummary, EmbeddedDocument, User};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
    #[error("database connection error: {0}")]
    Connection(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Connection>,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        let db = Self {
            conn: Arc::new(conn),
        };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS users (
                        id TEXT PRIMARY KEY,
                        username TEXT UNIQUE NOT NULL,
                        password_hash TEXT NOT NULL,
                        role TEXT NOT NULL DEFAULT 'User',
                        can_view_documents INTEGER NOT NULL DEFAULT 1,
                        can_upload_documents INTEGER NOT NULL DEFAULT 0,
                        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
                    );
                    CREATE TABLE IF NOT EXISTS documents (
                        id INTEGER PRIMARY KEY,
                        file_name TEXT NOT NULL,
                        raw_text TEXT NOT NULL,
                        uploaded_at TEXT NOT NULL,
                        embedding_json TEXT
                    );
                    CREATE TABLE IF NOT EXISTS chat_history (
                        id INTEGER PRIMARY KEY,
                        user_id TEXT NOT NULL REFERENCES users(id),
                        question TEXT NOT NULL,
                        answer TEXT NOT NULL,
                        source_document TEXT NOT NULL,
                        timestamp TEXT NOT NULL
                    );",
                )
            })
            .await?;

        info!("Database initialized successfully");
        Ok(())
    }

    pub async fn insert_user(&self, user: User) -> Result<(), DatabaseError> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, username, password_hash, role, can_view_documents, can_upload_documents)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    (
                        &user.id,
                        &user.username,
                        &user.password_hash,
                        &user.role,
                        user.can_view_documents,
                        user.can_upload_documents,
                    ),
                )
            })
            .await?;

        Ok(())
    }

    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let username = username.to_string();
        let result = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, password_hash, role, can_view_documents, can_upload_documents
                     FROM users WHERE username = ?1",
                )?;
                let mut rows = stmt.query([&username])?;

                if let Some(row) = rows.next()? {
                    Ok(Some(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        role: row.get(3)?,
                        can_view_documents: row.get(4)?,
                        can_upload_documents: row.get(5)?,
                    }))
                } else {
                    Ok(None)
                }
            })
            .await?;

        Ok(result)
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let id = id.to_string();
        let result = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, password_hash, role, can_view_documents, can_upload_documents
                     FROM users WHERE id = ?1",
                )?;
                let mut rows = stmt.query([&id])?;

                if let Some(row) = rows.next()? {
                    Ok(Some(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        role: row.get(3)?,
                        can_view_documents: row.get(4)?,
                        can_upload_documents: row.get(5)?,
                    }))
                } else {
                    Ok(None)
                }
            })
            .await?;

        Ok(result)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let result = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, username, password_hash, role, can_view_documents, can_upload_documents
                     FROM users ORDER BY username",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        role: row.get(3)?,
                        can_view_documents: row.get(4)?,
                        can_upload_documents: row.get(5)?,
                    })
                })?;

                let mut users = Vec::new();
                for row in rows {
                    users.push(row?);
                }

                Ok(users)
            })
            .await?;

        Ok(result)
    }

    /// Returns false when no user with that id exists.
    pub async fn update_user_permissions(
        &self,
        id: &str,
        can_view_documents: bool,
        can_upload_documents: bool,
    ) -> Result<bool, DatabaseError> {
        let id = id.to_string();
        let changed = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE users SET can_view_documents = ?1, can_upload_documents = ?2 WHERE id = ?3",
                    (can_view_documents, can_upload_documents, &id),
                )
            })
            .await?;

        Ok(changed > 0)
    }

    pub async fn insert_document(
        &self,
        file_name: String,
        raw_text: String,
        embedding: Option<&[f32]>,
    ) -> Result<i64, DatabaseError> {
        let embedding_json = match embedding {
            Some(vector) => Some(serde_json::to_string(vector)?),
            None => None,
        };
        let uploaded_at = Utc::now().to_rfc3339();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO documents (file_name, raw_text, uploaded_at, embedding_json)
                     VALUES (?1, ?2, ?3, ?4)",
                    (&file_name, &raw_text, &uploaded_at, &embedding_json),
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(id)
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>, DatabaseError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, file_name, uploaded_at FROM documents ORDER BY uploaded_at DESC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?;

                let mut documents = Vec::new();
                for row in rows {
                    documents.push(row?);
                }

                Ok(documents)
            })
            .await?;

        rows.into_iter()
            .map(|(id, file_name, uploaded_at)| {
                Ok(DocumentSummary {
                    id,
                    file_name,
                    uploaded_at: parse_timestamp(&uploaded_at)?,
                })
            })
            .collect()
    }

    pub async fn get_document(&self, id: i64) -> Result<Option<DocumentSummary>, DatabaseError> {
        let row = self
            .conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT id, file_name, uploaded_at FROM documents WHERE id = ?1")?;
                let mut rows = stmt.query([id])?;

                if let Some(row) = rows.next()? {
                    Ok(Some((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    )))
                } else {
                    Ok(None)
                }
            })
            .await?;

        match row {
            Some((id, file_name, uploaded_at)) => Ok(Some(DocumentSummary {
                id,
                file_name,
                uploaded_at: parse_timestamp(&uploaded_at)?,
            })),
            None => Ok(None),
        }
    }

    /// Returns false when no document with that id exists.
    pub async fn delete_document(&self, id: i64) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .call(move |conn| conn.execute("DELETE FROM documents WHERE id = ?1", [id]))
            .await?;

        Ok(deleted > 0)
    }

    /// Documents eligible for similarity ranking: vector already computed.
    pub async fn documents_with_embeddings(&self) -> Result<Vec<EmbeddedDocument>, DatabaseError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, file_name, raw_text, embedding_json
                     FROM documents WHERE embedding_json IS NOT NULL",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?;

                let mut documents = Vec::new();
                for row in rows {
                    documents.push(row?);
                }

                Ok(documents)
            })
            .await?;

        rows.into_iter()
            .map(|(id, file_name, raw_text, embedding_json)| {
                let embedding: Vec<f32> = serde_json::from_str(&embedding_json)?;
                Ok(EmbeddedDocument {
                    id,
                    file_name,
                    raw_text,
                    embedding,
                })
            })
            .collect()
    }

    pub async fn insert_chat_entry(
        &self,
        user_id: String,
        question: String,
        answer: String,
        source_document: String,
    ) -> Result<i64, DatabaseError> {
        let timestamp = Utc::now().to_rfc3339();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO chat_history (user_id, question, answer, source_document, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    (&user_id, &question, &answer, &source_document, &timestamp),
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(id)
    }

    /// The caller's history, oldest entry first.
    pub async fn chat_history(&self, user_id: &str) -> Result<Vec<ChatEntry>, DatabaseError> {
        let user_id = user_id.to_string();
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, question, answer, source_document, timestamp
                     FROM chat_history WHERE user_id = ?1 ORDER BY timestamp",
                )?;
                let rows = stmt.query_map([&user_id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                })?;

                let mut entries = Vec::new();
                for row in rows {
                    entries.push(row?);
                }

                Ok(entries)
            })
            .await?;

        rows.into_iter()
            .map(|(id, user_id, question, answer, source_document, timestamp)| {
                Ok(ChatEntry {
                    id,
                    user_id,
                    question,
                    answer,
                    source_document,
                    timestamp: parse_timestamp(&timestamp)?,
                })
            })
            .collect()
    }

    pub async fn clear_chat_history(&self) -> Result<(), DatabaseError> {
        self.conn
            .call(|conn| conn.execute("DELETE FROM chat_history", []))
            .await?;

        Ok(())
    }
}


fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Corrupt(format!("bad timestamp {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{ROLE_ADMIN, ROLE_USER};

    async fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db")).await.unwrap();
        (db, dir)
    }

    fn user(id: &str, username: &str, role: &str) -> User {
        User {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            can_view_documents: true,
            can_upload_documents: false,
        }
    }

    #[tokio::test]
    async fn users_roundtrip_and_update() {
        let (db, _dir) = test_db().await;

        db.insert_user(user("u1", "alice", ROLE_USER)).await.unwrap();
        db.insert_user(user("u2", "root", ROLE_ADMIN)).await.unwrap();

        let alice = db.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.id, "u1");
        assert!(alice.can_view_documents);
        assert!(!alice.can_upload_documents);

        assert!(db.find_user_by_username("nobody").await.unwrap().is_none());
        assert_eq!(db.list_users().await.unwrap().len(), 2);

        assert!(db.update_user_permissions("u1", false, true).await.unwrap());
        let alice = db.find_user_by_id("u1").await.unwrap().unwrap();
        assert!(!alice.can_view_documents);
        assert!(alice.can_upload_documents);

        assert!(!db.update_user_permissions("missing", true, true).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_usernames_hit_the_unique_constraint() {
        let (db, _dir) = test_db().await;
        db.insert_user(user("u1", "alice", ROLE_USER)).await.unwrap();
        assert!(db.insert_user(user("u2", "alice", ROLE_USER)).await.is_err());
    }

    #[tokio::test]
    async fn documents_store_and_delete() {
        let (db, _dir) = test_db().await;

        let with_vector = db
            .insert_document("a.txt".to_string(), "alpha".to_string(), Some(&[0.1, 0.2]))
            .await
            .unwrap();
        let without_vector = db
            .insert_document("b.txt".to_string(), "beta".to_string(), None)
            .await
            .unwrap();

        let listed = db.list_documents().await.unwrap();
        assert_eq!(listed.len(), 2);

        // Only the embedded document is eligible for ranking.
        let embedded = db.documents_with_embeddings().await.unwrap();
        assert_eq!(embedded.len(), 1);
        assert_eq!(embedded[0].id, with_vector);
        assert_eq!(embedded[0].embedding, vec![0.1, 0.2]);
        assert_eq!(embedded[0].raw_text, "alpha");

        let fetched = db.get_document(with_vector).await.unwrap().unwrap();
        assert_eq!(fetched.file_name, "a.txt");

        assert!(db.delete_document(with_vector).await.unwrap());
        assert!(!db.delete_document(with_vector).await.unwrap());
        assert!(db.get_document(with_vector).await.unwrap().is_none());

        let listed = db.list_documents().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, without_vector);
        assert!(db.documents_with_embeddings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_history_is_scoped_and_clearable() {
        let (db, _dir) = test_db().await;

        db.insert_user(user("u1", "alice", ROLE_USER)).await.unwrap();
        db.insert_user(user("u2", "bob", ROLE_USER)).await.unwrap();

        db.insert_chat_entry(
            "u1".to_string(),
            "q1".to_string(),
            "a1".to_string(),
            "doc.txt".to_string(),
        )
        .await
        .unwrap();
        db.insert_chat_entry(
            "u1".to_string(),
            "q2".to_string(),
            "a2".to_string(),
            "None".to_string(),
        )
        .await
        .unwrap();
        db.insert_chat_entry(
            "u2".to_string(),
            "other".to_string(),
            "answer".to_string(),
            "None".to_string(),
        )
        .await
        .unwrap();

        let history = db.chat_history("u1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "q1");
        assert_eq!(history[1].question, "q2");
        assert!(history[0].timestamp <= history[1].timestamp);

        assert_eq!(db.chat_history("u2").await.unwrap().len(), 1);

        db.clear_chat_history().await.unwrap();
        assert!(db.chat_history("u1").await.unwrap().is_empty());
        assert!(db.chat_history("u2").await.unwrap().is_empty());
    }
}
