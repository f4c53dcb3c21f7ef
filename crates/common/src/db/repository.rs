//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result row from knowledge-base vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbSearchResult {
    pub chunk_id: Uuid,
    pub chunk_index: i32,
    pub content: String,
    pub score: f64,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user; rejects duplicate username or email
    pub async fn create_user(
        &self,
        username: String,
        email: String,
        password_hash: String,
        preferred_language: String,
        role: UserRole,
    ) -> Result<User> {
        if self.find_user_by_username(&username).await?.is_some() {
            return Err(AppError::DuplicateUser {
                field: "username".into(),
            });
        }
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateUser {
                field: "email".into(),
            });
        }

        let now = chrono::Utc::now();
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            preferred_language: Set(preferred_language),
            role: Set(String::from(role)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        user.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by username
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Update profile fields that were provided
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        email: Option<String>,
        preferred_language: Option<String>,
    ) -> Result<User> {
        let user = self
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: user_id.to_string(),
            })?;

        if let Some(ref new_email) = email {
            if new_email != &user.email
                && self.find_user_by_email(new_email).await?.is_some()
            {
                return Err(AppError::DuplicateUser {
                    field: "email".into(),
                });
            }
        }

        let mut active: UserActiveModel = user.into();
        if let Some(e) = email {
            active.email = Set(e);
        }
        if let Some(lang) = preferred_language {
            active.preferred_language = Set(lang);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Replace a user's password hash
    pub async fn update_password(&self, user_id: Uuid, password_hash: String) -> Result<()> {
        let user = self
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: user_id.to_string(),
            })?;

        let mut active: UserActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(self.write_conn()).await?;

        Ok(())
    }

    /// List users whose username starts with the given prefix
    pub async fn list_users_by_prefix(&self, prefix: &str) -> Result<Vec<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.starts_with(prefix))
            .order_by_asc(UserColumn::Username)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete a user by ID (maintenance use only)
    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = UserEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Chat Operations
    // ========================================================================

    /// Persist one chat turn and its session row in a single transaction.
    ///
    /// The chat_history insert and the idempotent chat_sessions upsert
    /// commit together; any failure rolls both back. The ON CONFLICT
    /// guard on the composite primary key makes concurrent creation of
    /// the same (session_id, user) pair safe.
    pub async fn record_chat_turn(
        &self,
        user_id: Uuid,
        session_id: &str,
        message: &str,
        response: &str,
    ) -> Result<ChatTurn> {
        let now = chrono::Utc::now();
        let txn = self.write_conn().begin().await?;

        let turn = ChatHistoryActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            session_id: Set(session_id.to_string()),
            message: Set(message.to_string()),
            response: Set(response.to_string()),
            created_at: Set(now.into()),
        };
        let turn = turn.insert(&txn).await?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO chat_sessions (session_id, user_id, title, created_at)
            VALUES ($1, $2, NULL, $3)
            ON CONFLICT (session_id, user_id) DO NOTHING
            "#,
            vec![session_id.into(), user_id.into(), now.into()],
        );
        txn.execute(stmt).await?;

        txn.commit().await?;
        Ok(turn)
    }

    /// List a user's chat sessions, newest first
    pub async fn list_chat_sessions(&self, user_id: Uuid) -> Result<Vec<ChatSession>> {
        ChatSessionEntity::find()
            .filter(ChatSessionColumn::UserId.eq(user_id))
            .order_by_desc(ChatSessionColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Set the title of an existing chat session
    pub async fn set_session_title(
        &self,
        user_id: Uuid,
        session_id: &str,
        title: String,
    ) -> Result<ChatSession> {
        let session = ChatSessionEntity::find_by_id((session_id.to_string(), user_id))
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::SessionNotFound {
                id: session_id.to_string(),
            })?;

        let mut active: ChatSessionActiveModel = session.into();
        active.title = Set(Some(title));
        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// List a user's chat history, oldest first, optionally for one session
    pub async fn list_chat_history(
        &self,
        user_id: Uuid,
        session_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<ChatTurn>> {
        let mut query = ChatHistoryEntity::find().filter(ChatHistoryColumn::UserId.eq(user_id));

        if let Some(sid) = session_id {
            query = query.filter(ChatHistoryColumn::SessionId.eq(sid));
        }

        query
            .order_by_asc(ChatHistoryColumn::CreatedAt)
            .limit(limit)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Knowledge Base Operations
    // ========================================================================

    /// Get the current KB source, if any
    pub async fn current_kb_source(&self) -> Result<Option<KbSource>> {
        KbSourceEntity::find()
            .order_by_desc(KbSourceColumn::IndexedAt)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Replace the knowledge base wholesale.
    ///
    /// Deletes the previous source (chunks cascade) and inserts the new
    /// source plus its embedded chunks in one transaction.
    pub async fn replace_kb_index(
        &self,
        content: &str,
        chunks: Vec<(i32, String, Vec<f32>)>,
    ) -> Result<usize> {
        let now = chrono::Utc::now();
        let source_id = Uuid::new_v4();
        let count = chunks.len();

        let txn = self.write_conn().begin().await?;

        KbSourceEntity::delete_many().exec(&txn).await?;

        let source = KbSourceActiveModel {
            id: Set(source_id),
            content: Set(content.to_string()),
            indexed_at: Set(now.into()),
        };
        source.insert(&txn).await?;

        for (index, chunk_content, embedding) in chunks {
            let embedding_str = format!(
                "[{}]",
                embedding
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            );

            // Raw SQL for the pgvector column type
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                INSERT INTO kb_chunks (id, source_id, chunk_index, content, embedding, created_at)
                VALUES ($1, $2, $3, $4, $5::vector, $6)
                "#,
                vec![
                    Uuid::new_v4().into(),
                    source_id.into(),
                    index.into(),
                    chunk_content.into(),
                    embedding_str.into(),
                    now.into(),
                ],
            );
            txn.execute(stmt).await?;
        }

        txn.commit().await?;
        Ok(count)
    }

    /// Vector similarity search over KB chunks (cosine distance)
    pub async fn kb_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<KbSearchResult>> {
        let embedding_str = format!(
            "[{}]",
            embedding
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT
                c.id as chunk_id,
                c.chunk_index,
                c.content,
                1 - (c.embedding <=> $1::vector) as score
            FROM kb_chunks c
            WHERE c.embedding IS NOT NULL
            ORDER BY c.embedding <=> $1::vector
            LIMIT $2
            "#,
            vec![embedding_str.into(), (limit as i64).into()],
        );

        let results = self
            .read_conn()
            .query_all(stmt)
            .await?
            .into_iter()
            .filter_map(|row| {
                Some(KbSearchResult {
                    chunk_id: row.try_get_by_index::<Uuid>(0).ok()?,
                    chunk_index: row.try_get_by_index::<i32>(1).ok()?,
                    content: row.try_get_by_index::<String>(2).ok()?,
                    score: row.try_get_by_index::<f64>(3).ok()?,
                })
            })
            .collect();

        Ok(results)
    }

    // ========================================================================
    // Site Settings Operations
    // ========================================================================

    /// Get a site setting by key
    pub async fn get_setting(&self, key: &str) -> Result<Option<SiteSetting>> {
        SiteSettingEntity::find_by_id(key.to_string())
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create or update a site setting
    pub async fn upsert_setting(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO site_settings (key, value, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at
            "#,
            vec![key.into(), value.into(), chrono::Utc::now().into()],
        );

        self.write_conn().execute(stmt).await?;
        Ok(())
    }

    // ========================================================================
    // Training Program Operations
    // ========================================================================

    /// Create a new training program
    pub async fn create_program(
        &self,
        trainer_id: Uuid,
        title: String,
        description: String,
    ) -> Result<TrainingProgram> {
        let program = TrainingProgramActiveModel {
            id: Set(Uuid::new_v4()),
            trainer_id: Set(trainer_id),
            title: Set(title),
            description: Set(description),
            created_at: Set(chrono::Utc::now().into()),
        };

        program.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find a training program by ID
    pub async fn find_program(&self, id: Uuid) -> Result<Option<TrainingProgram>> {
        TrainingProgramEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List programs authored by a trainer, newest first
    pub async fn list_programs_by_trainer(&self, trainer_id: Uuid) -> Result<Vec<TrainingProgram>> {
        TrainingProgramEntity::find()
            .filter(TrainingProgramColumn::TrainerId.eq(trainer_id))
            .order_by_desc(TrainingProgramColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List programs assigned to a member, with assignment metadata
    pub async fn list_programs_assigned_to(
        &self,
        member_id: Uuid,
    ) -> Result<Vec<(ProgramAssignment, Option<TrainingProgram>)>> {
        ProgramAssignmentEntity::find()
            .filter(ProgramAssignmentColumn::MemberId.eq(member_id))
            .find_also_related(TrainingProgramEntity)
            .order_by_desc(ProgramAssignmentColumn::AssignedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Assign a program to a member; repeat assignment is a conflict
    pub async fn assign_program(
        &self,
        program_id: Uuid,
        member_id: Uuid,
        assigned_by: Uuid,
        note: Option<String>,
    ) -> Result<ProgramAssignment> {
        let existing = ProgramAssignmentEntity::find()
            .filter(ProgramAssignmentColumn::ProgramId.eq(program_id))
            .filter(ProgramAssignmentColumn::MemberId.eq(member_id))
            .one(self.read_conn())
            .await?;

        if existing.is_some() {
            return Err(AppError::AlreadyAssigned {
                program_id: program_id.to_string(),
                member_id: member_id.to_string(),
            });
        }

        let assignment = ProgramAssignmentActiveModel {
            id: Set(Uuid::new_v4()),
            program_id: Set(program_id),
            member_id: Set(member_id),
            assigned_by: Set(assigned_by),
            note: Set(note),
            assigned_at: Set(chrono::Utc::now().into()),
        };

        assignment.insert(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Audit Operations
    // ========================================================================

    /// Insert one audit record; called only from the audit writer task
    pub async fn insert_audit_record(
        &self,
        user_id: Uuid,
        message: String,
        response: String,
        payload: serde_json::Value,
        error: Option<String>,
    ) -> Result<()> {
        let record = AuditRecordActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            message: Set(message),
            response: Set(response),
            payload: Set(payload),
            error: Set(error),
            created_at: Set(chrono::Utc::now().into()),
        };

        record.insert(self.write_conn()).await?;
        Ok(())
    }
}
