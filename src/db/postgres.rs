use sqlx::{Connection, PgConnection};

use crate::{
    error::AppResult,
    models::{LearningItem, LearningItemRow},
};

const PUBLIC_ITEMS_QUERY: &str = r#"
    SELECT title, author, type::text AS item_type, status::text AS status
    FROM learning_items
    WHERE user_id = $1 AND is_public = true
    ORDER BY started_at DESC
"#;

const COUNT_USERS_QUERY: &str = "SELECT COUNT(*) FROM users";

/// Read-only access to users' learning materials
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MaterialsStore: Send + Sync {
    /// Public learning items for a user, most recently started first
    async fn public_items(&self, user_id: i64) -> AppResult<Vec<LearningItem>>;

    /// Number of registered users; doubles as a connectivity check
    async fn count_users(&self) -> AppResult<i64>;
}

/// Postgres-backed store
///
/// Every call opens its own connection and closes it before returning,
/// so nothing is held between requests.
#[derive(Clone)]
pub struct PgMaterialsStore {
    database_url: String,
}

impl PgMaterialsStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    async fn connect(&self) -> AppResult<PgConnection> {
        let conn = PgConnection::connect(&self.database_url).await?;
        Ok(conn)
    }

    async fn release(conn: PgConnection) {
        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "Failed to close database connection");
        }
    }
}

#[async_trait::async_trait]
impl MaterialsStore for PgMaterialsStore {
    async fn public_items(&self, user_id: i64) -> AppResult<Vec<LearningItem>> {
        let mut conn = self.connect().await?;

        let rows = sqlx::query_as::<_, LearningItemRow>(PUBLIC_ITEMS_QUERY)
            .bind(user_id)
            .fetch_all(&mut conn)
            .await;

        Self::release(conn).await;

        let items: Vec<LearningItem> = rows?.into_iter().map(LearningItem::from).collect();

        tracing::debug!(user_id, items = items.len(), "Fetched public learning items");

        Ok(items)
    }

    async fn count_users(&self) -> AppResult<i64> {
        let mut conn = self.connect().await?;

        let count = sqlx::query_scalar::<_, i64>(COUNT_USERS_QUERY)
            .fetch_one(&mut conn)
            .await;

        Self::release(conn).await;

        Ok(count?)
    }
}
