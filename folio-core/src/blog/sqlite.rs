use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use super::PostStore;
use crate::model::{BlogPost, NewBlogPost};

/// Column list for `blog_posts` queries.
const POST_COLUMNS: &str = "id, title, slug, content, created_at";

/// SQLite-backed post store. Migrations run on connect.
#[derive(Debug, Clone)]
pub struct SqlitePostStore {
    pool: SqlitePool,
}

impl SqlitePostStore {
    /// Open (creating if needed) the database at `url` and apply migrations.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// A private in-memory database, kept on a single connection.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn insert(&self, post: &NewBlogPost) -> Result<BlogPost, sqlx::Error> {
        let query = format!(
            "INSERT INTO blog_posts (title, slug, content, created_at) \
             VALUES (?, ?, ?, ?) \
             RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.content)
            .bind(post.created_at)
            .fetch_one(&self.pool)
            .await
    }
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn count(&self) -> Result<u64, sqlx::Error> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blog_posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<BlogPost>, sqlx::Error> {
        let query = format!(
            "SELECT {POST_COLUMNS} FROM blog_posts \
             ORDER BY created_at DESC, id DESC \
             LIMIT ? OFFSET ?"
        );
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, sqlx::Error> {
        let query = format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = ?");
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }
}
