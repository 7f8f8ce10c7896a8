use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

use crate::cutoff::CutoffWindow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub entity_name: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
}

impl Article {
    pub fn published_display(&self) -> String {
        self.published_at.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}

#[derive(Debug, FromRow)]
struct ArticleRow {
    entity_name: String,
    title: String,
    link: String,
    published_at: String,
    source: String,
}

impl TryFrom<ArticleRow> for Article {
    type Error = anyhow::Error;

    fn try_from(row: ArticleRow) -> Result<Self, Self::Error> {
        let published_at = DateTime::parse_from_rfc3339(&row.published_at)?.with_timezone(&Utc);
        Ok(Article {
            entity_name: row.entity_name,
            title: row.title,
            link: row.link,
            published_at,
            source: row.source,
        })
    }
}

/// Fixed-width UTC text, so that string order in SQLite is time order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Every connection to `sqlite::memory:` opens its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                entity_name TEXT NOT NULL,
                title TEXT NOT NULL,
                link TEXT NOT NULL UNIQUE,
                published_at TEXT NOT NULL,
                source TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_articles_published
            ON articles(published_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert `article` unless its link is already stored.
    ///
    /// Returns `true` when a row was written. A known link is left untouched.
    pub async fn save(&self, article: &Article) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (entity_name, title, link, published_at, source)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(link) DO NOTHING
            "#,
        )
        .bind(&article.entity_name)
        .bind(&article.title)
        .bind(&article.link)
        .bind(encode_timestamp(article.published_at))
        .bind(&article.source)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn clear_all(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM articles")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Articles published at or after `window_start`, newest first.
    pub async fn query_recent(
        &self,
        window_start: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT entity_name, title, link, published_at, source FROM articles
            WHERE published_at >= ?
            ORDER BY published_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(encode_timestamp(window_start))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Article::try_from).collect()
    }

    pub async fn list_recent_at(
        &self,
        window: &CutoffWindow,
        now: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Article>> {
        self.query_recent(window.start(now), limit).await
    }

    /// Articles inside the window as of the current instant.
    pub async fn list_recent(
        &self,
        window: &CutoffWindow,
        limit: i64,
    ) -> anyhow::Result<Vec<Article>> {
        self.list_recent_at(window, Utc::now(), limit).await
    }

    pub async fn count(&self) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
