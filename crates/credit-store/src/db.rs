use crate::models::*;
use chrono::NaiveDate;
use credit_core::CreditError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database and initialize the schema.
    pub async fn connect(database_url: &str) -> Result<Self, CreditError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(sqlx::Error::from)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // WAL mode so the scheduler tick and request handlers can write
        // without blocking each other's reads.
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

        let store = Self { pool };
        store.init_tables().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn init_tables(&self) -> Result<(), CreditError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS issuers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                ticker TEXT UNIQUE,
                country TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS fundamentals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                issuer_id INTEGER NOT NULL REFERENCES issuers(id) ON DELETE CASCADE,
                report_date TEXT NOT NULL,
                revenue REAL,
                ebitda REAL,
                total_debt REAL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                link TEXT NOT NULL UNIQUE,
                summary TEXT,
                published_at TEXT,
                processed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                issuer_id INTEGER REFERENCES issuers(id) ON DELETE SET NULL,
                news_id INTEGER REFERENCES news(id) ON DELETE SET NULL,
                category TEXT NOT NULL,
                description TEXT,
                sentiment REAL,
                timestamp TEXT NOT NULL DEFAULT (datetime('now')),
                payload TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_fundamentals_issuer ON fundamentals(issuer_id, report_date)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_issuer ON events(issuer_id, timestamp)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_category ON events(category)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_news_processed ON news(processed)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ---- Issuers ----

    pub async fn create_issuer(&self, issuer: &NewIssuer) -> Result<Issuer, CreditError> {
        let created = sqlx::query_as::<_, Issuer>(
            "INSERT INTO issuers (name, ticker, country) VALUES (?, ?, ?)
             RETURNING id, name, ticker, country",
        )
        .bind(&issuer.name)
        .bind(&issuer.ticker)
        .bind(&issuer.country)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn get_issuer(&self, id: i64) -> Result<Option<Issuer>, CreditError> {
        let issuer = sqlx::query_as::<_, Issuer>(
            "SELECT id, name, ticker, country FROM issuers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(issuer)
    }

    /// All issuers in iteration order (ascending id). This ordering is
    /// the tie-break for news-to-issuer attribution.
    pub async fn all_issuers(&self) -> Result<Vec<Issuer>, CreditError> {
        let issuers = sqlx::query_as::<_, Issuer>(
            "SELECT id, name, ticker, country FROM issuers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(issuers)
    }

    pub async fn list_issuers(&self, skip: i64, limit: i64) -> Result<Vec<Issuer>, CreditError> {
        let issuers = sqlx::query_as::<_, Issuer>(
            "SELECT id, name, ticker, country FROM issuers ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(issuers)
    }

    pub async fn issuers_with_tickers(&self) -> Result<Vec<Issuer>, CreditError> {
        let issuers = sqlx::query_as::<_, Issuer>(
            "SELECT id, name, ticker, country FROM issuers
             WHERE ticker IS NOT NULL AND ticker != '' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(issuers)
    }

    pub async fn issuer_count(&self) -> Result<i64, CreditError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM issuers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ---- Fundamentals ----

    pub async fn create_fundamental(
        &self,
        fundamental: &NewFundamental,
    ) -> Result<Fundamental, CreditError> {
        let created = sqlx::query_as::<_, Fundamental>(
            "INSERT INTO fundamentals (issuer_id, report_date, revenue, ebitda, total_debt)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, issuer_id, report_date, revenue, ebitda, total_debt, created_at",
        )
        .bind(fundamental.issuer_id)
        .bind(fundamental.report_date)
        .bind(fundamental.revenue)
        .bind(fundamental.ebitda)
        .bind(fundamental.total_debt)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Most recent fundamentals first.
    pub async fn recent_fundamentals(
        &self,
        issuer_id: i64,
        limit: i64,
    ) -> Result<Vec<Fundamental>, CreditError> {
        let rows = sqlx::query_as::<_, Fundamental>(
            "SELECT id, issuer_id, report_date, revenue, ebitda, total_debt, created_at
             FROM fundamentals WHERE issuer_id = ?
             ORDER BY report_date DESC LIMIT ?",
        )
        .bind(issuer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_fundamentals(
        &self,
        issuer_id: Option<i64>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Fundamental>, CreditError> {
        let rows = match issuer_id {
            Some(id) => {
                sqlx::query_as::<_, Fundamental>(
                    "SELECT id, issuer_id, report_date, revenue, ebitda, total_debt, created_at
                     FROM fundamentals WHERE issuer_id = ?
                     ORDER BY report_date DESC LIMIT ? OFFSET ?",
                )
                .bind(id)
                .bind(limit)
                .bind(skip)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Fundamental>(
                    "SELECT id, issuer_id, report_date, revenue, ebitda, total_debt, created_at
                     FROM fundamentals ORDER BY report_date DESC LIMIT ? OFFSET ?",
                )
                .bind(limit)
                .bind(skip)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    // ---- News ----

    pub async fn find_news_by_link(&self, link: &str) -> Result<Option<NewsItem>, CreditError> {
        let item = sqlx::query_as::<_, NewsItem>(
            "SELECT id, title, link, summary, published_at, processed, created_at
             FROM news WHERE link = ?",
        )
        .bind(link)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Insert a news item unless its link already exists. Returns true
    /// when a row was actually inserted. A duplicate link is a normal
    /// no-op, never an error.
    pub async fn insert_news_if_new(
        &self,
        title: &str,
        link: &str,
        summary: Option<&str>,
        published_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<bool, CreditError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO news (title, link, summary, published_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(link)
        .bind(summary)
        .bind(published_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unprocessed news, newest published first, items with no publish
    /// time last.
    pub async fn unprocessed_news(&self) -> Result<Vec<NewsItem>, CreditError> {
        let rows = sqlx::query_as::<_, NewsItem>(
            "SELECT id, title, link, summary, published_at, processed, created_at
             FROM news WHERE processed = 0
             ORDER BY (published_at IS NULL), published_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn mark_news_processed(&self, id: i64) -> Result<(), CreditError> {
        sqlx::query("UPDATE news SET processed = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn news_count(&self) -> Result<i64, CreditError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ---- Events ----

    pub async fn insert_event(&self, event: &NewEvent) -> Result<i64, CreditError> {
        let payload = event
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let (id,): (i64,) = match event.timestamp {
            Some(ts) => {
                sqlx::query_as(
                    "INSERT INTO events (issuer_id, news_id, category, description, sentiment, timestamp, payload)
                     VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
                )
                .bind(event.issuer_id)
                .bind(event.news_id)
                .bind(&event.category)
                .bind(&event.description)
                .bind(event.sentiment)
                .bind(ts)
                .bind(payload)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "INSERT INTO events (issuer_id, news_id, category, description, sentiment, payload)
                     VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
                )
                .bind(event.issuer_id)
                .bind(event.news_id)
                .bind(&event.category)
                .bind(&event.description)
                .bind(event.sentiment)
                .bind(payload)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(id)
    }

    /// Whether a price event already exists for this issuer on this
    /// calendar day. Deliberately coarser than exact-timestamp dedup:
    /// at most one price event per issuer per day.
    pub async fn has_price_event_on(
        &self,
        issuer_id: i64,
        day: NaiveDate,
    ) -> Result<bool, CreditError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM events
             WHERE issuer_id = ? AND category = 'price' AND date(timestamp) = ?",
        )
        .bind(issuer_id)
        .bind(day.format("%Y-%m-%d").to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Sentiment values of the most recent events for an issuer that
    /// carry one, newest first.
    pub async fn recent_sentiments(
        &self,
        issuer_id: i64,
        limit: i64,
    ) -> Result<Vec<f64>, CreditError> {
        let values: Vec<f64> = sqlx::query_scalar(
            "SELECT sentiment FROM events
             WHERE issuer_id = ? AND sentiment IS NOT NULL
             ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(issuer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    pub async fn events_for_issuer(&self, issuer_id: i64) -> Result<Vec<Event>, CreditError> {
        let rows = sqlx::query_as::<_, Event>(
            "SELECT id, issuer_id, news_id, category, description, sentiment, timestamp, payload
             FROM events WHERE issuer_id = ? ORDER BY timestamp DESC",
        )
        .bind(issuer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
