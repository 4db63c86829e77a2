//! Storage repositories for channels, articles and accounts.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::types::{
    Account, Article, ArticleQuery, Channel, ChannelStatus, InsertOutcome, NewAccount,
    NewArticle, NewChannel,
};
use crate::datetime::{parse_day_bound, parse_stored, to_stored};
use crate::db::DbPool;
use crate::{OarssError, Result};

/// Row type for a channel.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    biz_id: String,
    name: String,
    description: String,
    avatar: String,
    link: String,
    account_id: Option<i64>,
    last_update: Option<String>,
    article_count: i64,
    status: String,
    created_at: String,
}

impl TryFrom<ChannelRow> for Channel {
    type Error = OarssError;

    fn try_from(row: ChannelRow) -> Result<Self> {
        Ok(Channel {
            id: row.id,
            real_id: row.biz_id,
            name: row.name,
            description: row.description,
            avatar: row.avatar,
            link: row.link,
            account_id: row.account_id,
            last_update: row.last_update.as_deref().and_then(parse_stored),
            article_count: row.article_count,
            status: ChannelStatus::parse(&row.status)?,
            created_at: parse_stored(&row.created_at).unwrap_or_else(Utc::now),
        })
    }
}

/// Row type for an article.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    biz_id: String,
    title: String,
    description: String,
    content: String,
    link: String,
    cover: String,
    published_at: String,
    created_at: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            channel_id: row.biz_id,
            title: row.title,
            description: row.description,
            content: row.content,
            link: row.link,
            cover: row.cover,
            published_at: parse_stored(&row.published_at),
            created_at: parse_stored(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Row type for an account.
#[derive(Debug, Clone, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    cookie: String,
    token: String,
    available: bool,
    need_check: bool,
    wait_time: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            name: row.name,
            cookie: row.cookie,
            token: row.token,
            available: row.available,
            need_check: row.need_check,
            wait_time: row.wait_time.as_deref().and_then(parse_stored),
            created_at: parse_stored(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_stored(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

const CHANNEL_COLUMNS: &str = "id, biz_id, name, description, avatar, link, account_id, \
                               last_update, article_count, status, created_at";

/// Repository for channel operations.
pub struct ChannelRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ChannelRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a channel with status active.
    pub async fn create(&self, channel: &NewChannel) -> Result<Channel> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO channels (biz_id, name, description, avatar, link, account_id, last_update)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&channel.real_id)
        .bind(&channel.name)
        .bind(&channel.description)
        .bind(&channel.avatar)
        .bind(&channel.link)
        .bind(channel.account_id)
        .bind(to_stored(&Utc::now()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| OarssError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| OarssError::ChannelNotFound(channel.real_id.clone()))
    }

    /// Get a channel by row id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Channel>> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = $1");
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        row.map(Channel::try_from).transpose()
    }

    /// Get a channel by its real identifier.
    pub async fn get_by_real_id(&self, real_id: &str) -> Result<Option<Channel>> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE biz_id = $1");
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(real_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        row.map(Channel::try_from).transpose()
    }

    /// List active channels in creation order.
    pub async fn list_active(&self) -> Result<Vec<Channel>> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE status = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(ChannelStatus::Active.as_str())
            .fetch_all(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        rows.into_iter().map(Channel::try_from).collect()
    }

    /// List every channel regardless of status.
    pub async fn list_all(&self) -> Result<Vec<Channel>> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY id");
        let rows = sqlx::query_as::<_, ChannelRow>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        rows.into_iter().map(Channel::try_from).collect()
    }

    /// List channels with pagination and an optional name filter.
    ///
    /// Returns the page and the total number of matching channels.
    pub async fn list(
        &self,
        page: u32,
        page_size: u32,
        name_filter: Option<&str>,
    ) -> Result<(Vec<Channel>, i64)> {
        let page = page.max(1) as i64;
        let size = page_size.max(1) as i64;
        let pattern = name_filter
            .filter(|n| !n.is_empty())
            .map(|n| format!("%{n}%"));

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {CHANNEL_COLUMNS} FROM channels"));
        if let Some(pattern) = &pattern {
            qb.push(" WHERE name LIKE ").push_bind(pattern.clone());
        }
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(size)
            .push(" OFFSET ")
            .push_bind((page - 1) * size);

        let rows = qb
            .build_query_as::<ChannelRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM channels");
        if let Some(pattern) = &pattern {
            count.push(" WHERE name LIKE ").push_bind(pattern.clone());
        }
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        let channels = rows
            .into_iter()
            .map(Channel::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((channels, total))
    }

    /// All real identifiers, used for reverse lookup of opaque feed ids.
    pub async fn list_real_ids(&self) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT biz_id FROM channels ORDER BY id")
            .fetch_all(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))
    }

    /// Record a completed sync: cached article count and last update time.
    pub async fn update_sync_stats(&self, real_id: &str, article_count: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE channels SET article_count = $1, last_update = $2 WHERE biz_id = $3",
        )
        .bind(article_count)
        .bind(to_stored(&Utc::now()))
        .bind(real_id)
        .execute(self.pool)
        .await
        .map_err(|e| OarssError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(OarssError::ChannelNotFound(real_id.to_string()));
        }
        Ok(())
    }

    /// Set the channel status.
    pub async fn update_status(&self, real_id: &str, status: ChannelStatus) -> Result<()> {
        let result = sqlx::query("UPDATE channels SET status = $1 WHERE biz_id = $2")
            .bind(status.as_str())
            .bind(real_id)
            .execute(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(OarssError::ChannelNotFound(real_id.to_string()));
        }
        Ok(())
    }

    /// Delete a channel together with all of its articles.
    pub async fn delete(&self, real_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM articles WHERE biz_id = $1")
            .bind(real_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM channels WHERE biz_id = $1")
            .bind(real_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(OarssError::ChannelNotFound(real_id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Owned filter values shared by the page and count queries.
struct ArticleFilters {
    channel_id: Option<String>,
    before: Option<String>,
    after: Option<String>,
}

impl ArticleFilters {
    fn from_query(query: &ArticleQuery) -> Result<Self> {
        let day = |d: &Option<String>| -> Result<Option<String>> {
            match d.as_deref().filter(|s| !s.is_empty()) {
                Some(s) => parse_day_bound(s).map(Some),
                None => Ok(None),
            }
        };
        Ok(Self {
            channel_id: query.channel_id.clone().filter(|c| !c.is_empty()),
            before: day(&query.before)?,
            after: day(&query.after)?,
        })
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(channel_id) = &self.channel_id {
            qb.push(" AND biz_id = ").push_bind(channel_id.clone());
        }
        if let Some(before) = &self.before {
            qb.push(" AND published_at < ").push_bind(before.clone());
        }
        if let Some(after) = &self.after {
            qb.push(" AND published_at >= ").push_bind(after.clone());
        }
    }
}

/// Repository for article operations.
pub struct ArticleRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert an article unless one with the same link already exists.
    ///
    /// The unique index on `link` makes this atomic, so concurrent syncs of
    /// one channel cannot create duplicates. An existing row is left untouched.
    pub async fn insert_if_absent(&self, article: &NewArticle) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles (biz_id, title, description, content, link, cover, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&article.channel_id)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.content)
        .bind(&article.link)
        .bind(&article.cover)
        .bind(to_stored(&article.published_at))
        .execute(self.pool)
        .await
        .map_err(|e| OarssError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            Ok(InsertOutcome::Created(result.last_insert_rowid()))
        } else {
            Ok(InsertOutcome::AlreadyExists)
        }
    }

    /// Whether an article with this link is already stored.
    pub async fn exists_by_link(&self, link: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM articles WHERE link = $1 LIMIT 1")
                .bind(link)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| OarssError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    /// Query articles newest first.
    ///
    /// Returns the requested page and the total number of matching articles.
    pub async fn query(&self, query: &ArticleQuery) -> Result<(Vec<Article>, i64)> {
        let filters = ArticleFilters::from_query(query)?;
        let (offset, limit) = query.to_offset_limit();

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, biz_id, title, description, ");
        qb.push(if query.include_body {
            "content"
        } else {
            "'' AS content"
        });
        qb.push(", link, cover, published_at, created_at FROM articles");
        filters.push_where(&mut qb);
        qb.push(" ORDER BY published_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb
            .build_query_as::<ArticleRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM articles");
        filters.push_where(&mut count);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        Ok((rows.into_iter().map(Article::from).collect(), total))
    }

    /// Get an article by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, biz_id, title, description, content, link, cover, published_at, created_at
            FROM articles WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| OarssError::Database(e.to_string()))?;

        Ok(row.map(Article::from))
    }

    /// Number of stored articles for a channel.
    pub async fn count_by_channel(&self, real_id: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE biz_id = $1")
            .bind(real_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))
    }
}

/// Repository for provider accounts.
pub struct AccountRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create an account.
    pub async fn create(&self, account: &NewAccount) -> Result<Account> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO accounts (name, cookie, token) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&account.name)
        .bind(&account.cookie)
        .bind(&account.token)
        .fetch_one(self.pool)
        .await
        .map_err(|e| OarssError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| OarssError::Database(format!("account {id} vanished after insert")))
    }

    /// Get an account by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, cookie, token, available, need_check, wait_time, created_at, updated_at
            FROM accounts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| OarssError::Database(e.to_string()))?;

        Ok(row.map(Account::from))
    }

    /// List all accounts.
    pub async fn list(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, cookie, token, available, need_check, wait_time, created_at, updated_at
            FROM accounts ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| OarssError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Set an account's availability flags. Returns whether the account exists.
    pub async fn set_status(&self, id: i64, available: bool, need_check: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET available = $1, need_check = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(available)
        .bind(need_check)
        .bind(to_stored(&Utc::now()))
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| OarssError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an account. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| OarssError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
