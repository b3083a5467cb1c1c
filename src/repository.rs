//! Typed operations over the `t_comment` table.
//!
//! Every operation is a single statement (or a read followed by a single
//! insert), so concurrent requests rely on SQLite's own atomicity and the
//! repository holds no locks.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use serde::Serialize;
use thiserror::Error;

use crate::entity::comment::{self, CommentStatus};

pub const MAX_NICKNAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 100;
pub const MAX_CONTENT_LENGTH: usize = 2000;

/// Page size used by the admin surface.
pub const ADMIN_PAGE_SIZE: u64 = 10;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(String),
    #[error("parent comment {0} not found")]
    ParentNotFound(i32),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// A comment as submitted by a visitor. Empty strings stand for absent fields.
#[derive(Clone, Debug, Default)]
pub struct NewComment {
    pub article_url: String,
    pub parent_id: Option<i32>,
    pub nickname: String,
    pub email: Option<String>,
    pub content: String,
}

/// The part of a comment that is safe to show to anyone.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PublicComment {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i32>,
    pub nickname: String,
    pub content: String,
    pub created_at: String,
}

impl From<comment::Model> for PublicComment {
    fn from(model: comment::Model) -> Self {
        Self {
            id: model.id,
            parent_id: model.parent_id,
            nickname: model.nickname,
            content: model.content,
            created_at: to_rfc3339(model.created_at),
        }
    }
}

/// Full comment shape, admin surface only.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdminComment {
    pub id: i32,
    pub article_url: String,
    pub parent_id: Option<i32>,
    pub nickname: String,
    pub email: Option<String>,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: String,
}

impl From<comment::Model> for AdminComment {
    fn from(model: comment::Model) -> Self {
        Self {
            id: model.id,
            article_url: model.article_url,
            parent_id: model.parent_id,
            nickname: model.nickname,
            email: model.email,
            content: model.content,
            status: model.status,
            created_at: to_rfc3339(model.created_at),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    #[default]
    Pending,
    Approved,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Approved => "approved",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = RepoError;

    /// An empty value means "unspecified" and falls back to `pending`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "all" => Ok(Self::All),
            other => Err(RepoError::Validation(format!("unknown status filter: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CommentFilter {
    pub status: StatusFilter,
    /// Prefix match, empty means no constraint.
    pub article_url: String,
    /// Exact match, empty means no constraint.
    pub email: String,
    /// 1-based, callers normalize values below 1.
    pub page: u64,
    pub page_size: u64,
}

impl Default for CommentFilter {
    fn default() -> Self {
        Self {
            status: StatusFilter::default(),
            article_url: String::new(),
            email: String::new(),
            page: 1,
            page_size: ADMIN_PAGE_SIZE,
        }
    }
}

impl CommentFilter {
    /// The predicate shared by the count and the page query.
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        match self.status {
            StatusFilter::All => {}
            StatusFilter::Pending => cond = cond.add(comment::Column::Status.eq(CommentStatus::Pending)),
            StatusFilter::Approved => cond = cond.add(comment::Column::Status.eq(CommentStatus::Approved)),
        }
        if !self.article_url.is_empty() {
            // substr keeps the match case-sensitive and free of LIKE wildcards
            cond = cond.add(Expr::cust_with_values(
                "substr(article_url, 1, length(?)) = ?",
                [self.article_url.clone(), self.article_url.clone()],
            ));
        }
        if !self.email.is_empty() {
            cond = cond.add(comment::Column::Email.eq(self.email.clone()));
        }
        cond
    }

    fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.page_size
    }
}

#[derive(Clone, Debug)]
pub struct CommentPage {
    pub comments: Vec<comment::Model>,
    /// Rows matching the filter, independent of the page window.
    pub total: u64,
}

pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

#[derive(Clone)]
pub struct CommentRepository {
    db: DatabaseConnection,
}

impl CommentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates and stores a visitor comment. New comments always start
    /// out `pending`, whatever the caller sends.
    pub async fn create_comment(&self, input: NewComment) -> Result<comment::Model, RepoError> {
        validate(&input)?;

        if let Some(parent_id) = input.parent_id {
            let parent = comment::Entity::find_by_id(parent_id).one(&self.db).await?;
            if parent.is_none() {
                return Err(RepoError::ParentNotFound(parent_id));
            }
        }

        let email = input.email.filter(|e| !e.is_empty());
        let model = comment::ActiveModel {
            article_url: Set(input.article_url),
            parent_id: Set(input.parent_id),
            nickname: Set(input.nickname),
            email: Set(email),
            content: Set(input.content),
            status: Set(CommentStatus::Pending),
            ..Default::default()
        };
        let inserted = model.insert(&self.db).await?;
        log::debug!("comment saved id={} article={}", inserted.id, inserted.article_url);
        Ok(inserted)
    }

    /// Approved comments of one article, oldest first.
    pub async fn comments_by_article(&self, article_url: &str) -> Result<Vec<PublicComment>, RepoError> {
        let rows = ordered(comment::Entity::find())
            .filter(comment::Column::ArticleUrl.eq(article_url))
            .filter(comment::Column::Status.eq(CommentStatus::Approved))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(PublicComment::from).collect())
    }

    pub async fn list_filtered(&self, filter: &CommentFilter) -> Result<CommentPage, RepoError> {
        let cond = filter.condition();

        let total = comment::Entity::find()
            .filter(cond.clone())
            .count(&self.db)
            .await?;

        let comments = ordered(comment::Entity::find())
            .filter(cond)
            .offset(filter.offset())
            .limit(filter.page_size)
            .all(&self.db)
            .await?;

        Ok(CommentPage { comments, total })
    }

    /// No-op when the id does not exist.
    pub async fn approve_comment(&self, id: i32) -> Result<(), RepoError> {
        let res = comment::Entity::update_many()
            .col_expr(comment::Column::Status, Expr::value(CommentStatus::Approved))
            .filter(comment::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        log::info!("approve comment id={} rows={}", id, res.rows_affected);
        Ok(())
    }

    /// No-op when the id does not exist. Replies keep their `parent_id`.
    pub async fn delete_comment(&self, id: i32) -> Result<(), RepoError> {
        let res = comment::Entity::delete_by_id(id).exec(&self.db).await?;
        log::info!("delete comment id={} rows={}", id, res.rows_affected);
        Ok(())
    }
}

fn ordered(select: Select<comment::Entity>) -> Select<comment::Entity> {
    select
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
}

/// Presence first, then length bounds. Lengths are counted in characters.
fn validate(input: &NewComment) -> Result<(), RepoError> {
    if input.article_url.trim().is_empty()
        || input.nickname.trim().is_empty()
        || input.content.trim().is_empty()
    {
        return Err(RepoError::Validation("Missing required fields".to_string()));
    }

    let email_len = input.email.as_deref().map(|e| e.chars().count()).unwrap_or(0);
    if input.nickname.chars().count() > MAX_NICKNAME_LENGTH
        || email_len > MAX_EMAIL_LENGTH
        || input.content.chars().count() > MAX_CONTENT_LENGTH
    {
        return Err(RepoError::Validation(
            "Field length exceeds maximum allowed".to_string(),
        ));
    }
    Ok(())
}

fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
