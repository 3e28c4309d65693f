use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

use crate::entities::{comment_likes, comments, report_likes, reports};

/// Input for a new report; required-field validation happens at the API
/// layer before this is constructed.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_name: String,
    pub user_area: String,
    pub user_pincode: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub image_url: String,
}

/// A report together with its derived social state.
#[derive(Debug, Clone)]
pub struct ReportOverview {
    pub report: reports::Model,
    pub likes: u64,
    pub liked_by: Vec<String>,
    pub comment_count: u64,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub likes: u64,
    pub is_liked: bool,
}

#[derive(Debug, Clone)]
pub struct CommentWithLikes {
    pub comment: comments::Model,
    pub likes: u64,
    pub liked_by: Vec<String>,
}

/// One page of a report's comments in stored (oldest-first) order.
#[derive(Debug, Clone)]
pub struct CommentPage {
    pub comments: Vec<CommentWithLikes>,
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

pub struct ReportRepository {
    conn: DatabaseConnection,
}

impl ReportRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: NewReport) -> Result<reports::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let report = reports::ActiveModel {
            user_name: Set(input.user_name),
            user_area: Set(input.user_area),
            user_pincode: Set(input.user_pincode),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            address: Set(input.address),
            image_url: Set(input.image_url),
            uploaded_at: Set(now),
            ..Default::default()
        };

        report
            .insert(&self.conn)
            .await
            .context("Failed to insert report")
    }

    pub async fn get(&self, id: i32) -> Result<Option<reports::Model>> {
        reports::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query report by id")
    }

    /// All reports, newest upload first, each with its derived like and
    /// comment state.
    pub async fn list(&self) -> Result<Vec<ReportOverview>> {
        let report_list = reports::Entity::find()
            .order_by_desc(reports::Column::UploadedAt)
            .all(&self.conn)
            .await
            .context("Failed to list reports")?;

        let ids: Vec<i32> = report_list.iter().map(|r| r.id).collect();

        let likes = report_likes::Entity::find()
            .filter(report_likes::Column::ReportId.is_in(ids.clone()))
            .all(&self.conn)
            .await
            .context("Failed to load report likes")?;

        let mut liked_by: HashMap<i32, Vec<String>> = HashMap::new();
        for like in likes {
            liked_by
                .entry(like.report_id)
                .or_default()
                .push(like.user_identifier);
        }

        let comment_counts: Vec<(i32, i64)> = comments::Entity::find()
            .select_only()
            .column(comments::Column::ReportId)
            .column_as(comments::Column::Id.count(), "count")
            .filter(comments::Column::ReportId.is_in(ids))
            .group_by(comments::Column::ReportId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count comments")?;

        let comment_counts: HashMap<i32, i64> = comment_counts.into_iter().collect();

        Ok(report_list
            .into_iter()
            .map(|report| {
                let likers = liked_by.remove(&report.id).unwrap_or_default();
                let comment_count =
                    u64::try_from(*comment_counts.get(&report.id).unwrap_or(&0)).unwrap_or(0);
                ReportOverview {
                    likes: likers.len() as u64,
                    liked_by: likers,
                    comment_count,
                    report,
                }
            })
            .collect())
    }

    /// One report with its derived social state.
    pub async fn overview(&self, id: i32) -> Result<Option<ReportOverview>> {
        let Some(report) = self.get(id).await? else {
            return Ok(None);
        };

        let liked_by: Vec<String> = report_likes::Entity::find()
            .filter(report_likes::Column::ReportId.eq(id))
            .all(&self.conn)
            .await
            .context("Failed to load report likes")?
            .into_iter()
            .map(|like| like.user_identifier)
            .collect();

        let comment_count = comments::Entity::find()
            .filter(comments::Column::ReportId.eq(id))
            .count(&self.conn)
            .await
            .context("Failed to count comments")?;

        Ok(Some(ReportOverview {
            likes: liked_by.len() as u64,
            liked_by,
            comment_count,
            report,
        }))
    }

    /// Overwrites the AI fields and stamps `analyzed_at`. Returns `None`
    /// when the report does not exist.
    pub async fn attach_analysis(
        &self,
        id: i32,
        analysis: &str,
        safety_score: &str,
        safety_percentage: i32,
    ) -> Result<Option<reports::Model>> {
        let Some(report) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: reports::ActiveModel = report.into();
        active.analysis = Set(Some(analysis.to_string()));
        active.safety_score = Set(Some(safety_score.to_string()));
        active.safety_percentage = Set(Some(safety_percentage));
        active.analyzed_at = Set(Some(chrono::Utc::now().to_rfc3339()));

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update analysis fields")?;

        Ok(Some(updated))
    }

    /// Flips the (report, user) like membership. Returns `None` when the
    /// report does not exist.
    pub async fn toggle_like(
        &self,
        report_id: i32,
        user_identifier: &str,
    ) -> Result<Option<LikeState>> {
        if self.get(report_id).await?.is_none() {
            return Ok(None);
        }

        let removed = report_likes::Entity::delete_many()
            .filter(report_likes::Column::ReportId.eq(report_id))
            .filter(report_likes::Column::UserIdentifier.eq(user_identifier))
            .exec(&self.conn)
            .await
            .context("Failed to remove like")?;

        let is_liked = if removed.rows_affected == 0 {
            report_likes::ActiveModel {
                report_id: Set(report_id),
                user_identifier: Set(user_identifier.to_string()),
                ..Default::default()
            }
            .insert(&self.conn)
            .await
            .context("Failed to insert like")?;
            true
        } else {
            false
        };

        let likes = report_likes::Entity::find()
            .filter(report_likes::Column::ReportId.eq(report_id))
            .count(&self.conn)
            .await
            .context("Failed to count likes")?;

        Ok(Some(LikeState { likes, is_liked }))
    }

    /// Appends a comment to a report. Returns `None` when the report does
    /// not exist. The public id is generated here, not by the database.
    pub async fn add_comment(
        &self,
        report_id: i32,
        user_name: &str,
        user_area: Option<&str>,
        body: &str,
    ) -> Result<Option<comments::Model>> {
        if self.get(report_id).await?.is_none() {
            return Ok(None);
        }

        let comment = comments::ActiveModel {
            public_id: Set(generate_comment_id()),
            report_id: Set(report_id),
            user_name: Set(user_name.to_string()),
            user_area: Set(user_area.map(ToString::to_string)),
            body: Set(body.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let inserted = comment
            .insert(&self.conn)
            .await
            .context("Failed to insert comment")?;

        Ok(Some(inserted))
    }

    pub async fn get_comment(
        &self,
        report_id: i32,
        public_id: &str,
    ) -> Result<Option<comments::Model>> {
        comments::Entity::find()
            .filter(comments::Column::ReportId.eq(report_id))
            .filter(comments::Column::PublicId.eq(public_id))
            .one(&self.conn)
            .await
            .context("Failed to query comment")
    }

    /// Same toggle semantics as [`Self::toggle_like`], scoped to one
    /// comment. Returns `None` when the comment does not exist within the
    /// report.
    pub async fn toggle_comment_like(
        &self,
        report_id: i32,
        comment_public_id: &str,
        user_identifier: &str,
    ) -> Result<Option<LikeState>> {
        let Some(comment) = self.get_comment(report_id, comment_public_id).await? else {
            return Ok(None);
        };

        let removed = comment_likes::Entity::delete_many()
            .filter(comment_likes::Column::CommentId.eq(comment.id))
            .filter(comment_likes::Column::UserIdentifier.eq(user_identifier))
            .exec(&self.conn)
            .await
            .context("Failed to remove comment like")?;

        let is_liked = if removed.rows_affected == 0 {
            comment_likes::ActiveModel {
                comment_id: Set(comment.id),
                user_identifier: Set(user_identifier.to_string()),
                ..Default::default()
            }
            .insert(&self.conn)
            .await
            .context("Failed to insert comment like")?;
            true
        } else {
            false
        };

        let likes = comment_likes::Entity::find()
            .filter(comment_likes::Column::CommentId.eq(comment.id))
            .count(&self.conn)
            .await
            .context("Failed to count comment likes")?;

        Ok(Some(LikeState { likes, is_liked }))
    }

    /// One page of comments in stored order. `page` is 1-based and both
    /// parameters must already be validated as positive.
    pub async fn comments_page(
        &self,
        report_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<Option<CommentPage>> {
        if self.get(report_id).await?.is_none() {
            return Ok(None);
        }

        let paginator = comments::Entity::find()
            .filter(comments::Column::ReportId.eq(report_id))
            .order_by_asc(comments::Column::Id)
            .paginate(&self.conn, per_page);

        let total = paginator
            .num_items()
            .await
            .context("Failed to count comments")?;
        let total_pages = total.div_ceil(per_page);

        let page_comments = paginator
            .fetch_page(page - 1)
            .await
            .context("Failed to fetch comment page")?;

        let comment_ids: Vec<i32> = page_comments.iter().map(|c| c.id).collect();
        let likes = comment_likes::Entity::find()
            .filter(comment_likes::Column::CommentId.is_in(comment_ids))
            .all(&self.conn)
            .await
            .context("Failed to load comment likes")?;

        let mut liked_by: HashMap<i32, Vec<String>> = HashMap::new();
        for like in likes {
            liked_by
                .entry(like.comment_id)
                .or_default()
                .push(like.user_identifier);
        }

        let comments = page_comments
            .into_iter()
            .map(|comment| {
                let likers = liked_by.remove(&comment.id).unwrap_or_default();
                CommentWithLikes {
                    likes: likers.len() as u64,
                    liked_by: likers,
                    comment,
                }
            })
            .collect();

        Ok(Some(CommentPage {
            comments,
            total,
            total_pages,
            has_more: page * per_page < total,
        }))
    }

    /// Reports that have not been analyzed yet, oldest first, for the
    /// admin bulk pass.
    pub async fn list_unanalyzed(&self) -> Result<Vec<reports::Model>> {
        reports::Entity::find()
            .filter(reports::Column::SafetyScore.is_null())
            .order_by_asc(reports::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list unanalyzed reports")
    }
}

/// Millisecond timestamp plus a random alphanumeric suffix; unique enough
/// for a comment id within one report.
fn generate_comment_id() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| {
            const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
            CHARS[rng.random_range(0..CHARS.len())] as char
        })
        .collect();

    format!("{}{}", chrono::Utc::now().timestamp_millis(), suffix)
}
