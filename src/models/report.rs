// src/models/report.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{error::AppError, models::user::UserRef};

/// Which collection a report points into. Stored as `report_target_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_target_type", rename_all = "snake_case")]
pub enum ReportTargetType {
    #[serde(rename = "review")]
    Review,
    #[serde(rename = "communityPost")]
    CommunityPost,
}

impl FromStr for ReportTargetType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "review" => Ok(ReportTargetType::Review),
            "communityPost" => Ok(ReportTargetType::CommunityPost),
            _ => Err(AppError::BadRequest("Invalid report type".to_string())),
        }
    }
}

/// Reported content: a review or a community post, by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTarget {
    Review(i64),
    CommunityPost(i64),
}

impl ReportTarget {
    pub fn new(kind: ReportTargetType, id: i64) -> Self {
        match kind {
            ReportTargetType::Review => ReportTarget::Review(id),
            ReportTargetType::CommunityPost => ReportTarget::CommunityPost(id),
        }
    }

    pub fn kind(&self) -> ReportTargetType {
        match self {
            ReportTarget::Review(_) => ReportTargetType::Review,
            ReportTarget::CommunityPost(_) => ReportTargetType::CommunityPost,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ReportTarget::Review(id) | ReportTarget::CommunityPost(id) => *id,
        }
    }

    /// Table holding the referenced content.
    pub fn table(&self) -> &'static str {
        match self {
            ReportTarget::Review(_) => "reviews",
            ReportTarget::CommunityPost(_) => "community_posts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Harassment,
    Inappropriate,
    OffTopic,
    Other,
}

impl FromStr for ReportReason {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spam" => Ok(ReportReason::Spam),
            "harassment" => Ok(ReportReason::Harassment),
            "inappropriate" => Ok(ReportReason::Inappropriate),
            "off_topic" => Ok(ReportReason::OffTopic),
            "other" => Ok(ReportReason::Other),
            _ => Err(AppError::BadRequest("Invalid reason".to_string())),
        }
    }
}

/// Moderation status. Any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "resolved" => Ok(ReportStatus::Resolved),
            "dismissed" => Ok(ReportStatus::Dismissed),
            _ => Err(AppError::BadRequest("Invalid status".to_string())),
        }
    }
}

/// Raw report submission. Fields are loosely typed so that missing or
/// out-of-enum values surface as 400s rather than body rejections.
#[derive(Debug, Deserialize)]
pub struct SubmitReportRequest {
    pub r#type: Option<String>,
    #[serde(alias = "refId")]
    pub ref_id: Option<i64>,
    pub reason: Option<String>,
    pub comment: Option<String>,
}

/// A validated report ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReport {
    pub target: ReportTarget,
    pub reason: ReportReason,
    pub comment: Option<String>,
}

pub const MAX_REPORT_COMMENT: usize = 500;

impl TryFrom<SubmitReportRequest> for NewReport {
    type Error = AppError;

    fn try_from(req: SubmitReportRequest) -> Result<Self, Self::Error> {
        let (Some(kind), Some(ref_id), Some(reason)) = (req.r#type, req.ref_id, req.reason) else {
            return Err(AppError::BadRequest(
                "Type, ref_id and reason are required".to_string(),
            ));
        };

        let kind: ReportTargetType = kind.parse()?;
        let reason: ReportReason = reason.parse()?;

        let comment = req
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if comment.as_ref().is_some_and(|c| c.chars().count() > MAX_REPORT_COMMENT) {
            return Err(AppError::BadRequest(format!(
                "Comment must be at most {} characters",
                MAX_REPORT_COMMENT
            )));
        }

        Ok(NewReport {
            target: ReportTarget::new(kind, ref_id),
            reason,
            comment,
        })
    }
}

/// Body of the admin status update.
#[derive(Debug, Deserialize)]
pub struct UpdateReportStatusRequest {
    pub status: Option<String>,
}

/// Query parameters for the admin report listing.
#[derive(Debug, Default, Deserialize)]
pub struct ReportListParams {
    pub status: Option<String>,
}

/// Represents the 'reports' table joined with the reporter.
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: i64,
    pub reporter_id: i64,
    pub reporter_username: String,
    pub reporter_email: String,
    pub target_type: ReportTargetType,
    pub ref_id: i64,
    pub reason: ReportReason,
    pub comment: Option<String>,
    pub status: ReportStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub id: i64,
    pub reporter: UserRef,
    pub r#type: ReportTargetType,
    pub ref_id: i64,
    pub reason: ReportReason,
    pub comment: Option<String>,
    pub status: ReportStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ReportRow> for ReportResponse {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            reporter: UserRef {
                id: row.reporter_id,
                username: row.reporter_username,
                email: row.reporter_email,
            },
            r#type: row.target_type,
            ref_id: row.ref_id,
            reason: row.reason,
            comment: row.comment,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
