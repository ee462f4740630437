use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::rating::is_valid_rating;
use crate::user::UserSummary;
use crate::ValidationErrors;

pub const MIN_FEEDBACK_LEN: usize = 10;

/// Feedback about the service itself, not a particular ride.
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rating: f64,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub feedback: Feedback,
    pub submitter: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    pub id: Uuid,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub submitted_by: String,
    pub submitted_by_email: Option<String>,
    pub submitted_by_phone: Option<String>,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<FeedbackRecord> for FeedbackView {
    fn from(record: FeedbackRecord) -> Self {
        let FeedbackRecord {
            feedback,
            submitter,
        } = record;
        Self {
            id: feedback.id,
            rating: feedback.rating,
            comment: feedback.feedback,
            created_at: feedback.created_at,
            submitted_by: submitter
                .as_ref()
                .map(|u| u.name.clone())
                .unwrap_or_else(|| "Unknown User".to_string()),
            submitted_by_email: submitter.as_ref().map(|u| u.email.clone()),
            submitted_by_phone: submitter.and_then(|u| u.phone_number),
            user_id: feedback.user_id,
            kind: "SYSTEM",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewFeedback {
    pub rating: f64,
    pub feedback: String,
}

impl NewFeedback {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !is_valid_rating(self.rating) {
            errors.push("rating", "Rating must be between 1.0 and 5.0");
        }
        self.feedback = self.feedback.trim().to_string();
        if self.feedback.chars().count() < MIN_FEEDBACK_LEN {
            errors.push("feedback", "Feedback must be at least 10 characters long");
        }
        errors.into_result(self)
    }
}

/// Aggregate over feedback rows sharing `floor(rating)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingBucket {
    pub bucket: i32,
    pub count: i64,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total_feedback: i64,
    /// Mean rating, one decimal place.
    pub average_rating: f64,
    /// Counts keyed by whole star, always containing 1 through 5.
    pub rating_distribution: BTreeMap<u8, i64>,
}

impl FeedbackStats {
    pub fn from_buckets(buckets: &[RatingBucket]) -> Self {
        let mut distribution: BTreeMap<u8, i64> = (1..=5).map(|star| (star, 0)).collect();
        let mut total = 0i64;
        let mut sum = 0.0f64;

        for bucket in buckets {
            total += bucket.count;
            sum += bucket.sum;
            if let Ok(star) = u8::try_from(bucket.bucket) {
                if let Some(slot) = distribution.get_mut(&star) {
                    *slot += bucket.count;
                }
            }
        }

        let average = if total > 0 {
            (sum / total as f64 * 10.0).round() / 10.0
        } else {
            0.0
        };

        Self {
            total_feedback: total,
            average_rating: average,
            rating_distribution: distribution,
        }
    }
}
