use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::user::{RoleStatus, UserRole, UserSummary};
use crate::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: ApplicationStatus,
    pub application_date: DateTime<Utc>,
    pub review_date: Option<DateTime<Utc>>,
    pub reviewer_id: Option<Uuid>,
    pub review_notes: Option<String>,
    #[serde(rename = "user")]
    pub applicant: Option<UserSummary>,
}

/// The admin's verdict. Only a terminal status can be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn application_status(self) -> ApplicationStatus {
        match self {
            ReviewDecision::Approved => ApplicationStatus::Approved,
            ReviewDecision::Rejected => ApplicationStatus::Rejected,
        }
    }

    /// Role the applicant ends up with.
    pub fn resulting_role(self) -> UserRole {
        match self {
            ReviewDecision::Approved => UserRole::Driver,
            ReviewDecision::Rejected => UserRole::Passenger,
        }
    }

    pub fn resulting_role_status(self) -> RoleStatus {
        match self {
            ReviewDecision::Approved => RoleStatus::Approved,
            ReviewDecision::Rejected => RoleStatus::Rejected,
        }
    }
}

pub const MAX_REVIEW_NOTES: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ReviewRequest {
    pub status: ReviewDecision,
    #[serde(default)]
    pub review_notes: Option<String>,
}

impl ReviewRequest {
    /// Blank notes are dropped.
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let notes = self
            .review_notes
            .take()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if let Some(n) = &notes {
            if n.chars().count() > MAX_REVIEW_NOTES {
                return Err(ValidationErrors::single(
                    "reviewNotes",
                    "Review notes cannot exceed 1000 characters",
                ));
            }
        }
        self.review_notes = notes;
        Ok(self)
    }
}

/// Everything the store needs to apply one review atomically.
#[derive(Debug, Clone)]
pub struct ApplicationReview {
    pub decision: ReviewDecision,
    pub reviewer_id: Uuid,
    pub notes: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_effects() {
        assert_eq!(ReviewDecision::Approved.resulting_role(), UserRole::Driver);
        assert_eq!(ReviewDecision::Approved.resulting_role_status(), RoleStatus::Approved);
        assert_eq!(ReviewDecision::Rejected.resulting_role(), UserRole::Passenger);
        assert_eq!(ReviewDecision::Rejected.resulting_role_status(), RoleStatus::Rejected);
        assert_eq!(ReviewDecision::Rejected.application_status(), ApplicationStatus::Rejected);
    }

    #[test]
    fn test_pending_is_not_a_decision() {
        let parsed: Result<ReviewRequest, _> = serde_json::from_str(r#"{"status": "pending"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_notes_are_trimmed_and_bounded() {
        let req: ReviewRequest =
            serde_json::from_str(r#"{"status": "approved", "reviewNotes": "  docs verified  "}"#).unwrap();
        assert_eq!(req.validate().unwrap().review_notes.as_deref(), Some("docs verified"));

        let req: ReviewRequest =
            serde_json::from_str(r#"{"status": "rejected", "reviewNotes": "   "}"#).unwrap();
        assert_eq!(req.validate().unwrap().review_notes, None);

        let long = "x".repeat(MAX_REVIEW_NOTES + 1);
        let req = ReviewRequest {
            status: ReviewDecision::Rejected,
            review_notes: Some(long),
        };
        assert!(req.validate().is_err());
    }
}
