use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Passenger,
    Driver,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Passenger => "passenger",
            UserRole::Driver => "driver",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passenger" => Ok(UserRole::Passenger),
            "driver" => Ok(UserRole::Driver),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown user role '{}'", other)),
        }
    }
}

/// Account standing, independent of the role itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleStatus {
    Approved,
    Inactive,
    Pending,
    Suspended,
    Rejected,
}

impl RoleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleStatus::Approved => "approved",
            RoleStatus::Inactive => "inactive",
            RoleStatus::Pending => "pending",
            RoleStatus::Suspended => "suspended",
            RoleStatus::Rejected => "rejected",
        }
    }

    /// Accounts in these states may not use the API.
    pub fn is_locked(&self) -> bool {
        matches!(self, RoleStatus::Inactive | RoleStatus::Suspended)
    }
}

impl fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(RoleStatus::Approved),
            "inactive" => Ok(RoleStatus::Inactive),
            "pending" => Ok(RoleStatus::Pending),
            "suspended" => Ok(RoleStatus::Suspended),
            "rejected" => Ok(RoleStatus::Rejected),
            other => Err(format!("unknown role status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub rating: Option<f64>,
    pub car_model: Option<String>,
    pub plate_number: Option<String>,
    pub role: UserRole,
    pub role_status: Option<RoleStatus>,
    pub total_rides: i32,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            profile_picture: self.profile_picture.clone(),
            car_model: self.car_model.clone(),
            plate_number: self.plate_number.clone(),
            rating: self.rating,
            total_rides: Some(self.total_rides),
        }
    }
}

/// The slice of a user joined into ride, booking, and review records.
/// Driver-only columns are omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rides: Option<i32>,
}

impl UserSummary {
    /// Drops the driver-only columns, for passenger joins.
    pub fn as_passenger(mut self) -> Self {
        self.car_model = None;
        self.plate_number = None;
        self.rating = None;
        self.total_rides = None;
        self
    }
}

/// Admin edit of a user. Server-managed columns are accepted by the
/// deserializer only so they can be rejected with a precise message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<UserRole>,
    pub role_status: Option<RoleStatus>,
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    created_at: Option<serde_json::Value>,
    #[serde(default)]
    total_rides: Option<serde_json::Value>,
    #[serde(default)]
    rating: Option<serde_json::Value>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.role.is_none()
            && self.role_status.is_none()
    }

    /// Trims text fields and checks every constraint, reporting all failures at once.
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.id.is_some() {
            errors.push("id", "Cannot update user ID");
        }
        if self.created_at.is_some() {
            errors.push("created_at", "Cannot update created_at timestamp");
        }
        if self.total_rides.is_some() {
            errors.push("total_rides", "Cannot directly update total_rides");
        }
        if self.rating.is_some() {
            errors.push("rating", "Cannot directly update user rating");
        }

        if let Some(name) = self.name.take() {
            let name = name.trim().to_string();
            let len = name.chars().count();
            if !(2..=50).contains(&len) {
                errors.push("name", "Name must be between 2 and 50 characters");
            }
            self.name = Some(name);
        }

        if let Some(email) = self.email.take() {
            let email = email.trim().to_string();
            if !is_valid_email(&email) {
                errors.push("email", "Invalid email format");
            }
            self.email = Some(email);
        }

        if let Some(phone) = self.phone_number.as_deref() {
            if !is_valid_phone(phone) {
                errors.push("phone_number", "Invalid phone number format");
            }
        }

        if errors.is_empty() && self.is_empty() {
            errors.push("body", "At least one updatable field is required");
        }

        errors.into_result(self)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Digits with an optional leading `+`, spaces and dashes allowed, 7 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return false;
    }
    let digits = body.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<UserUpdate, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_valid_update_is_trimmed() {
        let update = parse(r#"{"name": "  Aina  ", "email": " aina@example.com "}"#)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(update.name.as_deref(), Some("Aina"));
        assert_eq!(update.email.as_deref(), Some("aina@example.com"));
    }

    #[test]
    fn test_short_name_and_bad_email_are_both_reported() {
        let errors = parse(r#"{"name": "A", "email": "not-an-email"}"#)
            .unwrap()
            .validate()
            .unwrap_err();
        let fields: Vec<&str> = errors.fields().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email"]);
    }

    #[test]
    fn test_server_managed_fields_are_rejected() {
        let errors = parse(r#"{"name": "Valid Name", "total_rides": 9, "rating": 5}"#)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(errors.fields().iter().any(|e| e.message == "Cannot directly update total_rides"));
        assert!(errors.fields().iter().any(|e| e.message == "Cannot directly update user rating"));
    }

    #[test]
    fn test_unknown_fields_fail_deserialization() {
        assert!(parse(r#"{"nickname": "x"}"#).is_err());
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let errors = parse("{}").unwrap().validate().unwrap_err();
        assert_eq!(errors.fields()[0].field, "body");
    }

    #[test]
    fn test_role_and_status_parse() {
        let update = parse(r#"{"role": "driver", "role_status": "suspended"}"#)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(update.role, Some(UserRole::Driver));
        assert_eq!(update.role_status, Some(RoleStatus::Suspended));
        assert!(parse(r#"{"role": "pilot"}"#).is_err());
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("+60 12-345 6789"));
        assert!(is_valid_phone("0123456789"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_locked_statuses() {
        assert!(RoleStatus::Inactive.is_locked());
        assert!(RoleStatus::Suspended.is_locked());
        assert!(!RoleStatus::Approved.is_locked());
        assert!(!RoleStatus::Pending.is_locked());
    }
}
