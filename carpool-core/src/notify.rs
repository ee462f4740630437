use async_trait::async_trait;
use carpool_shared::Masked;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::booking::BookingContact;
use crate::ValidationErrors;

pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactRequest {
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.subject = self.subject.trim().to_string();
        self.message = self.message.trim().to_string();

        if self.subject.is_empty() {
            errors.push("subject", "Subject is required");
        } else if self.subject.chars().count() > MAX_SUBJECT_LEN {
            errors.push("subject", "Subject cannot exceed 200 characters");
        }
        if self.message.is_empty() {
            errors.push("message", "Message is required");
        } else if self.message.chars().count() > MAX_MESSAGE_LEN {
            errors.push("message", "Message cannot exceed 5000 characters");
        }
        errors.into_result(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RideDetails {
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

/// A driver's message to one of their passengers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub to: Masked<String>,
    pub from: Masked<String>,
    #[serde(skip)]
    pub sender_name: String,
    pub subject: String,
    #[serde(skip)]
    pub body: String,
    pub ride_details: RideDetails,
}

impl ContactMessage {
    pub fn new(
        contact: &BookingContact,
        sender_name: &str,
        sender_email: &str,
        request: ContactRequest,
    ) -> Self {
        Self {
            to: Masked(contact.passenger.email.clone()),
            from: Masked(sender_email.to_string()),
            sender_name: sender_name.to_string(),
            subject: request.subject,
            body: request.message,
            ride_details: RideDetails {
                pickup: contact.pickup_address.clone(),
                drop: contact.drop_address.clone(),
                date: contact.date,
                time: contact.time,
            },
        }
    }
}

/// Outbound channel to passengers.
#[async_trait]
pub trait PassengerNotifier: Send + Sync {
    async fn send(&self, message: &ContactMessage) -> anyhow::Result<()>;
}

/// Records the message in the log instead of delivering it.
pub struct LogNotifier;

#[async_trait]
impl PassengerNotifier for LogNotifier {
    async fn send(&self, message: &ContactMessage) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            from = %message.from,
            subject = %message.subject,
            body_len = message.body.len(),
            "Passenger contact message accepted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserSummary;
    use uuid::Uuid;

    fn contact() -> BookingContact {
        BookingContact {
            booking_id: Uuid::new_v4(),
            passenger: UserSummary {
                id: Uuid::new_v4(),
                name: "Mei".to_string(),
                email: "mei@example.com".to_string(),
                phone_number: None,
                profile_picture: None,
                car_model: None,
                plate_number: None,
                rating: None,
                total_rides: None,
            },
            driver_id: Uuid::new_v4(),
            pickup_address: Some("Block A".to_string()),
            drop_address: Some("Library".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 11, 2),
            time: None,
        }
    }

    #[test]
    fn test_blank_fields_are_rejected() {
        let req = ContactRequest {
            subject: "  ".to_string(),
            message: "".to_string(),
        };
        assert_eq!(req.validate().unwrap_err().fields().len(), 2);
    }

    #[test]
    fn test_message_serializes_details_without_body() {
        let req = ContactRequest {
            subject: " Pickup moved ".to_string(),
            message: "Meet at gate 2".to_string(),
        }
        .validate()
        .unwrap();
        let message = ContactMessage::new(&contact(), "Daniel", "daniel@example.com", req);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["to"], "mei@example.com");
        assert_eq!(json["subject"], "Pickup moved");
        assert_eq!(json["rideDetails"]["pickup"], "Block A");
        assert!(json.get("body").is_none());
    }

    #[tokio::test]
    async fn test_log_notifier_accepts() {
        let req = ContactRequest {
            subject: "Hi".to_string(),
            message: "Running late".to_string(),
        };
        let message = ContactMessage::new(&contact(), "Daniel", "daniel@example.com", req);
        assert!(LogNotifier.send(&message).await.is_ok());
    }
}
