use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use carpool_api::middleware::Claims;
use carpool_api::{app, AppState, AuthSettings};
use carpool_core::booking::{Booking, BookingStatus};
use carpool_core::driver_application::{ApplicationStatus, DriverApplication};
use carpool_core::feedback::Feedback;
use carpool_core::repository::{RideRepository, UserRepository};
use carpool_core::ride::Ride;
use carpool_core::user::{RoleStatus, User, UserRole};
use carpool_store::InMemoryStore;
use chrono::{NaiveDate, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

// ============================================================================
// Fixtures
// ============================================================================

fn user(name: &str, role: UserRole) -> User {
    User {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone_number: Some("+60123456789".to_string()),
        profile_picture: None,
        rating: None,
        car_model: None,
        plate_number: None,
        role,
        role_status: Some(RoleStatus::Approved),
        total_rides: 0,
    }
}

fn ride(driver_id: Uuid, total_fare: Option<Decimal>) -> Ride {
    Ride {
        id: Uuid::new_v4(),
        driver_id,
        date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        time: None,
        pickup_address: "Block A".to_string(),
        pickup_latitude: None,
        pickup_longitude: None,
        drop_address: "Main Library".to_string(),
        drop_latitude: None,
        drop_longitude: None,
        base_fare: None,
        distance: None,
        duration: None,
        is_surge: false,
        distance_fare: None,
        duration_fare: None,
        surge_multiplier: None,
        total_fare,
        price: None,
        seats: 4,
        preferences: vec![],
        status: "open".to_string(),
        status_label: String::new(),
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn booking(ride_id: Uuid, user_id: Uuid, status: &str) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        ride_id,
        user_id,
        seat_number: None,
        status: BookingStatus::from(status),
        booking_time: Some(Utc::now()),
        passenger: None,
    }
}

fn token_for(email: &str, secret: &str) -> String {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: email.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        aud: None,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

struct World {
    app: Router,
    store: InMemoryStore,
    admin: User,
    driver: User,
    rider: User,
}

impl World {
    async fn new() -> Self {
        let store = InMemoryStore::new();
        let admin = user("Ops", UserRole::Admin);
        let driver = user("Daniel", UserRole::Driver);
        let rider = user("Mei", UserRole::Passenger);
        for u in [&admin, &driver, &rider] {
            store.insert_user(u.clone()).await;
        }

        let state = AppState::in_memory(
            store.clone(),
            AuthSettings {
                secret: SECRET.to_string(),
                audience: None,
            },
        );
        Self {
            app: app(state),
            store,
            admin,
            driver,
            rider,
        }
    }

    fn token(&self, who: &User) -> String {
        token_for(&who.email, SECRET)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str, as_user: &User) -> (StatusCode, Value) {
        let token = self.token(as_user);
        self.send(Method::GET, uri, Some(&token), None).await
    }
}

// ============================================================================
// Authentication and gates
// ============================================================================

#[tokio::test]
async fn test_health_needs_no_token() {
    let world = World::new().await;
    let (status, body) = world.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let world = World::new().await;
    let (status, body) = world.send(Method::GET, "/api/rides", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let world = World::new().await;
    let token = token_for(&world.admin.email, "not-the-secret");
    let (status, _) = world.send(Method::GET, "/api/rides", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_unknown_email_is_unauthorized() {
    let world = World::new().await;
    let token = token_for("ghost@example.com", SECRET);
    let (status, _) = world.send(Method::GET, "/api/rides", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_is_forbidden_on_admin_routes() {
    let world = World::new().await;
    for uri in [
        "/api/admin/users",
        "/api/admin/stats",
        "/api/admin/driver-applications",
        "/api/bookings",
        "/api/ratings",
        "/api/feedback",
        "/api/feedback/stats",
    ] {
        let (status, _) = world.get(uri, &world.rider).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_suspended_account_is_refused() {
    let world = World::new().await;
    world
        .store
        .set_role_status(world.rider.id, RoleStatus::Suspended)
        .await
        .unwrap();
    let (status, _) = world.get("/api/rides", &world.rider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Rides and fare allocation
// ============================================================================

#[tokio::test]
async fn test_ride_detail_splits_fare_across_active_bookings() {
    let world = World::new().await;
    let r = ride(world.driver.id, Some(dec!(30.00)));
    world.store.insert_ride(r.clone()).await;
    for status in ["confirmed", "confirmed", "pending", "cancelled"] {
        world.store.insert_booking(booking(r.id, world.rider.id, status)).await;
    }

    let (status, body) = world.get(&format!("/api/rides/{}", r.id), &world.rider).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["fare_per_passenger"].as_f64(), Some(10.0));
    assert_eq!(data["status_label"], "Scheduled");

    let bookings = data["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 4);
    for b in bookings {
        let expected = if b["status"] == "cancelled" { 0.0 } else { 10.0 };
        assert_eq!(b["fare"].as_f64(), Some(expected));
        assert_eq!(b["users"]["name"], "Mei");
    }
}

#[tokio::test]
async fn test_ride_bookings_carry_summary() {
    let world = World::new().await;
    let r = ride(world.driver.id, Some(dec!(10.00)));
    world.store.insert_ride(r.clone()).await;
    for _ in 0..3 {
        world.store.insert_booking(booking(r.id, world.rider.id, "confirmed")).await;
    }

    let (status, body) = world
        .get(&format!("/api/rides/{}/bookings", r.id), &world.driver)
        .await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"]["summary"];
    assert_eq!(summary["totalBookings"], 3);
    assert_eq!(summary["activeBookings"], 3);
    assert_eq!(summary["cancelledBookings"], 0);
    assert_eq!(summary["farePerPassenger"].as_f64(), Some(3.33));
}

#[tokio::test]
async fn test_missing_ride_is_not_found() {
    let world = World::new().await;
    let (status, body) = world
        .get(&format!("/api/rides/{}", Uuid::new_v4()), &world.rider)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Ride not found");
}

#[tokio::test]
async fn test_ride_list_reports_active_counts_and_shares() {
    let world = World::new().await;
    let busy = ride(world.driver.id, Some(dec!(20.00)));
    let empty = ride(world.driver.id, Some(dec!(50.00)));
    world.store.insert_ride(busy.clone()).await;
    world.store.insert_ride(empty.clone()).await;
    world.store.insert_booking(booking(busy.id, world.rider.id, "confirmed")).await;
    world.store.insert_booking(booking(busy.id, world.rider.id, "confirmed")).await;
    world.store.insert_booking(booking(busy.id, world.rider.id, "cancelled")).await;

    let (status, body) = world.get("/api/rides", &world.rider).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 2);

    for item in body["data"]["items"].as_array().unwrap() {
        if item["id"] == json!(busy.id) {
            assert_eq!(item["active_bookings"], 2);
            assert_eq!(item["fare_per_passenger"].as_f64(), Some(10.0));
        } else {
            assert_eq!(item["active_bookings"], 0);
            assert_eq!(item["fare_per_passenger"].as_f64(), Some(0.0));
        }
        assert_eq!(item["users"]["name"], "Daniel");
    }
}

#[tokio::test]
async fn test_unknown_query_parameter_is_rejected() {
    let world = World::new().await;
    let (status, body) = world.get("/api/rides?colour=red", &world.rider).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_invalid_page_size_reports_field() {
    let world = World::new().await;
    let (status, body) = world.get("/api/rides?limit=500", &world.rider).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "limit");
}

#[tokio::test]
async fn test_status_filter_accepts_display_label() {
    let world = World::new().await;
    let mut legacy = ride(world.driver.id, None);
    legacy.status = "started".to_string();
    let mut current = ride(world.driver.id, None);
    current.status = "in_progress".to_string();
    world.store.insert_ride(legacy).await;
    world.store.insert_ride(current).await;
    world.store.insert_ride(ride(world.driver.id, None)).await;

    let (status, body) = world.get("/api/rides?status=Active", &world.rider).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_driver_creates_ride_as_open() {
    let world = World::new().await;
    let token = world.token(&world.driver);
    let (status, body) = world
        .send(
            Method::POST,
            "/api/rides",
            Some(&token),
            Some(json!({
                "date": "2026-11-03",
                "pickup_address": "  Block C ",
                "drop_address": "Sports Hall",
                "total_fare": 12.5,
                "seats": 3
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    assert_eq!(data["status"], "open");
    assert_eq!(data["status_label"], "Scheduled");
    assert_eq!(data["pickup_address"], "Block C");
    assert_eq!(data["driver_id"], json!(world.driver.id));
}

#[tokio::test]
async fn test_passenger_cannot_create_ride() {
    let world = World::new().await;
    let token = world.token(&world.rider);
    let (status, _) = world
        .send(
            Method::POST,
            "/api/rides",
            Some(&token),
            Some(json!({
                "date": "2026-11-03",
                "pickup_address": "Block C",
                "drop_address": "Sports Hall",
                "seats": 3
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_status_update_with_display_label_is_stored_canonically() {
    let world = World::new().await;
    let r = ride(world.driver.id, Some(dec!(30.00)));
    world.store.insert_ride(r.clone()).await;

    let token = world.token(&world.driver);
    let (status, body) = world
        .send(
            Method::PUT,
            &format!("/api/rides/{}/status", r.id),
            Some(&token),
            Some(json!({ "status": "Active" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in_progress");
    assert_eq!(body["data"]["status_label"], "Active");

    let stored = world.store.find_ride(r.id).await.unwrap();
    assert_eq!(stored.status, "in_progress");
}

#[tokio::test]
async fn test_other_driver_cannot_change_ride_status() {
    let world = World::new().await;
    let other = user("Farid", UserRole::Driver);
    world.store.insert_user(other.clone()).await;
    let r = ride(world.driver.id, None);
    world.store.insert_ride(r.clone()).await;

    let token = world.token(&other);
    let (status, _) = world
        .send(
            Method::PUT,
            &format!("/api/rides/{}/status", r.id),
            Some(&token),
            Some(json!({ "status": "ended" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_ride_status_is_rejected() {
    let world = World::new().await;
    let r = ride(world.driver.id, None);
    world.store.insert_ride(r.clone()).await;

    let token = world.token(&world.driver);
    let (status, body) = world
        .send(
            Method::PUT,
            &format!("/api/rides/{}/status", r.id),
            Some(&token),
            Some(json!({ "status": "paused" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "status");
}

// ============================================================================
// Bookings
// ============================================================================

#[tokio::test]
async fn test_booking_list_distributes_fare_per_ride() {
    let world = World::new().await;
    let a = ride(world.driver.id, Some(dec!(30.00)));
    let b = ride(world.driver.id, Some(dec!(10.00)));
    world.store.insert_ride(a.clone()).await;
    world.store.insert_ride(b.clone()).await;
    for _ in 0..3 {
        world.store.insert_booking(booking(a.id, world.rider.id, "confirmed")).await;
    }
    world.store.insert_booking(booking(a.id, world.rider.id, "cancelled")).await;
    world.store.insert_booking(booking(b.id, world.rider.id, "pending")).await;

    let (status, body) = world.get("/api/bookings", &world.admin).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);

    for item in items {
        let share = item["distributed_fare"].as_f64().unwrap();
        if item["status"] == "cancelled" {
            assert_eq!(share, 0.0);
        } else if item["ride_id"] == json!(a.id) {
            assert_eq!(share, 10.0);
        } else {
            assert_eq!(share, 10.0);
            assert_eq!(item["rides"]["status_label"], "Scheduled");
        }
    }
}

#[tokio::test]
async fn test_booking_status_filter_is_strict() {
    let world = World::new().await;
    let (status, _) = world.get("/api/bookings?status=refunded", &world.admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_cancels_booking() {
    let world = World::new().await;
    let r = ride(world.driver.id, Some(dec!(20.00)));
    let b = booking(r.id, world.rider.id, "confirmed");
    world.store.insert_ride(r.clone()).await;
    world.store.insert_booking(b.clone()).await;

    let token = world.token(&world.admin);
    let (status, body) = world
        .send(
            Method::PUT,
            &format!("/api/bookings/{}/status", b.id),
            Some(&token),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    let (_, body) = world
        .get(&format!("/api/bookings/{}", b.id), &world.admin)
        .await;
    assert_eq!(body["data"]["distributed_fare"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_driver_contacts_passenger() {
    let world = World::new().await;
    let r = ride(world.driver.id, None);
    let b = booking(r.id, world.rider.id, "confirmed");
    world.store.insert_ride(r.clone()).await;
    world.store.insert_booking(b.clone()).await;

    let token = world.token(&world.driver);
    let (status, body) = world
        .send(
            Method::POST,
            &format!("/api/bookings/{}/contact", b.id),
            Some(&token),
            Some(json!({ "subject": "Pickup", "message": "Running 5 minutes late" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["to"], "mei@example.com");
    assert_eq!(body["data"]["rideDetails"]["pickup"], "Block A");

    let token = world.token(&world.rider);
    let (status, _) = world
        .send(
            Method::POST,
            &format!("/api/bookings/{}/contact", b.id),
            Some(&token),
            Some(json!({ "subject": "Hi", "message": "Hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Admin: users and driver applications
// ============================================================================

#[tokio::test]
async fn test_admin_user_update_rejects_server_fields() {
    let world = World::new().await;
    let token = world.token(&world.admin);
    let (status, body) = world
        .send(
            Method::PATCH,
            &format!("/api/admin/users/{}", world.rider.id),
            Some(&token),
            Some(json!({ "name": "Mei Ling", "total_rides": 40 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "total_rides");

    let (status, body) = world
        .send(
            Method::PATCH,
            &format!("/api/admin/users/{}", world.rider.id),
            Some(&token),
            Some(json!({ "name": "Mei Ling" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Mei Ling");
}

#[tokio::test]
async fn test_deleted_user_is_deactivated_and_locked_out() {
    let world = World::new().await;
    let token = world.token(&world.admin);
    let uri = format!("/api/admin/users/{}", world.rider.id);
    for _ in 0..2 {
        let (status, body) = world.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["role_status"], "inactive");
    }
    let (status, _) = world.get("/api/rides", &world.rider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_stats_count_roles() {
    let world = World::new().await;
    let (status, body) = world.get("/api/admin/stats", &world.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalUsers"], 3);
    assert_eq!(body["data"]["totalDrivers"], 1);
    assert_eq!(body["data"]["totalPassengers"], 1);
}

#[tokio::test]
async fn test_application_approval_promotes_applicant_once() {
    let world = World::new().await;
    let application = DriverApplication {
        id: Uuid::new_v4(),
        user_id: world.rider.id,
        status: ApplicationStatus::Pending,
        application_date: Utc::now(),
        review_date: None,
        reviewer_id: None,
        review_notes: None,
        applicant: None,
    };
    world.store.insert_application(application.clone()).await;

    let token = world.token(&world.admin);
    let uri = format!("/api/admin/driver-applications/{}", application.id);
    let (status, body) = world
        .send(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "status": "approved", "reviewNotes": "  Licence checked  " })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["review_notes"], "Licence checked");
    assert_eq!(body["data"]["reviewer_id"], json!(world.admin.id));

    let promoted = world.store.get_user(world.rider.id).await.unwrap();
    assert_eq!(promoted.role, UserRole::Driver);
    assert_eq!(promoted.role_status, Some(RoleStatus::Approved));

    let (status, _) = world
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "status": "rejected" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_review_cannot_set_pending() {
    let world = World::new().await;
    let token = world.token(&world.admin);
    let (status, _) = world
        .send(
            Method::PUT,
            &format!("/api/admin/driver-applications/{}", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "status": "pending" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Ratings and feedback
// ============================================================================

#[tokio::test]
async fn test_duplicate_rating_conflicts() {
    let world = World::new().await;
    let r = ride(world.driver.id, None);
    let b = booking(r.id, world.rider.id, "confirmed");
    world.store.insert_ride(r.clone()).await;
    world.store.insert_booking(b.clone()).await;

    let token = world.token(&world.rider);
    let body = json!({
        "bookingId": b.id,
        "rideId": r.id,
        "targetUserId": world.driver.id,
        "rating": 4.5,
        "comment": "Smooth ride"
    });
    let (status, _) = world
        .send(Method::POST, "/api/ratings", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = world
        .send(Method::POST, "/api/ratings", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "You have already rated this booking");

    let (status, body) = world
        .get(&format!("/api/ratings/driver/{}", world.driver.id), &world.rider)
        .await;
    assert_eq!(status, StatusCode::OK);
    let view = &body["data"]["items"][0];
    assert_eq!(view["driverName"], "Daniel");
    assert_eq!(view["submittedBy"], "Mei");
    assert_eq!(view["pickupLocation"], "Block A");
}

#[tokio::test]
async fn test_rating_for_someone_other_than_the_driver_is_rejected() {
    let world = World::new().await;
    let r = ride(world.driver.id, None);
    let b = booking(r.id, world.rider.id, "confirmed");
    world.store.insert_ride(r.clone()).await;
    world.store.insert_booking(b.clone()).await;

    let token = world.token(&world.rider);
    let (status, body) = world
        .send(
            Method::POST,
            "/api/ratings",
            Some(&token),
            Some(json!({
                "bookingId": b.id,
                "rideId": r.id,
                "targetUserId": world.admin.id,
                "rating": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "targetUserId");

    let (_, body) = world
        .get(&format!("/api/ratings/driver/{}", world.admin.id), &world.rider)
        .await;
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_rating_out_of_range_is_rejected() {
    let world = World::new().await;
    let token = world.token(&world.rider);
    let (status, _) = world
        .send(
            Method::POST,
            "/api/ratings",
            Some(&token),
            Some(json!({
                "bookingId": Uuid::new_v4(),
                "rideId": Uuid::new_v4(),
                "targetUserId": world.driver.id,
                "rating": 6
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_suspend_and_unsuspend() {
    let world = World::new().await;
    let token = world.token(&world.admin);
    let (status, body) = world
        .send(
            Method::PUT,
            &format!("/api/ratings/suspend/{}", world.driver.id),
            Some(&token),
            Some(json!({ "reason": "Repeated no-shows" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_status"], "suspended");

    let (status, body) = world
        .send(
            Method::PUT,
            &format!("/api/ratings/unsuspend/{}", world.driver.id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role_status"], "approved");
}

#[tokio::test]
async fn test_feedback_stats_bucket_by_whole_star() {
    let world = World::new().await;
    for rating in [5.0, 4.5, 4.0, 2.0] {
        world
            .store
            .insert_feedback(Feedback {
                id: Uuid::new_v4(),
                user_id: world.rider.id,
                rating,
                feedback: "The app works well for me".to_string(),
                created_at: Utc::now(),
            })
            .await;
    }

    let (status, body) = world.get("/api/feedback/stats", &world.admin).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalFeedback"], 4);
    assert_eq!(data["averageRating"].as_f64(), Some(3.9));
    assert_eq!(data["ratingDistribution"]["4"], 2);
    assert_eq!(data["ratingDistribution"]["1"], 0);
}

#[tokio::test]
async fn test_feedback_submission_and_owner_listing() {
    let world = World::new().await;
    let token = world.token(&world.rider);
    let (status, _) = world
        .send(
            Method::POST,
            "/api/feedback",
            Some(&token),
            Some(json!({ "rating": 4, "feedback": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = world
        .send(
            Method::POST,
            "/api/feedback",
            Some(&token),
            Some(json!({ "rating": 4, "feedback": "Booking flow is quick" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/feedback/user/{}", world.rider.id);
    let (status, body) = world.get(&uri, &world.rider).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"][0]["type"], "SYSTEM");
    assert_eq!(body["data"]["items"][0]["comment"], "Booking flow is quick");

    let (status, _) = world.get(&uri, &world.driver).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
