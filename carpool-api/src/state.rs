use carpool_core::notify::{LogNotifier, PassengerNotifier};
use carpool_core::repository::{
    BookingRepository, DriverApplicationRepository, FeedbackRepository, RatingRepository,
    RideRepository, UserRepository,
};
use carpool_store::{
    DbClient, InMemoryStore, StoreBookingRepository, StoreDriverApplicationRepository,
    StoreFeedbackRepository, StoreRatingRepository, StoreRideRepository, StoreUserRepository,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthSettings {
    /// HS256 secret shared with the identity provider.
    pub secret: String,
    pub audience: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub rides: Arc<dyn RideRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub applications: Arc<dyn DriverApplicationRepository>,
    pub ratings: Arc<dyn RatingRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub notifier: Arc<dyn PassengerNotifier>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn postgres(db: &DbClient, auth: AuthSettings) -> Self {
        Self {
            rides: Arc::new(StoreRideRepository::new(db.pool.clone())),
            bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
            users: Arc::new(StoreUserRepository::new(db.pool.clone())),
            applications: Arc::new(StoreDriverApplicationRepository::new(db.pool.clone())),
            ratings: Arc::new(StoreRatingRepository::new(db.pool.clone())),
            feedback: Arc::new(StoreFeedbackRepository::new(db.pool.clone())),
            notifier: Arc::new(LogNotifier),
            auth,
        }
    }

    /// Every repository backed by the same in-memory store.
    pub fn in_memory(store: InMemoryStore, auth: AuthSettings) -> Self {
        Self {
            rides: Arc::new(store.clone()),
            bookings: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            applications: Arc::new(store.clone()),
            ratings: Arc::new(store.clone()),
            feedback: Arc::new(store),
            notifier: Arc::new(LogNotifier),
            auth,
        }
    }
}
