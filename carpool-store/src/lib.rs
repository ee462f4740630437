pub mod app_config;
pub mod application_repo;
pub mod booking_repo;
pub mod database;
pub mod memory;
pub mod review_repo;
pub mod ride_repo;
mod rows;
pub mod user_repo;

pub use application_repo::StoreDriverApplicationRepository;
pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use memory::InMemoryStore;
pub use review_repo::{StoreFeedbackRepository, StoreRatingRepository};
pub use ride_repo::StoreRideRepository;
pub use user_repo::StoreUserRepository;
