use async_trait::async_trait;
use carpool_core::booking::{Booking, BookingContact, BookingListing, BookingStatus};
use carpool_core::driver_application::{ApplicationReview, ApplicationStatus, DriverApplication};
use carpool_core::feedback::{Feedback, FeedbackRecord, NewFeedback, RatingBucket};
use carpool_core::query::{
    ApplicationFilter, ApplicationSort, BookingFilter, BookingSort, Page, PageRequest,
    ReviewFilter, ReviewSort, RideFilter, RideSort, SortOrder, UserFilter, UserSort,
};
use carpool_core::rating::{NewRating, RatedDriver, RatedRide, RatingRecord, RideRating};
use carpool_core::repository::{
    BookingRepository, DashboardStats, DriverApplicationRepository, FeedbackRepository,
    RatingRepository, RideRepository, UserRepository,
};
use carpool_core::ride::{self, NewRide, Ride, RideRecord, RideStatus, RideWithDriver};
use carpool_core::user::{RoleStatus, User, UserRole, UserSummary, UserUpdate};
use carpool_core::{StoreError, StoreResult};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store implementing every repository trait.
///
/// Joins are resolved on read, the same way the Postgres queries resolve
/// them, so handlers behave identically against either backend. Used by the
/// API integration tests and for local runs without a database.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    rides: HashMap<Uuid, Ride>,
    bookings: HashMap<Uuid, Booking>,
    applications: HashMap<Uuid, DriverApplication>,
    ratings: HashMap<Uuid, RideRating>,
    feedback: HashMap<Uuid, Feedback>,
}

impl State {
    fn driver_summary(&self, id: Uuid) -> Option<UserSummary> {
        self.users.get(&id).map(User::summary)
    }

    fn person_summary(&self, id: Uuid) -> Option<UserSummary> {
        self.users.get(&id).map(|u| u.summary().as_passenger())
    }

    fn with_passenger(&self, booking: &Booking) -> Booking {
        let mut booking = booking.clone();
        booking.passenger = self.person_summary(booking.user_id);
        booking
    }

    fn listing(&self, booking: &Booking) -> BookingListing {
        BookingListing {
            booking: self.with_passenger(booking),
            ride: self
                .rides
                .get(&booking.ride_id)
                .map(|r| r.summary(self.driver_summary(r.driver_id))),
        }
    }

    fn application(&self, application: &DriverApplication) -> DriverApplication {
        let mut application = application.clone();
        application.applicant = self.person_summary(application.user_id);
        application
    }

    fn rating_record(&self, rating: &RideRating) -> RatingRecord {
        RatingRecord {
            rating: rating.clone(),
            submitter: self.person_summary(rating.user_id),
            driver: self.users.get(&rating.target_user_id).map(|u| RatedDriver {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                phone_number: u.phone_number.clone(),
                role: u.role,
                role_status: u.role_status,
            }),
            ride: self.rides.get(&rating.ride_id).map(|r| RatedRide {
                id: r.id,
                date: r.date,
                pickup_address: r.pickup_address.clone(),
                drop_address: r.drop_address.clone(),
            }),
        }
    }

    fn feedback_record(&self, feedback: &Feedback) -> FeedbackRecord {
        FeedbackRecord {
            feedback: feedback.clone(),
            submitter: self.person_summary(feedback.user_id),
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Stored as given, including a non-canonical `status`.
    pub async fn insert_ride(&self, mut ride: Ride) {
        ride.status_label = ride::display_of(&ride.status);
        self.state.write().await.rides.insert(ride.id, ride);
    }

    pub async fn insert_booking(&self, mut booking: Booking) {
        booking.passenger = None;
        self.state.write().await.bookings.insert(booking.id, booking);
    }

    pub async fn insert_application(&self, mut application: DriverApplication) {
        application.applicant = None;
        self.state
            .write()
            .await
            .applications
            .insert(application.id, application);
    }

    pub async fn insert_feedback(&self, feedback: Feedback) {
        self.state.write().await.feedback.insert(feedback.id, feedback);
    }
}

// ============================================================================
// Ordering and paging helpers
// ============================================================================

fn directed(ord: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

/// Missing values sort after present ones in either direction.
fn nulls_last<T: PartialOrd>(a: Option<T>, b: Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.partial_cmp(&b).unwrap_or(Ordering::Equal), order),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect();
    Page::new(items, total, page)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn ride_matches(ride: &Ride, filter: &RideFilter) -> bool {
    filter.status.as_ref().is_none_or(|s| s.matches(&ride.status))
        && filter.driver_id.is_none_or(|d| ride.driver_id == d)
        && filter.date.is_none_or(|d| ride.date == d)
        && filter.start_date.is_none_or(|d| ride.date >= d)
        && filter.end_date.is_none_or(|d| ride.date <= d)
        && filter
            .pickup
            .as_deref()
            .is_none_or(|p| contains_ci(&ride.pickup_address, p))
        && filter
            .destination
            .as_deref()
            .is_none_or(|p| contains_ci(&ride.drop_address, p))
        && filter.min_seats.is_none_or(|n| ride.seats >= n)
}

// ============================================================================
// Repositories
// ============================================================================

#[async_trait]
impl RideRepository for InMemoryStore {
    async fn list_rides(&self, filter: &RideFilter) -> StoreResult<Page<RideWithDriver>> {
        let state = self.state.read().await;
        let mut rides: Vec<&Ride> = state
            .rides
            .values()
            .filter(|r| ride_matches(r, filter))
            .collect();
        rides.sort_by(|a, b| {
            let ord = match filter.sort {
                RideSort::Date => nulls_last(Some(a.date), Some(b.date), filter.order),
                RideSort::CreatedAt => nulls_last(Some(a.created_at), Some(b.created_at), filter.order),
                RideSort::TotalFare => nulls_last(a.total_fare, b.total_fare, filter.order),
                RideSort::Seats => nulls_last(Some(a.seats), Some(b.seats), filter.order),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });

        let items = rides
            .into_iter()
            .map(|r| RideWithDriver {
                ride: r.clone(),
                driver: state.driver_summary(r.driver_id),
            })
            .collect();
        Ok(paginate(items, filter.page))
    }

    async fn get_ride(&self, id: Uuid) -> StoreResult<RideRecord> {
        let state = self.state.read().await;
        let ride = state
            .rides
            .get(&id)
            .ok_or_else(|| StoreError::NotFound("Ride".into()))?;

        let mut bookings: Vec<&Booking> = state.bookings.values().filter(|b| b.ride_id == id).collect();
        bookings.sort_by(|a, b| {
            nulls_last(a.booking_time, b.booking_time, SortOrder::Asc).then_with(|| a.id.cmp(&b.id))
        });

        Ok(RideRecord {
            ride: ride.clone(),
            driver: state.driver_summary(ride.driver_id),
            bookings: bookings.into_iter().map(|b| state.with_passenger(b)).collect(),
        })
    }

    async fn find_ride(&self, id: Uuid) -> StoreResult<Ride> {
        self.state
            .read()
            .await
            .rides
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Ride".into()))
    }

    async fn create_ride(&self, driver_id: Uuid, new: &NewRide) -> StoreResult<Ride> {
        let status = RideStatus::Open;
        let ride = Ride {
            id: Uuid::new_v4(),
            driver_id,
            date: new.date,
            time: new.time,
            pickup_address: new.pickup_address.clone(),
            pickup_latitude: new.pickup_latitude,
            pickup_longitude: new.pickup_longitude,
            drop_address: new.drop_address.clone(),
            drop_latitude: new.drop_latitude,
            drop_longitude: new.drop_longitude,
            base_fare: new.base_fare,
            distance: new.distance,
            duration: new.duration,
            is_surge: new.is_surge,
            distance_fare: new.distance_fare,
            duration_fare: new.duration_fare,
            surge_multiplier: new.surge_multiplier,
            total_fare: new.total_fare,
            price: new.price,
            seats: new.seats,
            preferences: new.preferences.clone(),
            status: status.storage().to_string(),
            status_label: status.display().to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.state.write().await.rides.insert(ride.id, ride.clone());
        Ok(ride)
    }

    async fn update_ride_status(&self, id: Uuid, status: RideStatus) -> StoreResult<Ride> {
        let mut state = self.state.write().await;
        let ride = state
            .rides
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Ride".into()))?;
        ride.status = status.storage().to_string();
        ride.status_label = status.display().to_string();
        ride.updated_at = Some(Utc::now());
        Ok(ride.clone())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Page<BookingListing>> {
        let state = self.state.read().await;
        let ride_date = |b: &Booking| state.rides.get(&b.ride_id).map(|r| r.date);

        let mut bookings: Vec<&Booking> = state
            .bookings
            .values()
            .filter(|b| {
                filter.status.as_ref().is_none_or(|s| &b.status == s)
                    && filter.user_id.is_none_or(|u| b.user_id == u)
                    && filter.ride_id.is_none_or(|r| b.ride_id == r)
                    && filter
                        .start_date
                        .is_none_or(|d| ride_date(b).is_some_and(|rd| rd >= d))
                    && filter
                        .end_date
                        .is_none_or(|d| ride_date(b).is_some_and(|rd| rd <= d))
            })
            .collect();
        bookings.sort_by(|a, b| {
            let ord = match filter.sort {
                BookingSort::BookingTime => nulls_last(a.booking_time, b.booking_time, filter.order),
                BookingSort::SeatNumber => nulls_last(a.seat_number, b.seat_number, filter.order),
                BookingSort::Status => {
                    nulls_last(Some(a.status.as_str()), Some(b.status.as_str()), filter.order)
                }
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });

        let items = bookings.into_iter().map(|b| state.listing(b)).collect();
        Ok(paginate(items, filter.page))
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<BookingListing> {
        let state = self.state.read().await;
        state
            .bookings
            .get(&id)
            .map(|b| state.listing(b))
            .ok_or_else(|| StoreError::NotFound("Booking".into()))
    }

    async fn bookings_for_ride(&self, ride_id: Uuid) -> StoreResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<&Booking> = state.bookings.values().filter(|b| b.ride_id == ride_id).collect();
        bookings.sort_by(|a, b| {
            nulls_last(a.booking_time, b.booking_time, SortOrder::Asc).then_with(|| a.id.cmp(&b.id))
        });
        Ok(bookings.into_iter().map(|b| state.with_passenger(b)).collect())
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<Booking> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Booking".into()))?;
        booking.status = status;
        Ok(booking.clone())
    }

    async fn active_counts(&self, ride_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        let state = self.state.read().await;
        let mut counts = HashMap::new();
        for booking in state.bookings.values() {
            if ride_ids.contains(&booking.ride_id) && !booking.status.is_cancelled() {
                *counts.entry(booking.ride_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn booking_contact(&self, id: Uuid) -> StoreResult<BookingContact> {
        let state = self.state.read().await;
        let booking = state
            .bookings
            .get(&id)
            .ok_or_else(|| StoreError::NotFound("Booking".into()))?;
        let ride = state
            .rides
            .get(&booking.ride_id)
            .ok_or_else(|| StoreError::NotFound("Booking".into()))?;
        let passenger = state
            .person_summary(booking.user_id)
            .ok_or_else(|| StoreError::Corrupt(format!("booking {} has no passenger", id)))?;

        Ok(BookingContact {
            booking_id: booking.id,
            passenger,
            driver_id: ride.driver_id,
            pickup_address: Some(ride.pickup_address.clone()),
            drop_address: Some(ride.drop_address.clone()),
            date: Some(ride.date),
            time: ride.time,
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("User".into()))
    }

    async fn list_users(&self, filter: &UserFilter) -> StoreResult<Page<User>> {
        let state = self.state.read().await;
        let mut users: Vec<&User> = state
            .users
            .values()
            .filter(|u| {
                filter.role.is_none_or(|r| u.role == r)
                    && filter.name.as_deref().is_none_or(|n| contains_ci(&u.name, n))
                    && filter.email.as_deref().is_none_or(|e| contains_ci(&u.email, e))
            })
            .collect();
        users.sort_by(|a, b| {
            let ord = match filter.sort {
                UserSort::CreatedAt => nulls_last(Some(a.created_at), Some(b.created_at), filter.order),
                UserSort::TotalRides => nulls_last(Some(a.total_rides), Some(b.total_rides), filter.order),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        Ok(paginate(users.into_iter().cloned().collect(), filter.page))
    }

    async fn update_user(&self, id: Uuid, update: &UserUpdate) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if let Some(email) = &update.email {
            let taken = state
                .users
                .values()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(StoreError::Conflict("email already in use".into()));
            }
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("User".into()))?;
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        if let Some(phone) = &update.phone_number {
            user.phone_number = Some(phone.clone());
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(status) = update.role_status {
            user.role_status = Some(status);
        }
        Ok(user.clone())
    }

    async fn set_role_status(&self, id: Uuid, status: RoleStatus) -> StoreResult<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("User".into()))?;
        user.role_status = Some(status);
        Ok(user.clone())
    }

    async fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let state = self.state.read().await;
        let count_role = |role: UserRole| state.users.values().filter(|u| u.role == role).count() as i64;
        let active_rides = state
            .rides
            .values()
            .filter(|r| {
                matches!(
                    RideStatus::from_storage(&r.status),
                    Some(RideStatus::Open | RideStatus::InProgress)
                )
            })
            .count() as i64;

        Ok(DashboardStats {
            total_users: state.users.len() as i64,
            total_drivers: count_role(UserRole::Driver),
            total_passengers: count_role(UserRole::Passenger),
            pending_applications: state
                .applications
                .values()
                .filter(|a| a.status == ApplicationStatus::Pending)
                .count() as i64,
            total_rides: state.rides.len() as i64,
            active_rides,
            total_bookings: state.bookings.len() as i64,
        })
    }
}

#[async_trait]
impl DriverApplicationRepository for InMemoryStore {
    async fn list_applications(&self, filter: &ApplicationFilter) -> StoreResult<Page<DriverApplication>> {
        let state = self.state.read().await;
        let mut applications: Vec<&DriverApplication> = state
            .applications
            .values()
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .collect();
        applications.sort_by(|a, b| {
            let ord = match filter.sort {
                ApplicationSort::ApplicationDate => {
                    nulls_last(Some(a.application_date), Some(b.application_date), filter.order)
                }
                ApplicationSort::ReviewDate => nulls_last(a.review_date, b.review_date, filter.order),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });
        let items = applications.into_iter().map(|a| state.application(a)).collect();
        Ok(paginate(items, filter.page))
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<DriverApplication> {
        let state = self.state.read().await;
        state
            .applications
            .get(&id)
            .map(|a| state.application(a))
            .ok_or_else(|| StoreError::NotFound("Driver application".into()))
    }

    async fn review_application(
        &self,
        id: Uuid,
        review: &ApplicationReview,
    ) -> StoreResult<DriverApplication> {
        let mut state = self.state.write().await;
        let (status, user_id) = state
            .applications
            .get(&id)
            .map(|a| (a.status, a.user_id))
            .ok_or_else(|| StoreError::NotFound("Driver application".into()))?;
        if status != ApplicationStatus::Pending {
            return Err(StoreError::Conflict(format!(
                "Driver application has already been {}",
                status
            )));
        }
        // check both rows before touching either
        if !state.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("User".into()));
        }

        if let Some(user) = state.users.get_mut(&user_id) {
            user.role = review.decision.resulting_role();
            user.role_status = Some(review.decision.resulting_role_status());
        }
        if let Some(application) = state.applications.get_mut(&id) {
            application.status = review.decision.application_status();
            application.review_date = Some(review.reviewed_at);
            application.reviewer_id = Some(review.reviewer_id);
            application.review_notes = review.notes.clone();
        }

        state
            .applications
            .get(&id)
            .map(|a| state.application(a))
            .ok_or_else(|| StoreError::NotFound("Driver application".into()))
    }
}

fn sort_reviews<T>(items: &mut [&T], filter: &ReviewFilter, key: impl Fn(&T) -> (chrono::DateTime<Utc>, f64, Uuid)) {
    items.sort_by(|a, b| {
        let (a_at, a_rating, a_id) = key(a);
        let (b_at, b_rating, b_id) = key(b);
        let ord = match filter.sort {
            ReviewSort::CreatedAt => nulls_last(Some(a_at), Some(b_at), filter.order),
            ReviewSort::Rating => nulls_last(Some(a_rating), Some(b_rating), filter.order),
        };
        ord.then_with(|| a_id.cmp(&b_id))
    });
}

#[async_trait]
impl RatingRepository for InMemoryStore {
    async fn list_ratings(&self, filter: &ReviewFilter) -> StoreResult<Page<RatingRecord>> {
        let state = self.state.read().await;
        let mut ratings: Vec<&RideRating> = state.ratings.values().collect();
        sort_reviews(&mut ratings, filter, |r| (r.created_at, r.rating, r.id));
        let items = ratings.into_iter().map(|r| state.rating_record(r)).collect();
        Ok(paginate(items, filter.page))
    }

    async fn ratings_for_driver(&self, driver_id: Uuid, page: PageRequest) -> StoreResult<Page<RatingRecord>> {
        let state = self.state.read().await;
        let filter = ReviewFilter::latest(page);
        let mut ratings: Vec<&RideRating> = state
            .ratings
            .values()
            .filter(|r| r.target_user_id == driver_id)
            .collect();
        sort_reviews(&mut ratings, &filter, |r| (r.created_at, r.rating, r.id));
        let items = ratings.into_iter().map(|r| state.rating_record(r)).collect();
        Ok(paginate(items, page))
    }

    async fn create_rating(&self, user_id: Uuid, new: &NewRating) -> StoreResult<RideRating> {
        let mut state = self.state.write().await;
        let driver_id = state
            .bookings
            .get(&new.booking_id)
            .filter(|b| b.ride_id == new.ride_id && b.user_id == user_id)
            .and_then(|b| state.rides.get(&b.ride_id))
            .map(|r| r.driver_id)
            .ok_or_else(|| StoreError::NotFound("Booking".into()))?;
        new.check_target(driver_id)?;
        let duplicate = state
            .ratings
            .values()
            .any(|r| r.booking_id == new.booking_id && r.user_id == user_id);
        if duplicate {
            return Err(StoreError::Conflict("You have already rated this booking".into()));
        }

        let rating = RideRating {
            id: Uuid::new_v4(),
            booking_id: new.booking_id,
            ride_id: new.ride_id,
            user_id,
            target_user_id: new.target_user_id,
            rating: new.rating,
            comment: new.comment.clone(),
            created_at: Utc::now(),
        };
        state.ratings.insert(rating.id, rating.clone());
        Ok(rating)
    }
}

#[async_trait]
impl FeedbackRepository for InMemoryStore {
    async fn list_feedback(&self, filter: &ReviewFilter) -> StoreResult<Page<FeedbackRecord>> {
        let state = self.state.read().await;
        let mut feedback: Vec<&Feedback> = state.feedback.values().collect();
        sort_reviews(&mut feedback, filter, |f| (f.created_at, f.rating, f.id));
        let items = feedback.into_iter().map(|f| state.feedback_record(f)).collect();
        Ok(paginate(items, filter.page))
    }

    async fn feedback_by_user(&self, user_id: Uuid, page: PageRequest) -> StoreResult<Page<FeedbackRecord>> {
        let state = self.state.read().await;
        let filter = ReviewFilter::latest(page);
        let mut feedback: Vec<&Feedback> = state.feedback.values().filter(|f| f.user_id == user_id).collect();
        sort_reviews(&mut feedback, &filter, |f| (f.created_at, f.rating, f.id));
        let items = feedback.into_iter().map(|f| state.feedback_record(f)).collect();
        Ok(paginate(items, page))
    }

    async fn create_feedback(&self, user_id: Uuid, new: &NewFeedback) -> StoreResult<Feedback> {
        let feedback = Feedback {
            id: Uuid::new_v4(),
            user_id,
            rating: new.rating,
            feedback: new.feedback.clone(),
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .feedback
            .insert(feedback.id, feedback.clone());
        Ok(feedback)
    }

    async fn rating_buckets(&self) -> StoreResult<Vec<RatingBucket>> {
        let state = self.state.read().await;
        let mut buckets: HashMap<i32, RatingBucket> = HashMap::new();
        for f in state.feedback.values() {
            let star = f.rating.floor() as i32;
            let bucket = buckets.entry(star).or_insert(RatingBucket {
                bucket: star,
                count: 0,
                sum: 0.0,
            });
            bucket.count += 1;
            bucket.sum += f.rating;
        }
        Ok(buckets.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpool_core::driver_application::ReviewDecision;
    use carpool_core::query::{BookingQuery, RideQuery};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn user(name: &str, role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone_number: None,
            profile_picture: None,
            rating: None,
            car_model: None,
            plate_number: None,
            role,
            role_status: Some(RoleStatus::Approved),
            total_rides: 0,
        }
    }

    fn ride(driver_id: Uuid, status: &str) -> Ride {
        Ride {
            id: Uuid::new_v4(),
            driver_id,
            date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            time: None,
            pickup_address: "Block A".to_string(),
            pickup_latitude: None,
            pickup_longitude: None,
            drop_address: "Library".to_string(),
            drop_latitude: None,
            drop_longitude: None,
            base_fare: None,
            distance: None,
            duration: None,
            is_surge: false,
            distance_fare: None,
            duration_fare: None,
            surge_multiplier: None,
            total_fare: Some(dec!(30.00)),
            price: None,
            seats: 4,
            preferences: vec![],
            status: status.to_string(),
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

    #[tokio::test]
    async fn test_active_filter_matches_legacy_started_rows() {
        let store = InMemoryStore::new();
        let driver = user("Daniel", UserRole::Driver);
        store.insert_user(driver.clone()).await;
        store.insert_ride(ride(driver.id, "in_progress")).await;
        store.insert_ride(ride(driver.id, "started")).await;
        store.insert_ride(ride(driver.id, "open")).await;

        let filter = RideQuery {
            status: Some("Active".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let page = store.list_rides(&filter).await.unwrap();
        assert_eq!(page.pagination.total, 2);
        assert!(page.items.iter().all(|r| r.ride.status_label == "Active"));
        assert!(page.items.iter().all(|r| r.driver.is_some()));
    }

    #[tokio::test]
    async fn test_active_counts_skip_cancelled_and_empty_rides() {
        let store = InMemoryStore::new();
        let driver = user("Daniel", UserRole::Driver);
        let rider = user("Mei", UserRole::Passenger);
        let busy = ride(driver.id, "open");
        let empty = ride(driver.id, "open");
        store.insert_booking(booking(busy.id, rider.id, "confirmed")).await;
        store.insert_booking(booking(busy.id, rider.id, "pending")).await;
        store.insert_booking(booking(busy.id, rider.id, "cancelled")).await;
        store.insert_booking(booking(empty.id, rider.id, "cancelled")).await;

        let counts = store.active_counts(&[busy.id, empty.id]).await.unwrap();
        assert_eq!(counts.get(&busy.id), Some(&2));
        assert_eq!(counts.get(&empty.id), None);
    }

    #[tokio::test]
    async fn test_booking_list_joins_ride_and_passenger() {
        let store = InMemoryStore::new();
        let driver = user("Daniel", UserRole::Driver);
        let rider = user("Mei", UserRole::Passenger);
        let r = ride(driver.id, "open");
        store.insert_user(driver.clone()).await;
        store.insert_user(rider.clone()).await;
        store.insert_ride(r.clone()).await;
        store.insert_booking(booking(r.id, rider.id, "confirmed")).await;

        let filter = BookingQuery::default().validate().unwrap();
        let page = store.list_bookings(&filter).await.unwrap();
        let listing = &page.items[0];
        assert_eq!(listing.booking.passenger.as_ref().map(|p| p.name.as_str()), Some("Mei"));
        let summary = listing.ride.as_ref().unwrap();
        assert_eq!(summary.status_label, "Scheduled");
        assert_eq!(summary.driver.as_ref().map(|d| d.id), Some(driver.id));
    }

    #[tokio::test]
    async fn test_review_updates_application_and_user() {
        let store = InMemoryStore::new();
        let admin = user("Ops", UserRole::Admin);
        let applicant = user("Aina", UserRole::Passenger);
        store.insert_user(applicant.clone()).await;
        let application = DriverApplication {
            id: Uuid::new_v4(),
            user_id: applicant.id,
            status: ApplicationStatus::Pending,
            application_date: Utc::now(),
            review_date: None,
            reviewer_id: None,
            review_notes: None,
            applicant: None,
        };
        store.insert_application(application.clone()).await;

        let review = ApplicationReview {
            decision: ReviewDecision::Approved,
            reviewer_id: admin.id,
            notes: Some("ok".to_string()),
            reviewed_at: Utc::now(),
        };
        let reviewed = store.review_application(application.id, &review).await.unwrap();
        assert_eq!(reviewed.status, ApplicationStatus::Approved);
        assert_eq!(reviewed.reviewer_id, Some(admin.id));

        let updated = store.get_user(applicant.id).await.unwrap();
        assert_eq!(updated.role, UserRole::Driver);
        assert_eq!(updated.role_status, Some(RoleStatus::Approved));

        let again = store.review_application(application.id, &review).await;
        assert!(matches!(again, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_rating_conflicts() {
        let store = InMemoryStore::new();
        let driver = user("Daniel", UserRole::Driver);
        let rider = user("Mei", UserRole::Passenger);
        let r = ride(driver.id, "ended");
        let b = booking(r.id, rider.id, "confirmed");
        store.insert_ride(r.clone()).await;
        store.insert_booking(b.clone()).await;

        let new = NewRating {
            booking_id: b.id,
            ride_id: r.id,
            target_user_id: driver.id,
            rating: 5.0,
            comment: None,
        };
        assert!(store.create_rating(rider.id, &new).await.is_ok());
        assert!(matches!(
            store.create_rating(rider.id, &new).await,
            Err(StoreError::Conflict(_))
        ));
        // someone else's booking
        assert!(matches!(
            store.create_rating(driver.id, &new).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rating_must_target_the_ride_driver() {
        let store = InMemoryStore::new();
        let driver = user("Daniel", UserRole::Driver);
        let bystander = user("Farid", UserRole::Driver);
        let rider = user("Mei", UserRole::Passenger);
        let r = ride(driver.id, "ended");
        let b = booking(r.id, rider.id, "confirmed");
        store.insert_ride(r.clone()).await;
        store.insert_booking(b.clone()).await;

        let new = NewRating {
            booking_id: b.id,
            ride_id: r.id,
            target_user_id: bystander.id,
            rating: 1.0,
            comment: None,
        };
        assert!(matches!(
            store.create_rating(rider.id, &new).await,
            Err(StoreError::Invalid(_))
        ));
        let ratings = store
            .ratings_for_driver(bystander.id, PageRequest::default())
            .await
            .unwrap();
        assert!(ratings.items.is_empty());
    }

    #[tokio::test]
    async fn test_email_update_conflicts_with_existing_user() {
        let store = InMemoryStore::new();
        let a = user("Aina", UserRole::Passenger);
        let b = user("Badrul", UserRole::Passenger);
        store.insert_user(a.clone()).await;
        store.insert_user(b.clone()).await;

        let update: UserUpdate = serde_json::from_str(r#"{"email": "AINA@example.com"}"#).unwrap();
        let result = store.update_user(b.id, &update.validate().unwrap()).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(store.get_ride(Uuid::new_v4()).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.get_booking(Uuid::new_v4()).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.get_user(Uuid::new_v4()).await, Err(StoreError::NotFound(_))));
    }
}
