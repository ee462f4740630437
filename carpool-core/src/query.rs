//! List-endpoint query parameters.
//!
//! Each endpoint deserializes its query string into one of the `*Query`
//! structs below (unknown keys are rejected) and then calls `validate()` to
//! obtain a filter with defaults applied and ranges checked.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::BookingStatus;
use crate::driver_application::ApplicationStatus;
use crate::ride::RideStatusFilter;
use crate::user::UserRole;
use crate::ValidationErrors;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Pagination
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    fn parse(page: Option<u32>, limit: Option<u32>, errors: &mut ValidationErrors) -> Self {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            errors.push("page", "Page must be at least 1");
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            errors.push("limit", "Limit must be between 1 and 100");
        }
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let limit = i64::from(request.limit.max(1));
        Self {
            items,
            pagination: PaginationMeta {
                total,
                page: request.page,
                limit: request.limit,
                total_pages: (total + limit - 1) / limit,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

fn check_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    errors: &mut ValidationErrors,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.push("startDate", "startDate must not be after endDate");
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ============================================================================
// Rides
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideSort {
    Date,
    CreatedAt,
    TotalFare,
    Seats,
}

impl RideSort {
    pub fn column(&self) -> &'static str {
        match self {
            RideSort::Date => "date",
            RideSort::CreatedAt => "created_at",
            RideSort::TotalFare => "total_fare",
            RideSort::Seats => "seats",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RideQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<RideSort>,
    pub order: Option<SortOrder>,
    pub status: Option<String>,
    pub driver_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub pickup: Option<String>,
    pub destination: Option<String>,
    pub min_seats: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct RideFilter {
    pub page: PageRequest,
    pub sort: RideSort,
    pub order: SortOrder,
    pub status: Option<RideStatusFilter>,
    pub driver_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub pickup: Option<String>,
    pub destination: Option<String>,
    pub min_seats: Option<i32>,
}

impl RideFilter {
    /// All rides of one driver, newest first.
    pub fn for_driver(driver_id: Uuid, page: PageRequest, status: Option<RideStatusFilter>) -> Self {
        Self {
            page,
            sort: RideSort::Date,
            order: SortOrder::Desc,
            status,
            driver_id: Some(driver_id),
            date: None,
            start_date: None,
            end_date: None,
            pickup: None,
            destination: None,
            min_seats: None,
        }
    }
}

impl RideQuery {
    pub fn validate(self) -> Result<RideFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = PageRequest::parse(self.page, self.limit, &mut errors);
        check_range(self.start_date, self.end_date, &mut errors);
        if matches!(self.min_seats, Some(n) if n < 1) {
            errors.push("minSeats", "minSeats must be at least 1");
        }

        let filter = RideFilter {
            page,
            sort: self.sort_by.unwrap_or(RideSort::Date),
            order: self.order.unwrap_or(SortOrder::Asc),
            status: non_blank(self.status).map(|s| RideStatusFilter::parse(&s)),
            driver_id: self.driver_id,
            date: self.date,
            start_date: self.start_date,
            end_date: self.end_date,
            pickup: non_blank(self.pickup),
            destination: non_blank(self.destination),
            min_seats: self.min_seats,
        };
        errors.into_result(filter)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverRidesQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

impl DriverRidesQuery {
    pub fn validate(self, driver_id: Uuid) -> Result<RideFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = PageRequest::parse(self.page, self.limit, &mut errors);
        let status = non_blank(self.status).map(|s| RideStatusFilter::parse(&s));
        errors.into_result(RideFilter::for_driver(driver_id, page, status))
    }
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSort {
    BookingTime,
    SeatNumber,
    Status,
}

impl BookingSort {
    pub fn column(&self) -> &'static str {
        match self {
            BookingSort::BookingTime => "booking_time",
            BookingSort::SeatNumber => "seat_number",
            BookingSort::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BookingQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<BookingSort>,
    pub order: Option<SortOrder>,
    pub status: Option<String>,
    pub user_id: Option<Uuid>,
    pub ride_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct BookingFilter {
    pub page: PageRequest,
    pub sort: BookingSort,
    pub order: SortOrder,
    pub status: Option<BookingStatus>,
    pub user_id: Option<Uuid>,
    pub ride_id: Option<Uuid>,
    /// Bounds on the ride's date.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BookingQuery {
    pub fn validate(self) -> Result<BookingFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = PageRequest::parse(self.page, self.limit, &mut errors);
        check_range(self.start_date, self.end_date, &mut errors);

        let status = match non_blank(self.status) {
            Some(raw) => {
                let parsed = BookingStatus::parse_known(&raw);
                if parsed.is_none() {
                    errors.push("status", "Status must be one of: pending, confirmed, cancelled");
                }
                parsed
            }
            None => None,
        };

        let filter = BookingFilter {
            page,
            sort: self.sort_by.unwrap_or(BookingSort::BookingTime),
            order: self.order.unwrap_or(SortOrder::Desc),
            status,
            user_id: self.user_id,
            ride_id: self.ride_id,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        errors.into_result(filter)
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSort {
    CreatedAt,
    TotalRides,
}

impl UserSort {
    pub fn column(&self) -> &'static str {
        match self {
            UserSort::CreatedAt => "created_at",
            UserSort::TotalRides => "total_rides",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UserQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<UserSort>,
    pub order: Option<SortOrder>,
    pub role: Option<UserRole>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserFilter {
    pub page: PageRequest,
    pub sort: UserSort,
    pub order: SortOrder,
    pub role: Option<UserRole>,
    /// Case-insensitive substring.
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserQuery {
    pub fn validate(self) -> Result<UserFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = PageRequest::parse(self.page, self.limit, &mut errors);
        let filter = UserFilter {
            page,
            sort: self.sort_by.unwrap_or(UserSort::CreatedAt),
            order: self.order.unwrap_or(SortOrder::Desc),
            role: self.role,
            name: non_blank(self.name),
            email: non_blank(self.email),
        };
        errors.into_result(filter)
    }
}

// ============================================================================
// Driver applications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSort {
    ApplicationDate,
    ReviewDate,
}

impl ApplicationSort {
    pub fn column(&self) -> &'static str {
        match self {
            ApplicationSort::ApplicationDate => "application_date",
            ApplicationSort::ReviewDate => "review_date",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ApplicationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<ApplicationSort>,
    pub order: Option<SortOrder>,
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Clone)]
pub struct ApplicationFilter {
    pub page: PageRequest,
    pub sort: ApplicationSort,
    pub order: SortOrder,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationQuery {
    pub fn validate(self) -> Result<ApplicationFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = PageRequest::parse(self.page, self.limit, &mut errors);
        let filter = ApplicationFilter {
            page,
            sort: self.sort_by.unwrap_or(ApplicationSort::ApplicationDate),
            order: self.order.unwrap_or(SortOrder::Desc),
            status: self.status,
        };
        errors.into_result(filter)
    }
}

// ============================================================================
// Ratings and feedback
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    CreatedAt,
    Rating,
}

impl ReviewSort {
    pub fn column(&self) -> &'static str {
        match self {
            ReviewSort::CreatedAt => "created_at",
            ReviewSort::Rating => "rating",
        }
    }
}

/// Listing parameters shared by ride ratings and system feedback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ReviewQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<ReviewSort>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReviewFilter {
    pub page: PageRequest,
    pub sort: ReviewSort,
    pub order: SortOrder,
}

impl ReviewFilter {
    /// Newest first.
    pub fn latest(page: PageRequest) -> Self {
        Self {
            page,
            sort: ReviewSort::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl ReviewQuery {
    pub fn validate(self) -> Result<ReviewFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = PageRequest::parse(self.page, self.limit, &mut errors);
        let filter = ReviewFilter {
            page,
            sort: self.sort_by.unwrap_or(ReviewSort::CreatedAt),
            order: self.order.unwrap_or(SortOrder::Desc),
        };
        errors.into_result(filter)
    }
}

/// Bare pagination for the per-driver and per-user sub-lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn validate(self) -> Result<PageRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let page = PageRequest::parse(self.page, self.limit, &mut errors);
        errors.into_result(page)
    }
}
