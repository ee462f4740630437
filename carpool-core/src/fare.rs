//! Fare allocation.
//!
//! A ride's total fare is split equally across its non-cancelled bookings.
//! Shares are rounded per booking to two decimal places with banker's
//! rounding, so the sum over active bookings may differ from the total by up
//! to `n * 0.005`. Shares are derived on every read and never stored.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Anything the engine can split a fare across.
pub trait FareParticipant {
    /// Only the literal cancelled status excludes a participant.
    fn is_cancelled(&self) -> bool;
}

/// A participant annotated with what they owe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareShare<B> {
    #[serde(flatten)]
    pub booking: B,
    #[serde(with = "rust_decimal::serde::float")]
    pub fare: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FareAllocation<B> {
    pub fare_per_passenger: Decimal,
    pub total_fare: Decimal,
    pub active_bookings: usize,
    pub cancelled_bookings: usize,
    /// Same order as the input.
    pub bookings: Vec<FareShare<B>>,
}

impl<B> FareAllocation<B> {
    pub fn summary(&self) -> FareSummary {
        FareSummary {
            total_bookings: self.bookings.len(),
            active_bookings: self.active_bookings,
            cancelled_bookings: self.cancelled_bookings,
            total_fare: self.total_fare,
            fare_per_passenger: self.fare_per_passenger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FareSummary {
    pub total_bookings: usize,
    pub active_bookings: usize,
    pub cancelled_bookings: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_fare: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub fare_per_passenger: Decimal,
}

/// Picks the ride's total: the first present of `total_fare` and `price`, else zero.
/// Negative amounts are clamped to zero.
pub fn resolve_total_fare(total_fare: Option<Decimal>, price: Option<Decimal>) -> Decimal {
    let amount = total_fare.or(price).unwrap_or(Decimal::ZERO);
    if amount.is_sign_negative() && !amount.is_zero() {
        tracing::warn!(%amount, "Negative ride fare normalized to 0");
        return Decimal::ZERO;
    }
    amount
}

/// Per-passenger share of `total` across `active` passengers. Zero when nobody is riding.
pub fn share_for(total: Decimal, active: usize) -> Decimal {
    if active == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(active)).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

pub fn allocate<B>(total_fare: Decimal, bookings: &[B]) -> FareAllocation<B>
where
    B: FareParticipant + Clone,
{
    let cancelled = bookings.iter().filter(|b| b.is_cancelled()).count();
    let active = bookings.len() - cancelled;
    let share = share_for(total_fare, active);

    let annotated = bookings
        .iter()
        .map(|b| FareShare {
            fare: if b.is_cancelled() { Decimal::ZERO } else { share },
            booking: b.clone(),
        })
        .collect();

    FareAllocation {
        fare_per_passenger: share,
        total_fare,
        active_bookings: active,
        cancelled_bookings: cancelled,
        bookings: annotated,
    }
}
