//! Booking repository interface

use async_trait::async_trait;

use super::model::{Booking, BookingCandidate, BookingId, ConflictFilter};
use super::stay::Stay;
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// True iff a stored booking matching `filter`, other than `exclude`,
    /// overlaps `stay`.
    async fn find_conflicting(
        &self,
        filter: &ConflictFilter,
        stay: &Stay,
        exclude: Option<BookingId>,
    ) -> DomainResult<bool>;

    /// Persist a new booking and return it with its assigned ID
    async fn insert(&self, candidate: BookingCandidate) -> DomainResult<Booking>;

    /// Find booking by ID
    async fn find_by_id(&self, id: BookingId) -> DomainResult<Option<Booking>>;

    /// Set the night count of an existing booking
    async fn update_nights(&self, id: BookingId, number_of_nights: u32) -> DomainResult<Booking>;
}
