//! In-memory storage implementation

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::booking::{
    Booking, BookingCandidate, BookingId, BookingRepository, ConflictFilter, Stay,
};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// In-memory booking store for development and testing
pub struct InMemoryBookingRepository {
    bookings: DashMap<BookingId, Booking>,
    booking_counter: AtomicI32,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
            booking_counter: AtomicI32::new(1),
        }
    }
}

impl Default for InMemoryBookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_conflicting(
        &self,
        filter: &ConflictFilter,
        stay: &Stay,
        exclude: Option<BookingId>,
    ) -> DomainResult<bool> {
        Ok(self.bookings.iter().any(|entry| {
            let booking = entry.value();
            Some(booking.id) != exclude
                && filter.matches(booking)
                && booking.stay().is_some_and(|existing| existing.overlaps(stay))
        }))
    }

    async fn insert(&self, candidate: BookingCandidate) -> DomainResult<Booking> {
        let id = self.booking_counter.fetch_add(1, Ordering::SeqCst);
        let booking = Booking::from_candidate(id, candidate);
        self.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: BookingId) -> DomainResult<Option<Booking>> {
        Ok(self.bookings.get(&id).map(|b| b.value().clone()))
    }

    async fn update_nights(&self, id: BookingId, number_of_nights: u32) -> DomainResult<Booking> {
        let mut entry = self
            .bookings
            .get_mut(&id)
            .ok_or_else(|| DomainError::booking_not_found(id))?;
        entry.number_of_nights = number_of_nights;
        Ok(entry.clone())
    }
}

/// `RepositoryProvider` over in-memory repositories
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    bookings: InMemoryBookingRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }
}
