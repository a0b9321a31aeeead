//! Booking use cases: create and extend

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::domain::booking::{Booking, BookingCandidate, BookingId, Verdict};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

use super::clock::Clock;
use super::validator::{candidate_stay, check_additional_nights, BookingValidator};

/// Sequences validation with persistence.
///
/// Validation is read-then-decide, so validate + persist for a given guest
/// and unit runs under keyed admission locks. Locks are always taken guest
/// first, then unit, so two requests can never wait on each other in
/// opposite order. A lock entry lives only while some admission holds or
/// waits on it.
pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    validator: BookingValidator,
    guest_locks: LockMap,
    unit_locks: LockMap,
}

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Held for the duration of one admission; releases both locks and drops
/// their map entries once nobody else is using them.
struct AdmissionGuard<'a> {
    service: &'a BookingService,
    guest_name: String,
    unit_id: String,
    held: Option<(OwnedMutexGuard<()>, OwnedMutexGuard<()>)>,
}

impl Drop for AdmissionGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        release(&self.service.guest_locks, &self.guest_name);
        release(&self.service.unit_locks, &self.unit_id);
    }
}

impl BookingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            validator: BookingValidator::new(repos.clone(), clock),
            repos,
            guest_locks: DashMap::new(),
            unit_locks: DashMap::new(),
        }
    }

    pub async fn create_booking(&self, candidate: BookingCandidate) -> DomainResult<Booking> {
        candidate_stay(&candidate)?;
        let _admission = self.admit(&candidate.guest_name, &candidate.unit_id).await;

        let verdict = self.validator.validate_new_booking(&candidate).await?;
        if let Verdict::Rejected(reason) = verdict {
            warn!(
                guest = %candidate.guest_name,
                unit = %candidate.unit_id,
                check_in = %candidate.check_in_date,
                nights = candidate.number_of_nights,
                reason = reason.code(),
                "Booking refused"
            );
            metrics::counter!("bookings_rejected_total", "reason" => reason.code()).increment(1);
            return Err(DomainError::Rejected(reason));
        }

        let booking = self.repos.bookings().insert(candidate).await?;
        info!(
            booking_id = booking.id,
            guest = %booking.guest_name,
            unit = %booking.unit_id,
            check_in = %booking.check_in_date,
            nights = booking.number_of_nights,
            "Booking created"
        );
        metrics::counter!("bookings_created_total").increment(1);
        Ok(booking)
    }

    pub async fn extend_booking(
        &self,
        booking_id: BookingId,
        additional_nights: u32,
    ) -> DomainResult<Booking> {
        check_additional_nights(additional_nights)?;
        let existing = self.get_booking(booking_id).await?;

        // Guest and unit never change, so the locks taken here cover the
        // fresh read below.
        let _admission = self.admit(&existing.guest_name, &existing.unit_id).await;
        let existing = self.get_booking(booking_id).await?;

        let verdict = self
            .validator
            .validate_extension(&existing, additional_nights)
            .await?;
        if let Verdict::Rejected(reason) = verdict {
            warn!(
                booking_id,
                additional_nights,
                reason = reason.code(),
                "Booking extension refused"
            );
            metrics::counter!("bookings_rejected_total", "reason" => reason.code()).increment(1);
            return Err(DomainError::Rejected(reason));
        }

        let number_of_nights = existing
            .number_of_nights
            .checked_add(additional_nights)
            .ok_or_else(|| DomainError::InvalidInput("extended night count is out of range".into()))?;
        let updated = self
            .repos
            .bookings()
            .update_nights(booking_id, number_of_nights)
            .await?;
        info!(
            booking_id,
            additional_nights,
            nights = updated.number_of_nights,
            "Booking extended"
        );
        metrics::counter!("bookings_extended_total").increment(1);
        Ok(updated)
    }

    pub async fn get_booking(&self, booking_id: BookingId) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::booking_not_found(booking_id))
    }

    async fn admit(&self, guest_name: &str, unit_id: &str) -> AdmissionGuard<'_> {
        // Built first so a cancelled wait still cleans up its entries
        let mut admission = AdmissionGuard {
            service: self,
            guest_name: guest_name.to_string(),
            unit_id: unit_id.to_string(),
            held: None,
        };
        let guest = keyed_lock(&self.guest_locks, guest_name).lock_owned().await;
        let unit = keyed_lock(&self.unit_locks, unit_id).lock_owned().await;
        admission.held = Some((guest, unit));
        admission
    }
}

fn keyed_lock(locks: &LockMap, key: &str) -> Arc<Mutex<()>> {
    locks.entry(key.to_string()).or_default().clone()
}

/// Drop the entry for `key` when the map holds the only reference.
/// Checked under the shard lock, so no new waiter can slip in between.
fn release(locks: &LockMap, key: &str) {
    locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};

    use crate::application::booking::clock::FixedClock;
    use crate::domain::booking::{BookingRepository, ConflictFilter, RejectionReason, Stay};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    const GUEST_OVERLAP: &str = "Guest already has a booking during these dates";
    const UNIT_TAKEN: &str = "The unit is already booked for one or more of the selected nights";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 7, 1).unwrap()
    }

    fn day(offset: u64) -> NaiveDate {
        today() + Days::new(offset)
    }

    fn service() -> BookingService {
        service_at(today())
    }

    fn service_at(date: NaiveDate) -> BookingService {
        BookingService::new(
            Arc::new(InMemoryRepositoryProvider::new()),
            Arc::new(FixedClock(date)),
        )
    }

    fn guest_a_unit_1() -> BookingCandidate {
        BookingCandidate::new("GuestA", "1", day(0), 5)
    }

    fn rejection(err: DomainError) -> String {
        match err {
            DomainError::Rejected(reason) => reason.to_string(),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_on_empty_store() {
        let svc = service();
        let booking = svc.create_booking(guest_a_unit_1()).await.unwrap();
        assert_eq!(booking.number_of_nights, 5);
        assert_eq!(booking.guest_name, "GuestA");
        assert_eq!(booking.unit_id, "1");
    }

    #[tokio::test]
    async fn repeat_booking_hits_guest_rule() {
        let svc = service();
        svc.create_booking(guest_a_unit_1()).await.unwrap();
        let err = svc.create_booking(guest_a_unit_1()).await.unwrap_err();
        assert_eq!(rejection(err), GUEST_OVERLAP);
    }

    #[tokio::test]
    async fn same_guest_other_unit_hits_guest_rule() {
        let svc = service();
        svc.create_booking(guest_a_unit_1()).await.unwrap();
        let err = svc
            .create_booking(BookingCandidate::new("GuestA", "2", day(0), 5))
            .await
            .unwrap_err();
        assert_eq!(rejection(err), GUEST_OVERLAP);
    }

    #[tokio::test]
    async fn other_guest_same_unit_hits_unit_rule() {
        let svc = service();
        svc.create_booking(guest_a_unit_1()).await.unwrap();
        let err = svc
            .create_booking(BookingCandidate::new("GuestB", "1", day(0), 5))
            .await
            .unwrap_err();
        assert_eq!(rejection(err), UNIT_TAKEN);

        // Shifted by one day still overlaps
        let err = svc
            .create_booking(BookingCandidate::new("GuestB", "1", day(1), 5))
            .await
            .unwrap_err();
        assert_eq!(rejection(err), UNIT_TAKEN);
    }

    #[tokio::test]
    async fn adjacent_booking_succeeds() {
        let svc = service();
        svc.create_booking(guest_a_unit_1()).await.unwrap();
        let next = svc
            .create_booking(BookingCandidate::new("GuestB", "1", day(5), 3))
            .await
            .unwrap();
        assert_eq!(next.number_of_nights, 3);
    }

    #[tokio::test]
    async fn extend_without_neighbours() {
        let svc = service();
        let booking = svc.create_booking(guest_a_unit_1()).await.unwrap();
        let extended = svc.extend_booking(booking.id, 3).await.unwrap();
        assert_eq!(extended.id, booking.id);
        assert_eq!(extended.number_of_nights, 8);
        assert_eq!(extended.check_in_date, booking.check_in_date);
    }

    #[tokio::test]
    async fn extend_into_adjacent_booking_is_refused() {
        let svc = service();
        let booking = svc.create_booking(guest_a_unit_1()).await.unwrap();
        svc.create_booking(BookingCandidate::new("GuestB", "1", day(5), 3))
            .await
            .unwrap();

        let err = svc.extend_booking(booking.id, 5).await.unwrap_err();
        assert_eq!(rejection(err), UNIT_TAKEN);

        // Nothing was written
        assert_eq!(svc.get_booking(booking.id).await.unwrap().number_of_nights, 5);
    }

    #[tokio::test]
    async fn extend_after_checkout_is_refused() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let booking = repos
            .bookings()
            .insert(BookingCandidate::new("GuestA", "1", day(0), 5))
            .await
            .unwrap();

        // Two days after checkout, with the unit otherwise free
        let svc = BookingService::new(repos, Arc::new(FixedClock(day(7))));
        let err = svc.extend_booking(booking.id, 1).await.unwrap_err();
        assert_eq!(rejection(err), "Cannot extend booking after checkout date");
    }

    #[tokio::test]
    async fn extend_missing_booking_is_not_found() {
        let svc = service();
        let err = svc.extend_booking(404, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Booking", .. }));
    }

    #[tokio::test]
    async fn invalid_candidate_is_not_a_rejection() {
        let svc = service();
        let err = svc
            .create_booking(BookingCandidate::new("GuestA", "1", day(0), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_admit_exactly_one() {
        let svc = Arc::new(service());
        let mut handles = Vec::new();
        for i in 0..16 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.create_booking(BookingCandidate::new(format!("Guest{i}"), "1", day(i % 3), 4))
                    .await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(DomainError::Rejected(RejectionReason::UnitUnavailable)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn extend_after_checkout_is_refused_even_when_unit_is_taken() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let booking = repos
            .bookings()
            .insert(BookingCandidate::new("GuestA", "1", day(0), 5))
            .await
            .unwrap();
        // The nights an extension would add are already booked
        repos
            .bookings()
            .insert(BookingCandidate::new("GuestB", "1", day(5), 5))
            .await
            .unwrap();

        let svc = BookingService::new(repos, Arc::new(FixedClock(day(7))));
        let err = svc.extend_booking(booking.id, 2).await.unwrap_err();
        assert_eq!(rejection(err), "Cannot extend booking after checkout date");
    }

    // ── Admission locks ────────────────────────────────────────

    #[tokio::test]
    async fn lock_maps_are_empty_after_calls_finish() {
        let svc = service();

        // Malformed input never reaches the locks
        for i in 0..100u64 {
            let err = svc
                .create_booking(BookingCandidate::new(format!("Guest{i}"), format!("U{i}"), day(i), 0))
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)));
        }
        assert!(svc.guest_locks.is_empty());
        assert!(svc.unit_locks.is_empty());

        // Admitted, refused and extended calls release their entries too
        for i in 0..20u64 {
            svc.create_booking(BookingCandidate::new(format!("Guest{i}"), format!("U{i}"), day(i), 1))
                .await
                .unwrap();
        }
        let err = svc
            .create_booking(BookingCandidate::new("Guest0", "U99", day(0), 1))
            .await
            .unwrap_err();
        assert_eq!(rejection(err), GUEST_OVERLAP);
        svc.extend_booking(1, 1).await.unwrap();
        assert!(svc.extend_booking(1, 0).await.is_err());

        assert!(svc.guest_locks.is_empty());
        assert!(svc.unit_locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn lock_maps_drain_after_contention() {
        let svc = Arc::new(service());
        let mut handles = Vec::new();
        for i in 0..32u64 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.create_booking(BookingCandidate::new(format!("Guest{}", i % 4), "1", day(i), 1))
                    .await
            }));
        }
        for handle in handles {
            let _ = handle.await.unwrap();
        }
        assert!(svc.guest_locks.is_empty());
        assert!(svc.unit_locks.is_empty());
    }

    // ── Storage faults ─────────────────────────────────────────

    struct FailingRepository;

    #[async_trait]
    impl BookingRepository for FailingRepository {
        async fn find_conflicting(
            &self,
            _filter: &ConflictFilter,
            _stay: &Stay,
            _exclude: Option<BookingId>,
        ) -> DomainResult<bool> {
            Err(DomainError::Storage("connection refused".into()))
        }

        async fn insert(&self, _candidate: BookingCandidate) -> DomainResult<Booking> {
            Err(DomainError::Storage("connection refused".into()))
        }

        async fn find_by_id(&self, _id: BookingId) -> DomainResult<Option<Booking>> {
            Err(DomainError::Storage("connection refused".into()))
        }

        async fn update_nights(&self, _id: BookingId, _nights: u32) -> DomainResult<Booking> {
            Err(DomainError::Storage("connection refused".into()))
        }
    }

    struct FailingProvider(FailingRepository);

    impl RepositoryProvider for FailingProvider {
        fn bookings(&self) -> &dyn BookingRepository {
            &self.0
        }
    }

    #[tokio::test]
    async fn storage_faults_propagate_unchanged() {
        let svc = BookingService::new(
            Arc::new(FailingProvider(FailingRepository)),
            Arc::new(FixedClock(today())),
        );

        let err = svc.create_booking(guest_a_unit_1()).await.unwrap_err();
        assert!(err.is_transient(), "{err:?}");

        let err = svc.extend_booking(1, 1).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
